//! Tests fuer den ModerationWorkflow


use std::sync::Arc;

use uuid::Uuid;

use stillpost_audit::{AuditKanal, AuditTrail};
use stillpost_crypto::{AuditSigner, CryptoCodec, KeyStore, MemoryKeyStorage};
use stillpost_db::{FlagRepository, ProfileRepository, RestrictionRepository, SqliteDb};
use stillpost_messaging::{MessageFlow, Nachricht};

use crate::workflow::ModerationWorkflow;

pub(crate) struct Umgebung {
    pub db: Arc<SqliteDb>,
    pub key_store: Arc<KeyStore>,
    pub trail: Arc<AuditTrail>,
    pub audit: AuditKanal,
    pub flow: Arc<MessageFlow>,
    pub workflow: Arc<ModerationWorkflow>,
}

impl Umgebung {
    pub async fn neu() -> Self {
        let db = Arc::new(
            SqliteDb::in_memory()
                .await
                .expect("In-Memory-DB konnte nicht geoeffnet werden"),
        );
        Self::mit_sperren(db.clone(), db).await
    }

    /// Umgebung mit eigener Sperren-Ablage
    pub async fn mit_sperren(db: Arc<SqliteDb>, sperren: Arc<dyn RestrictionRepository>) -> Self {
        Self::mit_repos(db.clone(), db, sperren).await
    }

    /// Umgebung mit eigener Meldungs- und Sperren-Ablage fuer den Workflow
    pub async fn mit_repos(
        db: Arc<SqliteDb>,
        flags: Arc<dyn FlagRepository>,
        sperren: Arc<dyn RestrictionRepository>,
    ) -> Self {
        let key_store = KeyStore::oeffnen(Arc::new(MemoryKeyStorage::new())).await;
        let trail = AuditTrail::neu(db.clone(), AuditSigner::generate());
        let audit = AuditKanal::starten(Arc::clone(&trail));
        let codec = CryptoCodec::neu(Arc::clone(&key_store));

        let flow = MessageFlow::neu(
            db.clone(),
            db.clone(),
            db.clone(),
            codec.clone(),
            audit.clone(),
        );
        let workflow = ModerationWorkflow::neu(db.clone(), flags, sperren, codec, audit.clone());

        Self {
            db,
            key_store,
            trail,
            audit,
            flow,
            workflow,
        }
    }

    pub async fn registrieren(&self, email: &str) {
        let public_key = self
            .key_store
            .generate_and_store(email)
            .await
            .expect("Schluessel-Generierung fehlgeschlagen");
        self.db
            .store_public_key(Uuid::new_v4(), email, public_key.as_str())
            .await
            .expect("Profil anlegen fehlgeschlagen");
    }

    /// a@x.com schickt b@x.com eine Nachricht
    pub async fn nachricht_an_b(&self, text: &str) -> Nachricht {
        self.flow
            .send(text, "b@x.com", "a@x.com")
            .await
            .expect("Senden fehlgeschlagen")
    }
}

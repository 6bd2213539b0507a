//! Tests fuer MessageFlow und Posteingang-Abo


use std::sync::Arc;

use stillpost_audit::{AuditKanal, AuditTrail};
use stillpost_crypto::{AuditSigner, CryptoCodec, KeyStore, MemoryKeyStorage};
use stillpost_db::{AuditLogRepository, ProfileRepository, SqliteDb};
use uuid::Uuid;

use crate::flow::MessageFlow;

/// Testumgebung: In-Memory-DB, Schluessel im RAM, echtes Audit-Log
pub(crate) struct Umgebung {
    pub db: Arc<SqliteDb>,
    pub key_store: Arc<KeyStore>,
    pub trail: Arc<AuditTrail>,
    pub audit: AuditKanal,
    pub flow: Arc<MessageFlow>,
}

impl Umgebung {
    pub async fn neu() -> Self {
        let db = Arc::new(
            SqliteDb::in_memory()
                .await
                .expect("In-Memory-DB konnte nicht geoeffnet werden"),
        );
        Self::mit_audit_repo(db.clone(), db).await
    }

    pub async fn mit_audit_repo(db: Arc<SqliteDb>, audit_repo: Arc<dyn AuditLogRepository>) -> Self {
        let key_store = KeyStore::oeffnen(Arc::new(MemoryKeyStorage::new())).await;
        let trail = AuditTrail::neu(audit_repo, AuditSigner::generate());
        let audit = AuditKanal::starten(Arc::clone(&trail));
        let flow = MessageFlow::neu(
            db.clone(),
            db.clone(),
            db.clone(),
            CryptoCodec::neu(Arc::clone(&key_store)),
            audit.clone(),
        );
        Self {
            db,
            key_store,
            trail,
            audit,
            flow,
        }
    }

    /// Schluessel erzeugen und oeffentlichen Teil im Profil ablegen
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
}

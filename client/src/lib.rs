//! stillpost-client – Anwendungskontext
//!
//! `App` verdrahtet Datenbank, lokale Schluessel-Ablage, Audit-Log,
//! Nachrichtenversand und Moderation. Es gibt keinen globalen Zustand:
//! KeyStore und Ansichts-Cache gehoeren dem Kontext und werden bei der
//! Abmeldung geleert.

pub mod config;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use config::ClientConfig;
use stillpost_audit::{AuditEreignis, AuditKanal, AuditTrail};
use stillpost_core::{Email, LocalSessionProvider, Rolle, Session, SessionProvider, UserId};
use stillpost_crypto::{AuditSigner, CryptoCodec, FileKeyStorage, KeyStore, LocalKeyStorage};
use stillpost_db::{ProfileRepository, SqliteDb};
use stillpost_messaging::{MessageFlow, Nachricht};
use stillpost_moderation::ModerationWorkflow;

/// Haelt den Client-Zustand zusammen
pub struct App {
    pub config: ClientConfig,
    db: Arc<SqliteDb>,
    key_store: Arc<KeyStore>,
    sessions: LocalSessionProvider,
    audit_trail: Arc<AuditTrail>,
    audit: AuditKanal,
    nachrichten: Arc<MessageFlow>,
    moderation: Arc<ModerationWorkflow>,
}

impl App {
    /// Oeffnet Datenbank, Schluessel-Ablage und Audit-Schluessel laut Konfiguration
    pub async fn starten(config: ClientConfig) -> Result<Self> {
        let db = SqliteDb::oeffnen(&config.datenbank_config())
            .await
            .context("Datenbank konnte nicht geoeffnet werden")?;
        let speicher = Arc::new(FileKeyStorage::new(&config.schluessel.verzeichnis));
        let signer = AuditSigner::laden_oder_erzeugen(&config.audit.signatur_schluessel_datei)
            .context("Audit-Signaturschluessel nicht verfuegbar")?;

        tracing::info!(
            datenbank = %config.datenbank.url,
            schluessel = %config.schluessel.verzeichnis.display(),
            "Stillpost-Client gestartet"
        );
        Ok(Self::zusammensetzen(config, Arc::new(db), speicher, signer).await)
    }

    /// Baut den Kontext aus bereits geoeffneten Teilen
    pub async fn zusammensetzen(
        config: ClientConfig,
        db: Arc<SqliteDb>,
        speicher: Arc<dyn LocalKeyStorage>,
        signer: AuditSigner,
    ) -> Self {
        let key_store = KeyStore::oeffnen(speicher).await;
        let audit_trail = AuditTrail::neu(db.clone(), signer);
        let audit = AuditKanal::starten(Arc::clone(&audit_trail));
        let codec = CryptoCodec::neu(Arc::clone(&key_store));

        let nachrichten = MessageFlow::neu(
            db.clone(),
            db.clone(),
            db.clone(),
            codec.clone(),
            audit.clone(),
        );
        let moderation =
            ModerationWorkflow::neu(db.clone(), db.clone(), db.clone(), codec, audit.clone());

        // Abmeldung verwirft Klartext-Ansichten und private Schluessel im Speicher
        let sessions = LocalSessionProvider::new();
        let flow = Arc::clone(&nachrichten);
        let schluessel = Arc::clone(&key_store);
        sessions.on_auth_change(Box::new(move |session| {
            if session.is_none() {
                flow.clear_view_cache();
                schluessel.clear();
            }
        }));

        Self {
            config,
            db,
            key_store,
            sessions,
            audit_trail,
            audit,
            nachrichten,
            moderation,
        }
    }

    /// Legt ein Profil an (oder erneuert den Schluessel) und meldet an
    pub async fn registrieren(&self, email: &str, rolle: Rolle) -> Result<Session> {
        let email = Email::neu(email);
        if email.is_empty() {
            bail!("E-Mail-Adresse fehlt");
        }

        let public_key = self
            .key_store
            .generate_and_store(email.as_str())
            .await
            .context("Schluessel-Paar konnte nicht erzeugt werden")?;

        let user_id = match self.db.get_by_email(email.as_str()).await? {
            Some(profil) => UserId(profil.user_id),
            None => UserId::new(),
        };
        self.db
            .store_public_key(user_id.inner(), email.as_str(), public_key.as_str())
            .await?;
        if rolle != Rolle::User {
            self.db.set_role(email.as_str(), rolle).await?;
        }

        tracing::info!(user_id = %user_id, rolle = %rolle, "Profil registriert");
        self.audit
            .melden(AuditEreignis::signup(&user_id.to_string(), email.as_str()));
        Ok(self.sessions.sign_in(user_id, email.as_str()))
    }

    /// Meldet ein bestehendes Profil an
    pub async fn anmelden(&self, email: &str) -> Result<Session> {
        let email = Email::neu(email);
        let Some(profil) = self.db.get_by_email(email.as_str()).await? else {
            bail!("Kein Profil fuer '{email}', zuerst registrieren");
        };

        let user_id = UserId(profil.user_id);
        self.audit
            .melden(AuditEreignis::login(&user_id.to_string(), email.as_str()));
        Ok(self.sessions.sign_in(user_id, email.as_str()))
    }

    /// Meldet ab; `false` wenn niemand angemeldet war
    pub async fn abmelden(&self) -> bool {
        let Some(session) = self.sessions.current_session().await else {
            return false;
        };
        self.audit.melden(AuditEreignis::logout(
            &session.user_id.to_string(),
            session.email.as_str(),
        ));
        self.sessions.sign_out()
    }

    /// Aktuelle Session oder Fehler
    pub async fn sitzung(&self) -> Result<Session> {
        self.sessions
            .current_session()
            .await
            .context("Nicht angemeldet")
    }

    /// Rolle laut Profil; ohne Profil `User`
    async fn rolle(&self, session: &Session) -> Result<Rolle> {
        Ok(self
            .db
            .get_by_email(session.email.as_str())
            .await?
            .map(|p| p.rolle)
            .unwrap_or_default())
    }

    /// Aktuelle Session, sofern sie Moderator- oder Admin-Rechte hat
    pub async fn moderator_sitzung(&self) -> Result<Session> {
        let session = self.sitzung().await?;
        let rolle = self.rolle(&session).await?;
        if !rolle.ist_moderator() {
            tracing::warn!(rolle = %rolle, "Moderationsaktion ohne Berechtigung abgelehnt");
            bail!("Keine Berechtigung: Moderator- oder Admin-Rolle erforderlich");
        }
        Ok(session)
    }

    /// Entschluesselt eine Nachricht fuer die angemeldete Person
    ///
    /// Moderator- und Admin-Rollen werden im Audit-Eintrag als
    /// Moderator-Entschluesselung vermerkt.
    pub async fn entschluesseln(&self, message_id: Uuid) -> Result<Nachricht> {
        let session = self.sitzung().await?;
        let ist_moderator = self.rolle(&session).await?.ist_moderator();
        Ok(self
            .nachrichten
            .decrypt_message(message_id, session.email.as_str(), ist_moderator)
            .await?)
    }

    pub fn nachrichten(&self) -> &Arc<MessageFlow> {
        &self.nachrichten
    }

    pub fn moderation(&self) -> &Arc<ModerationWorkflow> {
        &self.moderation
    }

    pub fn audit_trail(&self) -> &Arc<AuditTrail> {
        &self.audit_trail
    }

    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.key_store
    }

    /// Meldet ab, schreibt ausstehende Audit-Eintraege und schliesst die DB
    pub async fn beenden(&self) {
        self.abmelden().await;
        self.audit.leeren().await;
        self.db.schliessen().await;
        tracing::debug!("Stillpost-Client beendet");
    }
}

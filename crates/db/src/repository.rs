//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Die Traits sind objektsicher, damit Services
//! sie als `Arc<dyn ...>` halten und in Tests durch Fakes ersetzen koennen.

use async_trait::async_trait;
use stillpost_core::Rolle;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{
    AuditLogFilter, AuditLogRecord, FlagAbschluss, FlagRecord, NachrichtRecord,
    NachrichtenAenderung, NeueNachricht, NeueSperre, NeuerFlag, Prioritaet, ProfilRecord,
    SperreRecord,
};

/// Result-Alias fuer Datenbankoperationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://stillpost.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://stillpost.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ProfileRepository
// ---------------------------------------------------------------------------

/// Profil-Store: oeffentliche Schluessel und Rollen
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Legt das Profil an oder ersetzt den oeffentlichen Schluessel
    async fn store_public_key(&self, user_id: Uuid, email: &str, public_key: &str)
        -> DbResult<()>;

    /// Oeffentlicher Schluessel zur (normalisierten) E-Mail-Adresse
    async fn get_public_key(&self, email: &str) -> DbResult<Option<String>>;

    async fn get_by_email(&self, email: &str) -> DbResult<Option<ProfilRecord>>;

    /// Setzt die Rolle; `false` wenn kein Profil existiert
    async fn set_role(&self, email: &str, rolle: Rolle) -> DbResult<bool>;
}

// ---------------------------------------------------------------------------
// MessageRepository
// ---------------------------------------------------------------------------

/// Nachrichten-Store
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord>;

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<NachrichtRecord>>;

    /// Alle Nachrichten an `recipient_email`, neueste zuerst
    async fn query_by_recipient(&self, recipient_email: &str) -> DbResult<Vec<NachrichtRecord>>;

    /// Alle gemeldeten Nachrichten, neueste zuerst
    async fn list_flagged(&self) -> DbResult<Vec<NachrichtRecord>>;

    /// Setzt Meldungs-Flag und Prioritaet; `false` wenn die Nachricht fehlt
    async fn update_flags(
        &self,
        id: Uuid,
        is_flagged: bool,
        priority: Option<Prioritaet>,
    ) -> DbResult<bool>;

    /// Aenderungs-Feed (Einfuegen/Aktualisieren)
    fn subscribe(&self) -> broadcast::Receiver<NachrichtenAenderung>;
}

// ---------------------------------------------------------------------------
// FlagRepository
// ---------------------------------------------------------------------------

/// Meldungen; hoechstens eine pro Nachricht
#[async_trait]
pub trait FlagRepository: Send + Sync {
    async fn create(&self, data: NeuerFlag<'_>) -> DbResult<FlagRecord>;

    async fn get_by_message(&self, message_id: Uuid) -> DbResult<Option<FlagRecord>>;

    /// Offene Meldung zum Token
    async fn get_pending_by_token(&self, token_id: &str) -> DbResult<Option<FlagRecord>>;

    /// Schliesst eine offene Meldung ab
    ///
    /// Wirkt nur auf `pending`; bereits abgeschlossene Meldungen bleiben
    /// unveraendert und ergeben `false`.
    async fn resolve(&self, id: Uuid, abschluss: FlagAbschluss<'_>) -> DbResult<bool>;

    async fn update_decrypted_content(&self, message_id: Uuid, content: &str) -> DbResult<bool>;
}

// ---------------------------------------------------------------------------
// RestrictionRepository
// ---------------------------------------------------------------------------

/// Gerichtete Nachrichtensperren
#[async_trait]
pub trait RestrictionRepository: Send + Sync {
    async fn is_restricted(&self, sender_email: &str, recipient_email: &str) -> DbResult<bool>;

    async fn insert_restriction(&self, data: NeueSperre<'_>) -> DbResult<SperreRecord>;

    async fn list_for_sender(&self, sender_email: &str) -> DbResult<Vec<SperreRecord>>;
}

// ---------------------------------------------------------------------------
// AuditLogRepository
// ---------------------------------------------------------------------------

/// Audit-Senke (nur Anhaengen und Lesen)
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, eintrag: &AuditLogRecord) -> DbResult<()>;

    async fn get(&self, id: Uuid) -> DbResult<Option<AuditLogRecord>>;

    /// Eintraege nach Filter, neueste zuerst
    async fn list(&self, filter: AuditLogFilter) -> DbResult<Vec<AuditLogRecord>>;

    async fn count(&self, filter: AuditLogFilter) -> DbResult<i64>;
}

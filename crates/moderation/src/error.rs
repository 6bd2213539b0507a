//! Fehlertypen fuer die Moderation

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Nachricht nicht gefunden: {0}")]
    NachrichtNichtGefunden(Uuid),

    #[error("Nachricht {0} hat keinen vollstaendigen Absender/Empfaenger")]
    UnvollstaendigeNachricht(Uuid),

    #[error("Datenbank-Fehler: {0}")]
    Persistenz(#[from] stillpost_db::DbError),
}

pub type ModerationResult<T> = Result<T, ModerationError>;

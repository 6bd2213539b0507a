//! Fehlertypen fuer den Nachrichtenversand

use thiserror::Error;
use uuid::Uuid;

use stillpost_crypto::{CryptoError, EntschluesselungsFehler};

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Nachrichten an diesen Empfaenger sind gesperrt")]
    NachrichtenSperre,

    #[error("Empfaenger hat keinen oeffentlichen Schluessel")]
    EmpfaengerSchluesselFehlt,

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(#[from] CryptoError),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(#[from] EntschluesselungsFehler),

    #[error("Nachricht nicht gefunden: {0}")]
    NachrichtNichtGefunden(Uuid),

    #[error("Keine Berechtigung: {0}")]
    KeineBerechtigung(String),

    #[error("Datenbank-Fehler: {0}")]
    Persistenz(#[from] stillpost_db::DbError),
}

pub type MessagingResult<T> = Result<T, MessagingError>;

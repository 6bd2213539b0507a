//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Ungueltiger Schluessel: {0}")]
    UngueltigerSchluessel(String),

    #[error("Lokaler Schluesselspeicher nicht verfuegbar: {0}")]
    Speicher(String),

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Typisiertes Ergebnis einer fehlgeschlagenen Entschluesselung
///
/// Kein Systemfehler: Betrachter ohne passenden Schluessel sind der
/// Normalfall (neues Geraet, Moderator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EntschluesselungsFehler {
    #[error("Kein privater Schluessel fuer diese Identitaet verfuegbar")]
    KeinSchluessel,

    #[error("Ungueltiges Ciphertext-Format")]
    UngueltigesFormat,

    #[error("Falscher Schluessel oder beschaedigter Ciphertext")]
    FalscherSchluesselOderBeschaedigt,
}

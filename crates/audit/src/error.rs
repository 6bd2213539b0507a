//! Fehlertypen fuer das Audit-Log

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit-Log nicht verfuegbar: {0}")]
    Persistenz(#[from] stillpost_db::DbError),

    #[error("Unbekannte Kategorie: {0}")]
    UnbekannteKategorie(String),
}

pub type AuditResult<T> = Result<T, AuditError>;

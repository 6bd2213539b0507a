//! stillpost-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern bereit: objektsichere Traits
//! fuer Profile, Nachrichten, Meldungen, Sperren und das Audit-Log sowie
//! eine SQLite-Implementierung mit eingebetteten Migrationen.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{
    AuditLogRepository, DatabaseConfig, DbResult, FlagRepository, MessageRepository,
    ProfileRepository, RestrictionRepository,
};
pub use sqlite::SqliteDb;

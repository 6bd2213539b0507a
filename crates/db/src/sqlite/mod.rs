//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod audit;
pub mod flags;
pub mod messages;
pub mod pool;
pub mod profiles;
pub mod restrictions;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::DbResult;

pub(crate) fn parse_uuid(row: &sqlx::sqlite::SqliteRow, col: &str) -> DbResult<Uuid> {
    let s: String = row.try_get(col)?;
    Uuid::parse_str(&s).map_err(|e| DbError::intern(format!("Ungueltige UUID in '{col}': {e}")))
}

pub(crate) fn parse_datetime(row: &sqlx::sqlite::SqliteRow, col: &str) -> DbResult<DateTime<Utc>> {
    let s: String = row.try_get(col)?;
    zeit_parsen(&s, col)
}

pub(crate) fn parse_opt_datetime(
    row: &sqlx::sqlite::SqliteRow,
    col: &str,
) -> DbResult<Option<DateTime<Utc>>> {
    let s: Option<String> = row.try_get(col)?;
    s.as_deref().map(|v| zeit_parsen(v, col)).transpose()
}

fn zeit_parsen(s: &str, col: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltiger Zeitstempel in '{col}' ('{s}'): {e}")))
}

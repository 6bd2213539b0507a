//! SQLite-Implementierung des AuditLogRepository
//!
//! Nur Anhaengen und Lesen. UPDATE und DELETE werden zusaetzlich von
//! Triggern in der Datenbank abgewiesen.

use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{zeitstempel_text, AuditLogFilter, AuditLogRecord};
use crate::repository::{AuditLogRepository, DbResult};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_datetime, parse_uuid};

#[async_trait]
impl AuditLogRepository for SqliteDb {
    async fn append(&self, eintrag: &AuditLogRecord) -> DbResult<()> {
        let metadata_str = serde_json::to_string(&eintrag.metadata)?;

        sqlx::query(
            "INSERT INTO audit_log
               (id, event_type, timestamp, actor_id, token_id, recipient_ref, message_id,
                metadata_json, signature)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(eintrag.id.to_string())
        .bind(&eintrag.event_type)
        .bind(zeitstempel_text(&eintrag.timestamp))
        .bind(&eintrag.actor_id)
        .bind(&eintrag.token_id)
        .bind(&eintrag.recipient_ref)
        .bind(&eintrag.message_id)
        .bind(&metadata_str)
        .bind(&eintrag.signature)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DbResult<Option<AuditLogRecord>> {
        let row = sqlx::query(
            "SELECT id, event_type, timestamp, actor_id, token_id, recipient_ref, message_id,
                    metadata_json, signature
             FROM audit_log WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_audit(&r)).transpose()
    }

    async fn list(&self, filter: AuditLogFilter) -> DbResult<Vec<AuditLogRecord>> {
        let where_clause = where_klausel(&filter);

        let limit_clause = filter
            .limit
            .map(|l| format!("LIMIT {l}"))
            .unwrap_or_default();
        let offset_clause = match (filter.limit, filter.offset) {
            (Some(_), Some(o)) => format!("OFFSET {o}"),
            // OFFSET ist in SQLite nur zusammen mit LIMIT erlaubt
            (None, Some(o)) => format!("LIMIT -1 OFFSET {o}"),
            _ => String::new(),
        };

        let sql = format!(
            "SELECT id, event_type, timestamp, actor_id, token_id, recipient_ref, message_id,
                    metadata_json, signature
             FROM audit_log
             {where_clause}
             ORDER BY timestamp DESC, rowid DESC
             {limit_clause} {offset_clause}"
        );

        let rows = filter_binden(sqlx::query(&sql), &filter)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_audit).collect()
    }

    async fn count(&self, filter: AuditLogFilter) -> DbResult<i64> {
        let where_clause = where_klausel(&filter);
        let sql = format!("SELECT COUNT(*) as cnt FROM audit_log {where_clause}");

        let row = filter_binden(sqlx::query(&sql), &filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("cnt")?)
    }
}

/// Dynamische WHERE-Klausel aufbauen
fn where_klausel(filter: &AuditLogFilter) -> String {
    let mut conditions: Vec<String> = Vec::new();

    if !filter.event_types.is_empty() {
        let platzhalter = vec!["?"; filter.event_types.len()].join(", ");
        conditions.push(format!("event_type IN ({platzhalter})"));
    }
    if filter.since.is_some() {
        conditions.push("timestamp >= ?".into());
    }
    if filter.until.is_some() {
        conditions.push("timestamp <= ?".into());
    }
    if filter.nur_moderator_aktionen {
        conditions.push("json_extract(metadata_json, '$.moderator_action') = 1".into());
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Bindet die Filterwerte in derselben Reihenfolge wie `where_klausel`
fn filter_binden<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &AuditLogFilter,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for event_type in &filter.event_types {
        q = q.bind(event_type.clone());
    }
    if let Some(ref v) = filter.since {
        q = q.bind(zeitstempel_text(v));
    }
    if let Some(ref v) = filter.until {
        q = q.bind(zeitstempel_text(v));
    }
    q
}

fn row_to_audit(row: &sqlx::sqlite::SqliteRow) -> DbResult<AuditLogRecord> {
    let metadata_str: String = row.try_get("metadata_json")?;
    let metadata: serde_json::Value = serde_json::from_str(&metadata_str)
        .map_err(|e| DbError::intern(format!("Ungueltige metadata JSON: {e}")))?;

    Ok(AuditLogRecord {
        id: parse_uuid(row, "id")?,
        event_type: row.try_get("event_type")?,
        timestamp: parse_datetime(row, "timestamp")?,
        actor_id: row.try_get("actor_id")?,
        token_id: row.try_get("token_id")?,
        recipient_ref: row.try_get("recipient_ref")?,
        message_id: row.try_get("message_id")?,
        metadata,
        signature: row.try_get("signature")?,
    })
}

//! SQLite-Implementierung des FlagRepository

use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{jetzt, zeitstempel_text, FlagAbschluss, FlagRecord, FlagStatus, NeuerFlag};
use crate::repository::{DbResult, FlagRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_datetime, parse_opt_datetime, parse_uuid};

const SPALTEN: &str = "id, message_id, token_id, flagged_by, reason, status, decrypted_content, \
                       flagged_at, reviewed_at, reviewed_by, notes";

#[async_trait]
impl FlagRepository for SqliteDb {
    async fn create(&self, data: NeuerFlag<'_>) -> DbResult<FlagRecord> {
        let id = Uuid::new_v4();
        let now = jetzt();

        sqlx::query(
            "INSERT INTO flagged_messages
               (id, message_id, token_id, flagged_by, reason, status, decrypted_content, flagged_at)
             VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.message_id.to_string())
        .bind(data.token_id)
        .bind(data.flagged_by)
        .bind(data.reason)
        .bind(data.decrypted_content)
        .bind(zeitstempel_text(&now))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let e = DbError::from(e);
            if e.ist_eindeutigkeit() {
                DbError::Eindeutigkeit(format!("Nachricht {} ist bereits gemeldet", data.message_id))
            } else {
                e
            }
        })?;

        Ok(FlagRecord {
            id,
            message_id: data.message_id,
            token_id: data.token_id.to_string(),
            flagged_by: data.flagged_by.map(str::to_string),
            reason: data.reason.to_string(),
            status: FlagStatus::Pending,
            decrypted_content: data.decrypted_content.map(str::to_string),
            flagged_at: now,
            reviewed_at: None,
            reviewed_by: None,
            notes: None,
        })
    }

    async fn get_by_message(&self, message_id: Uuid) -> DbResult<Option<FlagRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SPALTEN} FROM flagged_messages WHERE message_id = ?"
        ))
        .bind(message_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_flag(&r)).transpose()
    }

    async fn get_pending_by_token(&self, token_id: &str) -> DbResult<Option<FlagRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SPALTEN} FROM flagged_messages
             WHERE token_id = ? AND status = 'pending'
             ORDER BY flagged_at DESC, rowid DESC
             LIMIT 1"
        ))
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_flag(&r)).transpose()
    }

    async fn resolve(&self, id: Uuid, abschluss: FlagAbschluss<'_>) -> DbResult<bool> {
        if !abschluss.status.ist_abgeschlossen() {
            return Err(DbError::UngueltigeDaten(
                "Meldung kann nur auf reviewed oder dismissed gesetzt werden".into(),
            ));
        }

        let result = sqlx::query(
            "UPDATE flagged_messages
             SET status = ?, reviewed_at = ?, reviewed_by = ?, notes = ?
             WHERE id = ? AND status = 'pending'",
        )
        .bind(abschluss.status.als_str())
        .bind(zeitstempel_text(&jetzt()))
        .bind(abschluss.reviewed_by)
        .bind(abschluss.notes)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_decrypted_content(&self, message_id: Uuid, content: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE flagged_messages SET decrypted_content = ? WHERE message_id = ?",
        )
        .bind(content)
        .bind(message_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_flag(row: &sqlx::sqlite::SqliteRow) -> DbResult<FlagRecord> {
    let status_str: String = row.try_get("status")?;
    let status = FlagStatus::parse(&status_str)
        .ok_or_else(|| DbError::intern(format!("Ungueltiger Meldungsstatus '{status_str}'")))?;

    Ok(FlagRecord {
        id: parse_uuid(row, "id")?,
        message_id: parse_uuid(row, "message_id")?,
        token_id: row.try_get("token_id")?,
        flagged_by: row.try_get("flagged_by")?,
        reason: row.try_get("reason")?,
        status,
        decrypted_content: row.try_get("decrypted_content")?,
        flagged_at: parse_datetime(row, "flagged_at")?,
        reviewed_at: parse_opt_datetime(row, "reviewed_at")?,
        reviewed_by: row.try_get("reviewed_by")?,
        notes: row.try_get("notes")?,
    })
}

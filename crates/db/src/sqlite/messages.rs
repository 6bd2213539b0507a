//! SQLite-Implementierung des MessageRepository

use async_trait::async_trait;
use sqlx::Row;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{
    jetzt, zeitstempel_text, NachrichtRecord, NachrichtenAenderung, NeueNachricht, Prioritaet,
};
use crate::repository::{DbResult, MessageRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_datetime, parse_uuid};

const SPALTEN: &str = "id, token_id, content, is_encrypted, timestamp, is_flagged, priority, \
                       sender_email, recipient_email";

#[async_trait]
impl MessageRepository for SqliteDb {
    async fn insert(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord> {
        let id = Uuid::new_v4();
        let now = jetzt();

        sqlx::query(
            "INSERT INTO messages
               (id, token_id, content, is_encrypted, timestamp, is_flagged, sender_email, recipient_email)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.token_id)
        .bind(data.content)
        .bind(data.is_encrypted)
        .bind(zeitstempel_text(&now))
        .bind(data.sender_email)
        .bind(data.recipient_email)
        .execute(&self.pool)
        .await?;

        self.aenderung_melden(NachrichtenAenderung::Eingefuegt {
            id,
            recipient_email: Some(data.recipient_email.to_string()),
        });

        Ok(NachrichtRecord {
            id,
            token_id: data.token_id.to_string(),
            content: data.content.to_string(),
            is_encrypted: data.is_encrypted,
            timestamp: now,
            is_flagged: false,
            priority: None,
            sender_email: Some(data.sender_email.to_string()),
            recipient_email: Some(data.recipient_email.to_string()),
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<NachrichtRecord>> {
        let row = sqlx::query(&format!("SELECT {SPALTEN} FROM messages WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_nachricht(&r)).transpose()
    }

    async fn query_by_recipient(&self, recipient_email: &str) -> DbResult<Vec<NachrichtRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {SPALTEN} FROM messages
             WHERE recipient_email = ?
             ORDER BY timestamp DESC, rowid DESC"
        ))
        .bind(recipient_email)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_nachricht).collect()
    }

    async fn list_flagged(&self) -> DbResult<Vec<NachrichtRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {SPALTEN} FROM messages
             WHERE is_flagged = 1
             ORDER BY timestamp DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_nachricht).collect()
    }

    async fn update_flags(
        &self,
        id: Uuid,
        is_flagged: bool,
        priority: Option<Prioritaet>,
    ) -> DbResult<bool> {
        let row = sqlx::query(
            "UPDATE messages SET is_flagged = ?, priority = ?
             WHERE id = ?
             RETURNING recipient_email",
        )
        .bind(is_flagged)
        .bind(priority.map(|p| p.als_str()))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(false);
        };

        self.aenderung_melden(NachrichtenAenderung::Aktualisiert {
            id,
            recipient_email: row.try_get("recipient_email")?,
        });
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<NachrichtenAenderung> {
        self.aenderungen.subscribe()
    }
}

fn row_to_nachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<NachrichtRecord> {
    let priority: Option<String> = row.try_get("priority")?;
    let priority = priority
        .as_deref()
        .map(|p| {
            Prioritaet::parse(p).ok_or_else(|| DbError::intern(format!("Ungueltige Prioritaet '{p}'")))
        })
        .transpose()?;

    let is_encrypted: i64 = row.try_get("is_encrypted")?;
    let is_flagged: i64 = row.try_get("is_flagged")?;

    Ok(NachrichtRecord {
        id: parse_uuid(row, "id")?,
        token_id: row.try_get("token_id")?,
        content: row.try_get("content")?,
        is_encrypted: is_encrypted != 0,
        timestamp: parse_datetime(row, "timestamp")?,
        is_flagged: is_flagged != 0,
        priority,
        sender_email: row.try_get("sender_email")?,
        recipient_email: row.try_get("recipient_email")?,
    })
}

//! SQLite-Implementierung des ProfileRepository

use async_trait::async_trait;
use sqlx::Row;
use stillpost_core::Rolle;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{jetzt, zeitstempel_text, ProfilRecord};
use crate::repository::{DbResult, ProfileRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_datetime, parse_uuid};

#[async_trait]
impl ProfileRepository for SqliteDb {
    async fn store_public_key(
        &self,
        user_id: Uuid,
        email: &str,
        public_key: &str,
    ) -> DbResult<()> {
        let now_str = zeitstempel_text(&jetzt());

        sqlx::query(
            "INSERT INTO profiles (user_id, email, public_key, role, created_at)
             VALUES (?, ?, ?, 'User', ?)
             ON CONFLICT (user_id) DO UPDATE SET
               email = excluded.email,
               public_key = excluded.public_key",
        )
        .bind(user_id.to_string())
        .bind(email)
        .bind(public_key)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, "Oeffentlicher Schluessel gespeichert");
        Ok(())
    }

    async fn get_public_key(&self, email: &str) -> DbResult<Option<String>> {
        let row = sqlx::query("SELECT public_key FROM profiles WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let key: Option<String> = row.try_get("public_key")?;
        Ok(key.filter(|k| !k.trim().is_empty()))
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<ProfilRecord>> {
        let row = sqlx::query(
            "SELECT user_id, email, public_key, role, created_at
             FROM profiles WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_profil(&r)).transpose()
    }

    async fn set_role(&self, email: &str, rolle: Rolle) -> DbResult<bool> {
        let result = sqlx::query("UPDATE profiles SET role = ? WHERE email = ?")
            .bind(rolle.als_str())
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_profil(row: &sqlx::sqlite::SqliteRow) -> DbResult<ProfilRecord> {
    let role_str: String = row.try_get("role")?;
    let rolle = role_str
        .parse::<Rolle>()
        .map_err(|e| DbError::intern(format!("Ungueltige Rolle: {e}")))?;

    Ok(ProfilRecord {
        user_id: parse_uuid(row, "user_id")?,
        email: row.try_get("email")?,
        public_key: row.try_get("public_key")?,
        rolle,
        created_at: parse_datetime(row, "created_at")?,
    })
}

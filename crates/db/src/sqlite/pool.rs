//! SQLite Connection Pool mit WAL-Modus

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::broadcast;
use tracing::info;

use crate::error::DbError;
use crate::models::NachrichtenAenderung;
use crate::repository::DatabaseConfig;

/// Kapazitaet des Aenderungs-Feeds; langsame Empfaenger sehen `Lagged`
const AENDERUNGS_KAPAZITAET: usize = 256;

/// Wrapper um den SQLite Connection Pool
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
    pub(crate) aenderungen: broadcast::Sender<NachrichtenAenderung>,
}

impl SqliteDb {
    fn neu(pool: SqlitePool) -> Self {
        let (aenderungen, _) = broadcast::channel(AENDERUNGS_KAPAZITAET);
        Self { pool, aenderungen }
    }

    /// Erstellt einen neuen Pool, fuehrt Migrationen aus
    pub async fn oeffnen(config: &DatabaseConfig) -> Result<Self, DbError> {
        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(if config.sqlite_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen)
            .connect_with(opts)
            .await?;

        info!(url = %config.url, wal = config.sqlite_wal, "SQLite-Pool geoeffnet");

        let db = Self::neu(pool);
        db.migrationen_ausfuehren().await?;

        Ok(db)
    }

    /// Fuehrt alle ausstehenden Migrationen aus
    pub async fn migrationen_ausfuehren(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Datenbank-Migrationen abgeschlossen");
        Ok(())
    }

    /// Gibt den internen Pool zurueck (fuer Tests)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Erstellt eine In-Memory-Datenbank fuer Tests
    pub async fn in_memory() -> Result<Self, DbError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            // In-Memory benoetigt mindestens 1 persistente Verbindung
            .min_connections(1)
            .connect_with(opts)
            .await?;

        let db = Self::neu(pool);
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    /// Schliesst den Pool
    pub async fn schliessen(&self) {
        self.pool.close().await;
    }

    pub(crate) fn aenderung_melden(&self, aenderung: NachrichtenAenderung) {
        // Ohne Empfaenger schlaegt `send` fehl; das ist kein Fehler
        let _ = self.aenderungen.send(aenderung);
    }
}

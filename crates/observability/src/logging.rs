//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (ueberschreibt die Konfiguration):
//! - `STILLPOST_LOG_LEVEL`: Filter im `EnvFilter`-Format, Standard: info
//! - `STILLPOST_LOG_FORMAT`: `text` oder `json`, Standard: text

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "STILLPOST_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "STILLPOST_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum LoggingFehler {
    #[error("Ungueltiger Log-Filter '{0}'")]
    UngueltigerFilter(String),

    #[error("Logging bereits initialisiert")]
    BereitsInitialisiert,
}

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(format!("Unbekanntes Log-Format: {andere}")),
        }
    }
}

/// Aufgeloeste Logging-Einstellungen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEinstellungen {
    pub level: String,
    pub format: LogFormat,
}

impl LogEinstellungen {
    /// Kombiniert Konfiguration und Umgebungswerte; Umgebung gewinnt
    ///
    /// Ein unbekanntes Format faellt auf `text` zurueck.
    pub fn aufloesen(
        level: &str,
        format: &str,
        env_level: Option<String>,
        env_format: Option<String>,
    ) -> Self {
        let level = env_level
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| level.to_string());
        let format = env_format
            .as_deref()
            .unwrap_or(format)
            .parse()
            .unwrap_or_default();
        Self { level, format }
    }

    /// Liest die Umgebungsvariablen und kombiniert sie mit der Konfiguration
    pub fn aus_umgebung(level: &str, format: &str) -> Self {
        Self::aufloesen(
            level,
            format,
            std::env::var(ENV_LOG_LEVEL).ok(),
            std::env::var(ENV_LOG_FORMAT).ok(),
        )
    }

    pub fn filter(&self) -> Result<EnvFilter, LoggingFehler> {
        EnvFilter::try_new(&self.level)
            .map_err(|_| LoggingFehler::UngueltigerFilter(self.level.clone()))
    }
}

/// Initialisiert das Logging-System
///
/// Darf pro Prozess nur einmal aufgerufen werden.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<(), LoggingFehler> {
    let einstellungen = LogEinstellungen::aus_umgebung(level, format);
    let filter = einstellungen.filter()?;

    let ergebnis = match einstellungen.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|_| LoggingFehler::BereitsInitialisiert)
}

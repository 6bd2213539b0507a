//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! Standardwerte, der Client laeuft also auch ohne Konfigurationsdatei.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stillpost_db::DatabaseConfig;

/// Umgebungsvariable fuer den Pfad der Konfigurationsdatei
pub const ENV_CONFIG: &str = "STILLPOST_CONFIG";

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub datenbank: DatenbankEinstellungen,
    /// Lokale Ablage der privaten Schluessel
    pub schluessel: SchluesselEinstellungen,
    pub audit: AuditEinstellungen,
    pub logging: LoggingEinstellungen,
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    pub sqlite_wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        let standard = DatabaseConfig::default();
        Self {
            url: standard.url,
            max_verbindungen: standard.max_verbindungen,
            sqlite_wal: standard.sqlite_wal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchluesselEinstellungen {
    /// Verzeichnis fuer den Schluessel-Blob; verlaesst nie das Geraet
    pub verzeichnis: PathBuf,
}

impl Default for SchluesselEinstellungen {
    fn default() -> Self {
        Self {
            verzeichnis: PathBuf::from(".stillpost"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditEinstellungen {
    /// Datei mit dem Ed25519-Seed fuer Audit-Signaturen (wird bei Bedarf erzeugt)
    pub signatur_schluessel_datei: PathBuf,
}

impl Default for AuditEinstellungen {
    fn default() -> Self {
        Self {
            signatur_schluessel_datei: PathBuf::from(".stillpost/audit_signatur.key"),
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Filter, z.B. "info" oder "info,stillpost_db=debug"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Pfad aus `--config`, sonst `STILLPOST_CONFIG`, sonst `stillpost.toml`
    pub fn pfad_bestimmen(cli_pfad: Option<String>) -> String {
        cli_pfad
            .or_else(|| std::env::var(ENV_CONFIG).ok())
            .unwrap_or_else(|| "stillpost.toml".into())
    }

    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.sqlite_wal,
        }
    }
}

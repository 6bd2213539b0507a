//! Lokale Ablage der privaten Schluessel
//!
//! Die Ablage ist ein einzelner JSON-Blob `{ email: pem }` unter einem
//! festen Namen. Er wird beim Start gelesen und bei jeder
//! Schluesselgenerierung zusammengefuehrt neu geschrieben. Der Blob verlaesst
//! nie das Geraet.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::CryptoResult;

/// Fester Name des Schluessel-Blobs
pub const SCHLUESSEL_BLOB_NAME: &str = "userPrivateKeys";

/// Abstrakte, nicht synchronisierte lokale Ablage
#[async_trait]
pub trait LocalKeyStorage: Send + Sync {
    /// Liest den gesamten Blob (leer wenn noch nichts gespeichert wurde)
    async fn laden(&self) -> CryptoResult<HashMap<String, String>>;

    /// Ersetzt den gesamten Blob
    async fn schreiben(&self, schluessel: &HashMap<String, String>) -> CryptoResult<()>;
}

/// Dateibasierte Ablage: `<verzeichnis>/userPrivateKeys.json`
#[derive(Debug, Clone)]
pub struct FileKeyStorage {
    pfad: PathBuf,
}

impl FileKeyStorage {
    pub fn new(verzeichnis: impl AsRef<Path>) -> Self {
        Self {
            pfad: verzeichnis
                .as_ref()
                .join(format!("{SCHLUESSEL_BLOB_NAME}.json")),
        }
    }

    pub fn pfad(&self) -> &Path {
        &self.pfad
    }
}

#[async_trait]
impl LocalKeyStorage for FileKeyStorage {
    async fn laden(&self) -> CryptoResult<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.pfad).await {
            Ok(inhalt) if inhalt.trim().is_empty() => Ok(HashMap::new()),
            Ok(inhalt) => Ok(serde_json::from_str(&inhalt)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn schreiben(&self, schluessel: &HashMap<String, String>) -> CryptoResult<()> {
        if let Some(parent) = self.pfad.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Erst in eine Temp-Datei schreiben, dann atomar umbenennen
        let tmp = self.pfad.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(schluessel)?;
        tokio::fs::write(&tmp, &json).await?;
        nur_besitzer_lesbar(&tmp).await?;
        tokio::fs::rename(&tmp, &self.pfad).await?;

        tracing::debug!(pfad = %self.pfad.display(), eintraege = schluessel.len(), "Schluessel-Blob geschrieben");
        Ok(())
    }
}

#[cfg(unix)]
async fn nur_besitzer_lesbar(pfad: &Path) -> CryptoResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(pfad, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn nur_besitzer_lesbar(_pfad: &Path) -> CryptoResult<()> {
    Ok(())
}

/// Fluechtige Ablage im Arbeitsspeicher (Tests, kurzlebige Sessions)
#[derive(Debug, Default)]
pub struct MemoryKeyStorage {
    inhalt: Mutex<HashMap<String, String>>,
}

impl MemoryKeyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vorbelegte Ablage (simuliert einen frueheren Programmstart)
    pub fn mit_inhalt(inhalt: HashMap<String, String>) -> Self {
        Self {
            inhalt: Mutex::new(inhalt),
        }
    }

    pub fn anzahl(&self) -> usize {
        self.inhalt.lock().len()
    }
}

#[async_trait]
impl LocalKeyStorage for MemoryKeyStorage {
    async fn laden(&self) -> CryptoResult<HashMap<String, String>> {
        Ok(self.inhalt.lock().clone())
    }

    async fn schreiben(&self, schluessel: &HashMap<String, String>) -> CryptoResult<()> {
        *self.inhalt.lock() = schluessel.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;

    #[tokio::test]
    async fn datei_fehlt_ergibt_leeren_blob() {
        let dir = tempfile::tempdir().unwrap();
        let speicher = FileKeyStorage::new(dir.path());
        assert!(speicher.laden().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn datei_schreiben_und_lesen() {
        let dir = tempfile::tempdir().unwrap();
        let speicher = FileKeyStorage::new(dir.path().join("schluessel"));

        let mut blob = HashMap::new();
        blob.insert("a@x.com".to_string(), "pem-a".to_string());
        speicher.schreiben(&blob).await.unwrap();

        assert!(speicher.pfad().ends_with("userPrivateKeys.json"));
        let gelesen = speicher.laden().await.unwrap();
        assert_eq!(gelesen.get("a@x.com").map(String::as_str), Some("pem-a"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn datei_nur_fuer_besitzer_lesbar() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let speicher = FileKeyStorage::new(dir.path());
        speicher.schreiben(&HashMap::new()).await.unwrap();

        let modus = std::fs::metadata(speicher.pfad()).unwrap().permissions().mode();
        assert_eq!(modus & 0o777, 0o600);
    }

    #[tokio::test]
    async fn kaputtes_json_ist_fehler() {
        let dir = tempfile::tempdir().unwrap();
        let speicher = FileKeyStorage::new(dir.path());
        std::fs::write(speicher.pfad(), "{kein json").unwrap();
        assert!(matches!(speicher.laden().await, Err(CryptoError::Json(_))));
    }

    #[tokio::test]
    async fn speicher_im_ram() {
        let speicher = MemoryKeyStorage::new();
        let mut blob = HashMap::new();
        blob.insert("b@x.com".to_string(), "pem-b".to_string());
        speicher.schreiben(&blob).await.unwrap();
        assert_eq!(speicher.anzahl(), 1);
        assert_eq!(speicher.laden().await.unwrap(), blob);
    }
}

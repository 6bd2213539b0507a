//! KeyStore: private Schluessel pro E-Mail-Adresse
//!
//! Die Registry im Arbeitsspeicher wird beim Oeffnen aus der lokalen Ablage
//! hydratisiert. Neue Schluessel werden zuerst persistiert und erst danach
//! im Speicher sichtbar. Private Schluessel verlassen nie das Geraet.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::codec::{generate_key_pair, RSA_BITS};
use crate::error::{CryptoError, CryptoResult};
use crate::storage::LocalKeyStorage;
use crate::types::{PrivateKeyPem, PublicKeyPem};

/// Schluessel werden immer unter der normalisierten Adresse abgelegt
fn normalisieren(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Prozesslokaler Speicher fuer private Schluessel
pub struct KeyStore {
    registry: DashMap<String, PrivateKeyPem>,
    speicher: Arc<dyn LocalKeyStorage>,
    /// Serialisiert Lesen-Zusammenfuehren-Schreiben auf dem Blob
    schreib_lock: Mutex<()>,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("eintraege", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl KeyStore {
    /// Oeffnet den KeyStore und laedt alle vorhandenen Schluessel
    ///
    /// Eine unlesbare Ablage wird protokolliert; der Store startet dann leer.
    pub async fn oeffnen(speicher: Arc<dyn LocalKeyStorage>) -> Arc<Self> {
        let registry = DashMap::new();
        match speicher.laden().await {
            Ok(blob) => {
                for (email, pem) in blob {
                    registry.insert(normalisieren(&email), PrivateKeyPem::new(pem));
                }
                tracing::debug!(eintraege = registry.len(), "KeyStore hydratisiert");
            }
            Err(e) => {
                tracing::warn!(fehler = %e, "Lokale Schluessel-Ablage nicht lesbar, starte leer");
            }
        }

        Arc::new(Self {
            registry,
            speicher,
            schreib_lock: Mutex::new(()),
        })
    }

    /// Erzeugt ein neues Schluessel-Paar fuer `email`
    ///
    /// Der private Schluessel wird lokal gespeichert (ein vorhandener Eintrag
    /// wird ersetzt), der oeffentliche zurueckgegeben.
    pub async fn generate_and_store(&self, email: &str) -> CryptoResult<PublicKeyPem> {
        let email = normalisieren(email);
        if email.is_empty() {
            return Err(CryptoError::SchluesselGenerierung(
                "E-Mail-Adresse fehlt".into(),
            ));
        }

        let paar = tokio::task::spawn_blocking(|| generate_key_pair(RSA_BITS))
            .await
            .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))??;

        {
            let _guard = self.schreib_lock.lock().await;
            let mut blob: HashMap<String, String> = self.speicher.laden().await?;
            blob.retain(|k, _| normalisieren(k) != email);
            blob.insert(email.clone(), paar.private_key.as_pem().to_string());
            self.speicher.schreiben(&blob).await?;
        }

        self.registry.insert(email, paar.private_key);
        tracing::info!("Neues Schluessel-Paar erzeugt und lokal gespeichert");
        Ok(paar.public_key)
    }

    /// Liefert den privaten Schluessel fuer `email`
    ///
    /// Erst aus dem Speicher, sonst aus der lokalen Ablage (mit Caching).
    /// Fehler der Ablage ergeben `None`.
    pub async fn get_private_key(&self, email: &str) -> Option<PrivateKeyPem> {
        let email = normalisieren(email);
        if email.is_empty() {
            return None;
        }
        if let Some(key) = self.registry.get(&email) {
            return Some(key.value().clone());
        }

        match self.speicher.laden().await {
            Ok(blob) => {
                let pem = blob
                    .into_iter()
                    .find(|(k, _)| normalisieren(k) == email)
                    .map(|(_, v)| PrivateKeyPem::new(v))?;
                self.registry.insert(email, pem.clone());
                Some(pem)
            }
            Err(e) => {
                tracing::warn!(fehler = %e, "Schluessel-Ablage beim Lookup nicht lesbar");
                None
            }
        }
    }

    /// Prueft ob ein Schluessel im Speicher liegt
    pub fn has_key(&self, email: &str) -> bool {
        self.registry.contains_key(&normalisieren(email))
    }

    /// Anzahl der Schluessel im Speicher
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Leert die Registry im Speicher (Abmeldung). Die Ablage bleibt erhalten.
    pub fn clear(&self) {
        self.registry.clear();
        tracing::debug!("KeyStore im Speicher geleert");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileKeyStorage, MemoryKeyStorage};
    use async_trait::async_trait;

    /// Ablage die immer fehlschlaegt
    struct KaputteAblage;

    #[async_trait]
    impl LocalKeyStorage for KaputteAblage {
        async fn laden(&self) -> CryptoResult<HashMap<String, String>> {
            Err(CryptoError::Speicher("kaputt".into()))
        }

        async fn schreiben(&self, _: &HashMap<String, String>) -> CryptoResult<()> {
            Err(CryptoError::Speicher("kaputt".into()))
        }
    }

    #[tokio::test]
    async fn neuer_schluessel_ersetzt_alte_schreibweisen() {
        let mut blob = HashMap::new();
        blob.insert("Alice@X.com".to_string(), "pem-alt".to_string());
        blob.insert(" ALICE@x.com".to_string(), "pem-aelter".to_string());
        blob.insert("bob@x.com".to_string(), "pem-bob".to_string());
        let ablage = Arc::new(MemoryKeyStorage::mit_inhalt(blob));
        let store = KeyStore::oeffnen(ablage.clone()).await;

        store.generate_and_store("alice@x.com").await.unwrap();

        assert_eq!(ablage.anzahl(), 2);
        let inhalt = ablage.laden().await.unwrap();
        assert!(inhalt.contains_key("alice@x.com"));
        assert_ne!(inhalt["alice@x.com"], "pem-alt");
        assert_eq!(inhalt["bob@x.com"], "pem-bob");

        // Neustart sieht nur den neuen Schluessel
        let neu = KeyStore::oeffnen(ablage).await;
        let key = neu.get_private_key("alice@x.com").await.unwrap();
        assert_eq!(key.as_pem(), inhalt["alice@x.com"]);
    }

    #[tokio::test]
    async fn hydratisierung_aus_ablage() {
        let mut blob = HashMap::new();
        blob.insert("Alice@X.com".to_string(), "pem-alice".to_string());
        let store = KeyStore::oeffnen(Arc::new(MemoryKeyStorage::mit_inhalt(blob))).await;

        assert_eq!(store.len(), 1);
        assert!(store.has_key("alice@x.com"));
        let key = store.get_private_key("ALICE@x.com").await.unwrap();
        assert_eq!(key.as_pem(), "pem-alice");
    }

    #[tokio::test]
    async fn unbekannte_adresse_ergibt_none() {
        let store = KeyStore::oeffnen(Arc::new(MemoryKeyStorage::new())).await;
        assert!(store.get_private_key("nobody@x.com").await.is_none());
        assert!(store.get_private_key("").await.is_none());
    }

    #[tokio::test]
    async fn kaputte_ablage_startet_leer() {
        let store = KeyStore::oeffnen(Arc::new(KaputteAblage)).await;
        assert!(store.is_empty());
        assert!(store.get_private_key("a@x.com").await.is_none());
    }

    #[tokio::test]
    async fn generieren_scheitert_bei_kaputter_ablage() {
        let store = KeyStore::oeffnen(Arc::new(KaputteAblage)).await;
        let result = store.generate_and_store("a@x.com").await;
        assert!(matches!(result, Err(CryptoError::Speicher(_))));
        assert!(!store.has_key("a@x.com"));
    }

    #[tokio::test]
    async fn leere_adresse_abgelehnt() {
        let store = KeyStore::oeffnen(Arc::new(MemoryKeyStorage::new())).await;
        let result = store.generate_and_store("  ").await;
        assert!(matches!(result, Err(CryptoError::SchluesselGenerierung(_))));
    }

    #[tokio::test]
    async fn generieren_persistiert_und_fuehrt_zusammen() {
        let dir = tempfile::tempdir().unwrap();
        let ablage = Arc::new(FileKeyStorage::new(dir.path()));

        let mut vorher = HashMap::new();
        vorher.insert("alt@x.com".to_string(), "pem-alt".to_string());
        ablage.schreiben(&vorher).await.unwrap();

        let store = KeyStore::oeffnen(ablage.clone()).await;
        let public = store.generate_and_store("Neu@X.com").await.unwrap();
        assert!(public.as_str().contains("BEGIN PUBLIC KEY"));

        let blob = ablage.laden().await.unwrap();
        assert_eq!(blob.len(), 2);
        assert!(blob.contains_key("alt@x.com"));
        assert!(blob["neu@x.com"].contains("BEGIN PRIVATE KEY"));

        // Neuer Prozess sieht denselben Schluessel
        let neu_geoeffnet = KeyStore::oeffnen(ablage).await;
        assert_eq!(
            neu_geoeffnet.get_private_key("neu@x.com").await.unwrap().as_pem(),
            blob["neu@x.com"]
        );
    }

    #[tokio::test]
    async fn clear_leert_nur_speicher() {
        let ablage = Arc::new(MemoryKeyStorage::new());
        let store = KeyStore::oeffnen(ablage.clone()).await;
        store.generate_and_store("a@x.com").await.unwrap();

        store.clear();
        assert!(!store.has_key("a@x.com"));
        assert_eq!(ablage.anzahl(), 1);

        // Lookup laedt aus der Ablage nach
        assert!(store.get_private_key("a@x.com").await.is_some());
        assert!(store.has_key("a@x.com"));
    }
}

//! Nachrichten-Verschluesselung (Envelope Encryption)
//!
//! Der Nachrichtentext wird direkt mit dem oeffentlichen RSA-Schluessel des
//! Empfaengers verschluesselt, ohne separaten symmetrischen Sitzungsschluessel.
//!
//! ## Format
//! ```text
//! base64( RSA-OAEP-SHA256( utf8(klartext) ) )
//! ```
//!
//! Bei RSA-2048 passen maximal 190 Bytes Klartext in einen Block.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult, EntschluesselungsFehler};
use crate::key_store::KeyStore;
use crate::token::generate_token;
use crate::types::{KeyPair, PrivateKeyPem, PublicKeyPem};

/// Schluessellaenge fuer neue Schluessel-Paare
pub const RSA_BITS: usize = 2048;

/// OAEP-Overhead: 2 * Hash-Laenge + 2
const OAEP_OVERHEAD: usize = 2 * 32 + 2;

/// Erzeugt ein neues RSA-Schluessel-Paar (PKCS#8 / SPKI PEM)
///
/// CPU-intensiv; in async Kontexten ueber `spawn_blocking` aufrufen.
pub fn generate_key_pair(bits: usize) -> CryptoResult<KeyPair> {
    let private = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
    let public = RsaPublicKey::from(&private);

    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

    Ok(KeyPair {
        public_key: PublicKeyPem::new(public_pem),
        private_key: PrivateKeyPem::aus_zeroizing(private_pem),
    })
}

/// Verschluesselt Klartext mit dem oeffentlichen Schluessel des Empfaengers
pub fn encrypt(plaintext: &str, recipient_public_key: &str) -> CryptoResult<String> {
    if plaintext.is_empty() {
        return Err(CryptoError::Verschluesselung(
            "Klartext darf nicht leer sein".into(),
        ));
    }

    let public_key = public_key_parsen(recipient_public_key)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let kapazitaet = public_key.size().saturating_sub(OAEP_OVERHEAD);
    if plaintext.len() > kapazitaet {
        return Err(CryptoError::Verschluesselung(format!(
            "Klartext zu lang: {} Bytes (Maximum: {kapazitaet} Bytes)",
            plaintext.len()
        )));
    }

    let ciphertext = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext.as_bytes())
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    Ok(STANDARD.encode(ciphertext))
}

/// Entschluesselt mit einem konkreten privaten Schluessel
pub fn decrypt_with_key(
    ciphertext_base64: &str,
    private_key: &PrivateKeyPem,
) -> Result<String, EntschluesselungsFehler> {
    let bytes = base64_dekodieren(ciphertext_base64)?;
    oaep_entschluesseln(&bytes, private_key)
}

/// Prueft ob ein String wohlgeformtes Standard-Base64 ist
///
/// Nicht leer, Laenge durch 4 teilbar, nur `A-Z a-z 0-9 + /` und hoechstens
/// drei abschliessende `=`.
pub fn ist_gueltiges_base64(eingabe: &str) -> bool {
    if eingabe.is_empty() || eingabe.len() % 4 != 0 {
        return false;
    }
    let daten = eingabe.trim_end_matches('=');
    if eingabe.len() - daten.len() > 3 {
        return false;
    }
    daten
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

fn base64_dekodieren(ciphertext_base64: &str) -> Result<Vec<u8>, EntschluesselungsFehler> {
    let getrimmt = ciphertext_base64.trim();
    if !ist_gueltiges_base64(getrimmt) {
        return Err(EntschluesselungsFehler::UngueltigesFormat);
    }
    let bytes = STANDARD
        .decode(getrimmt)
        .map_err(|_| EntschluesselungsFehler::UngueltigesFormat)?;
    if bytes.is_empty() {
        return Err(EntschluesselungsFehler::UngueltigesFormat);
    }
    Ok(bytes)
}

fn oaep_entschluesseln(
    bytes: &[u8],
    private_key: &PrivateKeyPem,
) -> Result<String, EntschluesselungsFehler> {
    let private = private_key_parsen(private_key.as_pem()).map_err(|e| {
        tracing::warn!(fehler = %e, "Gespeicherter privater Schluessel nicht lesbar");
        EntschluesselungsFehler::FalscherSchluesselOderBeschaedigt
    })?;

    let klartext = private
        .decrypt(Oaep::new::<Sha256>(), bytes)
        .map_err(|_| EntschluesselungsFehler::FalscherSchluesselOderBeschaedigt)?;

    String::from_utf8(klartext).map_err(|_| EntschluesselungsFehler::FalscherSchluesselOderBeschaedigt)
}

fn public_key_parsen(pem: &str) -> CryptoResult<RsaPublicKey> {
    let pem = pem.trim();
    if pem.is_empty() {
        return Err(CryptoError::UngueltigerSchluessel(
            "Oeffentlicher Schluessel fehlt".into(),
        ));
    }
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| CryptoError::UngueltigerSchluessel(e.to_string()))
}

fn private_key_parsen(pem: &str) -> CryptoResult<RsaPrivateKey> {
    let pem = pem.trim();
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| CryptoError::UngueltigerSchluessel(e.to_string()))
}

/// Ver- und Entschluesselung von Nachrichtentexten
///
/// Haelt eine Referenz auf den `KeyStore` der Sitzung; private Schluessel
/// werden nur ueber ihn nachgeschlagen.
#[derive(Debug, Clone)]
pub struct CryptoCodec {
    key_store: Arc<KeyStore>,
}

impl CryptoCodec {
    pub fn neu(key_store: Arc<KeyStore>) -> Self {
        Self { key_store }
    }

    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.key_store
    }

    /// Siehe [`encrypt`]
    pub fn encrypt(&self, plaintext: &str, recipient_public_key: &str) -> CryptoResult<String> {
        encrypt(plaintext, recipient_public_key)
    }

    /// Entschluesselt einen Ciphertext fuer `owner_email`
    ///
    /// Das Format wird vor dem Schluessel-Lookup geprueft: ein kaputter
    /// Ciphertext ist immer `UngueltigesFormat`, unabhaengig vom Betrachter.
    /// `UngueltigesFormat` hat damit Vorrang vor `KeinSchluessel`.
    pub async fn decrypt(
        &self,
        ciphertext_base64: &str,
        owner_email: &str,
    ) -> Result<String, EntschluesselungsFehler> {
        let bytes = base64_dekodieren(ciphertext_base64)?;

        let Some(private_key) = self.key_store.get_private_key(owner_email).await else {
            tracing::debug!("Kein privater Schluessel fuer Entschluesselung vorhanden");
            return Err(EntschluesselungsFehler::KeinSchluessel);
        };

        oaep_entschluesseln(&bytes, &private_key)
    }

    /// Siehe [`generate_token`]
    pub fn generate_token(&self) -> String {
        generate_token()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

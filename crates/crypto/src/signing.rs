//! Signaturschluessel fuer das Audit-Log (Ed25519)
//!
//! Jeder Audit-Eintrag wird ueber seine kanonische Darstellung signiert.
//! Ed25519 ist deterministisch: derselbe Eintrag ergibt immer dieselbe
//! Signatur, Manipulationen werden beim Verifizieren erkannt.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

/// Signierer fuer Audit-Eintraege
#[derive(Clone)]
pub struct AuditSigner {
    signing_key: SigningKey,
}

impl AuditSigner {
    /// Generiert einen neuen Signaturschluessel
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Erstellt einen Signierer aus einem privaten Schluessel (32 Bytes)
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Privater Schluessel als Bytes (fuer Persistenz)
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Signiert Daten, Ergebnis Base64-kodiert
    pub fn sign(&self, data: &[u8]) -> String {
        STANDARD.encode(self.signing_key.sign(data).to_bytes())
    }

    /// Verifiziert eine Base64-Signatur mit dem eigenen oeffentlichen Schluessel
    pub fn verify(&self, data: &[u8], signature_base64: &str) -> bool {
        Self::verify_with(data, signature_base64, &self.public_key_bytes())
    }

    /// Verifiziert eine Base64-Signatur mit einem beliebigen oeffentlichen Schluessel
    pub fn verify_with(data: &[u8], signature_base64: &str, public_key_bytes: &[u8; 32]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(public_key_bytes) else {
            return false;
        };
        let Ok(bytes) = STANDARD.decode(signature_base64.trim()) else {
            return false;
        };
        let Ok(sig_array) = <[u8; 64]>::try_from(bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_array);
        verifying_key.verify(data, &signature).is_ok()
    }

    /// Laedt den Schluessel aus `pfad` oder erzeugt und speichert einen neuen
    ///
    /// Die Datei enthaelt den 32-Byte-Seed Base64-kodiert.
    pub fn laden_oder_erzeugen(pfad: &Path) -> CryptoResult<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let bytes = Zeroizing::new(STANDARD.decode(inhalt.trim())?);
                let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    CryptoError::UngueltigerSchluessel(format!(
                        "Audit-Schluessel hat {} statt 32 Bytes",
                        bytes.len()
                    ))
                })?;
                tracing::debug!(pfad = %pfad.display(), "Audit-Signaturschluessel geladen");
                Ok(Self::from_bytes(&seed))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let signer = Self::generate();
                if let Some(parent) = pfad.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let kodiert = Zeroizing::new(STANDARD.encode(*signer.private_key_bytes()));
                std::fs::write(pfad, kodiert.as_bytes())?;
                nur_besitzer_lesbar(pfad)?;
                tracing::info!(pfad = %pfad.display(), "Neuer Audit-Signaturschluessel erzeugt");
                Ok(signer)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn nur_besitzer_lesbar(pfad: &Path) -> CryptoResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(pfad, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn nur_besitzer_lesbar(_pfad: &Path) -> CryptoResult<()> {
    Ok(())
}

impl std::fmt::Debug for AuditSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuditSigner {{ public_key: [Ed25519 VerifyingKey] }}")
    }
}

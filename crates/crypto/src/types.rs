//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Oeffentlicher RSA-Schluessel im PEM-Format (SPKI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKeyPem(String);

impl PublicKeyPem {
    pub fn new(pem: impl Into<String>) -> Self {
        Self(pem.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PublicKeyPem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Privater RSA-Schluessel im PEM-Format (PKCS#8)
///
/// Wird beim Drop genullt und nie ueber `Debug` ausgegeben.
#[derive(Clone)]
pub struct PrivateKeyPem(Zeroizing<String>);

impl PrivateKeyPem {
    pub fn new(pem: impl Into<String>) -> Self {
        Self(Zeroizing::new(pem.into()))
    }

    pub(crate) fn aus_zeroizing(pem: Zeroizing<String>) -> Self {
        Self(pem)
    }

    /// Zugriff auf das PEM (nur fuer Entschluesselung und lokale Ablage)
    pub fn as_pem(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for PrivateKeyPem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKeyPem([REDACTED] {} bytes)", self.0.len())
    }
}

/// Ein RSA-Schluessel-Paar (oeffentlich + privat)
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKeyPem,
    pub private_key: PrivateKeyPem,
}

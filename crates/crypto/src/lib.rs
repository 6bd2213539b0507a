//! # stillpost-crypto
//!
//! Client-seitige Ende-zu-Ende Verschluesselung fuer Stillpost.
//!
//! ## Module
//! - `codec` - RSA-OAEP Verschluesselung/Entschluesselung, Base64-Pruefung
//! - `key_store` - Verwahrung der privaten Schluessel (Speicher + lokale Datei)
//! - `storage` - Lokale, nicht synchronisierte Schluessel-Ablage
//! - `signing` - Ed25519-Schluessel fuer Audit-Signaturen
//! - `token` - Kurze Korrelations-Tokens fuer Nachrichten
//! - `types` - PEM-Typen und Schluessel-Paar
//! - `error` - Fehlertypen

pub mod codec;
pub mod error;
pub mod key_store;
pub mod signing;
pub mod storage;
pub mod token;
pub mod types;

// Bequeme Re-Exports
pub use codec::{generate_key_pair, ist_gueltiges_base64, CryptoCodec, RSA_BITS};
pub use error::{CryptoError, CryptoResult, EntschluesselungsFehler};
pub use key_store::KeyStore;
pub use signing::AuditSigner;
pub use storage::{FileKeyStorage, LocalKeyStorage, MemoryKeyStorage, SCHLUESSEL_BLOB_NAME};
pub use token::generate_token;
pub use types::{KeyPair, PrivateKeyPem, PublicKeyPem};

//! stillpost-messaging – Verschluesselter Nachrichtenversand
//!
//! Dieses Crate implementiert:
//! - MessageFlow: Senden (Sperre -> Schluessel -> Verschluesseln -> Speichern -> Audit)
//! - Posteingang: Abruf ohne automatische Entschluesselung
//! - Explizite Entschluesselung mit Ansichts-Cache im Speicher
//! - InboxAbo: Posteingang bei jeder Aenderung neu laden
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use stillpost_audit::{AuditKanal, AuditTrail};
//! use stillpost_crypto::{AuditSigner, CryptoCodec, KeyStore, MemoryKeyStorage};
//! use stillpost_db::SqliteDb;
//! use stillpost_messaging::MessageFlow;
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Arc::new(SqliteDb::in_memory().await.unwrap());
//!     let key_store = KeyStore::oeffnen(Arc::new(MemoryKeyStorage::new())).await;
//!     let audit = AuditKanal::starten(AuditTrail::neu(db.clone(), AuditSigner::generate()));
//!
//!     let flow = MessageFlow::neu(db.clone(), db.clone(), db.clone(), CryptoCodec::neu(key_store), audit);
//! }
//! ```

pub mod error;
pub mod flow;
pub mod inbox;
pub mod types;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use error::{MessagingError, MessagingResult};
pub use flow::MessageFlow;
pub use inbox::InboxAbo;
pub use types::{FlagDetails, Nachricht, SendePhase, VERSCHLUESSELT_PLATZHALTER};

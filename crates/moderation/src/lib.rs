//! stillpost-moderation – Meldungen und Moderator-Entscheidungen
//!
//! Dieses Crate implementiert:
//! - Melden einer Nachricht (idempotent, mit Best-Effort-Klartext-Snapshot)
//! - Verwerfen einer Meldung
//! - Einfrieren eines Tokens (gerichtete Nachrichtensperre)
//! - Moderations-Warteschlange
//!
//! Rollenpruefungen finden nicht hier statt, sondern beim Aufrufer.

pub mod error;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use error::{ModerationError, ModerationResult};
pub use workflow::{ModerationWorkflow, SNAPSHOT_PLATZHALTER, STANDARD_GRUND};

//! stillpost-audit – Signiertes Audit-Log
//!
//! Jede kryptografische und moderierende Aktion wird als signierter,
//! unveraenderlicher Eintrag festgehalten.
//!
//! - `ereignis`: Ereignistypen, Kategorien und Ereignis-Builder
//! - `kanonisch`: Kanonische Serialisierung fuer die Signatur
//! - `trail`: `AuditTrail` (Anhaengen, Verifizieren, Abfragen)
//! - `kanal`: `AuditKanal` als Seitenkanal fuer die Services

pub mod ereignis;
pub mod error;
pub mod kanal;
pub mod kanonisch;
pub mod trail;

pub use ereignis::{AuditEreignis, AuditEreignisTyp, AuditKategorie};
pub use error::{AuditError, AuditResult};
pub use kanal::AuditKanal;
pub use trail::{AuditTrail, Integritaet, IntegritaetsBericht};

//! stillpost-core – Gemeinsame Typen fuer alle Stillpost-Crates
//!
//! - `types`: E-Mail-Identitaet (normalisiert), Benutzer-ID, Rollen
//! - `session`: Schnittstelle zum Identitaets-/Session-Provider

pub mod session;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use session::{AuthCallback, LocalSessionProvider, Session, SessionProvider};
pub use types::{Email, Rolle, UserId};

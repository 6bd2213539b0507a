//! Gemeinsame Identifikationstypen fuer Stillpost
//!
//! Identitaeten werden ueber die E-Mail-Adresse gefuehrt. Alle Vergleiche
//! und Schluessel-Lookups laufen ueber die normalisierte Form (getrimmt,
//! kleingeschrieben), damit `Bob@X.com` und `bob@x.com` dieselbe Person sind.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Benutzer-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Erstellt eine neue zufaellige UserId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Normalisierte E-Mail-Adresse
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalisiert eine rohe Eingabe (trim + lowercase)
    pub fn neu(roh: &str) -> Self {
        Self(roh.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Email {
    fn from(roh: &str) -> Self {
        Self::neu(roh)
    }
}

/// Rolle eines Benutzers im Profil-Store
///
/// Die Rolle wird vom Aufrufer geprueft; die Moderations-Logik selbst
/// fuehrt keine Rollenpruefung durch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Rolle {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Rolle {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Moderator => "Moderator",
            Self::Admin => "Admin",
        }
    }

    /// Moderatoren und Admins duerfen Meldungen bearbeiten
    pub fn ist_moderator(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

impl std::fmt::Display for Rolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

impl std::str::FromStr for Rolle {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" | "user" => Ok(Self::User),
            "Moderator" | "moderator" => Ok(Self::Moderator),
            "Admin" | "admin" => Ok(Self::Admin),
            other => Err(format!("Unbekannte Rolle: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_eindeutig() {
        let a = UserId::new();
        let b = UserId::new();
        assert_ne!(a, b, "Zwei neue UserIds muessen verschieden sein");
    }

    #[test]
    fn email_wird_normalisiert() {
        assert_eq!(Email::neu("  Bob@Example.COM ").as_str(), "bob@example.com");
        assert_eq!(Email::neu("A@X.com"), Email::neu("a@x.com"));
    }

    #[test]
    fn leere_email() {
        assert!(Email::neu("   ").is_empty());
    }

    #[test]
    fn email_ist_serde_transparent() {
        let email = Email::neu("C@x.com");
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"c@x.com\"");
    }

    #[test]
    fn rollen_parsen_und_pruefen() {
        assert_eq!("Moderator".parse::<Rolle>().unwrap(), Rolle::Moderator);
        assert_eq!("admin".parse::<Rolle>().unwrap(), Rolle::Admin);
        assert!("Gast".parse::<Rolle>().is_err());
        assert!(Rolle::Admin.ist_moderator());
        assert!(Rolle::Moderator.ist_moderator());
        assert!(!Rolle::User.ist_moderator());
    }
}

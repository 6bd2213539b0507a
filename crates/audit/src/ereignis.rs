//! Audit-Ereignisse
//!
//! Ein `AuditEreignis` ist die noch unsignierte Beschreibung einer Aktion.
//! Zeitstempel und Signatur vergibt erst der `AuditTrail`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AuditError;

/// Ereignistypen des Audit-Logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEreignisTyp {
    Signup,
    Login,
    Logout,
    SendMessage,
    DecryptedMessage,
    FlagMessage,
    ViewedMessage,
}

impl AuditEreignisTyp {
    pub const ALLE: [AuditEreignisTyp; 7] = [
        Self::Signup,
        Self::Login,
        Self::Logout,
        Self::SendMessage,
        Self::DecryptedMessage,
        Self::FlagMessage,
        Self::ViewedMessage,
    ];

    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::SendMessage => "send_message",
            Self::DecryptedMessage => "decrypted_message",
            Self::FlagMessage => "flag_message",
            Self::ViewedMessage => "viewed_message",
        }
    }

    pub fn kategorie(&self) -> AuditKategorie {
        match self {
            Self::Signup | Self::Login | Self::Logout => AuditKategorie::Auth,
            Self::SendMessage | Self::DecryptedMessage | Self::ViewedMessage => {
                AuditKategorie::Message
            }
            Self::FlagMessage => AuditKategorie::Moderation,
        }
    }
}

impl std::fmt::Display for AuditEreignisTyp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

/// Abfrage-Kategorien
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKategorie {
    Auth,
    Message,
    Moderation,
    #[default]
    All,
}

impl AuditKategorie {
    /// Ereignistypen der Kategorie; leer bei `All` (kein Filter)
    pub fn ereignis_typen(&self) -> Vec<AuditEreignisTyp> {
        match self {
            Self::All => Vec::new(),
            kategorie => AuditEreignisTyp::ALLE
                .into_iter()
                .filter(|t| t.kategorie() == *kategorie)
                .collect(),
        }
    }
}

impl std::str::FromStr for AuditKategorie {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "message" => Ok(Self::Message),
            "moderation" => Ok(Self::Moderation),
            "all" | "" => Ok(Self::All),
            other => Err(AuditError::UnbekannteKategorie(other.to_string())),
        }
    }
}

/// Unsigniertes Audit-Ereignis
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEreignis {
    pub typ: AuditEreignisTyp,
    pub actor_id: Option<String>,
    pub token_id: Option<String>,
    pub recipient_ref: Option<String>,
    pub message_id: Option<String>,
    pub metadata: Map<String, Value>,
}

impl AuditEreignis {
    pub fn neu(typ: AuditEreignisTyp) -> Self {
        Self {
            typ,
            actor_id: None,
            token_id: None,
            recipient_ref: None,
            message_id: None,
            metadata: Map::new(),
        }
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn token(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    pub fn empfaenger(mut self, recipient_ref: impl Into<String>) -> Self {
        self.recipient_ref = Some(recipient_ref.into());
        self
    }

    pub fn nachricht(mut self, message_id: impl ToString) -> Self {
        self.message_id = Some(message_id.to_string());
        self
    }

    pub fn meta(mut self, schluessel: &str, wert: impl Into<Value>) -> Self {
        self.metadata.insert(schluessel.to_string(), wert.into());
        self
    }

    /// Metadaten-Feld lesen (Tests, Auswertung)
    pub fn meta_wert(&self, schluessel: &str) -> Option<&Value> {
        self.metadata.get(schluessel)
    }

    // -----------------------------------------------------------------------
    // Vorgefertigte Ereignisse
    // -----------------------------------------------------------------------

    pub fn signup(user_id: &str, email: &str) -> Self {
        Self::neu(AuditEreignisTyp::Signup)
            .actor(user_id)
            .empfaenger(email)
            .meta("action", "user_registered")
    }

    pub fn login(user_id: &str, email: &str) -> Self {
        Self::neu(AuditEreignisTyp::Login)
            .actor(user_id)
            .empfaenger(email)
            .meta("action", "user_authenticated")
    }

    pub fn logout(user_id: &str, email: &str) -> Self {
        Self::neu(AuditEreignisTyp::Logout)
            .actor(user_id)
            .empfaenger(email)
            .meta("action", "user_signed_out")
    }

    pub fn nachricht_gesendet(
        message_id: impl ToString,
        sender_id: &str,
        recipient_email: &str,
        token_id: &str,
    ) -> Self {
        Self::neu(AuditEreignisTyp::SendMessage)
            .nachricht(message_id)
            .actor(sender_id)
            .empfaenger(recipient_email)
            .token(token_id)
            .meta("action", "message_sent")
    }

    /// Moderator hat eine gemeldete Nachricht in der Warteschlange gesehen
    pub fn nachricht_angesehen(message_id: impl ToString, moderator: &str, token_id: &str) -> Self {
        Self::neu(AuditEreignisTyp::ViewedMessage)
            .nachricht(message_id)
            .actor(moderator)
            .token(token_id)
            .meta("action", "moderator_viewed_flagged_message")
            .meta("moderator_action", true)
    }

    pub fn nachricht_entschluesselt(
        message_id: impl ToString,
        user_id: &str,
        token_id: &str,
        moderator: bool,
    ) -> Self {
        let action = if moderator {
            "moderator_decryption"
        } else {
            "user_decryption"
        };
        Self::neu(AuditEreignisTyp::DecryptedMessage)
            .nachricht(message_id)
            .actor(user_id)
            .token(token_id)
            .meta("action", action)
            .meta("moderator_action", moderator)
    }

    pub fn nachricht_gemeldet(
        message_id: impl ToString,
        flagged_by: &str,
        reason: &str,
        token_id: &str,
    ) -> Self {
        Self::neu(AuditEreignisTyp::FlagMessage)
            .nachricht(message_id)
            .actor(flagged_by)
            .token(token_id)
            .meta("reason", reason)
            .meta("action", "message_flagged")
    }

    /// Moderator-Entscheidung zu einer Meldung (`dismissed` / `frozen`)
    pub fn moderator_entscheidung(moderator: &str, token_id: &str, entscheidung: &str) -> Self {
        let action = if entscheidung == "dismissed" {
            "moderator_dismissed_flagged_message"
        } else {
            "moderator_reviewed_flagged_message"
        };
        Self::neu(AuditEreignisTyp::FlagMessage)
            .actor(moderator)
            .token(token_id)
            .meta("action", action)
            .meta("moderator_action", true)
            .meta("decision", entscheidung)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kategorien_der_typen() {
        assert_eq!(
            AuditKategorie::Auth.ereignis_typen(),
            vec![
                AuditEreignisTyp::Signup,
                AuditEreignisTyp::Login,
                AuditEreignisTyp::Logout
            ]
        );
        assert_eq!(
            AuditKategorie::Message.ereignis_typen(),
            vec![
                AuditEreignisTyp::SendMessage,
                AuditEreignisTyp::DecryptedMessage,
                AuditEreignisTyp::ViewedMessage
            ]
        );
        assert_eq!(
            AuditKategorie::Moderation.ereignis_typen(),
            vec![AuditEreignisTyp::FlagMessage]
        );
        assert!(AuditKategorie::All.ereignis_typen().is_empty());
    }

    #[test]
    fn kategorie_parsen() {
        assert_eq!("Auth".parse::<AuditKategorie>().unwrap(), AuditKategorie::Auth);
        assert_eq!("all".parse::<AuditKategorie>().unwrap(), AuditKategorie::All);
        assert!("sonstiges".parse::<AuditKategorie>().is_err());
    }

    #[test]
    fn entschluesselung_markiert_moderator() {
        let e = AuditEreignis::nachricht_entschluesselt("m1", "u1", "T1", true);
        assert_eq!(e.meta_wert("action"), Some(&Value::from("moderator_decryption")));
        assert_eq!(e.meta_wert("moderator_action"), Some(&Value::Bool(true)));

        let e = AuditEreignis::nachricht_entschluesselt("m1", "u1", "T1", false);
        assert_eq!(e.meta_wert("action"), Some(&Value::from("user_decryption")));
    }

    #[test]
    fn entscheidung_verwerfen() {
        let e = AuditEreignis::moderator_entscheidung("mod", "T1", "dismissed");
        assert_eq!(e.typ, AuditEreignisTyp::FlagMessage);
        assert_eq!(e.meta_wert("decision"), Some(&Value::from("dismissed")));
        assert_eq!(
            e.meta_wert("action"),
            Some(&Value::from("moderator_dismissed_flagged_message"))
        );
    }

    #[test]
    fn warteschlange_ansehen_ist_moderator_aktion() {
        let e = AuditEreignis::nachricht_angesehen(7, "mod", "T1");
        assert_eq!(e.typ, AuditEreignisTyp::ViewedMessage);
        assert_eq!(e.typ.kategorie(), AuditKategorie::Message);
        assert_eq!(
            e.meta_wert("action"),
            Some(&Value::from("moderator_viewed_flagged_message"))
        );
        assert_eq!(e.meta_wert("moderator_action"), Some(&Value::Bool(true)));
    }

    #[test]
    fn typ_textform() {
        assert_eq!(AuditEreignisTyp::SendMessage.to_string(), "send_message");
        assert_eq!(
            serde_json::to_string(&AuditEreignisTyp::DecryptedMessage).unwrap(),
            "\"decrypted_message\""
        );
    }
}

//! Datenbankmodelle fuer Stillpost
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Domain-Typen getrennt und dienen als reine Datenuebertragungsobjekte.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use stillpost_core::Rolle;
use uuid::Uuid;

/// Kanonische Textform eines Zeitstempels (RFC 3339, Mikrosekunden, `Z`)
///
/// Lexikografisch sortierbar; wird fuer Speicherung und Audit-Signaturen
/// gleichermassen verwendet.
pub fn zeitstempel_text(zeit: &DateTime<Utc>) -> String {
    zeit.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Aktuelle Zeit, auf Mikrosekunden gekuerzt (entspricht der Speicherform)
pub fn jetzt() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Profil-Datensatz (oeffentlicher Schluessel + Rolle)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilRecord {
    pub user_id: Uuid,
    pub email: String,
    pub public_key: Option<String>,
    pub rolle: Rolle,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Nachrichten
// ---------------------------------------------------------------------------

/// Prioritaet einer gemeldeten Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prioritaet {
    High,
    Medium,
    Low,
}

impl Prioritaet {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Nachrichten-Datensatz
///
/// `content` ist bei verschluesselten Nachrichten der Base64-Ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NachrichtRecord {
    pub id: Uuid,
    pub token_id: String,
    pub content: String,
    pub is_encrypted: bool,
    pub timestamp: DateTime<Utc>,
    pub is_flagged: bool,
    pub priority: Option<Prioritaet>,
    pub sender_email: Option<String>,
    pub recipient_email: Option<String>,
}

/// Daten zum Anlegen einer Nachricht
#[derive(Debug, Clone)]
pub struct NeueNachricht<'a> {
    pub token_id: &'a str,
    pub content: &'a str,
    pub is_encrypted: bool,
    pub sender_email: &'a str,
    pub recipient_email: &'a str,
}

/// Aenderungs-Ereignis aus dem Nachrichten-Store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NachrichtenAenderung {
    Eingefuegt {
        id: Uuid,
        recipient_email: Option<String>,
    },
    Aktualisiert {
        id: Uuid,
        recipient_email: Option<String>,
    },
}

impl NachrichtenAenderung {
    pub fn nachricht_id(&self) -> Uuid {
        match self {
            Self::Eingefuegt { id, .. } | Self::Aktualisiert { id, .. } => *id,
        }
    }

    pub fn empfaenger(&self) -> Option<&str> {
        match self {
            Self::Eingefuegt { recipient_email, .. }
            | Self::Aktualisiert { recipient_email, .. } => recipient_email.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Meldungen (Flags)
// ---------------------------------------------------------------------------

/// Status einer Meldung: pending -> {reviewed, dismissed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStatus {
    Pending,
    Reviewed,
    Dismissed,
}

impl FlagStatus {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "reviewed" => Some(Self::Reviewed),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }

    /// Reviewed und Dismissed sind Endzustaende
    pub fn ist_abgeschlossen(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

/// Meldungs-Datensatz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagRecord {
    pub id: Uuid,
    pub message_id: Uuid,
    pub token_id: String,
    pub flagged_by: Option<String>,
    pub reason: String,
    pub status: FlagStatus,
    /// Best-Effort-Klartext zum Zeitpunkt der Meldung
    pub decrypted_content: Option<String>,
    pub flagged_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

/// Daten zum Anlegen einer Meldung
#[derive(Debug, Clone)]
pub struct NeuerFlag<'a> {
    pub message_id: Uuid,
    pub token_id: &'a str,
    pub flagged_by: Option<&'a str>,
    pub reason: &'a str,
    pub decrypted_content: Option<&'a str>,
}

/// Abschluss einer offenen Meldung
#[derive(Debug, Clone)]
pub struct FlagAbschluss<'a> {
    pub status: FlagStatus,
    pub reviewed_by: &'a str,
    pub notes: &'a str,
}

// ---------------------------------------------------------------------------
// Nachrichtensperren
// ---------------------------------------------------------------------------

/// Gerichtete Sperre sender -> recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SperreRecord {
    pub id: Uuid,
    pub sender_email: String,
    pub recipient_email: String,
    pub reason: String,
    pub restricted_by: String,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Anlegen einer Sperre
#[derive(Debug, Clone)]
pub struct NeueSperre<'a> {
    pub sender_email: &'a str,
    pub recipient_email: &'a str,
    pub reason: &'a str,
    pub restricted_by: &'a str,
}

// ---------------------------------------------------------------------------
// Audit-Log
// ---------------------------------------------------------------------------

/// Audit-Log-Eintrag (append-only, signiert)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogRecord {
    pub id: Uuid,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub actor_id: Option<String>,
    pub token_id: Option<String>,
    pub recipient_ref: Option<String>,
    pub message_id: Option<String>,
    pub metadata: serde_json::Value,
    pub signature: String,
}

/// Filter fuer Audit-Log-Abfragen
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    /// Leer = alle Ereignistypen
    pub event_types: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Nur Eintraege mit `metadata.moderator_action = true`
    pub nur_moderator_aktionen: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zeitstempel_mit_mikrosekunden() {
        let zeit = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(zeitstempel_text(&zeit), "2024-03-01T12:00:05.123456Z");
    }

    #[test]
    fn flag_status_endzustaende() {
        assert!(!FlagStatus::Pending.ist_abgeschlossen());
        assert!(FlagStatus::Reviewed.ist_abgeschlossen());
        assert!(FlagStatus::Dismissed.ist_abgeschlossen());
        assert_eq!(FlagStatus::parse("dismissed"), Some(FlagStatus::Dismissed));
        assert_eq!(FlagStatus::parse("offen"), None);
    }

    #[test]
    fn prioritaet_textform() {
        for p in [Prioritaet::High, Prioritaet::Medium, Prioritaet::Low] {
            assert_eq!(Prioritaet::parse(p.als_str()), Some(p));
        }
    }
}

//! Oeffentliche Typen fuer den Nachrichtenversand

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stillpost_db::models::{FlagRecord, FlagStatus, NachrichtRecord, Prioritaet};

/// Inhalt, den der Absender nach dem Senden sieht
pub const VERSCHLUESSELT_PLATZHALTER: &str = "Encrypted Message";

/// Phasen eines Sendevorgangs (fuer Logging)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendePhase {
    Composing,
    RestrictionChecked,
    KeyResolved,
    Encrypted,
    Persisted,
    Audited,
}

/// Eine Nachricht (Domain-Typ, nicht DB-Record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nachricht {
    pub id: Uuid,
    pub token_id: String,
    pub content: String,
    pub is_encrypted: bool,
    pub timestamp: DateTime<Utc>,
    pub is_flagged: bool,
    pub priority: Option<Prioritaet>,
    pub sender_email: Option<String>,
    pub recipient_email: Option<String>,
    pub flag_details: Option<FlagDetails>,
}

/// Meldungsdetails fuer die Moderationsansicht
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagDetails {
    pub id: Uuid,
    pub status: FlagStatus,
    pub reason: String,
    pub flagged_at: DateTime<Utc>,
    pub flagged_by: Option<String>,
    pub decrypted_content: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

impl From<FlagRecord> for FlagDetails {
    fn from(flag: FlagRecord) -> Self {
        Self {
            id: flag.id,
            status: flag.status,
            reason: flag.reason,
            flagged_at: flag.flagged_at,
            flagged_by: flag.flagged_by,
            decrypted_content: flag.decrypted_content,
            reviewed_at: flag.reviewed_at,
            reviewed_by: flag.reviewed_by,
            notes: flag.notes,
        }
    }
}

impl Nachricht {
    pub fn aus_record(record: NachrichtRecord, flag: Option<FlagRecord>) -> Self {
        Self {
            id: record.id,
            token_id: record.token_id,
            content: record.content,
            is_encrypted: record.is_encrypted,
            timestamp: record.timestamp,
            is_flagged: record.is_flagged,
            priority: record.priority,
            sender_email: record.sender_email,
            recipient_email: record.recipient_email,
            flag_details: flag.map(FlagDetails::from),
        }
    }
}

//! Kanonische Serialisierung von Audit-Eintraegen
//!
//! Die Signatur wird ueber ein JSON-Array berechnet:
//!
//! ```text
//! [timestamp, event_type, actor_id, token_id, recipient_ref, message_id, metadata]
//! ```
//!
//! Fehlende Felder sind `null`, Objekt-Schluessel werden auf allen Ebenen
//! sortiert. Die Darstellung haengt damit nicht von der Einfuegereihenfolge
//! der Metadaten ab.

use serde_json::Value;
use stillpost_db::models::{zeitstempel_text, AuditLogRecord};

/// Kanonische Bytes eines Eintrags (ohne `id` und `signature`)
pub fn kanonische_form(eintrag: &AuditLogRecord) -> String {
    let felder = [
        Value::String(zeitstempel_text(&eintrag.timestamp)),
        Value::String(eintrag.event_type.clone()),
        optional(&eintrag.actor_id),
        optional(&eintrag.token_id),
        optional(&eintrag.recipient_ref),
        optional(&eintrag.message_id),
    ];

    let mut aus = String::from("[");
    for feld in &felder {
        schreiben(feld, &mut aus);
        aus.push(',');
    }
    schreiben(&eintrag.metadata, &mut aus);
    aus.push(']');
    aus
}

fn optional(wert: &Option<String>) -> Value {
    wert.as_ref()
        .map(|s| Value::String(s.clone()))
        .unwrap_or(Value::Null)
}

/// JSON mit sortierten Objekt-Schluesseln und ohne Leerraum
pub fn schreiben(wert: &Value, aus: &mut String) {
    match wert {
        Value::Object(map) => {
            let mut schluessel: Vec<&String> = map.keys().collect();
            schluessel.sort();
            aus.push('{');
            for (i, k) in schluessel.into_iter().enumerate() {
                if i > 0 {
                    aus.push(',');
                }
                aus.push_str(&Value::String(k.clone()).to_string());
                aus.push(':');
                if let Some(v) = map.get(k) {
                    schreiben(v, aus);
                }
            }
            aus.push('}');
        }
        Value::Array(liste) => {
            aus.push('[');
            for (i, v) in liste.iter().enumerate() {
                if i > 0 {
                    aus.push(',');
                }
                schreiben(v, aus);
            }
            aus.push(']');
        }
        skalar => aus.push_str(&skalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn eintrag(metadata: Value) -> AuditLogRecord {
        AuditLogRecord {
            id: Uuid::nil(),
            event_type: "send_message".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            actor_id: Some("u1".into()),
            token_id: Some("ABC123-XYZ".into()),
            recipient_ref: None,
            message_id: None,
            metadata,
            signature: String::new(),
        }
    }

    #[test]
    fn form_ist_stabil() {
        let form = kanonische_form(&eintrag(serde_json::json!({"b": 1, "a": {"d": true, "c": null}})));
        assert_eq!(
            form,
            r#"["2024-05-01T08:30:00.000000Z","send_message","u1","ABC123-XYZ",null,null,{"a":{"c":null,"d":true},"b":1}]"#
        );
    }

    #[test]
    fn schluesselreihenfolge_egal() {
        let mut a = serde_json::Map::new();
        a.insert("zeta".into(), Value::from(1));
        a.insert("alpha".into(), Value::from(2));
        let mut b = serde_json::Map::new();
        b.insert("alpha".into(), Value::from(2));
        b.insert("zeta".into(), Value::from(1));

        assert_eq!(
            kanonische_form(&eintrag(Value::Object(a))),
            kanonische_form(&eintrag(Value::Object(b)))
        );
    }

    #[test]
    fn sonderzeichen_werden_escaped() {
        let mut aus = String::new();
        schreiben(&serde_json::json!({"x\"y": "a\nb"}), &mut aus);
        assert_eq!(aus, r#"{"x\"y":"a\nb"}"#);
    }
}

//! Integration-Tests fuer AuditLogRepository (In-Memory SQLite)

use chrono::{Duration, Utc};
use stillpost_db::{
    models::{jetzt, AuditLogFilter, AuditLogRecord},
    AuditLogRepository, SqliteDb,
};
use uuid::Uuid;

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

fn eintrag(event_type: &str, metadata: serde_json::Value) -> AuditLogRecord {
    AuditLogRecord {
        id: Uuid::new_v4(),
        event_type: event_type.to_string(),
        timestamp: jetzt(),
        actor_id: Some("user-1".into()),
        token_id: Some("ABC123-XYZ".into()),
        recipient_ref: None,
        message_id: None,
        metadata,
        signature: "c2lnbmF0dXI=".into(),
    }
}

#[tokio::test]
async fn eintrag_anhaengen_und_laden() {
    let db = db().await;
    let e = eintrag("send_message", serde_json::json!({"action": "message_sent"}));

    db.append(&e).await.unwrap();
    let geladen = db.get(e.id).await.unwrap().unwrap();
    assert_eq!(geladen, e);
}

#[tokio::test]
async fn unbekannter_ereignistyp_abgelehnt() {
    let db = db().await;
    let result = db.append(&eintrag("erfunden", serde_json::json!({}))).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn update_und_delete_werden_abgewiesen() {
    let db = db().await;
    let e = eintrag("login", serde_json::json!({}));
    db.append(&e).await.unwrap();

    let update = sqlx::query("UPDATE audit_log SET signature = 'x' WHERE id = ?")
        .bind(e.id.to_string())
        .execute(db.pool())
        .await;
    assert!(update.unwrap_err().to_string().contains("append-only"));

    let delete = sqlx::query("DELETE FROM audit_log WHERE id = ?")
        .bind(e.id.to_string())
        .execute(db.pool())
        .await;
    assert!(delete.is_err());

    assert_eq!(db.get(e.id).await.unwrap().unwrap().signature, e.signature);
}

#[tokio::test]
async fn nach_typ_filtern() {
    let db = db().await;
    for typ in ["login", "logout", "send_message", "flag_message", "login"] {
        db.append(&eintrag(typ, serde_json::json!({}))).await.unwrap();
    }

    let auth = AuditLogFilter {
        event_types: vec!["signup".into(), "login".into(), "logout".into()],
        ..Default::default()
    };
    assert_eq!(db.count(auth.clone()).await.unwrap(), 3);
    assert!(db
        .list(auth)
        .await
        .unwrap()
        .iter()
        .all(|e| e.event_type != "send_message"));

    assert_eq!(db.count(AuditLogFilter::default()).await.unwrap(), 5);
}

#[tokio::test]
async fn auflisten_mit_limit_neueste_zuerst() {
    let db = db().await;
    let mut ids = Vec::new();
    for i in 0..5 {
        let e = eintrag("viewed_message", serde_json::json!({"index": i}));
        ids.push(e.id);
        db.append(&e).await.unwrap();
    }

    let liste = db
        .list(AuditLogFilter {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(liste.len(), 2);
    assert_eq!(liste[0].id, ids[4]);

    let rest = db
        .list(AuditLogFilter {
            offset: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rest.len(), 2);
}

#[tokio::test]
async fn moderator_aktionen_zaehlen() {
    let db = db().await;
    db.append(&eintrag("decrypted_message", serde_json::json!({"moderator_action": true})))
        .await
        .unwrap();
    db.append(&eintrag("decrypted_message", serde_json::json!({"moderator_action": false})))
        .await
        .unwrap();
    db.append(&eintrag("send_message", serde_json::json!({})))
        .await
        .unwrap();

    let filter = AuditLogFilter {
        nur_moderator_aktionen: true,
        since: Some(Utc::now() - Duration::hours(1)),
        ..Default::default()
    };
    assert_eq!(db.count(filter).await.unwrap(), 1);

    let zukunft = AuditLogFilter {
        nur_moderator_aktionen: true,
        since: Some(Utc::now() + Duration::hours(1)),
        ..Default::default()
    };
    assert_eq!(db.count(zukunft).await.unwrap(), 0);
}

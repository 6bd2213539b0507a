//! Integration-Tests fuer ProfileRepository (In-Memory SQLite)

use stillpost_core::Rolle;
use stillpost_db::{ProfileRepository, SqliteDb};
use uuid::Uuid;

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

#[tokio::test]
async fn schluessel_speichern_und_laden() {
    let db = db().await;
    let user_id = Uuid::new_v4();

    db.store_public_key(user_id, "a@x.com", "-----BEGIN PUBLIC KEY-----a")
        .await
        .unwrap();

    let key = db.get_public_key("a@x.com").await.unwrap();
    assert_eq!(key.as_deref(), Some("-----BEGIN PUBLIC KEY-----a"));

    let profil = db.get_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(profil.user_id, user_id);
    assert_eq!(profil.rolle, Rolle::User);
}

#[tokio::test]
async fn schluessel_ersetzen() {
    let db = db().await;
    let user_id = Uuid::new_v4();

    db.store_public_key(user_id, "a@x.com", "alt").await.unwrap();
    db.store_public_key(user_id, "a@x.com", "neu").await.unwrap();

    assert_eq!(db.get_public_key("a@x.com").await.unwrap().as_deref(), Some("neu"));
}

#[tokio::test]
async fn unbekannte_adresse_ohne_schluessel() {
    let db = db().await;
    assert!(db.get_public_key("niemand@x.com").await.unwrap().is_none());
    assert!(db.get_by_email("niemand@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn leerer_schluessel_zaehlt_als_fehlend() {
    let db = db().await;
    db.store_public_key(Uuid::new_v4(), "leer@x.com", "  ").await.unwrap();
    assert!(db.get_public_key("leer@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn email_doppelt_vergeben() {
    let db = db().await;
    db.store_public_key(Uuid::new_v4(), "a@x.com", "k1").await.unwrap();
    let err = db
        .store_public_key(Uuid::new_v4(), "a@x.com", "k2")
        .await
        .unwrap_err();
    assert!(err.ist_eindeutigkeit());
}

#[tokio::test]
async fn rolle_setzen() {
    let db = db().await;
    db.store_public_key(Uuid::new_v4(), "mod@x.com", "k").await.unwrap();

    assert!(db.set_role("mod@x.com", Rolle::Moderator).await.unwrap());
    let profil = db.get_by_email("mod@x.com").await.unwrap().unwrap();
    assert_eq!(profil.rolle, Rolle::Moderator);

    assert!(!db.set_role("niemand@x.com", Rolle::Admin).await.unwrap());
}

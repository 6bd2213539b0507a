//! AuditTrail – signiertes, append-only Ereignisprotokoll
//!
//! `append` wirft nie: Fehler werden protokolliert und ergeben `None`.
//! Jeder Eintrag traegt eine deterministische Ed25519-Signatur ueber seine
//! kanonische Form; `verify` berechnet sie neu und vergleicht.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stillpost_crypto::AuditSigner;
use stillpost_db::models::{jetzt, AuditLogFilter, AuditLogRecord};
use stillpost_db::AuditLogRepository;
use uuid::Uuid;

use crate::ereignis::{AuditEreignis, AuditKategorie};
use crate::error::AuditResult;
use crate::kanonisch::kanonische_form;

/// Ergebnis einer Integritaetspruefung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integritaet {
    Gueltig,
    Manipuliert,
    NichtGefunden,
}

/// Bericht zu einem geprueften Eintrag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegritaetsBericht {
    pub log_id: Uuid,
    pub status: Integritaet,
    pub gespeicherte_signatur: Option<String>,
    pub berechnete_signatur: Option<String>,
    pub geprueft_am: DateTime<Utc>,
}

impl IntegritaetsBericht {
    pub fn ist_gueltig(&self) -> bool {
        self.status == Integritaet::Gueltig
    }
}

pub struct AuditTrail {
    repo: Arc<dyn AuditLogRepository>,
    signer: AuditSigner,
}

impl AuditTrail {
    pub fn neu(repo: Arc<dyn AuditLogRepository>, signer: AuditSigner) -> Arc<Self> {
        Arc::new(Self { repo, signer })
    }

    /// Signiert und speichert ein Ereignis
    ///
    /// Gibt die ID des neuen Eintrags zurueck, `None` bei Fehlern.
    pub async fn append(&self, ereignis: AuditEreignis) -> Option<Uuid> {
        let typ = ereignis.typ;
        let mut eintrag = AuditLogRecord {
            id: Uuid::new_v4(),
            event_type: typ.als_str().to_string(),
            timestamp: jetzt(),
            actor_id: ereignis.actor_id,
            token_id: ereignis.token_id,
            recipient_ref: ereignis.recipient_ref,
            message_id: ereignis.message_id,
            metadata: Value::Object(ereignis.metadata),
            signature: String::new(),
        };
        eintrag.signature = self.signatur_berechnen(&eintrag);

        match self.repo.append(&eintrag).await {
            Ok(()) => {
                tracing::debug!(log_id = %eintrag.id, event_type = %typ, "Audit-Eintrag geschrieben");
                Some(eintrag.id)
            }
            Err(e) => {
                tracing::error!(fehler = %e, event_type = %typ, "Audit-Eintrag konnte nicht geschrieben werden");
                None
            }
        }
    }

    /// Prueft die Signatur eines gespeicherten Eintrags
    pub async fn verify(&self, log_id: Uuid) -> AuditResult<IntegritaetsBericht> {
        let geprueft_am = Utc::now();
        let Some(eintrag) = self.repo.get(log_id).await? else {
            return Ok(IntegritaetsBericht {
                log_id,
                status: Integritaet::NichtGefunden,
                gespeicherte_signatur: None,
                berechnete_signatur: None,
                geprueft_am,
            });
        };

        let berechnet = self.signatur_berechnen(&eintrag);
        let status = if berechnet == eintrag.signature
            && self
                .signer
                .verify(kanonische_form(&eintrag).as_bytes(), &eintrag.signature)
        {
            Integritaet::Gueltig
        } else {
            tracing::warn!(log_id = %log_id, "Audit-Eintrag mit ungueltiger Signatur");
            Integritaet::Manipuliert
        };

        Ok(IntegritaetsBericht {
            log_id,
            status,
            gespeicherte_signatur: Some(eintrag.signature),
            berechnete_signatur: Some(berechnet),
            geprueft_am,
        })
    }

    /// Neueste Eintraege einer Kategorie
    pub async fn logs(
        &self,
        kategorie: AuditKategorie,
        limit: i64,
    ) -> AuditResult<Vec<AuditLogRecord>> {
        let filter = AuditLogFilter {
            event_types: kategorie
                .ereignis_typen()
                .iter()
                .map(|t| t.als_str().to_string())
                .collect(),
            limit: Some(limit.max(0)),
            ..Default::default()
        };
        Ok(self.repo.list(filter).await?)
    }

    /// Anzahl der Moderator-Aktionen seit `seit`
    pub async fn moderator_aktionen_seit(&self, seit: DateTime<Utc>) -> AuditResult<i64> {
        let filter = AuditLogFilter {
            since: Some(seit),
            nur_moderator_aktionen: true,
            ..Default::default()
        };
        Ok(self.repo.count(filter).await?)
    }

    /// Oeffentlicher Schluessel des Signierers (fuer externe Pruefung)
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signer.public_key_bytes()
    }

    fn signatur_berechnen(&self, eintrag: &AuditLogRecord) -> String {
        self.signer.sign(kanonische_form(eintrag).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use stillpost_db::{DbError, DbResult, SqliteDb};

    use crate::ereignis::AuditEreignisTyp;

    async fn trail() -> Arc<AuditTrail> {
        let db = SqliteDb::in_memory().await.unwrap();
        AuditTrail::neu(Arc::new(db), AuditSigner::generate())
    }

    /// Speicher im RAM, der Eintraege nachtraeglich manipulieren kann
    #[derive(Default)]
    struct ManipulierbaresLog {
        eintraege: Mutex<Vec<AuditLogRecord>>,
    }

    #[async_trait]
    impl AuditLogRepository for ManipulierbaresLog {
        async fn append(&self, eintrag: &AuditLogRecord) -> DbResult<()> {
            self.eintraege.lock().push(eintrag.clone());
            Ok(())
        }

        async fn get(&self, id: Uuid) -> DbResult<Option<AuditLogRecord>> {
            Ok(self.eintraege.lock().iter().find(|e| e.id == id).cloned())
        }

        async fn list(&self, _filter: AuditLogFilter) -> DbResult<Vec<AuditLogRecord>> {
            Ok(self.eintraege.lock().clone())
        }

        async fn count(&self, _filter: AuditLogFilter) -> DbResult<i64> {
            Ok(self.eintraege.lock().len() as i64)
        }
    }

    struct KaputtesLog;

    #[async_trait]
    impl AuditLogRepository for KaputtesLog {
        async fn append(&self, _: &AuditLogRecord) -> DbResult<()> {
            Err(DbError::intern("Platte voll"))
        }

        async fn get(&self, _: Uuid) -> DbResult<Option<AuditLogRecord>> {
            Err(DbError::intern("Platte voll"))
        }

        async fn list(&self, _: AuditLogFilter) -> DbResult<Vec<AuditLogRecord>> {
            Ok(Vec::new())
        }

        async fn count(&self, _: AuditLogFilter) -> DbResult<i64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn eintrag_ist_gueltig() {
        let trail = trail().await;
        let id = trail
            .append(AuditEreignis::nachricht_gesendet("m1", "u1", "b@x.com", "T1"))
            .await
            .unwrap();

        let bericht = trail.verify(id).await.unwrap();
        assert!(bericht.ist_gueltig());
        assert_eq!(bericht.gespeicherte_signatur, bericht.berechnete_signatur);
    }

    #[tokio::test]
    async fn unbekannter_eintrag() {
        let trail = trail().await;
        let bericht = trail.verify(Uuid::new_v4()).await.unwrap();
        assert_eq!(bericht.status, Integritaet::NichtGefunden);
    }

    #[tokio::test]
    async fn manipulation_wird_erkannt() {
        let log = Arc::new(ManipulierbaresLog::default());
        let trail = AuditTrail::neu(log.clone(), AuditSigner::generate());

        let id = trail
            .append(AuditEreignis::nachricht_gemeldet("m1", "u1", "Spam", "T1"))
            .await
            .unwrap();
        assert!(trail.verify(id).await.unwrap().ist_gueltig());

        log.eintraege.lock()[0].metadata["reason"] = Value::from("harmlos");
        assert_eq!(trail.verify(id).await.unwrap().status, Integritaet::Manipuliert);
    }

    #[tokio::test]
    async fn fremde_signatur_ist_manipuliert() {
        let log = Arc::new(ManipulierbaresLog::default());
        let echt = AuditTrail::neu(log.clone(), AuditSigner::generate());
        let fremd = AuditTrail::neu(log.clone(), AuditSigner::generate());

        let id = fremd
            .append(AuditEreignis::neu(AuditEreignisTyp::Login))
            .await
            .unwrap();
        assert_eq!(echt.verify(id).await.unwrap().status, Integritaet::Manipuliert);
    }

    #[tokio::test]
    async fn fehler_beim_anhaengen_ergibt_none() {
        let trail = AuditTrail::neu(Arc::new(KaputtesLog), AuditSigner::generate());
        assert!(trail.append(AuditEreignis::neu(AuditEreignisTyp::Logout)).await.is_none());
        assert!(trail.verify(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn logs_nach_kategorie() {
        let trail = trail().await;
        trail.append(AuditEreignis::login("u1", "a@x.com")).await.unwrap();
        trail
            .append(AuditEreignis::nachricht_gesendet("m1", "u1", "b@x.com", "T1"))
            .await
            .unwrap();
        trail
            .append(AuditEreignis::nachricht_gemeldet("m1", "u2", "Spam", "T1"))
            .await
            .unwrap();

        let auth = trail.logs(AuditKategorie::Auth, 50).await.unwrap();
        assert_eq!(auth.len(), 1);
        assert_eq!(auth[0].event_type, "login");

        let alle = trail.logs(AuditKategorie::All, 50).await.unwrap();
        assert_eq!(alle.len(), 3);
        assert_eq!(alle[0].event_type, "flag_message");

        assert_eq!(trail.logs(AuditKategorie::All, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn moderator_aktionen_zaehlen() {
        let trail = trail().await;
        let vorher = Utc::now() - chrono::Duration::minutes(1);

        trail
            .append(AuditEreignis::moderator_entscheidung("mod", "T1", "frozen"))
            .await
            .unwrap();
        trail
            .append(AuditEreignis::nachricht_entschluesselt("m1", "u1", "T1", false))
            .await
            .unwrap();

        assert_eq!(trail.moderator_aktionen_seit(vorher).await.unwrap(), 1);
    }
}

//! MessageFlow – Nachrichten verschluesselt senden und abrufen
//!
//! Ablauf beim Senden:
//! `Composing -> RestrictionChecked -> KeyResolved -> Encrypted -> Persisted -> Audited`
//!
//! Ein Fehler vor `Persisted` bricht ohne Teil-Speicherung ab. Das Audit
//! laeuft ueber den `AuditKanal` und kann das Senden nicht scheitern lassen.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use stillpost_audit::{AuditEreignis, AuditKanal};
use stillpost_core::Email;
use stillpost_crypto::CryptoCodec;
use stillpost_db::{
    models::NeueNachricht, MessageRepository, ProfileRepository, RestrictionRepository,
};

use crate::{
    error::{MessagingError, MessagingResult},
    inbox::InboxAbo,
    types::{Nachricht, SendePhase, VERSCHLUESSELT_PLATZHALTER},
};

/// Versand und Abruf verschluesselter Nachrichten
pub struct MessageFlow {
    messages: Arc<dyn MessageRepository>,
    profiles: Arc<dyn ProfileRepository>,
    restrictions: Arc<dyn RestrictionRepository>,
    codec: CryptoCodec,
    audit: AuditKanal,
    /// Entschluesselte Ansichten pro Nachricht; nie persistiert
    ansicht_cache: DashMap<Uuid, String>,
}

impl MessageFlow {
    /// Erstellt einen neuen MessageFlow
    pub fn neu(
        messages: Arc<dyn MessageRepository>,
        profiles: Arc<dyn ProfileRepository>,
        restrictions: Arc<dyn RestrictionRepository>,
        codec: CryptoCodec,
        audit: AuditKanal,
    ) -> Arc<Self> {
        Arc::new(Self {
            messages,
            profiles,
            restrictions,
            codec,
            audit,
            ansicht_cache: DashMap::new(),
        })
    }

    /// Verschluesselt und speichert eine Nachricht an `recipient_email`
    ///
    /// Der Absender sieht danach nur den Platzhalter `"Encrypted Message"`.
    pub async fn send(
        &self,
        plaintext: &str,
        recipient_email: &str,
        sender_email: &str,
    ) -> MessagingResult<Nachricht> {
        if plaintext.trim().is_empty() {
            return Err(MessagingError::UngueltigeEingabe(
                "Nachrichteninhalt darf nicht leer sein".into(),
            ));
        }
        let empfaenger = Email::neu(recipient_email);
        let absender = Email::neu(sender_email);
        if empfaenger.is_empty() {
            return Err(MessagingError::UngueltigeEingabe("Empfaenger fehlt".into()));
        }
        if absender.is_empty() {
            return Err(MessagingError::UngueltigeEingabe("Absender fehlt".into()));
        }
        phase(SendePhase::Composing);

        if self
            .restrictions
            .is_restricted(absender.as_str(), empfaenger.as_str())
            .await?
        {
            tracing::info!("Senden blockiert: Nachrichtensperre aktiv");
            return Err(MessagingError::NachrichtenSperre);
        }
        phase(SendePhase::RestrictionChecked);

        let public_key = self
            .profiles
            .get_public_key(empfaenger.as_str())
            .await?
            .ok_or(MessagingError::EmpfaengerSchluesselFehlt)?;
        phase(SendePhase::KeyResolved);

        let ciphertext = self.codec.encrypt(plaintext, &public_key)?;
        phase(SendePhase::Encrypted);

        let token_id = self.codec.generate_token();
        let record = self
            .messages
            .insert(NeueNachricht {
                token_id: &token_id,
                content: &ciphertext,
                is_encrypted: true,
                sender_email: absender.as_str(),
                recipient_email: empfaenger.as_str(),
            })
            .await?;
        phase(SendePhase::Persisted);
        tracing::info!(message_id = %record.id, token_id = %token_id, "Nachricht verschluesselt gespeichert");

        self.audit.melden(AuditEreignis::nachricht_gesendet(
            record.id,
            absender.as_str(),
            empfaenger.as_str(),
            &token_id,
        ));
        phase(SendePhase::Audited);

        let mut nachricht = Nachricht::aus_record(record, None);
        nachricht.content = VERSCHLUESSELT_PLATZHALTER.to_string();
        Ok(nachricht)
    }

    /// Posteingang von `viewer_email`, neueste zuerst
    ///
    /// Inhalte bleiben verschluesselt, ausser sie wurden in dieser Sitzung
    /// explizit entschluesselt.
    pub async fn retrieve(&self, viewer_email: &str) -> MessagingResult<Vec<Nachricht>> {
        let viewer = Email::neu(viewer_email);
        if viewer.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.messages.query_by_recipient(viewer.as_str()).await?;
        tracing::debug!(anzahl = records.len(), "Posteingang geladen");

        Ok(records
            .into_iter()
            .map(|r| {
                let mut nachricht = Nachricht::aus_record(r, None);
                if let Some(klartext) = self.ansicht_cache.get(&nachricht.id) {
                    nachricht.content = klartext.value().clone();
                    nachricht.is_encrypted = false;
                }
                nachricht
            })
            .collect())
    }

    /// Entschluesselt eine Nachricht auf Anforderung des Empfaengers
    ///
    /// Der Klartext landet nur im Ansichts-Cache dieser Sitzung.
    pub async fn decrypt_message(
        &self,
        message_id: Uuid,
        viewer_email: &str,
        viewer_is_moderator: bool,
    ) -> MessagingResult<Nachricht> {
        let viewer = Email::neu(viewer_email);
        let record = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or(MessagingError::NachrichtNichtGefunden(message_id))?;

        if record.recipient_email.as_deref() != Some(viewer.as_str()) {
            return Err(MessagingError::KeineBerechtigung(
                "Nur der Empfaenger kann die Nachricht entschluesseln".into(),
            ));
        }

        let mut nachricht = Nachricht::aus_record(record, None);
        if !nachricht.is_encrypted {
            return Ok(nachricht);
        }

        let ereignis = AuditEreignis::nachricht_entschluesselt(
            message_id,
            viewer.as_str(),
            &nachricht.token_id,
            viewer_is_moderator,
        );

        match self.codec.decrypt(&nachricht.content, viewer.as_str()).await {
            Ok(klartext) => {
                self.ansicht_cache.insert(message_id, klartext.clone());
                self.audit.melden(ereignis.meta("outcome", "success"));
                tracing::debug!(message_id = %message_id, "Nachricht entschluesselt");

                nachricht.content = klartext;
                nachricht.is_encrypted = false;
                Ok(nachricht)
            }
            Err(fehler) => {
                self.audit.melden(
                    ereignis
                        .meta("outcome", "failed")
                        .meta("error", fehler.to_string()),
                );
                tracing::warn!(message_id = %message_id, fehler = ?fehler, "Entschluesselung fehlgeschlagen");
                Err(fehler.into())
            }
        }
    }

    /// Abonniert den Posteingang von `viewer_email`
    pub fn watch_inbox(self: &Arc<Self>, viewer_email: &str) -> InboxAbo {
        InboxAbo::neu(
            Arc::clone(self),
            self.messages.subscribe(),
            Email::neu(viewer_email),
        )
    }

    /// Verwirft alle entschluesselten Ansichten (Abmeldung)
    pub fn clear_view_cache(&self) {
        let anzahl = self.ansicht_cache.len();
        self.ansicht_cache.clear();
        tracing::debug!(anzahl, "Ansichts-Cache geleert");
    }

    /// Anzahl der entschluesselten Ansichten im Speicher
    pub fn view_cache_len(&self) -> usize {
        self.ansicht_cache.len()
    }
}

fn phase(phase: SendePhase) {
    tracing::debug!(phase = ?phase, "Sendephase erreicht");
}

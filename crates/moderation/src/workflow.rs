//! ModerationWorkflow
//!
//! Zustaende einer Meldung: `pending -> {dismissed, reviewed}`. Einfrieren
//! schliesst eine Meldung als `reviewed` ab und legt eine gerichtete
//! Nachrichtensperre (Absender -> Empfaenger) an.

use std::sync::Arc;

use uuid::Uuid;

use stillpost_audit::{AuditEreignis, AuditKanal};
use stillpost_crypto::CryptoCodec;
use stillpost_db::{
    models::{FlagAbschluss, FlagRecord, FlagStatus, NachrichtRecord, NeueSperre, NeuerFlag, Prioritaet},
    FlagRepository, MessageRepository, RestrictionRepository,
};
use stillpost_messaging::Nachricht;

use crate::error::{ModerationError, ModerationResult};

/// Snapshot-Inhalt, wenn der Empfaenger-Schluessel lokal nicht vorliegt
pub const SNAPSHOT_PLATZHALTER: &str =
    "[ENCRYPTED] Content requires decryption keys for full review";

/// Grund, wenn beim Melden keiner angegeben wurde
pub const STANDARD_GRUND: &str = "User reported content";

const VERWORFEN_NOTIZ: &str = "Flag dismissed by moderator";

pub struct ModerationWorkflow {
    messages: Arc<dyn MessageRepository>,
    flags: Arc<dyn FlagRepository>,
    restrictions: Arc<dyn RestrictionRepository>,
    codec: CryptoCodec,
    audit: AuditKanal,
}

impl ModerationWorkflow {
    pub fn neu(
        messages: Arc<dyn MessageRepository>,
        flags: Arc<dyn FlagRepository>,
        restrictions: Arc<dyn RestrictionRepository>,
        codec: CryptoCodec,
        audit: AuditKanal,
    ) -> Arc<Self> {
        Arc::new(Self {
            messages,
            flags,
            restrictions,
            codec,
            audit,
        })
    }

    /// Meldet eine Nachricht
    ///
    /// Existiert bereits eine Meldung, wird sie unveraendert zurueckgegeben.
    pub async fn flag(
        &self,
        message_id: Uuid,
        reason: &str,
        flagged_by: Option<&str>,
    ) -> ModerationResult<FlagRecord> {
        let nachricht = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or(ModerationError::NachrichtNichtGefunden(message_id))?;

        if let Some(vorhanden) = self.flags.get_by_message(message_id).await? {
            tracing::debug!(message_id = %message_id, "Nachricht bereits gemeldet");
            return Ok(vorhanden);
        }

        let grund = match reason.trim() {
            "" => STANDARD_GRUND,
            r => r,
        };

        match self
            .messages
            .update_flags(message_id, true, Some(Prioritaet::Medium))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(message_id = %message_id, "Meldungs-Flag nicht gesetzt: Nachricht verschwunden")
            }
            Err(e) => {
                tracing::warn!(message_id = %message_id, fehler = %e, "Meldungs-Flag konnte nicht gesetzt werden")
            }
        }

        let snapshot = self.snapshot(&nachricht).await;

        let flag = match self
            .flags
            .create(NeuerFlag {
                message_id,
                token_id: &nachricht.token_id,
                flagged_by,
                reason: grund,
                decrypted_content: Some(&snapshot),
            })
            .await
        {
            Ok(flag) => flag,
            Err(e) if e.ist_eindeutigkeit() => {
                // Paralleles Melden hat gewonnen
                tracing::debug!(message_id = %message_id, "Meldung parallel angelegt");
                return self
                    .flags
                    .get_by_message(message_id)
                    .await?
                    .ok_or(ModerationError::Persistenz(e));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            message_id = %message_id,
            token_id = %flag.token_id,
            flag_id = %flag.id,
            "Nachricht gemeldet"
        );
        self.audit.melden(AuditEreignis::nachricht_gemeldet(
            message_id,
            flagged_by.unwrap_or("anonymous"),
            grund,
            &flag.token_id,
        ));

        Ok(flag)
    }

    /// Verwirft die offene Meldung zu `token_id`
    ///
    /// `false` wenn keine offene Meldung existiert.
    pub async fn dismiss(&self, token_id: &str, moderator: &str) -> ModerationResult<bool> {
        let Some(flag) = self.flags.get_pending_by_token(token_id).await? else {
            tracing::info!(token_id, "Keine offene Meldung zum Verwerfen");
            return Ok(false);
        };

        let geschlossen = self
            .flags
            .resolve(
                flag.id,
                FlagAbschluss {
                    status: FlagStatus::Dismissed,
                    reviewed_by: moderator,
                    notes: VERWORFEN_NOTIZ,
                },
            )
            .await?;
        if !geschlossen {
            tracing::info!(token_id, "Meldung wurde zwischenzeitlich abgeschlossen");
            return Ok(false);
        }

        if let Err(e) = self.messages.update_flags(flag.message_id, false, None).await {
            tracing::warn!(message_id = %flag.message_id, fehler = %e, "Meldungs-Flag konnte nicht entfernt werden");
        }

        tracing::info!(token_id, moderator, "Meldung verworfen");
        self.audit.melden(
            AuditEreignis::moderator_entscheidung(moderator, token_id, "dismissed")
                .nachricht(flag.message_id),
        );
        Ok(true)
    }

    /// Friert `token_id` ein: Sperre Absender -> Empfaenger, Meldung `reviewed`
    ///
    /// Schlaegt das Laden der Nachricht oder das Anlegen der Sperre fehl,
    /// wird die Meldung mit Fehlernotiz abgeschlossen und `false` geliefert.
    /// Laesst sich der Meldungsstatus nach angelegter Sperre nicht setzen,
    /// bleibt die Sperre bestehen; auch dann `false` mit Audit-Eintrag.
    pub async fn freeze(&self, token_id: &str, moderator: &str) -> ModerationResult<bool> {
        let Some(flag) = self.flags.get_pending_by_token(token_id).await? else {
            tracing::info!(token_id, "Keine offene Meldung zum Einfrieren");
            return Ok(false);
        };

        match self.sperre_anlegen(&flag, token_id, moderator).await {
            Ok((absender, empfaenger)) => {
                let notiz = format!(
                    "Token {token_id} frozen by moderator and messaging restriction created between {absender} and {empfaenger}"
                );
                let abschluss = self
                    .flags
                    .resolve(
                        flag.id,
                        FlagAbschluss {
                            status: FlagStatus::Reviewed,
                            reviewed_by: moderator,
                            notes: &notiz,
                        },
                    )
                    .await;
                let ereignis = AuditEreignis::moderator_entscheidung(moderator, token_id, "frozen")
                    .nachricht(flag.message_id)
                    .meta("sender_email", absender)
                    .meta("recipient_email", empfaenger)
                    .meta("restriction_created", true);

                match abschluss {
                    Ok(true) => {
                        tracing::info!(token_id, moderator, "Token eingefroren");
                        self.audit.melden(ereignis);
                        Ok(true)
                    }
                    Ok(false) => {
                        tracing::warn!(token_id, "Sperre angelegt, Meldung war bereits abgeschlossen");
                        self.audit
                            .melden(ereignis.meta("error", "flag_status_update_failed"));
                        Ok(false)
                    }
                    Err(e) => {
                        tracing::error!(token_id, fehler = %e, "Sperre angelegt, Meldungsstatus nicht gespeichert");
                        self.audit
                            .melden(ereignis.meta("error", "flag_status_update_failed"));
                        Ok(false)
                    }
                }
            }
            Err(fehler) => {
                let (code, notiz) = match &fehler {
                    ModerationError::NachrichtNichtGefunden(_)
                    | ModerationError::UnvollstaendigeNachricht(_) => (
                        "message_not_found",
                        format!(
                            "Token {token_id} frozen but messaging restriction could not be created - message not found"
                        ),
                    ),
                    ModerationError::Persistenz(e) => (
                        "messaging_restriction_creation_failed",
                        format!("Token {token_id} frozen but messaging restriction creation failed: {e}"),
                    ),
                };
                tracing::error!(token_id, fehler = %fehler, "Einfrieren fehlgeschlagen");

                let abschluss = self
                    .flags
                    .resolve(
                        flag.id,
                        FlagAbschluss {
                            status: FlagStatus::Reviewed,
                            reviewed_by: moderator,
                            notes: &notiz,
                        },
                    )
                    .await;
                if let Err(e) = abschluss {
                    tracing::error!(token_id, fehler = %e, "Fehlernotiz konnte nicht gespeichert werden");
                }

                self.audit.melden(
                    AuditEreignis::moderator_entscheidung(moderator, token_id, "frozen")
                        .nachricht(flag.message_id)
                        .meta("error", code)
                        .meta("restriction_created", false),
                );
                Ok(false)
            }
        }
    }

    /// Moderations-Warteschlange: alle gemeldeten Nachrichten, neueste zuerst
    ///
    /// Jede ausgelieferte Nachricht wird als `viewed_message` von `moderator`
    /// im Audit-Trail vermerkt.
    pub async fn flagged_messages(&self, moderator: &str) -> ModerationResult<Vec<Nachricht>> {
        let records = self.messages.list_flagged().await?;
        let mut liste = Vec::with_capacity(records.len());
        for record in records {
            let flag = self.flags.get_by_message(record.id).await?;
            liste.push(Nachricht::aus_record(record, flag));
        }

        for nachricht in &liste {
            let mut ereignis =
                AuditEreignis::nachricht_angesehen(nachricht.id, moderator, &nachricht.token_id);
            if let Some(absender) = &nachricht.sender_email {
                ereignis = ereignis.meta("sender_email", absender.as_str());
            }
            if let Some(empfaenger) = &nachricht.recipient_email {
                ereignis = ereignis.meta("recipient_email", empfaenger.as_str());
            }
            self.audit.melden(ereignis);
        }

        tracing::debug!(anzahl = liste.len(), moderator, "Moderations-Warteschlange geladen");
        Ok(liste)
    }

    /// Ersetzt den Snapshot einer Meldung nach nachtraeglicher Entschluesselung
    pub async fn update_decrypted_content(
        &self,
        message_id: Uuid,
        content: &str,
    ) -> ModerationResult<bool> {
        let aktualisiert = self
            .flags
            .update_decrypted_content(message_id, content)
            .await?;
        if aktualisiert {
            tracing::info!(message_id = %message_id, "Meldungs-Snapshot aktualisiert");
        }
        Ok(aktualisiert)
    }

    async fn sperre_anlegen(
        &self,
        flag: &FlagRecord,
        token_id: &str,
        moderator: &str,
    ) -> ModerationResult<(String, String)> {
        let nachricht = self
            .messages
            .get_by_id(flag.message_id)
            .await?
            .ok_or(ModerationError::NachrichtNichtGefunden(flag.message_id))?;

        let (Some(absender), Some(empfaenger)) = (nachricht.sender_email, nachricht.recipient_email)
        else {
            return Err(ModerationError::UnvollstaendigeNachricht(flag.message_id));
        };

        let grund = format!("Token {token_id} frozen by moderator");
        let sperre = self
            .restrictions
            .insert_restriction(NeueSperre {
                sender_email: &absender,
                recipient_email: &empfaenger,
                reason: &grund,
                restricted_by: moderator,
            })
            .await?;
        tracing::info!(sperre_id = %sperre.id, "Nachrichtensperre angelegt");

        Ok((absender, empfaenger))
    }

    /// Klartext fuer die Moderationsansicht, soweit lokal moeglich
    async fn snapshot(&self, nachricht: &NachrichtRecord) -> String {
        if !nachricht.is_encrypted {
            return nachricht.content.clone();
        }
        let Some(empfaenger) = nachricht.recipient_email.as_deref() else {
            return SNAPSHOT_PLATZHALTER.to_string();
        };

        match self.codec.decrypt(&nachricht.content, empfaenger).await {
            Ok(klartext) => klartext,
            Err(e) => {
                tracing::debug!(message_id = %nachricht.id, fehler = ?e, "Kein Klartext-Snapshot moeglich");
                SNAPSHOT_PLATZHALTER.to_string()
            }
        }
    }
}

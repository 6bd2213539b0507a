//! Posteingang-Abonnement
//!
//! Haengt am Aenderungs-Feed des Nachrichten-Stores und laedt den
//! Posteingang neu, sobald eine Aenderung den Betrachter betrifft.
//! Zustellung ist at-least-once: ein verpasster Teil des Feeds (`Lagged`)
//! zaehlt als Aenderung.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use stillpost_core::Email;
use stillpost_db::models::NachrichtenAenderung;

use crate::{error::MessagingResult, flow::MessageFlow, types::Nachricht};

pub struct InboxAbo {
    flow: Arc<MessageFlow>,
    rx: broadcast::Receiver<NachrichtenAenderung>,
    viewer: Email,
}

impl InboxAbo {
    pub(crate) fn neu(
        flow: Arc<MessageFlow>,
        rx: broadcast::Receiver<NachrichtenAenderung>,
        viewer: Email,
    ) -> Self {
        Self { flow, rx, viewer }
    }

    /// Wartet auf die naechste relevante Aenderung und liefert den neuen Posteingang
    ///
    /// `None` wenn der Feed geschlossen wurde.
    pub async fn naechste(&mut self) -> Option<MessagingResult<Vec<Nachricht>>> {
        loop {
            match self.rx.recv().await {
                Ok(aenderung) if aenderung.empfaenger() == Some(self.viewer.as_str()) => {
                    return Some(self.flow.retrieve(self.viewer.as_str()).await);
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(verpasst)) => {
                    tracing::warn!(verpasst, "Posteingang-Feed zu langsam, lade neu");
                    return Some(self.flow.retrieve(self.viewer.as_str()).await);
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("Posteingang-Feed geschlossen");
                    return None;
                }
            }
        }
    }
}

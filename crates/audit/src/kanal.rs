//! AuditKanal – Seitenkanal zum AuditTrail
//!
//! Services melden Ereignisse ueber `melden` und warten nicht auf das
//! Ergebnis. Ein Hintergrund-Task schreibt sie in Meldereihenfolge; Fehler
//! werden nur protokolliert.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::ereignis::AuditEreignis;
use crate::trail::AuditTrail;

enum Auftrag {
    Ereignis(AuditEreignis),
    Leeren(oneshot::Sender<()>),
}

/// Handle auf den Audit-Hintergrund-Task
#[derive(Clone)]
pub struct AuditKanal {
    tx: mpsc::UnboundedSender<Auftrag>,
}

impl AuditKanal {
    /// Startet den Schreib-Task fuer `trail`
    ///
    /// Der Task endet, wenn alle Handles gedroppt wurden.
    pub fn starten(trail: Arc<AuditTrail>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Auftrag>();

        tokio::spawn(async move {
            while let Some(auftrag) = rx.recv().await {
                match auftrag {
                    Auftrag::Ereignis(ereignis) => {
                        // `append` protokolliert Fehler selbst
                        let _ = trail.append(ereignis).await;
                    }
                    Auftrag::Leeren(fertig) => {
                        let _ = fertig.send(());
                    }
                }
            }
            tracing::debug!("Audit-Task beendet");
        });

        Self { tx }
    }

    /// Meldet ein Ereignis (fire-and-forget)
    pub fn melden(&self, ereignis: AuditEreignis) {
        let typ = ereignis.typ;
        if self.tx.send(Auftrag::Ereignis(ereignis)).is_err() {
            tracing::error!(event_type = %typ, "Audit-Task nicht mehr aktiv, Ereignis verworfen");
        }
    }

    /// Wartet bis alle zuvor gemeldeten Ereignisse verarbeitet sind
    pub async fn leeren(&self) {
        let (fertig_tx, fertig_rx) = oneshot::channel();
        if self.tx.send(Auftrag::Leeren(fertig_tx)).is_err() {
            return;
        }
        let _ = fertig_rx.await;
    }
}

impl std::fmt::Debug for AuditKanal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditKanal")
            .field("aktiv", &!self.tx.is_closed())
            .finish()
    }
}

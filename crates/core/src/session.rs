//! Identitaets-/Session-Provider
//!
//! Die eigentliche Authentifizierung liegt ausserhalb von Stillpost. Dieses
//! Modul definiert nur die Schnittstelle (`SessionProvider`) und eine
//! prozesslokale Implementierung, die vom Client genutzt wird.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::{Email, UserId};

/// Eine angemeldete Session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub email: Email,
}

/// Callback bei Anmeldung/Abmeldung (`None` = abgemeldet)
pub type AuthCallback = Box<dyn Fn(Option<&Session>) + Send + Sync>;

/// Schnittstelle zum externen Identitaets-Provider
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Aktuelle Session, falls angemeldet
    async fn current_session(&self) -> Option<Session>;

    /// Registriert einen Listener fuer Anmelde-Aenderungen
    fn on_auth_change(&self, callback: AuthCallback);
}

/// Prozesslokaler Session-Provider
#[derive(Default)]
pub struct LocalSessionProvider {
    aktuell: RwLock<Option<Session>>,
    listener: RwLock<Vec<Arc<AuthCallback>>>,
}

impl LocalSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meldet eine Identitaet an und benachrichtigt alle Listener
    pub fn sign_in(&self, user_id: UserId, email: &str) -> Session {
        let session = Session {
            user_id,
            email: Email::neu(email),
        };
        *self.aktuell.write() = Some(session.clone());
        tracing::debug!(user_id = %user_id, "Session angemeldet");
        self.benachrichtigen(Some(&session));
        session
    }

    /// Meldet ab. Gibt `false` zurueck wenn niemand angemeldet war.
    pub fn sign_out(&self) -> bool {
        let vorher = self.aktuell.write().take();
        if vorher.is_none() {
            return false;
        }
        tracing::debug!("Session abgemeldet");
        self.benachrichtigen(None);
        true
    }

    fn benachrichtigen(&self, session: Option<&Session>) {
        // Listener ausserhalb des Locks aufrufen, damit Callbacks erneut
        // auf den Provider zugreifen koennen
        let listener: Vec<Arc<AuthCallback>> = self.listener.read().clone();
        for callback in listener {
            callback(session);
        }
    }
}

#[async_trait]
impl SessionProvider for LocalSessionProvider {
    async fn current_session(&self) -> Option<Session> {
        self.aktuell.read().clone()
    }

    fn on_auth_change(&self, callback: AuthCallback) {
        self.listener.write().push(Arc::new(callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn anmelden_und_abmelden() {
        let provider = LocalSessionProvider::new();
        assert!(provider.current_session().await.is_none());

        let id = UserId::new();
        provider.sign_in(id, "Alice@X.com");
        let session = provider.current_session().await.unwrap();
        assert_eq!(session.user_id, id);
        assert_eq!(session.email.as_str(), "alice@x.com");

        assert!(provider.sign_out());
        assert!(provider.current_session().await.is_none());
        assert!(!provider.sign_out());
    }

    #[tokio::test]
    async fn listener_werden_benachrichtigt() {
        let provider = LocalSessionProvider::new();
        let anmeldungen = Arc::new(AtomicUsize::new(0));
        let abmeldungen = Arc::new(AtomicUsize::new(0));

        let an = Arc::clone(&anmeldungen);
        let ab = Arc::clone(&abmeldungen);
        provider.on_auth_change(Box::new(move |session| match session {
            Some(_) => {
                an.fetch_add(1, Ordering::SeqCst);
            }
            None => {
                ab.fetch_add(1, Ordering::SeqCst);
            }
        }));

        provider.sign_in(UserId::new(), "a@x.com");
        provider.sign_out();
        // Abmelden ohne Session loest keinen Callback aus
        provider.sign_out();

        assert_eq!(anmeldungen.load(Ordering::SeqCst), 1);
        assert_eq!(abmeldungen.load(Ordering::SeqCst), 1);
    }
}

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::session::BookingSession;

/// Holds all live booking sessions.
///
/// Each session sits behind its own mutex, so requests for the same session
/// queue while different sessions proceed in parallel. The deadline is
/// enforced twice: lazily inside every session operation, and by the
/// background sweep for sessions nobody touches again.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<BookingSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: BookingSession) -> Uuid {
        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<BookingSession>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Transition overdue sessions to Expired and drop terminal sessions
    /// whose deadline has passed. Returns how many sessions were expired.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let snapshot: Vec<(Uuid, Arc<Mutex<BookingSession>>)> = {
            let sessions = self.sessions.read().await;
            sessions.iter().map(|(id, s)| (*id, s.clone())).collect()
        };

        let mut expired = 0;
        let mut removable = Vec::new();
        for (id, handle) in snapshot {
            let mut session = handle.lock().await;
            if session.expire_if_due(now) {
                expired += 1;
            }
            if session.state().is_terminal() && now >= session.expires_at {
                removable.push(id);
            }
        }

        if !removable.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in &removable {
                sessions.remove(id);
            }
        }

        if expired > 0 {
            info!(expired, "Expired stale booking sessions");
        }
        expired
    }
}

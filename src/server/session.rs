//! Session bookkeeping for Transport B (spec.md §3 "Session", §4.1
//! "server-generated opaque id, carried in a request header both ways").
//! Grounded on `ratchet-mcp::server::mod::McpServer`'s session map.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

pub struct Session {
    pub id: String,
    pub sender: mpsc::UnboundedSender<String>,
    /// Last response id issued to this session, used only to correlate
    /// out-of-order replies on the streaming transport (spec.md §3).
    pub last_response_id: Mutex<Option<Value>>,
}

impl Session {
    fn new(id: String, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            sender,
            last_response_id: Mutex::new(None),
        }
    }

    pub async fn record_response_id(&self, id: Option<Value>) {
        *self.last_response_id.lock().await = id;
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    /// Id of the most recently created session, tracked explicitly since
    /// `HashMap` iteration order carries no such guarantee (spec.md §4.1:
    /// "the most recently opened session" is where Transport A replies go).
    latest: RwLock<Option<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, sender: mpsc::UnboundedSender<String>) -> Arc<Session> {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone(), sender));
        self.sessions.write().await.insert(id.clone(), session.clone());
        *self.latest.write().await = Some(id);
        session
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.write().await.remove(id);
        let mut latest = self.latest.write().await;
        if latest.as_deref() == Some(id) {
            *latest = None;
        }
        removed
    }

    /// Transport A permits one active push stream per connection; the most
    /// recently opened session is where `POST /messages` replies land
    /// (spec.md §4.1).
    pub async fn most_recent(&self) -> Option<Arc<Session>> {
        let id = self.latest.read().await.clone()?;
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_session_is_retrievable_by_id() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = registry.create(tx).await;
        assert!(registry.get(&session.id).await.is_some());
    }

    #[tokio::test]
    async fn removed_session_is_no_longer_retrievable() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = registry.create(tx).await;
        registry.remove(&session.id).await;
        assert!(registry.get(&session.id).await.is_none());
    }
}

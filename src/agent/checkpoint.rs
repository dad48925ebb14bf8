//! Session snapshots keyed by session id
//!
//! The controller loads a session's snapshot when a run starts, saves after
//! every evaluator step and restores the pre-run snapshot if the run aborts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::state::ConversationState;
use crate::core::{Result, SidekickError};

/// A saved conversation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub session_id: String,
    pub state: ConversationState,
    /// Supersteps completed in the run that wrote this snapshot
    pub supersteps: usize,
    pub saved_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(session_id: impl Into<String>, state: ConversationState, supersteps: usize) -> Self {
        Self {
            session_id: session_id.into(),
            state,
            supersteps,
            saved_at: Utc::now(),
        }
    }
}

/// Storage for session snapshots
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<Snapshot>>;
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
    async fn remove(&self, session_id: &str) -> Result<()>;
}

/// Process-local run store
#[derive(Debug, Default, Clone)]
pub struct InMemoryRunStore {
    inner: Arc<RwLock<HashMap<String, Snapshot>>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with a snapshot
    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> SidekickError {
    SidekickError::Other("run store lock poisoned".to_string())
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn load(&self, session_id: &str) -> Result<Option<Snapshot>> {
        let guard = self.inner.read().map_err(|_| poisoned())?;
        Ok(guard.get(session_id).cloned())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        guard.insert(snapshot.session_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        guard.remove(session_id);
        Ok(())
    }
}

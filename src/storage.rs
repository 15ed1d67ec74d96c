//! Durable copy of the session's assignment state.
//!
//! The in-memory session is authoritative. Saves are pushed through an
//! unbounded channel to a background writer so a mutation never waits on
//! I/O, and a failed write is logged and reported through [`SaveStatus`]
//! without being retried.

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::assignment::store::Assignments;
use crate::assignment::ChangeListener;
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMeta {
    pub id: String,
    pub title: String,
}

/// Ordinal counters of the dynamic groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCounts {
    #[serde(default)]
    pub rest: u32,
    #[serde(default)]
    pub water: u32,
    #[serde(default)]
    pub custom: BTreeMap<String, u32>,
}

/// Serialized form of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub assignments: Assignments,
    #[serde(default)]
    pub groups: Vec<GroupMeta>,
    #[serde(default)]
    pub slot_counts: SlotCounts,
    #[serde(default)]
    pub notes: String,
    /// Live ordinals per dynamic group. Older saves lack it, in which case
    /// every ordinal below the group's count is live.
    #[serde(default)]
    pub slots: BTreeMap<String, Vec<u32>>,
}

/// Key-value store holding the assignment state.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_assignment_state(&self) -> Result<Option<PersistedState>, StorageError>;
    async fn set_assignment_state(&self, state: &PersistedState) -> Result<(), StorageError>;
}

/// State kept as a pretty-printed JSON file.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn get_assignment_state(&self) -> Result<Option<PersistedState>, StorageError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn set_assignment_state(&self, state: &PersistedState) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Saved assignment state to {}", self.path.display());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<Option<PersistedState>>,
}

impl MemoryStorage {
    pub fn new(state: Option<PersistedState>) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_assignment_state(&self) -> Result<Option<PersistedState>, StorageError> {
        Ok(self.state.lock().await.clone())
    }

    async fn set_assignment_state(&self, state: &PersistedState) -> Result<(), StorageError> {
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }
}

/// Outcome of the most recent save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Saved,
    Failed(String),
}

/// Session subscriber that queues every new state for the writer task.
pub struct PersistenceListener {
    tx: mpsc::UnboundedSender<PersistedState>,
}

impl ChangeListener for PersistenceListener {
    fn on_change(&mut self, state: &PersistedState) {
        if self.tx.send(state.clone()).is_err() {
            warn!("Persistence writer has stopped; change not saved");
        }
    }
}

/// Starts the background writer.
///
/// The writer exits once every [`PersistenceListener`] it handed out has
/// been dropped and the queue is drained.
pub fn spawn_writer(
    storage: Arc<dyn Storage>,
) -> (PersistenceListener, watch::Receiver<SaveStatus>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
    let handle = tokio::spawn(run_writer(storage, rx, status_tx));
    (PersistenceListener { tx }, status_rx, handle)
}

async fn run_writer(
    storage: Arc<dyn Storage>,
    mut rx: mpsc::UnboundedReceiver<PersistedState>,
    status: watch::Sender<SaveStatus>,
) {
    while let Some(mut state) = rx.recv().await {
        // Only the newest queued state matters.
        while let Ok(newer) = rx.try_recv() {
            state = newer;
        }
        let outcome = match storage.set_assignment_state(&state).await {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                warn!("Failed to save assignment state: {}", e);
                SaveStatus::Failed(e.to_string())
            }
        };
        status.send_replace(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Person;

    fn sample() -> PersistedState {
        let mut state = PersistedState::default();
        state
            .assignments
            .insert("attack_driver".into(), Person::new("1", "甲"));
        state.groups.push(GroupMeta {
            id: "custom_1".into(),
            title: "X".into(),
        });
        state.slot_counts.custom.insert("custom_1".into(), 2);
        state.notes = "X:甲".into();
        state
    }

    #[tokio::test]
    async fn json_file_storage_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested").join("state.json"));

        assert_eq!(storage.get_assignment_state().await.unwrap(), None);
        storage.set_assignment_state(&sample()).await.unwrap();
        assert_eq!(storage.get_assignment_state().await.unwrap(), Some(sample()));
    }

    #[test]
    fn reads_saves_without_live_slot_lists() {
        let json = r#"{
            "assignments": {"rest_0": {"id": "4", "name": "丁"}},
            "groups": [],
            "slotCounts": {"rest": 1, "water": 0, "custom": {}},
            "notes": "休息:丁"
        }"#;
        let state: PersistedState = serde_json::from_str(json).unwrap();
        assert_eq!(state.slot_counts.rest, 1);
        assert!(state.slots.is_empty());
        assert_eq!(state.assignments["rest_0"], Person::new("4", "丁"));
    }

    struct FailingStorage;

    #[async_trait]
    impl Storage for FailingStorage {
        async fn get_assignment_state(&self) -> Result<Option<PersistedState>, StorageError> {
            Ok(None)
        }

        async fn set_assignment_state(&self, _: &PersistedState) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
    }

    #[tokio::test]
    async fn writer_saves_latest_state() {
        let storage = Arc::new(MemoryStorage::default());
        let (mut listener, status, handle) = spawn_writer(storage.clone());

        listener.on_change(&PersistedState::default());
        listener.on_change(&sample());
        drop(listener);
        handle.await.unwrap();

        assert_eq!(storage.get_assignment_state().await.unwrap(), Some(sample()));
        assert_eq!(*status.borrow(), SaveStatus::Saved);
    }

    #[tokio::test]
    async fn writer_reports_failures_without_stopping() {
        let (mut listener, status, handle) = spawn_writer(Arc::new(FailingStorage));

        listener.on_change(&sample());
        drop(listener);
        handle.await.unwrap();

        assert!(matches!(&*status.borrow(), SaveStatus::Failed(reason) if reason.contains("disk full")));
    }
}

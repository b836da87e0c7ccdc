use crate::GameState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const SNAPSHOT_KEY: &str = "game-state";
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage backend: {0}")]
    Backend(String),
    #[error("encode snapshot: {0}")]
    Encode(String),
    #[error("decode snapshot: {0}")]
    Decode(String),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Opaque get/set-by-key blob storage for snapshots.
pub trait SnapshotStore: fmt::Debug {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn save(&mut self, key: &str, blob: &str) -> Result<(), PersistError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, blob: &str) -> Self {
        let mut store = Self::new();
        store.blobs.insert(key.to_string(), blob.to_string());
        store
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    #[serde(flatten)]
    state: &'a GameState,
}

#[derive(Deserialize)]
struct SnapshotIn {
    #[serde(default = "current_version")]
    version: u32,
    #[serde(flatten)]
    state: GameState,
}

fn current_version() -> u32 {
    SNAPSHOT_SCHEMA_VERSION
}

pub fn encode_snapshot(state: &GameState) -> Result<String, PersistError> {
    let payload = SnapshotOut {
        version: SNAPSHOT_SCHEMA_VERSION,
        state,
    };
    serde_json::to_string(&payload).map_err(|err| PersistError::Encode(err.to_string()))
}

pub fn decode_snapshot(blob: &str) -> Result<GameState, PersistError> {
    let payload: SnapshotIn = serde_json::from_str(blob)?;
    if payload.version != SNAPSHOT_SCHEMA_VERSION {
        return Err(PersistError::Version {
            found: payload.version,
            expected: SNAPSHOT_SCHEMA_VERSION,
        });
    }
    Ok(payload.state)
}

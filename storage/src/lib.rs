//! DPoS Storage Layer
//!
//! Sled-backed persistence for the consensus state document:
//! - Whole state saved atomically as one bincode record
//! - Rounds additionally stored under `round:{number}` for direct lookup
//! - JSON export for inspection

use dpos_core::{MemoryState, Round};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

const STATE_KEY: &str = "state";
const ROUND_PREFIX: &str = "round:";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone)]
pub struct ConsensusStore {
    db: sled::Db,
    path: String,
}

impl ConsensusStore {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = sled::open(&path)?;
        debug!("opened consensus store at {}", path_str);
        Ok(Self { db, path: path_str })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Save the whole state and every round it holds in one batch
    pub fn save_state(&self, state: &MemoryState) -> StorageResult<()> {
        let mut batch = sled::Batch::default();
        batch.insert(STATE_KEY.as_bytes(), encode(state)?);
        for round in state.rounds.values() {
            batch.insert(round_key(round.round_number).as_bytes(), encode(round)?);
        }
        self.db.apply_batch(batch)?;
        self.db.flush()?;

        debug!(
            "saved state at round {} with {} rounds",
            state.current_round_number,
            state.rounds.len()
        );
        Ok(())
    }

    pub fn load_state(&self) -> StorageResult<Option<MemoryState>> {
        self.get(STATE_KEY)
    }

    pub fn save_round(&self, round: &Round) -> StorageResult<()> {
        self.db
            .insert(round_key(round.round_number).as_bytes(), encode(round)?)?;
        Ok(())
    }

    pub fn load_round(&self, round_number: u64) -> StorageResult<Option<Round>> {
        self.get(&round_key(round_number))
    }

    /// All stored rounds, ordered by round number
    pub fn load_rounds(&self) -> StorageResult<Vec<Round>> {
        let mut rounds = Vec::new();
        for entry in self.db.scan_prefix(ROUND_PREFIX.as_bytes()) {
            let (_, value) = entry?;
            rounds.push(decode::<Round>(&value)?);
        }
        rounds.sort_by_key(|r| r.round_number);
        Ok(rounds)
    }

    /// Write the stored state as pretty JSON
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> StorageResult<bool> {
        let state = match self.load_state()? {
            Some(state) => state,
            None => return Ok(false),
        };
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(true)
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(decode(&data)?)),
            None => Ok(None),
        }
    }
}

fn round_key(round_number: u64) -> String {
    format!("{}{}", ROUND_PREFIX, round_number)
}

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_store() {
        let dir = tempdir().unwrap();
        let store = ConsensusStore::open(dir.path().join("db")).unwrap();

        assert!(store.load_state().unwrap().is_none());
        assert!(store.load_round(1).unwrap().is_none());
        assert!(store.load_rounds().unwrap().is_empty());
        assert!(!store.export_json(dir.path().join("state.json")).unwrap());
    }

    #[test]
    fn test_round_keys() {
        assert_eq!(round_key(12), "round:12");
    }

    #[test]
    fn test_corrupt_record() {
        let dir = tempdir().unwrap();
        let store = ConsensusStore::open(dir.path().join("db")).unwrap();
        store.db.insert(STATE_KEY.as_bytes(), &[1u8, 2, 3][..]).unwrap();

        assert!(matches!(
            store.load_state(),
            Err(StorageError::Serialization(_))
        ));
    }
}

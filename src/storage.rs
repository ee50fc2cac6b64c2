use std::path::{Path, PathBuf};

use sled::IVec;

use crate::errors::QuestError;
use crate::types::{ProgressSnapshot, SNAPSHOT_SCHEMA_VERSION};

const TREE_PROGRESS: &str = "questline_progress";
const SNAPSHOT_KEY: &[u8] = b"snapshot:current";

/// Helper builder so tests can easily create throwaway stores.
pub struct SnapshotStoreBuilder {
    path: PathBuf,
    temporary: bool,
}

impl SnapshotStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    /// Back the store with a throwaway database that is removed on drop.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn open(self) -> Result<SnapshotStore, QuestError> {
        if self.temporary {
            let db = sled::Config::new().temporary(true).open()?;
            SnapshotStore::from_db(db)
        } else {
            SnapshotStore::open(self.path)
        }
    }
}

/// Sled-backed persistence for quest progress snapshots.
///
/// The whole snapshot lives under a single key, so a save is one insert
/// followed by a flush: the atomic blocking write the engine relies on.
pub struct SnapshotStore {
    _db: sled::Db,
    progress: sled::Tree,
}

impl SnapshotStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, QuestError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, QuestError> {
        let progress = db.open_tree(TREE_PROGRESS)?;
        Ok(Self { _db: db, progress })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, QuestError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, QuestError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Write the snapshot and flush to disk.
    pub fn put_snapshot(&self, mut snapshot: ProgressSnapshot) -> Result<(), QuestError> {
        snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION;
        let bytes = Self::serialize(&snapshot)?;
        self.progress.insert(SNAPSHOT_KEY, bytes)?;
        self.progress.flush()?;
        Ok(())
    }

    /// Fetch the snapshot, or `None` when no save exists yet.
    pub fn get_snapshot(&self) -> Result<Option<ProgressSnapshot>, QuestError> {
        let Some(bytes) = self.progress.get(SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        let snapshot: ProgressSnapshot = Self::deserialize(bytes)?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(QuestError::SchemaMismatch {
                expected: SNAPSHOT_SCHEMA_VERSION,
                found: snapshot.schema_version,
            });
        }
        Ok(Some(snapshot))
    }

    /// Raw encoded snapshot, for callers that compare saved states.
    pub fn snapshot_bytes(&self) -> Result<Option<Vec<u8>>, QuestError> {
        Ok(self.progress.get(SNAPSHOT_KEY)?.map(|b| b.to_vec()))
    }

    /// Remove the stored snapshot.
    pub fn clear(&self) -> Result<(), QuestError> {
        self.progress.remove(SNAPSHOT_KEY)?;
        self.progress.flush()?;
        Ok(())
    }
}

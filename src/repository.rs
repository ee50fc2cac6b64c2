//! Catalog ownership and snapshot round-trips.
//!
//! The repository holds the merged view the rest of the engine works on:
//! immutable quest definitions from the catalog, overlaid with whatever
//! progress the snapshot store has for them. Persistence failures are
//! logged and swallowed here; the in-memory state stays authoritative and
//! the next mutating call attempts another save.

use log::{debug, warn};

use crate::errors::QuestError;
use crate::logutil::escape_log;
use crate::storage::SnapshotStore;
use crate::types::{ProgressRecord, ProgressSnapshot, Quest, QuestStatus};

/// The quest catalog merged with persisted progress.
pub struct QuestRepository {
    quests: Vec<Quest>,
    store: SnapshotStore,
}

impl QuestRepository {
    /// Build the repository from catalog definitions and a snapshot store.
    ///
    /// Every quest is first normalized to its unstarted default (Locked, or
    /// Available with zero prerequisites, all progress cleared), then any
    /// matching snapshot entry is applied on top. Snapshot entries without
    /// a catalog match are ignored. A snapshot that cannot be read is
    /// logged and treated as absent.
    pub fn open(catalog: Vec<Quest>, store: SnapshotStore) -> Self {
        let mut repo = Self {
            quests: catalog,
            store,
        };
        repo.merge_stored_snapshot();
        repo
    }

    fn merge_stored_snapshot(&mut self) {
        for quest in &mut self.quests {
            normalize_to_default(quest);
        }
        let snapshot = match self.store.get_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("failed to read progress snapshot, starting fresh: {err}");
                None
            }
        };
        if let Some(snapshot) = snapshot {
            self.apply_snapshot(snapshot);
        }
    }

    fn apply_snapshot(&mut self, snapshot: ProgressSnapshot) {
        for record in snapshot.entries {
            let Some(quest) = self.quests.iter_mut().find(|q| q.id == record.quest_id) else {
                debug!(
                    "snapshot entry without catalog quest, ignoring: {}",
                    escape_log(&record.quest_id)
                );
                continue;
            };
            quest.status = record.status;
            quest.completed_at = record.completed_at;
            for objective in &mut quest.objectives {
                if let Some(progress) = record.objective_progress.get(&objective.id) {
                    objective.progress = (*progress).min(objective.required);
                }
                if record.completed_objectives.iter().any(|id| *id == objective.id) {
                    objective.progress = objective.required;
                }
                objective.completed = objective.progress >= objective.required;
            }
        }
    }

    /// Persist the full current state as one atomic write.
    pub fn save(&self) -> Result<(), QuestError> {
        let entries: Vec<ProgressRecord> =
            self.quests.iter().map(ProgressRecord::from_quest).collect();
        self.store.put_snapshot(ProgressSnapshot::new(entries))
    }

    /// Recompute every quest's status purely from prerequisite cardinality,
    /// clear all progress, and persist.
    pub fn reset(&mut self) -> Result<(), QuestError> {
        for quest in &mut self.quests {
            normalize_to_default(quest);
        }
        self.save()
    }

    /// Replace the catalog wholesale and re-merge against the stored
    /// snapshot. Used for catalog re-loads; not a definition merge.
    pub fn replace_catalog(&mut self, catalog: Vec<Quest>) {
        self.quests = catalog;
        self.merge_stored_snapshot();
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn quests_mut(&mut self) -> &mut [Quest] {
        &mut self.quests
    }

    pub fn quest(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == quest_id)
    }

    pub fn quest_mut(&mut self, quest_id: &str) -> Option<&mut Quest> {
        self.quests.iter_mut().find(|q| q.id == quest_id)
    }

    pub fn contains(&self, quest_id: &str) -> bool {
        self.quests.iter().any(|q| q.id == quest_id)
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }
}

fn normalize_to_default(quest: &mut Quest) {
    quest.status = if quest.prerequisites.is_empty() {
        QuestStatus::Available
    } else {
        QuestStatus::Locked
    };
    quest.completed_at = None;
    for objective in &mut quest.objectives {
        objective.reset();
    }
}

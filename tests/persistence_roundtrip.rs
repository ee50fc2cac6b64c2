/// Integration tests for save-state persistence.
///
/// Verifies that progress written through the engine survives closing and
/// reopening the sled store, that rewriting unchanged state produces
/// byte-identical snapshots, and that resets, stale entries, and unreadable
/// snapshots leave the engine in a usable state.
use std::collections::BTreeMap;
use std::path::Path;

use questline::engine::QuestEngine;
use questline::events::GameEvent;
use questline::repository::QuestRepository;
use questline::seeds::starter_catalog;
use questline::storage::SnapshotStoreBuilder;
use questline::types::{
    ProgressRecord, ProgressSnapshot, QuestStatus, SNAPSHOT_SCHEMA_VERSION,
};
use tempfile::TempDir;

fn open_engine(path: &Path) -> QuestEngine {
    let store = SnapshotStoreBuilder::new(path).open().unwrap();
    QuestEngine::new(QuestRepository::open(starter_catalog(), store))
}

fn write_raw_snapshot(path: &Path, bytes: Vec<u8>) {
    let db = sled::open(path).unwrap();
    let tree = db.open_tree("questline_progress").unwrap();
    tree.insert(b"snapshot:current", bytes).unwrap();
    tree.flush().unwrap();
}

#[test]
fn progress_survives_reopen() {
    let temp = TempDir::new().unwrap();

    let completed_at = {
        let mut engine = open_engine(temp.path());
        assert!(engine.start_quest("gather_supplies"));
        engine.handle_event(&GameEvent::ItemCollected {
            item_id: "travel_supplies".to_string(),
            amount: 3,
        });
        assert!(engine.start_quest("forge_sword"));
        engine.handle_event(&GameEvent::ItemCollected {
            item_id: "iron".to_string(),
            amount: 2,
        });
        let stamp = engine.quest("gather_supplies").unwrap().completed_at;
        assert!(stamp.is_some());
        stamp
    };

    let engine = open_engine(temp.path());

    let supplies = engine.quest("gather_supplies").unwrap();
    assert_eq!(supplies.status, QuestStatus::Completed);
    assert_eq!(supplies.completed_at, completed_at, "timestamp round-trips");
    assert!(supplies.objective("pack_supplies").unwrap().is_complete());

    let forge = engine.quest("forge_sword").unwrap();
    assert_eq!(forge.status, QuestStatus::Active);
    assert_eq!(forge.objective("collect_iron").unwrap().progress, 2);
    assert!(!forge.objective("collect_iron").unwrap().is_complete());
    assert!(
        engine.is_quest_active("forge_sword"),
        "active set rebuilt from the save"
    );

    // The unlock that followed completion was persisted too
    assert_eq!(
        engine.quest("path_to_library").unwrap().status,
        QuestStatus::Available
    );
}

#[test]
fn unchanged_state_rewrites_identical_bytes() {
    let temp = TempDir::new().unwrap();

    let first = {
        let mut engine = open_engine(temp.path());
        assert!(engine.start_quest("gather_supplies"));
        engine.handle_event(&GameEvent::ItemCollected {
            item_id: "travel_supplies".to_string(),
            amount: 2,
        });

        engine.repository().save().unwrap();
        let first = engine
            .repository()
            .store()
            .snapshot_bytes()
            .unwrap()
            .expect("snapshot written");

        engine.repository().save().unwrap();
        let second = engine
            .repository()
            .store()
            .snapshot_bytes()
            .unwrap()
            .expect("snapshot written");
        assert_eq!(first, second, "saving twice writes the same bytes");
        first
    };

    // Load then save reproduces the stored form exactly
    let engine = open_engine(temp.path());
    engine.repository().save().unwrap();
    let reloaded = engine
        .repository()
        .store()
        .snapshot_bytes()
        .unwrap()
        .expect("snapshot written");
    assert_eq!(first, reloaded);
}

#[test]
fn reset_restores_initial_statuses_and_persists() {
    let temp = TempDir::new().unwrap();

    {
        let mut engine = open_engine(temp.path());
        assert!(engine.start_quest("gather_supplies"));
        engine.handle_event(&GameEvent::ItemCollected {
            item_id: "travel_supplies".to_string(),
            amount: 3,
        });
        assert_eq!(
            engine.quest("forge_sword").unwrap().status,
            QuestStatus::Available
        );

        engine.reset();

        let supplies = engine.quest("gather_supplies").unwrap();
        assert_eq!(supplies.status, QuestStatus::Available);
        assert_eq!(supplies.objective("pack_supplies").unwrap().progress, 0);
        assert!(supplies.completed_at.is_none());
        assert_eq!(
            engine.quest("forge_sword").unwrap().status,
            QuestStatus::Locked
        );
        assert!(engine.active_quests().is_empty());
    }

    // A new session sees the reset state, not the old progress
    let engine = open_engine(temp.path());
    assert_eq!(
        engine.quest("gather_supplies").unwrap().status,
        QuestStatus::Available
    );
    assert_eq!(
        engine.quest("forge_sword").unwrap().status,
        QuestStatus::Locked
    );
}

#[test]
fn stale_snapshot_entries_are_ignored() {
    let temp = TempDir::new().unwrap();

    {
        let store = SnapshotStoreBuilder::new(temp.path()).open().unwrap();
        let ghost = ProgressRecord {
            quest_id: "retired_quest".to_string(),
            status: QuestStatus::Completed,
            completed_at: None,
            completed_objectives: vec!["gone".to_string()],
            objective_progress: BTreeMap::new(),
        };
        store
            .put_snapshot(ProgressSnapshot::new(vec![ghost]))
            .unwrap();
    }

    let engine = open_engine(temp.path());
    assert!(engine.quest("retired_quest").is_none());
    assert_eq!(engine.quests().len(), 4, "catalog unchanged");
    assert_eq!(
        engine.quest("gather_supplies").unwrap().status,
        QuestStatus::Available
    );
}

#[test]
fn tampered_progress_is_clamped_on_load() {
    let temp = TempDir::new().unwrap();

    {
        let store = SnapshotStoreBuilder::new(temp.path()).open().unwrap();
        let mut objective_progress = BTreeMap::new();
        objective_progress.insert("pack_supplies".to_string(), 99);
        let record = ProgressRecord {
            quest_id: "gather_supplies".to_string(),
            status: QuestStatus::Active,
            completed_at: None,
            completed_objectives: Vec::new(),
            objective_progress,
        };
        store
            .put_snapshot(ProgressSnapshot::new(vec![record]))
            .unwrap();
    }

    let engine = open_engine(temp.path());
    let quest = engine.quest("gather_supplies").unwrap();
    let objective = quest.objective("pack_supplies").unwrap();
    assert_eq!(objective.progress, 3, "clamped at the requirement");
    assert!(objective.is_complete());
    assert!(engine.is_quest_active("gather_supplies"));
}

#[test]
fn unreadable_snapshots_fall_back_to_the_catalog() {
    let temp = TempDir::new().unwrap();

    // Garbage where the snapshot should be
    write_raw_snapshot(temp.path(), b"not bincode".to_vec());
    {
        let engine = open_engine(temp.path());
        assert_eq!(
            engine.quest("gather_supplies").unwrap().status,
            QuestStatus::Available
        );
        assert_eq!(
            engine.quest("forge_sword").unwrap().status,
            QuestStatus::Locked
        );
    }

    // A snapshot from a different schema version is refused the same way
    let drifted = ProgressSnapshot {
        schema_version: SNAPSHOT_SCHEMA_VERSION + 1,
        entries: Vec::new(),
    };
    write_raw_snapshot(temp.path(), bincode::serialize(&drifted).unwrap());
    let engine = open_engine(temp.path());
    assert_eq!(
        engine.quest("gather_supplies").unwrap().status,
        QuestStatus::Available
    );
}

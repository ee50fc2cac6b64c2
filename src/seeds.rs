//! Catalog loaders for data-driven quest content.
//!
//! Quest definitions live in JSON files so designers can edit content
//! without recompiling; the built-in starter catalog doubles as the demo
//! quest line and as the file `init` writes for a fresh installation.

use std::fs;
use std::path::Path;

use crate::errors::QuestError;
use crate::types::{Objective, ObjectiveKind, Position, Quest, Reward};

/// Load quest definitions from a JSON catalog file.
pub fn load_catalog_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Quest>, QuestError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let quests: Vec<Quest> = serde_json::from_str(&contents).map_err(|e| {
        QuestError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to parse {}: {}", path.display(), e),
        ))
    })?;

    Ok(quests)
}

/// Write the starter catalog as pretty JSON, creating parent directories.
pub fn write_starter_catalog<P: AsRef<Path>>(path: P) -> Result<(), QuestError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&starter_catalog()).map_err(|e| {
        QuestError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to encode starter catalog: {e}"),
        ))
    })?;
    fs::write(path, json)?;
    Ok(())
}

/// The built-in quest line: a short journey that exercises every
/// objective kind and a small dependency graph.
pub fn starter_catalog() -> Vec<Quest> {
    let mut quests = Vec::new();

    // Quest 1: entry point, no prerequisites
    let supplies = Quest::new(
        "gather_supplies",
        "Gather Supplies",
        "Pack what you need for the road to the library town.",
    )
    .with_objective(Objective::new(
        "pack_supplies",
        "Collect travel supplies",
        ObjectiveKind::CollectItems {
            item_id: "travel_supplies".to_string(),
        },
        3,
    ))
    .with_reward(Reward::new(50, 10));
    quests.push(supplies);

    // Quest 2: the journey itself (requires quest 1)
    let journey = Quest::new(
        "path_to_library",
        "The Path to the Library",
        "Cross the forest and reach the library tower where the new work waits.",
    )
    .with_objective(Objective::new(
        "talk_to_locals",
        "Ask two locals for directions",
        ObjectiveKind::Custom,
        2,
    ))
    .with_objective(Objective::new(
        "reach_forest_exit",
        "Find the forest exit",
        ObjectiveKind::ReachLocation {
            target: Position::new(50.0, 0.0, 100.0),
            radius: 5.0,
            area_id: None,
        },
        1,
    ))
    .with_objective(Objective::new(
        "slay_forest_wolf",
        "Drive off the forest wolf",
        ObjectiveKind::KillEnemies {
            enemy_type: "forest_wolf".to_string(),
        },
        1,
    ))
    .with_objective(Objective::new(
        "reach_library",
        "Arrive at the library tower",
        ObjectiveKind::ReachLocation {
            target: Position::new(200.0, 0.0, 200.0),
            radius: 5.0,
            area_id: Some("library_tower".to_string()),
        },
        1,
    ))
    .with_prerequisite("gather_supplies")
    .with_reward(Reward::new(200, 50).with_item("library_key", 1));
    quests.push(journey);

    // Quest 3: side work at the smithy (requires quest 1)
    let sword = Quest::new(
        "forge_sword",
        "Forge a Sword",
        "Bring the smith enough iron for a travel blade.",
    )
    .with_objective(Objective::new(
        "collect_iron",
        "Collect iron",
        ObjectiveKind::CollectItems {
            item_id: "iron".to_string(),
        },
        3,
    ))
    .with_objective(Objective::new(
        "talk_smith",
        "Talk to the smith",
        ObjectiveKind::TalkToNpc {
            npc_id: "smith".to_string(),
            dialogue_id: None,
        },
        1,
    ))
    .with_prerequisite("gather_supplies")
    .with_reward(Reward::new(150, 0).with_item("iron_sword", 1));
    quests.push(sword);

    // Quest 4: finale behind both branches
    let errand = Quest::new(
        "library_errand",
        "The Librarian's Errand",
        "Open the sealed archive and start the new work.",
    )
    .with_objective(Objective::new(
        "open_archive",
        "Open the archive door",
        ObjectiveKind::InteractWithObject {
            object_id: "archive_door".to_string(),
            action: Some("open".to_string()),
        },
        1,
    ))
    .with_prerequisite("path_to_library")
    .with_prerequisite("forge_sword")
    .with_reward(Reward::new(500, 0));
    quests.push(errand);

    quests
}

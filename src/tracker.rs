//! Per-objective progress application and completion detection.
//!
//! The core operation resolves a quest (must be Active) and an objective
//! (must exist, not already completed), applies a clamped delta, and
//! reports threshold crossings. The per-event dispatchers filter active
//! quests' objectives by kind and parameters before applying progress;
//! the direct-addressing path reaches `Custom` objectives only, so typed
//! objectives cannot be advanced past their gameplay events.
//! Progress application is deliberately not idempotent: every call is a
//! delta, and the gameplay layer fires each logical occurrence once.

use log::{debug, warn};

use crate::logutil::escape_log;
use crate::repository::QuestRepository;
use crate::types::{Objective, ObjectiveKind, Position, Quest, QuestStatus};

/// Outcome of a single progress application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveResult {
    /// Whether any progress was applied.
    pub applied: bool,
    pub progress: u32,
    pub required: u32,
    /// The objective crossed into completed during this call.
    pub objective_completed: bool,
    /// This call completed the quest's last incomplete objective.
    pub quest_completed: bool,
}

impl ObjectiveResult {
    fn skipped(progress: u32, required: u32) -> Self {
        Self {
            applied: false,
            progress,
            required,
            objective_completed: false,
            quest_completed: false,
        }
    }

    fn missing() -> Self {
        Self::skipped(0, 0)
    }
}

/// One applied progress update, with enough context to emit events.
#[derive(Debug, Clone)]
pub struct TrackerOutcome {
    pub quest_id: String,
    pub objective_id: String,
    pub description: String,
    pub result: ObjectiveResult,
}

/// Apply `delta` to one `Custom` objective of one quest, addressed
/// directly.
///
/// No-op (without error) when the quest is unknown or not Active, or when
/// the objective is unknown, not `Custom`-kind, or already completed.
pub fn apply_progress(
    repo: &mut QuestRepository,
    quest_id: &str,
    objective_id: &str,
    delta: u32,
) -> ObjectiveResult {
    let Some(quest) = repo.quest_mut(quest_id) else {
        warn!("progress for unknown quest: {}", escape_log(quest_id));
        return ObjectiveResult::missing();
    };
    if quest.status != QuestStatus::Active {
        debug!(
            "ignoring progress for {} quest {}",
            quest.status.as_str(),
            escape_log(quest_id)
        );
        return ObjectiveResult::missing();
    }
    let Some(index) = quest.objectives.iter().position(|o| o.id == objective_id) else {
        warn!(
            "unknown objective {} on quest {}",
            escape_log(objective_id),
            escape_log(quest_id)
        );
        return ObjectiveResult::missing();
    };
    if !matches!(quest.objectives[index].kind, ObjectiveKind::Custom) {
        warn!(
            "objective {} on quest {} is not custom, refusing direct update",
            escape_log(objective_id),
            escape_log(quest_id)
        );
        return ObjectiveResult::missing();
    }
    apply_delta(quest, index, delta)
}

fn apply_delta(quest: &mut Quest, index: usize, delta: u32) -> ObjectiveResult {
    let objective = &mut quest.objectives[index];
    if objective.completed {
        return ObjectiveResult::skipped(objective.progress, objective.required);
    }
    let crossed = objective.increment_progress(delta);
    let (progress, required) = (objective.progress, objective.required);
    ObjectiveResult {
        applied: true,
        progress,
        required,
        objective_completed: crossed,
        quest_completed: crossed && quest.all_objectives_complete(),
    }
}

/// Apply `delta` to every incomplete objective of every Active quest that
/// the matcher selects, collecting the applied updates in order.
fn apply_matching<F>(repo: &mut QuestRepository, delta: u32, matcher: F) -> Vec<TrackerOutcome>
where
    F: Fn(&Objective) -> bool,
{
    let mut outcomes = Vec::new();
    for quest in repo.quests_mut() {
        if quest.status != QuestStatus::Active {
            continue;
        }
        let indices: Vec<usize> = quest
            .objectives
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.completed && matcher(o))
            .map(|(i, _)| i)
            .collect();
        for index in indices {
            let result = apply_delta(quest, index, delta);
            if result.applied {
                let objective = &quest.objectives[index];
                outcomes.push(TrackerOutcome {
                    quest_id: quest.id.clone(),
                    objective_id: objective.id.clone(),
                    description: objective.description.clone(),
                    result,
                });
            }
        }
    }
    outcomes
}

pub fn apply_item_collected(
    repo: &mut QuestRepository,
    item_id: &str,
    amount: u32,
) -> Vec<TrackerOutcome> {
    apply_matching(repo, amount, |o| {
        matches!(&o.kind, ObjectiveKind::CollectItems { item_id: id } if id == item_id)
    })
}

pub fn apply_enemy_killed(
    repo: &mut QuestRepository,
    enemy_type: &str,
    count: u32,
) -> Vec<TrackerOutcome> {
    apply_matching(repo, count, |o| {
        matches!(&o.kind, ObjectiveKind::KillEnemies { enemy_type: ty } if ty == enemy_type)
    })
}

/// NPC talk: the npc id must match; an objective with a `dialogue_id` set
/// additionally requires the incoming dialogue to match it exactly.
pub fn apply_npc_talked_to(
    repo: &mut QuestRepository,
    npc_id: &str,
    dialogue_id: Option<&str>,
) -> Vec<TrackerOutcome> {
    apply_matching(repo, 1, |o| match &o.kind {
        ObjectiveKind::TalkToNpc {
            npc_id: id,
            dialogue_id: wanted,
        } => {
            id == npc_id
                && match wanted {
                    Some(wanted) => dialogue_id == Some(wanted.as_str()),
                    None => true,
                }
        }
        _ => false,
    })
}

/// Location reach: matches objectives whose target is within `radius` of
/// the reported position.
pub fn apply_location_reached(repo: &mut QuestRepository, position: Position) -> Vec<TrackerOutcome> {
    apply_matching(repo, 1, |o| {
        matches!(&o.kind, ObjectiveKind::ReachLocation { target, radius, .. }
            if position.distance_to(target) <= *radius)
    })
}

/// Area entry: matches location objectives bound to the named area.
pub fn apply_area_entered(repo: &mut QuestRepository, area_id: &str) -> Vec<TrackerOutcome> {
    apply_matching(repo, 1, |o| {
        matches!(&o.kind, ObjectiveKind::ReachLocation { area_id: Some(area), .. }
            if area == area_id)
    })
}

/// Object interaction: the object id must match; an objective with an
/// `action` set additionally requires the incoming action to match.
pub fn apply_object_interacted(
    repo: &mut QuestRepository,
    object_id: &str,
    action: Option<&str>,
) -> Vec<TrackerOutcome> {
    apply_matching(repo, 1, |o| match &o.kind {
        ObjectiveKind::InteractWithObject {
            object_id: id,
            action: wanted,
        } => {
            id == object_id
                && match wanted {
                    Some(wanted) => action == Some(wanted.as_str()),
                    None => true,
                }
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SnapshotStoreBuilder;

    fn repo_from(quests: Vec<Quest>) -> QuestRepository {
        let store = SnapshotStoreBuilder::new("unused")
            .temporary()
            .open()
            .expect("store");
        QuestRepository::open(quests, store)
    }

    fn quest_with(id: &str, objectives: Vec<Objective>) -> Quest {
        let mut quest = Quest::new(id, id, "test quest");
        quest.objectives = objectives;
        quest
    }

    fn activate(repo: &mut QuestRepository, id: &str) {
        repo.quest_mut(id).expect("quest").status = QuestStatus::Active;
    }

    #[test]
    fn progress_clamps_at_required() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![Objective::new(
                "drills",
                "Run the drills",
                ObjectiveKind::Custom,
                3,
            )],
        )]);
        activate(&mut repo, "q");
        let result = apply_progress(&mut repo, "q", "drills", 10);
        assert!(result.applied);
        assert_eq!(result.progress, 3);
        assert!(result.objective_completed);
    }

    #[test]
    fn inactive_quest_is_skipped() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![
                Objective::new("drills", "Run the drills", ObjectiveKind::Custom, 3),
                Objective::new(
                    "gather",
                    "Gather iron",
                    ObjectiveKind::CollectItems {
                        item_id: "iron".to_string(),
                    },
                    3,
                ),
            ],
        )]);
        // open() normalizes status; the quest is Available, not Active.
        let result = apply_progress(&mut repo, "q", "drills", 1);
        assert!(!result.applied);
        assert_eq!(repo.quest("q").unwrap().objective("drills").unwrap().progress, 0);

        let outcomes = apply_item_collected(&mut repo, "iron", 1);
        assert!(outcomes.is_empty());
    }

    #[test]
    fn completed_objective_is_not_reapplied() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![
                Objective::new("ritual", "Perform the rite", ObjectiveKind::Custom, 1),
                Objective::new("extra", "Side goal", ObjectiveKind::Custom, 5),
            ],
        )]);
        activate(&mut repo, "q");
        let first = apply_progress(&mut repo, "q", "ritual", 1);
        assert!(first.objective_completed);
        assert!(!first.quest_completed);

        let second = apply_progress(&mut repo, "q", "ritual", 1);
        assert!(!second.applied);
        assert!(!second.objective_completed);
        assert_eq!(second.progress, 1);
    }

    #[test]
    fn direct_updates_refuse_typed_objectives() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![Objective::new(
                "gather",
                "Gather widgets",
                ObjectiveKind::CollectItems {
                    item_id: "widget".to_string(),
                },
                3,
            )],
        )]);
        activate(&mut repo, "q");

        let result = apply_progress(&mut repo, "q", "gather", 2);
        assert!(!result.applied);
        assert_eq!(repo.quest("q").unwrap().objective("gather").unwrap().progress, 0);

        // The matching game event remains the only way to advance it
        let outcomes = apply_item_collected(&mut repo, "widget", 2);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].result.progress, 2);
    }

    #[test]
    fn unknown_ids_no_op() {
        let mut repo = repo_from(vec![]);
        let result = apply_progress(&mut repo, "missing", "none", 1);
        assert!(!result.applied);
        assert!(!result.objective_completed);
    }

    #[test]
    fn item_dispatch_matches_by_id() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![
                Objective::new(
                    "iron",
                    "Gather iron",
                    ObjectiveKind::CollectItems {
                        item_id: "iron".to_string(),
                    },
                    2,
                ),
                Objective::new(
                    "wood",
                    "Gather wood",
                    ObjectiveKind::CollectItems {
                        item_id: "wood".to_string(),
                    },
                    2,
                ),
            ],
        )]);
        activate(&mut repo, "q");
        let outcomes = apply_item_collected(&mut repo, "iron", 1);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].objective_id, "iron");
        assert_eq!(repo.quest("q").unwrap().objective("wood").unwrap().progress, 0);
    }

    #[test]
    fn npc_dialogue_must_match_when_set() {
        let strict = Objective::new(
            "strict",
            "Hear the warning",
            ObjectiveKind::TalkToNpc {
                npc_id: "old_woman".to_string(),
                dialogue_id: Some("warning".to_string()),
            },
            1,
        );
        let lax = Objective::new(
            "lax",
            "Meet the merchant",
            ObjectiveKind::TalkToNpc {
                npc_id: "merchant".to_string(),
                dialogue_id: None,
            },
            1,
        );
        let mut repo = repo_from(vec![quest_with("q", vec![strict, lax])]);
        activate(&mut repo, "q");

        let outcomes = apply_npc_talked_to(&mut repo, "old_woman", Some("smalltalk"));
        assert!(outcomes.is_empty());
        let outcomes = apply_npc_talked_to(&mut repo, "old_woman", None);
        assert!(outcomes.is_empty());
        let outcomes = apply_npc_talked_to(&mut repo, "old_woman", Some("warning"));
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.objective_completed);

        // No dialogue constraint accepts any dialogue, including none.
        let outcomes = apply_npc_talked_to(&mut repo, "merchant", None);
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn location_dispatch_uses_radius() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![Objective::new(
                "exit",
                "Reach the forest exit",
                ObjectiveKind::ReachLocation {
                    target: Position::new(50.0, 0.0, 100.0),
                    radius: 5.0,
                    area_id: None,
                },
                1,
            )],
        )]);
        activate(&mut repo, "q");

        let outcomes = apply_location_reached(&mut repo, Position::new(0.0, 0.0, 0.0));
        assert!(outcomes.is_empty());
        let outcomes = apply_location_reached(&mut repo, Position::new(52.0, 0.0, 101.0));
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.objective_completed);
    }

    #[test]
    fn area_entry_matches_bound_objectives() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![Objective::new(
                "tower",
                "Enter the library tower",
                ObjectiveKind::ReachLocation {
                    target: Position::new(200.0, 0.0, 200.0),
                    radius: 5.0,
                    area_id: Some("library_tower".to_string()),
                },
                1,
            )],
        )]);
        activate(&mut repo, "q");

        assert!(apply_area_entered(&mut repo, "crypt").is_empty());
        let outcomes = apply_area_entered(&mut repo, "library_tower");
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn interaction_action_must_match_when_set() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![Objective::new(
                "archive",
                "Open the archive door",
                ObjectiveKind::InteractWithObject {
                    object_id: "archive_door".to_string(),
                    action: Some("open".to_string()),
                },
                1,
            )],
        )]);
        activate(&mut repo, "q");

        assert!(apply_object_interacted(&mut repo, "archive_door", Some("close")).is_empty());
        assert!(apply_object_interacted(&mut repo, "archive_door", None).is_empty());
        let outcomes = apply_object_interacted(&mut repo, "archive_door", Some("open"));
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn quest_completed_fires_on_last_objective_only() {
        let mut repo = repo_from(vec![quest_with(
            "q",
            vec![
                Objective::new(
                    "first",
                    "First iron",
                    ObjectiveKind::CollectItems {
                        item_id: "iron".to_string(),
                    },
                    1,
                ),
                Objective::new(
                    "second",
                    "More iron",
                    ObjectiveKind::CollectItems {
                        item_id: "iron".to_string(),
                    },
                    2,
                ),
            ],
        )]);
        activate(&mut repo, "q");

        let outcomes = apply_item_collected(&mut repo, "iron", 1);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.objective_completed);
        assert!(!outcomes[0].result.quest_completed);
        assert!(!outcomes[1].result.objective_completed);

        let outcomes = apply_item_collected(&mut repo, "iron", 1);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.objective_completed);
        assert!(outcomes[0].result.quest_completed);
    }
}

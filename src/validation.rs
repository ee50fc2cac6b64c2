//! Catalog validation.
//!
//! Detects authoring mistakes at catalog-validate time and reports every
//! violation per offending quest instead of stopping at the first. A quest
//! with issues still loads; validation never prevents unaffected quests
//! from working.

use std::collections::HashSet;

use crate::repository::QuestRepository;
use crate::resolver;
use crate::types::{ObjectiveKind, Quest};

/// All problems found on one catalog quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub quest_id: String,
    pub problems: Vec<String>,
}

/// Validate the whole catalog, aggregating problems per quest.
pub fn validate_catalog(repo: &QuestRepository) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for quest in repo.quests() {
        let mut problems = Vec::new();

        if quest.id.is_empty() {
            problems.push("empty quest id".to_string());
        } else if !seen_ids.insert(quest.id.as_str()) {
            problems.push("duplicate quest id".to_string());
        }
        if quest.title.is_empty() {
            problems.push("empty title".to_string());
        }
        if quest.objectives.is_empty() {
            problems.push("no objectives".to_string());
        }

        validate_objectives(quest, &mut problems);

        for prereq_id in &quest.prerequisites {
            if !repo.contains(prereq_id) {
                problems.push(format!("unknown prerequisite: {prereq_id}"));
            }
        }
        if resolver::has_circular_dependency(repo, &quest.id) {
            problems.push("part of a dependency cycle".to_string());
        }

        if !problems.is_empty() {
            issues.push(CatalogIssue {
                quest_id: quest.id.clone(),
                problems,
            });
        }
    }
    issues
}

fn validate_objectives(quest: &Quest, problems: &mut Vec<String>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for objective in &quest.objectives {
        let oid = objective.id.as_str();
        if oid.is_empty() {
            problems.push("objective with empty id".to_string());
        } else if !seen.insert(oid) {
            problems.push(format!("duplicate objective id: {oid}"));
        }
        if objective.description.is_empty() {
            problems.push(format!("objective {oid}: empty description"));
        }
        if objective.required == 0 {
            problems.push(format!("objective {oid}: required progress must be positive"));
        }
        match &objective.kind {
            ObjectiveKind::CollectItems { item_id } => {
                if item_id.is_empty() {
                    problems.push(format!("objective {oid}: empty item_id"));
                }
            }
            ObjectiveKind::KillEnemies { enemy_type } => {
                if enemy_type.is_empty() {
                    problems.push(format!("objective {oid}: empty enemy_type"));
                }
            }
            ObjectiveKind::TalkToNpc { npc_id, .. } => {
                if npc_id.is_empty() {
                    problems.push(format!("objective {oid}: empty npc_id"));
                }
            }
            ObjectiveKind::InteractWithObject { object_id, .. } => {
                if object_id.is_empty() {
                    problems.push(format!("objective {oid}: empty object_id"));
                }
            }
            ObjectiveKind::ReachLocation {
                radius, area_id, ..
            } => {
                if *radius <= 0.0 {
                    problems.push(format!("objective {oid}: radius must be positive"));
                }
                if matches!(area_id, Some(area) if area.is_empty()) {
                    problems.push(format!("objective {oid}: empty area_id"));
                }
            }
            ObjectiveKind::Custom => {}
        }
    }
}

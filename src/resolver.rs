//! Dependency graph algorithms over prerequisite edges.
//!
//! Free functions over the repository: reachability of the Completed
//! requirement, cycle detection, topological chain construction and depth.
//! Nothing here mutates quest state.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::logutil::escape_log;
use crate::repository::QuestRepository;
use crate::types::{Quest, QuestStatus};

/// True iff every prerequisite id resolves to a catalog quest whose status
/// is Completed. A dangling prerequisite yields false, never a panic.
pub fn prerequisites_met(repo: &QuestRepository, quest: &Quest) -> bool {
    for prereq_id in &quest.prerequisites {
        let Some(prereq) = repo.quest(prereq_id) else {
            warn!(
                "prerequisite {} not found for quest {}",
                escape_log(prereq_id),
                escape_log(&quest.id)
            );
            return false;
        };
        if prereq.status != QuestStatus::Completed {
            return false;
        }
    }
    true
}

/// Every catalog quest that lists `quest_id` among its prerequisites.
pub fn dependent_quests<'a>(repo: &'a QuestRepository, quest_id: &str) -> Vec<&'a Quest> {
    repo.quests()
        .iter()
        .filter(|q| q.prerequisites.iter().any(|p| p == quest_id))
        .collect()
}

/// The resolved prerequisite quests, skipping dangling ids.
pub fn prerequisite_quests<'a>(repo: &'a QuestRepository, quest: &Quest) -> Vec<&'a Quest> {
    quest
        .prerequisites
        .iter()
        .filter_map(|id| repo.quest(id))
        .collect()
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Detects whether a dependency cycle is reachable from `quest_id`.
///
/// Iterative three-color DFS over an index-based adjacency list: gray marks
/// the path currently being explored, black marks finished subtrees, and an
/// edge into a gray node is a back-edge. Dangling prerequisites simply have
/// no edge. Unknown start ids report no cycle.
pub fn has_circular_dependency(repo: &QuestRepository, quest_id: &str) -> bool {
    let quests = repo.quests();
    let index: HashMap<&str, usize> = quests
        .iter()
        .enumerate()
        .map(|(i, q)| (q.id.as_str(), i))
        .collect();
    let Some(&start) = index.get(quest_id) else {
        return false;
    };
    let edges: Vec<Vec<usize>> = quests
        .iter()
        .map(|q| {
            q.prerequisites
                .iter()
                .filter_map(|p| index.get(p.as_str()).copied())
                .collect()
        })
        .collect();

    let mut color = vec![Color::White; quests.len()];
    color[start] = Color::Gray;
    // Each frame is (node, next outgoing edge to try).
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    while let Some((node, edge_idx)) = stack.pop() {
        if let Some(&next) = edges[node].get(edge_idx) {
            stack.push((node, edge_idx + 1));
            match color[next] {
                Color::Gray => return true,
                Color::White => {
                    color[next] = Color::Gray;
                    stack.push((next, 0));
                }
                Color::Black => {}
            }
        } else {
            color[node] = Color::Black;
        }
    }
    false
}

/// Post-order chain of quest ids leading to (and ending with) `quest_id`:
/// each quest appears after all of its prerequisites, deduplicated. Suited
/// for "quests leading to X" displays.
pub fn quest_chain(repo: &QuestRepository, quest_id: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    build_chain(repo, quest_id, &mut chain, &mut visited);
    chain
}

fn build_chain(
    repo: &QuestRepository,
    quest_id: &str,
    chain: &mut Vec<String>,
    visited: &mut HashSet<String>,
) {
    if visited.contains(quest_id) {
        return;
    }
    let Some(quest) = repo.quest(quest_id) else {
        return;
    };
    visited.insert(quest_id.to_string());
    for prereq_id in &quest.prerequisites {
        build_chain(repo, prereq_id, chain, visited);
    }
    chain.push(quest.id.clone());
}

/// Length of the longest prerequisite path below `quest_id`: 0 for no
/// prerequisites or an unknown id, else 1 + the maximum over prerequisites.
/// A visited guard keeps malformed (cyclic) catalogs from recursing forever;
/// validation reports the cycle itself separately.
pub fn quest_depth(repo: &QuestRepository, quest_id: &str) -> usize {
    let mut visiting = HashSet::new();
    depth_inner(repo, quest_id, &mut visiting)
}

fn depth_inner(repo: &QuestRepository, quest_id: &str, visiting: &mut HashSet<String>) -> usize {
    let Some(quest) = repo.quest(quest_id) else {
        return 0;
    };
    if quest.prerequisites.is_empty() {
        return 0;
    }
    if !visiting.insert(quest_id.to_string()) {
        return 0;
    }
    let max = quest
        .prerequisites
        .iter()
        .map(|p| depth_inner(repo, p, visiting) + 1)
        .max()
        .unwrap_or(0);
    visiting.remove(quest_id);
    max
}

/// Checks every quest's prerequisite ids for existence and the graph for
/// cycles, logging each violation instead of stopping at the first.
pub fn validate_all_dependencies(repo: &QuestRepository) -> bool {
    let mut valid = true;
    for quest in repo.quests() {
        for prereq_id in &quest.prerequisites {
            if !repo.contains(prereq_id) {
                warn!(
                    "quest {} has unknown prerequisite: {}",
                    escape_log(&quest.id),
                    escape_log(prereq_id)
                );
                valid = false;
            }
        }
        if has_circular_dependency(repo, &quest.id) {
            warn!(
                "circular dependency detected from quest: {}",
                escape_log(&quest.id)
            );
            valid = false;
        }
    }
    valid
}

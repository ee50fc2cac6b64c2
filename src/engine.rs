//! Quest lifecycle orchestration.
//!
//! The engine owns the merged catalog (through the repository), the
//! active-quest set, and the outbound event bus. Every mutating entry
//! point runs to completion on the calling thread: progress application,
//! state transitions, persistence, and event delivery all happen inline
//! before control returns. Persistence failures are logged and the
//! in-memory state stays authoritative.

use chrono::Utc;
use log::{debug, info, warn};

use crate::events::{EventBus, GameEvent, QuestEvent, SubscriptionId};
use crate::logutil::escape_log;
use crate::repository::QuestRepository;
use crate::resolver;
use crate::tracker::{self, ObjectiveResult, TrackerOutcome};
use crate::types::{Quest, QuestStatus, Reward};
use crate::validation;

/// The quest state machine over a repository of definitions and progress.
pub struct QuestEngine {
    repository: QuestRepository,
    bus: EventBus,
    active: Vec<String>,
}

impl QuestEngine {
    /// Build the engine, rebuild the active set from persisted statuses,
    /// and run the initial availability sweep. Catalog issues are logged
    /// but never prevent construction.
    pub fn new(repository: QuestRepository) -> Self {
        let mut engine = Self {
            repository,
            bus: EventBus::new(),
            active: Vec::new(),
        };
        for issue in validation::validate_catalog(&engine.repository) {
            warn!(
                "catalog issue for {}: {}",
                escape_log(&issue.quest_id),
                issue.problems.join("; ")
            );
        }
        engine.load_active_quests();
        engine.availability_sweep();
        engine
    }

    fn load_active_quests(&mut self) {
        self.active = self
            .repository
            .quests()
            .iter()
            .filter(|q| q.status == QuestStatus::Active)
            .map(|q| q.id.clone())
            .collect();
        debug!("loaded {} active quests", self.active.len());
    }

    /// Start an Available quest. Returns false (and only logs) when the
    /// quest is unknown, not Available, already active, or its
    /// prerequisites are no longer met; state is untouched in every
    /// failure case.
    pub fn start_quest(&mut self, quest_id: &str) -> bool {
        {
            let Some(quest) = self.repository.quest(quest_id) else {
                warn!("cannot start unknown quest: {}", escape_log(quest_id));
                return false;
            };
            if quest.status != QuestStatus::Available {
                debug!(
                    "cannot start quest {}: status is {}",
                    escape_log(quest_id),
                    quest.status.as_str()
                );
                return false;
            }
            if self.active.iter().any(|id| id == quest_id) {
                debug!("quest already active: {}", escape_log(quest_id));
                return false;
            }
            if !resolver::prerequisites_met(&self.repository, quest) {
                debug!(
                    "cannot start quest {}: prerequisites not met",
                    escape_log(quest_id)
                );
                return false;
            }
        }

        let Some(quest) = self.repository.quest_mut(quest_id) else {
            return false;
        };
        quest.status = QuestStatus::Active;
        let title = quest.title.clone();
        self.active.push(quest_id.to_string());
        self.persist();
        self.bus.publish(&QuestEvent::QuestStarted {
            quest_id: quest_id.to_string(),
            title,
        });
        info!("started quest: {}", escape_log(quest_id));
        true
    }

    /// Complete an active quest regardless of objective state. Returns
    /// false when the quest is not in the active set.
    pub fn complete_quest(&mut self, quest_id: &str) -> bool {
        if !self.active.iter().any(|id| id == quest_id) {
            debug!(
                "complete requested for non-active quest: {}",
                escape_log(quest_id)
            );
            return false;
        }
        self.finish_quest(quest_id);
        true
    }

    /// Fail an active quest. Returns false when the quest is not in the
    /// active set. Failed is terminal; there is no retry transition.
    pub fn fail_quest(&mut self, quest_id: &str) -> bool {
        if !self.active.iter().any(|id| id == quest_id) {
            debug!(
                "fail requested for non-active quest: {}",
                escape_log(quest_id)
            );
            return false;
        }
        let Some(quest) = self.repository.quest_mut(quest_id) else {
            return false;
        };
        quest.status = QuestStatus::Failed;
        let title = quest.title.clone();
        self.active.retain(|id| id != quest_id);
        self.persist();
        self.bus.publish(&QuestEvent::QuestFailed {
            quest_id: quest_id.to_string(),
            title,
        });
        info!("failed quest: {}", escape_log(quest_id));
        true
    }

    /// Feed one gameplay event through the tracker and run any resulting
    /// completion flows before returning.
    pub fn handle_event(&mut self, event: &GameEvent) {
        debug!("game event: {:?}", event);
        let outcomes = match event {
            GameEvent::ItemCollected { item_id, amount } => {
                tracker::apply_item_collected(&mut self.repository, item_id, *amount)
            }
            GameEvent::EnemyKilled { enemy_type, count } => {
                tracker::apply_enemy_killed(&mut self.repository, enemy_type, *count)
            }
            GameEvent::NpcTalkedTo {
                npc_id,
                dialogue_id,
            } => tracker::apply_npc_talked_to(&mut self.repository, npc_id, dialogue_id.as_deref()),
            GameEvent::LocationReached { position } => {
                tracker::apply_location_reached(&mut self.repository, *position)
            }
            GameEvent::AreaEntered { area_id } => {
                tracker::apply_area_entered(&mut self.repository, area_id)
            }
            GameEvent::ObjectInteracted { object_id, action } => {
                tracker::apply_object_interacted(&mut self.repository, object_id, action.as_deref())
            }
        };
        self.process_outcomes(outcomes);
    }

    fn process_outcomes(&mut self, outcomes: Vec<TrackerOutcome>) {
        if outcomes.is_empty() {
            return;
        }
        self.persist();
        for outcome in outcomes {
            if !outcome.result.objective_completed {
                continue;
            }
            info!(
                "objective {} completed in quest {}",
                escape_log(&outcome.objective_id),
                escape_log(&outcome.quest_id)
            );
            self.bus.publish(&QuestEvent::ObjectiveCompleted {
                quest_id: outcome.quest_id.clone(),
                objective_id: outcome.objective_id.clone(),
                description: outcome.description.clone(),
            });
            if outcome.result.quest_completed {
                self.bus.publish(&QuestEvent::AllObjectivesCompleted {
                    quest_id: outcome.quest_id.clone(),
                });
                self.finish_quest(&outcome.quest_id);
            }
        }
    }

    /// Apply progress to one `Custom` objective addressed directly, outside
    /// the gameplay-event dispatch. Used for free-form integrations such as
    /// dialogue completion. Typed objectives are refused here; they only
    /// advance through their matching game events.
    pub fn update_custom_objective(
        &mut self,
        quest_id: &str,
        objective_id: &str,
        amount: u32,
    ) -> ObjectiveResult {
        let result = tracker::apply_progress(&mut self.repository, quest_id, objective_id, amount);
        if !result.applied {
            return result;
        }
        self.persist();
        if result.objective_completed {
            let description = self
                .repository
                .quest(quest_id)
                .and_then(|q| q.objective(objective_id))
                .map(|o| o.description.clone())
                .unwrap_or_default();
            info!(
                "objective {} completed in quest {}",
                escape_log(objective_id),
                escape_log(quest_id)
            );
            self.bus.publish(&QuestEvent::ObjectiveCompleted {
                quest_id: quest_id.to_string(),
                objective_id: objective_id.to_string(),
                description,
            });
            if result.quest_completed {
                self.bus.publish(&QuestEvent::AllObjectivesCompleted {
                    quest_id: quest_id.to_string(),
                });
                self.finish_quest(quest_id);
            }
        }
        result
    }

    /// Shared completion routine: timestamp, active-set removal, persist,
    /// reward, QuestCompleted, then the availability sweep.
    fn finish_quest(&mut self, quest_id: &str) {
        let Some(quest) = self.repository.quest_mut(quest_id) else {
            return;
        };
        quest.status = QuestStatus::Completed;
        quest.completed_at = Some(Utc::now());
        let title = quest.title.clone();
        let reward = quest.reward.clone();
        self.active.retain(|id| id != quest_id);
        self.persist();
        if let Some(reward) = reward.as_ref().filter(|r| !r.is_empty()) {
            self.issue_reward(quest_id, reward);
        }
        self.bus.publish(&QuestEvent::QuestCompleted {
            quest_id: quest_id.to_string(),
            title,
            reward,
        });
        info!("completed quest: {}", escape_log(quest_id));
        self.availability_sweep();
    }

    /// Reward application is a collaborator concern; the engine logs the
    /// grant and carries the payload in the QuestCompleted event.
    fn issue_reward(&self, quest_id: &str, reward: &Reward) {
        info!(
            "reward for {}: {} xp, {} currency, {} item grants",
            escape_log(quest_id),
            reward.experience,
            reward.currency,
            reward.items.len()
        );
    }

    /// Promote every Locked quest whose prerequisites are now Completed.
    /// Runs over the entire catalog; each unlock persists and publishes.
    fn availability_sweep(&mut self) {
        let newly_available: Vec<String> = self
            .repository
            .quests()
            .iter()
            .filter(|q| {
                q.status == QuestStatus::Locked && resolver::prerequisites_met(&self.repository, q)
            })
            .map(|q| q.id.clone())
            .collect();
        for quest_id in newly_available {
            let Some(quest) = self.repository.quest_mut(&quest_id) else {
                continue;
            };
            quest.status = QuestStatus::Available;
            let title = quest.title.clone();
            self.persist();
            self.bus.publish(&QuestEvent::QuestUnlocked {
                quest_id: quest_id.clone(),
                title,
            });
            info!("unlocked quest: {}", escape_log(&quest_id));
        }
    }

    /// Reset all progress: statuses recomputed from prerequisite
    /// cardinality, counters cleared, snapshot rewritten.
    pub fn reset(&mut self) {
        if let Err(err) = self.repository.reset() {
            warn!("failed to persist quest reset: {err}");
        }
        self.active.clear();
        self.availability_sweep();
        info!("quest progress reset");
    }

    /// Complete every currently active quest through the normal
    /// completion routine. Debug helper.
    pub fn complete_active_quests(&mut self) {
        for quest_id in self.active.clone() {
            self.complete_quest(&quest_id);
        }
    }

    fn persist(&self) {
        if let Err(err) = self.repository.save() {
            warn!("failed to persist quest progress: {err}");
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&QuestEvent) + 'static,
    {
        self.bus.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn repository(&self) -> &QuestRepository {
        &self.repository
    }

    pub fn quest(&self, quest_id: &str) -> Option<&Quest> {
        self.repository.quest(quest_id)
    }

    pub fn quests(&self) -> &[Quest] {
        self.repository.quests()
    }

    /// Active quests in the order they were started.
    pub fn active_quests(&self) -> Vec<&Quest> {
        self.active
            .iter()
            .filter_map(|id| self.repository.quest(id))
            .collect()
    }

    pub fn available_quests(&self) -> Vec<&Quest> {
        self.repository
            .quests()
            .iter()
            .filter(|q| q.status == QuestStatus::Available)
            .collect()
    }

    pub fn completed_quests(&self) -> Vec<&Quest> {
        self.repository
            .quests()
            .iter()
            .filter(|q| q.status == QuestStatus::Completed)
            .collect()
    }

    pub fn is_quest_active(&self, quest_id: &str) -> bool {
        self.active.iter().any(|id| id == quest_id)
    }

    pub fn is_quest_completed(&self, quest_id: &str) -> bool {
        self.repository
            .quest(quest_id)
            .map(|q| q.status == QuestStatus::Completed)
            .unwrap_or(false)
    }
}

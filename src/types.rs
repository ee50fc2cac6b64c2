use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SNAPSHOT_SCHEMA_VERSION: u8 = 1;

/// Lifecycle state of a quest.
///
/// `Completed` and `Failed` are terminal; every transition between the
/// remaining states goes through [`crate::engine::QuestEngine`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Prerequisites not yet met
    Locked,
    /// Prerequisites met, can be started
    Available,
    /// Started and in progress
    Active,
    /// Finished successfully
    Completed,
    /// Failed or abandoned
    Failed,
}

impl Default for QuestStatus {
    fn default() -> Self {
        Self::Locked
    }
}

impl QuestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Available => "available",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// A point in world space, used by location objectives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// What an objective requires, with the parameters fixed per kind.
///
/// Parameters are resolved once at catalog load; progress checks match on
/// the variant instead of looking values up by string key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Collect a specific item
    CollectItems { item_id: String },
    /// Defeat a specific enemy type
    KillEnemies { enemy_type: String },
    /// Reach a point in the world; `area_id` additionally accepts a named
    /// area-trigger event
    ReachLocation {
        target: Position,
        radius: f32,
        #[serde(default)]
        area_id: Option<String>,
    },
    /// Talk to a specific NPC; when `dialogue_id` is set the incoming
    /// dialogue must match it exactly
    TalkToNpc {
        npc_id: String,
        #[serde(default)]
        dialogue_id: Option<String>,
    },
    /// Interact with a world object; when `action` is set the incoming
    /// action must match it exactly
    InteractWithObject {
        object_id: String,
        #[serde(default)]
        action: Option<String>,
    },
    /// Driven directly by quest/objective id, not by gameplay events
    Custom,
}

impl ObjectiveKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CollectItems { .. } => "collect_items",
            Self::KillEnemies { .. } => "kill_enemies",
            Self::ReachLocation { .. } => "reach_location",
            Self::TalkToNpc { .. } => "talk_to_npc",
            Self::InteractWithObject { .. } => "interact_with_object",
            Self::Custom => "custom",
        }
    }
}

/// A measurable sub-goal of a quest.
///
/// Invariant: `0 <= progress <= required` and `completed` holds exactly
/// when `progress` has reached `required`. Identity (id, kind, required)
/// is fixed at catalog load; only `progress` and `completed` mutate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Objective {
    pub id: String,
    pub description: String,
    pub kind: ObjectiveKind,
    #[serde(default)]
    pub progress: u32,
    pub required: u32,
    #[serde(default)]
    pub completed: bool,
}

impl Objective {
    pub fn new(id: &str, description: &str, kind: ObjectiveKind, required: u32) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            kind,
            progress: 0,
            required,
            completed: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Adds progress, clamped at `required`, and updates the completion
    /// flag. Returns true when this call crossed the threshold.
    pub fn increment_progress(&mut self, amount: u32) -> bool {
        let was_complete = self.completed;
        self.progress = self.progress.saturating_add(amount).min(self.required);
        self.completed = self.progress >= self.required;
        self.completed && !was_complete
    }

    pub fn reset(&mut self) {
        self.progress = 0;
        self.completed = false;
    }
}

/// One item grant within a reward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemGrant {
    pub item_id: String,
    pub quantity: u32,
}

/// Inert reward value, applied exactly once on quest completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reward {
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub currency: u32,
    #[serde(default)]
    pub items: Vec<ItemGrant>,
}

impl Default for Reward {
    fn default() -> Self {
        Self {
            experience: 0,
            currency: 0,
            items: Vec::new(),
        }
    }
}

impl Reward {
    pub fn new(experience: u32, currency: u32) -> Self {
        Self {
            experience,
            currency,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item_id: &str, quantity: u32) -> Self {
        self.items.push(ItemGrant {
            item_id: item_id.to_string(),
            quantity,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.experience == 0 && self.currency == 0 && self.items.is_empty()
    }
}

fn default_created_at() -> DateTime<Utc> {
    Utc::now()
}

/// A quest definition merged with its mutable progress state.
///
/// Definitions (title, prerequisites, objective identities, reward) come
/// from the catalog; status, objective progress and timestamps are the
/// mutable part round-tripped through the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: QuestStatus,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub reward: Option<Reward>,
    #[serde(default = "default_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Quest {
    pub fn new(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            status: QuestStatus::Locked,
            prerequisites: Vec::new(),
            objectives: Vec::new(),
            reward: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_prerequisite(mut self, quest_id: &str) -> Self {
        self.prerequisites.push(quest_id.to_string());
        self
    }

    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.reward = Some(reward);
        self
    }

    pub fn objective(&self, objective_id: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == objective_id)
    }

    pub fn objective_mut(&mut self, objective_id: &str) -> Option<&mut Objective> {
        self.objectives.iter_mut().find(|o| o.id == objective_id)
    }

    pub fn all_objectives_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.is_complete())
    }

    /// (complete, total) objective counts, for display.
    pub fn objective_counts(&self) -> (usize, usize) {
        let complete = self.objectives.iter().filter(|o| o.is_complete()).count();
        (complete, self.objectives.len())
    }
}

/// Per-quest slice of the persisted snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressRecord {
    pub quest_id: String,
    pub status: QuestStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_objectives: Vec<String>,
    #[serde(default)]
    pub objective_progress: BTreeMap<String, u32>,
}

impl ProgressRecord {
    pub fn from_quest(quest: &Quest) -> Self {
        let completed_objectives = quest
            .objectives
            .iter()
            .filter(|o| o.is_complete())
            .map(|o| o.id.clone())
            .collect();
        let objective_progress = quest
            .objectives
            .iter()
            .map(|o| (o.id.clone(), o.progress))
            .collect();
        Self {
            quest_id: quest.id.clone(),
            status: quest.status,
            completed_at: quest.completed_at,
            completed_objectives,
            objective_progress,
        }
    }
}

/// The full persisted progress state.
///
/// Carries no save timestamp and keeps `objective_progress` in a
/// `BTreeMap`, so re-encoding an unchanged state yields identical bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressSnapshot {
    pub schema_version: u8,
    pub entries: Vec<ProgressRecord>,
}

impl ProgressSnapshot {
    pub fn new(entries: Vec<ProgressRecord>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            entries,
        }
    }
}

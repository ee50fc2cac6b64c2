//! Gameplay-facing event surfaces.
//!
//! `GameEvent` is the closed set of inbound occurrences the engine reacts
//! to; `QuestEvent` is the closed set of outbound lifecycle notifications.
//! Delivery is synchronous: `EventBus::publish` invokes every subscriber
//! inline, within the engine call that produced the event, so subscribers
//! must not assume deferred delivery.

use serde::{Deserialize, Serialize};

use crate::types::{Position, Reward};

/// A discrete gameplay occurrence fed into the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    ItemCollected {
        item_id: String,
        amount: u32,
    },
    EnemyKilled {
        enemy_type: String,
        count: u32,
    },
    NpcTalkedTo {
        npc_id: String,
        #[serde(default)]
        dialogue_id: Option<String>,
    },
    LocationReached {
        position: Position,
    },
    AreaEntered {
        area_id: String,
    },
    ObjectInteracted {
        object_id: String,
        #[serde(default)]
        action: Option<String>,
    },
}

/// A lifecycle notification published by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum QuestEvent {
    QuestUnlocked {
        quest_id: String,
        title: String,
    },
    QuestStarted {
        quest_id: String,
        title: String,
    },
    ObjectiveCompleted {
        quest_id: String,
        objective_id: String,
        description: String,
    },
    AllObjectivesCompleted {
        quest_id: String,
    },
    QuestCompleted {
        quest_id: String,
        title: String,
        reward: Option<Reward>,
    },
    QuestFailed {
        quest_id: String,
        title: String,
    },
}

pub type SubscriptionId = u64;

/// Synchronous publish/subscribe channel owned by the engine.
///
/// Subscribers are invoked in subscription order. Publishing happens
/// inline on the calling thread; there is no queueing.
#[derive(Default)]
pub struct EventBus {
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Box<dyn FnMut(&QuestEvent)>)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&QuestEvent) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, event: &QuestEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

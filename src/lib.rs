//! # Questline - Quest Dependency and Progress Engine
//!
//! Questline is a quest engine for games that need quest lines with prerequisites,
//! typed objectives driven by gameplay events, and save state that survives restarts.
//! It is synchronous and single-threaded; the host game calls into it from its own loop.
//!
//! ## Features
//!
//! - **Dependency Graphs**: Quests unlock when their prerequisites complete, with
//!   cycle detection, prerequisite chains, and depth queries over the graph.
//! - **Typed Objectives**: Collect, kill, reach, talk, and interact objectives that
//!   match incoming game events by their parameters, plus custom counters.
//! - **Lifecycle State Machine**: Locked, Available, Active, Completed, and Failed
//!   states with guarded transitions and automatic unlock sweeps.
//! - **Persistent Progress**: Sled-backed bincode snapshots of quest state, merged
//!   over the catalog on startup so saves survive catalog edits.
//! - **Synchronous Events**: Subscribers observe unlocks, objective completions,
//!   quest completions, and failures as they happen.
//! - **Data-Driven Content**: JSON quest catalogs with integrity validation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use questline::config::Config;
//! use questline::engine::QuestEngine;
//! use questline::events::GameEvent;
//! use questline::repository::QuestRepository;
//! use questline::seeds;
//! use questline::storage::SnapshotStoreBuilder;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml")?;
//!
//!     let store = SnapshotStoreBuilder::new(&config.engine.data_dir).open()?;
//!     let catalog = seeds::load_catalog_from_json(&config.engine.catalog_path)?;
//!     let mut engine = QuestEngine::new(QuestRepository::open(catalog, store));
//!
//!     engine.subscribe(|event| println!("{:?}", event));
//!     engine.start_quest("gather_supplies");
//!     engine.handle_event(&GameEvent::ItemCollected {
//!         item_id: "travel_supplies".to_string(),
//!         amount: 3,
//!     });
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - Quest lifecycle state machine and event fan-out
//! - [`resolver`] - Prerequisite checks, cycle detection, and quest chains
//! - [`tracker`] - Mapping from game events to objective progress
//! - [`repository`] - In-memory catalog merged with saved progress
//! - [`storage`] - Sled-backed snapshot persistence
//! - [`events`] - Game and quest event types plus the subscription bus
//! - [`types`] - Quests, objectives, rewards, and snapshot records
//! - [`validation`] - Catalog integrity checks
//! - [`seeds`] - Built-in starter catalog and JSON loaders
//! - [`config`] - Configuration management
//!
//! ## Architecture
//!
//! Game events flow through the engine top to bottom; quest events flow back out
//! to subscribers:
//!
//! ```text
//! ┌─────────────────┐
//! │  Quest Engine   │ ← Lifecycle transitions and event fan-out
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Resolver +    │ ← Dependency graph walks and
//! │   Tracker       │   objective progress rules
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Repository    │ ← Catalog merged with saved state
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │ Snapshot Store  │ ← Sled + bincode persistence
//! └─────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod logutil;
pub mod repository;
pub mod resolver;
pub mod seeds;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod validation;

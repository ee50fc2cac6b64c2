//! Binary entrypoint for the questline CLI.
//!
//! Commands:
//! - `init [--force]` - write a starter `config.toml`, quest catalog, and data directory
//! - `validate` - check the quest catalog for integrity problems
//! - `status` - print quest statuses and objective progress from the save
//! - `reset --yes` - wipe saved progress back to a fresh state
//! - `demo` - run a scripted quest walkthrough against a throwaway save
//!
//! See the library crate docs for module-level details: `questline::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::Path;

use questline::config::Config;
use questline::engine::QuestEngine;
use questline::events::{GameEvent, QuestEvent};
use questline::repository::QuestRepository;
use questline::seeds;
use questline::storage::SnapshotStoreBuilder;
use questline::types::QuestStatus;
use questline::validation::validate_catalog;

#[derive(Parser)]
#[command(name = "questline")]
#[command(about = "A quest dependency and progress engine with persistent saves")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter configuration, quest catalog, and data directory
    Init {
        /// Overwrite an existing configuration and catalog
        #[arg(short, long)]
        force: bool,
    },
    /// Check the quest catalog for integrity problems
    Validate,
    /// Show quest statuses and objective progress from the save
    Status,
    /// Wipe saved quest progress back to a fresh state
    Reset {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
    /// Run a scripted quest walkthrough against a throwaway save
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes it later)
    let pre_config = match cli.command {
        Commands::Init { .. } => None,
        _ => Config::load(&cli.config).ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init { force } => {
            if Path::new(&cli.config).exists() && !force {
                println!("{} already exists; use --force to overwrite.", cli.config);
                std::process::exit(1);
            }
            info!("Initializing questline configuration");
            Config::create_default(&cli.config)?;
            info!("Configuration file created at {}", cli.config);

            let cfg = Config::default();
            std::fs::create_dir_all(&cfg.engine.data_dir)?;
            if Path::new(&cfg.engine.catalog_path).exists() && !force {
                println!("{} already exists; keeping it.", cfg.engine.catalog_path);
            } else {
                seeds::write_starter_catalog(&cfg.engine.catalog_path)?;
                info!("Starter quest catalog written to {}", cfg.engine.catalog_path);
            }
            if force {
                // A forced re-init starts from a clean save as well
                let store = SnapshotStoreBuilder::new(&cfg.engine.data_dir).open()?;
                store.clear()?;
                info!("Cleared existing progress snapshot");
            }
            println!("Initialized. Run `questline status` to see the quest line.");
        }
        Commands::Validate => {
            let config = pre_config.unwrap_or(Config::load(&cli.config)?);
            let catalog = seeds::load_catalog_from_json(&config.engine.catalog_path)?;
            // A throwaway store keeps validation from touching the real save
            let store = SnapshotStoreBuilder::new(&config.engine.data_dir)
                .temporary()
                .open()?;
            let repository = QuestRepository::open(catalog, store);
            let issues = validate_catalog(&repository);
            if issues.is_empty() {
                println!(
                    "Catalog OK: {} quests, no issues.",
                    repository.quests().len()
                );
            } else {
                for issue in &issues {
                    for problem in &issue.problems {
                        println!("{}: {}", issue.quest_id, problem);
                    }
                }
                println!("{} quest(s) with issues.", issues.len());
                std::process::exit(1);
            }
        }
        Commands::Status => {
            let config = pre_config.unwrap_or(Config::load(&cli.config)?);
            let engine = open_engine(&config)?;
            print_status(&engine);
        }
        Commands::Reset { yes } => {
            if !yes {
                println!("This wipes all saved quest progress. Re-run with --yes to confirm.");
                std::process::exit(1);
            }
            let config = pre_config.unwrap_or(Config::load(&cli.config)?);
            let mut engine = open_engine(&config)?;
            engine.reset();
            info!("Saved quest progress wiped");
            println!(
                "Progress reset; {} quests back to their initial state.",
                engine.quests().len()
            );
        }
        Commands::Demo => {
            let store = SnapshotStoreBuilder::new("demo").temporary().open()?;
            let mut engine =
                QuestEngine::new(QuestRepository::open(seeds::starter_catalog(), store));
            engine.subscribe(print_quest_event);

            println!("Starting 'Gather Supplies'...");
            engine.start_quest("gather_supplies");
            engine.handle_event(&GameEvent::ItemCollected {
                item_id: "travel_supplies".to_string(),
                amount: 3,
            });

            println!("Starting 'Forge a Sword'...");
            engine.start_quest("forge_sword");
            engine.handle_event(&GameEvent::ItemCollected {
                item_id: "iron".to_string(),
                amount: 2,
            });
            engine.handle_event(&GameEvent::ItemCollected {
                item_id: "iron".to_string(),
                amount: 5, // overshoot; progress clamps at the requirement
            });
            engine.handle_event(&GameEvent::NpcTalkedTo {
                npc_id: "smith".to_string(),
                dialogue_id: None,
            });

            println!();
            print_status(&engine);
        }
    }

    Ok(())
}

fn open_engine(config: &Config) -> Result<QuestEngine> {
    let store = SnapshotStoreBuilder::new(&config.engine.data_dir).open()?;
    let catalog = seeds::load_catalog_from_json(&config.engine.catalog_path)?;
    Ok(QuestEngine::new(QuestRepository::open(catalog, store)))
}

fn print_status(engine: &QuestEngine) {
    let quests = engine.quests();
    println!(
        "Quest catalog: {} quests ({} active, {} completed)",
        quests.len(),
        engine.active_quests().len(),
        engine.completed_quests().len()
    );
    for quest in quests {
        let (done, total) = quest.objective_counts();
        println!(
            "  [{:>9}] {} ({}) - objectives {}/{}",
            quest.status.as_str(),
            quest.title,
            quest.id,
            done,
            total
        );
        if quest.status == QuestStatus::Active {
            for objective in &quest.objectives {
                println!(
                    "              {} [{}] {}/{}",
                    objective.description,
                    objective.kind.label(),
                    objective.progress,
                    objective.required
                );
            }
        }
    }
}

fn print_quest_event(event: &QuestEvent) {
    match event {
        QuestEvent::QuestUnlocked { quest_id, title } => {
            println!("  >> unlocked: {} ({})", title, quest_id);
        }
        QuestEvent::QuestStarted { quest_id, title } => {
            println!("  >> started: {} ({})", title, quest_id);
        }
        QuestEvent::ObjectiveCompleted {
            quest_id,
            objective_id,
            description,
        } => {
            println!(
                "  >> objective done: {} [{}/{}]",
                description, quest_id, objective_id
            );
        }
        QuestEvent::AllObjectivesCompleted { quest_id } => {
            println!("  >> all objectives done for {}", quest_id);
        }
        QuestEvent::QuestCompleted {
            quest_id,
            title,
            reward,
        } => match reward {
            Some(r) => println!(
                "  >> completed: {} ({}) - {} xp, {} currency, {} item grant(s)",
                title,
                quest_id,
                r.experience,
                r.currency,
                r.items.len()
            ),
            None => println!("  >> completed: {} ({})", title, quest_id),
        },
        QuestEvent::QuestFailed { quest_id, title } => {
            println!("  >> failed: {} ({})", title, quest_id);
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    if let Some(file) = config.as_ref().and_then(|c| c.logging.file.clone()) {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));

            // When stdout is a terminal, mirror log lines to the console as well
            let is_tty = atty::is(atty::Stream::Stdout);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        } else {
            builder.format(|fmt, record| {
                writeln!(
                    fmt,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                )
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}

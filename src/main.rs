//! Binary entrypoint for the Cow Cow CLI.
//!
//! Commands:
//! - `init` - write a starter `cowcow.toml` and create the data directory
//! - `play --script <file> [--mode <mode>] [--minutes <n>]` - replay a JSON game script
//! - `leaderboard` - print stored players by score, plus the team total
//! - `reset [--all]` - zero every player's progress, or wipe the store entirely
//!
//! See the library crate docs for module-level details: `cowcow::`.
use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};

use cowcow::config::Config;
use cowcow::game::{
    calculate_total_team_score, leaderboard, GameEngine, GameMode, GameStore, ManualClock,
    NotificationSink, PlayerStore, SystemClock, Team, TeamStore,
};
use cowcow::script::{load_script, replay, ReplayDefaults};

#[derive(Parser)]
#[command(name = "cowcow")]
#[command(about = "Score keeper for the Cow Cow road-trip game")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "cowcow.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Replay a JSON game script against the stored players
    Play {
        /// Script file
        #[arg(short, long)]
        script: String,
        /// Mode for `start` steps that do not name one
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<GameMode>,
        /// Game length for `start` steps that do not name one (0 = untimed)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Show stored players ranked by score
    Leaderboard,
    /// Clear scores for a new game
    Reset {
        /// Also forget every player and the team
        #[arg(long)]
        all: bool,
    },
}

/// Prints game messages as they happen.
struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }
}

fn parse_mode(value: &str) -> Result<GameMode, String> {
    let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| format!("unknown mode '{}' (classic, teams, scavenger_hunt, trivia)", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config, so it starts with console-only logging
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new Cow Cow configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
            let cfg = Config::default();
            tokio::fs::create_dir_all(&cfg.storage.data_dir).await?;
            info!("Data directory ready at {}", cfg.storage.data_dir);
        }
        Commands::Play {
            script,
            mode,
            minutes,
        } => {
            let config = load_config(pre_config, &cli.config).await?;
            let steps = load_script(&script)?;
            let store = GameStore::open(config.storage.db_path())?;
            let mut engine = GameEngine::new(
                store,
                ConsoleNotifier,
                ManualClock::new(Utc::now()),
                config.game.engine_settings(),
                config.rule_book(),
            );
            let defaults = ReplayDefaults {
                mode: mode.unwrap_or(config.game.default_mode),
                duration_ms: match minutes {
                    Some(0) => None,
                    Some(m) => Some(i64::from(m) * 60_000),
                    None => config.game.default_duration_ms(),
                },
            };
            info!("Replaying {} steps from {}", steps.len(), script);
            let report = replay(&mut engine, &steps, defaults)?;
            if report.rejected > 0 {
                warn!("{} step(s) were rejected", report.rejected);
            }
            println!();
            print_leaderboard(engine.players(), engine.team());
        }
        Commands::Leaderboard => {
            let config = load_config(pre_config, &cli.config).await?;
            let store = GameStore::open(config.storage.db_path())?;
            let players = store.list_players()?;
            let team = store
                .load_team()?
                .unwrap_or_else(|| Team::new(&config.game.team_name));
            print_leaderboard(&players, &team);
        }
        Commands::Reset { all } => {
            let config = load_config(pre_config, &cli.config).await?;
            let store = GameStore::open(config.storage.db_path())?;
            if all {
                store.clear()?;
                println!("All players and the team were removed.");
            } else {
                let mut engine = GameEngine::new(
                    store,
                    ConsoleNotifier,
                    SystemClock,
                    config.game.engine_settings(),
                    config.rule_book(),
                );
                engine.reset_game();
            }
        }
    }

    Ok(())
}

async fn load_config(pre_config: Option<Config>, path: &str) -> Result<Config> {
    match pre_config {
        Some(config) => Ok(config),
        None => Config::load(path)
            .await
            .map_err(|e| anyhow!("{} (run `cowcow init` first?)", e)),
    }
}

fn print_leaderboard(players: &[cowcow::game::Player], team: &Team) {
    if players.is_empty() {
        println!("No players yet.");
        return;
    }
    println!("{:<4} {:<20} {:>6}", "#", "Player", "Score");
    for (rank, (player, score)) in leaderboard(players).iter().enumerate() {
        let marker = if team.contains(&player.id) { " *" } else { "" };
        println!("{:<4} {:<20} {:>6}{}", rank + 1, player.name, score, marker);
    }
    if !team.members.is_empty() {
        println!(
            "\n{} (*): {} points",
            team.name,
            calculate_total_team_score(team, players)
        );
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins; otherwise the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when a person is watching
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
    let _ = builder.try_init();
}

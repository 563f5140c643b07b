//! keyflow - Adaptive Typing Tutor
//!
//! CLI entry point. This is the minimal non-interactive consumer of the
//! library: inspect the curriculum and progress, print drills, and reset.
//! Interactive presentation layers embed the library directly.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use keyflow::config::Config;
use keyflow::curriculum::Level;
use keyflow::engine::AdaptiveEngine;
use keyflow::storage::{FileProgressStore, ProgressStore};

/// keyflow - Adaptive Typing Tutor
#[derive(Parser)]
#[command(name = "keyflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the lesson catalogue grouped by level
    Lessons {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Show saved progress: position, badges, history, worst keys
    Progress {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Print a drill targeting the current high-error keys
    Drill {
        /// Seed the generator for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the fixed muscle-memory warmup routine
    Warmup,

    /// Delete saved progress and start over
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Jump to a specific lesson
    Goto {
        /// Level name: beginner, intermediate, or advanced
        level: String,
        /// Lesson index within the level
        index: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load();

    let store = match FileProgressStore::new() {
        Ok(store) => store,
        Err(err) => {
            eprintln!("keyflow: {err}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Lessons { json } => cmd_lessons(store, config, json),
        Commands::Progress { json } => cmd_progress(store, config, json),
        Commands::Drill { seed } => cmd_drill(store, config, seed),
        Commands::Warmup => {
            println!("{}", keyflow::MUSCLE_MEMORY_ROUTINE);
            ExitCode::SUCCESS
        }
        Commands::Reset { yes } => cmd_reset(store, yes),
        Commands::Goto { level, index } => cmd_goto(store, config, &level, index),
    }
}

fn cmd_lessons(store: FileProgressStore, config: Config, json: bool) -> ExitCode {
    let engine = AdaptiveEngine::new(store, config);
    let (current_level, current_index) = engine.position();

    if json {
        let groups: Vec<serde_json::Value> = engine
            .curriculum()
            .grouped()
            .into_iter()
            .map(|(level, lessons)| {
                serde_json::json!({
                    "level": level.name(),
                    "lessons": lessons,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&groups).unwrap_or_default());
        return ExitCode::SUCCESS;
    }

    for (level, lessons) in engine.curriculum().grouped() {
        println!("{level}");
        for lesson in lessons {
            let marker = if (level, lesson.index) == (current_level, current_index) {
                "*"
            } else {
                " "
            };
            println!("  {marker} {:>2}. {}", lesson.index, lesson.title);
        }
    }
    ExitCode::SUCCESS
}

fn cmd_progress(store: FileProgressStore, config: Config, json: bool) -> ExitCode {
    let engine = AdaptiveEngine::new(store, config);
    let progress = engine.progress();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(progress).unwrap_or_default()
        );
        return ExitCode::SUCCESS;
    }

    let (level, index) = engine.position();
    println!("Position: {level} #{index}");
    println!("Sessions completed: {}", progress.sessions_completed);

    let badges: Vec<&str> = progress
        .badges
        .iter()
        .filter(|(_, earned)| **earned)
        .map(|(id, _)| id.as_str())
        .collect();
    println!(
        "Badges: {}",
        if badges.is_empty() {
            "none".to_string()
        } else {
            badges.join(", ")
        }
    );

    if !progress.history.is_empty() {
        println!("Recent sessions:");
        for entry in &progress.history {
            println!("  {:>3} wpm  {:>3}% accuracy", entry.wpm, entry.accuracy);
        }
    }

    let weak = engine.high_error_keys();
    if !weak.is_empty() {
        let shown: String = weak
            .iter()
            .map(|c| if *c == ' ' { "space".to_string() } else { c.to_string() })
            .collect::<Vec<_>>()
            .join(" ");
        println!("Trouble keys: {shown}");
    }

    ExitCode::SUCCESS
}

fn cmd_drill(store: FileProgressStore, config: Config, seed: Option<u64>) -> ExitCode {
    let engine = AdaptiveEngine::new(store, config);
    let weak = engine.high_error_keys();

    if weak.is_empty() {
        // Nothing to target yet; fall back to the warmup routine.
        println!("{}", engine.muscle_memory_routine());
        return ExitCode::SUCCESS;
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    println!("{}", engine.generate_drill(&weak, &mut rng));
    ExitCode::SUCCESS
}

fn cmd_reset(store: FileProgressStore, yes: bool) -> ExitCode {
    if !yes {
        eprintln!("This deletes all saved progress. Re-run with --yes to confirm.");
        return ExitCode::FAILURE;
    }

    match store.save(&keyflow::Progress::default()) {
        Ok(()) => {
            println!("Progress reset.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("keyflow: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_goto(store: FileProgressStore, config: Config, level: &str, index: usize) -> ExitCode {
    let level = match level.to_ascii_lowercase().as_str() {
        "beginner" => Level::Beginner,
        "intermediate" => Level::Intermediate,
        "advanced" => Level::Advanced,
        other => {
            eprintln!("keyflow: unknown level '{other}'");
            return ExitCode::FAILURE;
        }
    };

    let mut engine = AdaptiveEngine::new(store, config);
    match engine.set_position(level, index) {
        Ok(()) => {
            let lesson = engine
                .curriculum()
                .lesson(level, index)
                .expect("position was just validated");
            println!("Now at {level} #{index}: {}", lesson.title);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("keyflow: {err}");
            ExitCode::FAILURE
        }
    }
}

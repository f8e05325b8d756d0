//! Stack Arcade entry point
//!
//! Headless native runner: loads settings, builds one rapier-backed instance
//! per configured player and drives them on a fixed timestep.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use stack_arcade::consts::{MAX_SUBSTEPS, SIM_DT};
use stack_arcade::sim::RapierWorld;
use stack_arcade::{Arcade, Difficulty, Settings};

/// Wall-clock frame pacing
const FRAME: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(name = "stack-arcade")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON); missing means defaults
    #[arg(default_value = "stack-arcade.json")]
    settings: PathBuf,

    /// How long to run (seconds)
    #[arg(short, long, default_value = "60")]
    seconds: f32,

    /// Override the automated players' difficulty (easy, medium, hard)
    #[arg(short, long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    /// Base RNG seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Write the effective settings back to the settings file and exit
    #[arg(long)]
    write_settings: bool,
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s).ok_or_else(|| format!("unknown difficulty '{s}'"))
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Stack Arcade (headless) starting...");

    let mut settings = match Settings::load(&cli.settings) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Bad settings in {}: {e}", cli.settings.display());
            return ExitCode::FAILURE;
        }
    };
    if let Some(difficulty) = cli.difficulty {
        settings.difficulty = difficulty;
    }
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }

    if cli.write_settings {
        return match settings.save(&cli.settings) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("Could not write {}: {e}", cli.settings.display());
                ExitCode::FAILURE
            }
        };
    }

    log::info!("Difficulty: {}", settings.difficulty.as_str());
    let mut arcade: Arcade<RapierWorld> = Arcade::from_settings(&settings);
    arcade.start();
    run(&mut arcade, cli.seconds);

    for (name, score) in arcade.scores() {
        log::info!("{name}: {score}");
    }
    ExitCode::SUCCESS
}

/// Fixed-timestep loop; restarts the round once every surface has failed
fn run(arcade: &mut Arcade<RapierWorld>, run_secs: f32) {
    let started = Instant::now();
    let mut last = started;
    let mut accumulator = 0.0f32;

    while started.elapsed().as_secs_f32() < run_secs {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(0.1);
        last = now;
        accumulator += dt;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            arcade.tick_all(SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        if arcade.all_failed() {
            let scores: Vec<String> = arcade
                .scores()
                .into_iter()
                .map(|(name, score)| format!("{name}={score}"))
                .collect();
            log::info!("Round {} over: {}", arcade.rounds() + 1, scores.join(", "));
            arcade.restart_all();
            accumulator = 0.0;
        }

        thread::sleep(FRAME);
    }
}

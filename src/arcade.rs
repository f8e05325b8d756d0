//! Arcade orchestration
//!
//! Owns several independent [`GameInstance`]s and drives them on a shared
//! tick. Instances never share physics state; the arcade only fans out
//! ticks and input signals and polls for the all-failed condition.

use crate::control::{AutomatedController, HumanController, InputController, InputSignal};
use crate::highscores::{FileReporter, LogReporter, ScoreReporter};
use crate::settings::{PlayerConfig, Settings};
use crate::sim::{GameInstance, PhysicsWorld};

/// A set of side-by-side play surfaces
#[derive(Debug)]
pub struct Arcade<W: PhysicsWorld> {
    instances: Vec<GameInstance<W>>,
    /// Full restarts since construction
    rounds: u32,
}

impl<W: PhysicsWorld> Arcade<W> {
    /// Wrap pre-built instances
    pub fn new(instances: Vec<GameInstance<W>>) -> Self {
        Self {
            instances,
            rounds: 0,
        }
    }

    /// Build one instance per configured player
    pub fn from_settings(settings: &Settings) -> Self {
        let instances = settings
            .players
            .iter()
            .enumerate()
            .map(|(i, player)| {
                let seed = settings.seed.wrapping_add(i as u64 * 0x9e37_79b9);
                GameInstance::new(
                    player.name.clone(),
                    settings.game_mode.clone(),
                    controller_for(player, settings, seed),
                    settings.instance,
                    seed,
                )
                .with_reporter(reporter_for(settings))
            })
            .collect();
        Self::new(instances)
    }

    pub fn instances(&self) -> &[GameInstance<W>] {
        &self.instances
    }

    pub fn instance(&self, index: usize) -> Option<&GameInstance<W>> {
        self.instances.get(index)
    }

    pub fn instance_mut(&mut self, index: usize) -> Option<&mut GameInstance<W>> {
        self.instances.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Bring the first piece into every instance
    pub fn start(&mut self) {
        for inst in &mut self.instances {
            inst.spawn_next_piece();
        }
        log::info!("Arcade started with {} instances", self.instances.len());
    }

    /// Advance every instance by one step
    pub fn tick_all(&mut self, dt: f32) {
        for inst in &mut self.instances {
            inst.tick(dt);
        }
    }

    /// Forward an input signal to every human-controlled instance
    pub fn route_signal(&mut self, signal: &InputSignal) {
        for inst in self.instances.iter_mut().filter(|i| i.is_human()) {
            inst.handle_signal(signal);
        }
    }

    /// True when every instance has failed (never for an empty arcade)
    pub fn all_failed(&self) -> bool {
        let failed: Vec<bool> = self.instances.iter().map(|i| i.is_failed()).collect();
        !failed.is_empty() && failed.iter().all(|&f| f)
    }

    /// Scores in instance order
    pub fn scores(&self) -> Vec<(&str, u32)> {
        self.instances.iter().map(|i| (i.name(), i.score())).collect()
    }

    /// Reset every instance and spawn fresh pieces
    pub fn restart_all(&mut self) {
        for inst in &mut self.instances {
            inst.reset();
        }
        self.rounds += 1;
        self.start();
    }
}

fn controller_for(player: &PlayerConfig, settings: &Settings, seed: u64) -> Box<dyn InputController> {
    match &player.keys {
        Some(keys) if !keys.is_empty() => Box::new(HumanController::new(keys.clone())),
        _ => {
            let mut ai = AutomatedController::new(settings.ai_config(), seed);
            ai.set_aggression_multiplier(settings.aggression_multiplier);
            Box::new(ai)
        }
    }
}

fn reporter_for(settings: &Settings) -> Box<dyn ScoreReporter> {
    match &settings.leaderboard {
        Some(path) => Box::new(FileReporter::new(path.clone())),
        None => Box::new(LogReporter),
    }
}

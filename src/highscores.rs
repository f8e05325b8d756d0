//! Score reporting
//!
//! Human-controlled instances hand their final score to a [`ScoreReporter`]
//! exactly once when they fail. The shipped reporter keeps a top-10
//! leaderboard in a JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A final score as delivered by one instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Name entered for the player of this surface
    pub player_name: String,
    /// Which mode the run was played in (e.g. "player-1", "versus")
    pub game_mode: String,
    pub score: u32,
    /// Unix timestamp (ms) when the run ended
    pub timestamp: f64,
}

impl ScoreRecord {
    /// Record stamped with the current wall-clock time
    pub fn now(player_name: &str, game_mode: &str, score: u32) -> Self {
        Self {
            player_name: player_name.to_string(),
            game_mode: game_mode.to_string(),
            score,
            timestamp: unix_millis(),
        }
    }
}

fn unix_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

/// External collaborator receiving final scores.
///
/// Delivery failures are returned, logged by the caller and never retried.
pub trait ScoreReporter: Send {
    fn report(&mut self, record: &ScoreRecord) -> Result<(), ScoreError>;
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<ScoreRecord>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Must beat the lowest entry
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a record if it qualifies; returns the rank achieved
    pub fn add(&mut self, record: ScoreRecord) -> Option<usize> {
        if !self.qualifies(record.score) {
            return None;
        }

        // Sorted descending by score; ties keep the earlier run first
        let pos = self.entries.iter().position(|e| record.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, record);
                i + 1
            }
            None => {
                self.entries.push(record);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    /// Load a leaderboard file; a missing file is an empty board
    pub fn load(path: &Path) -> Result<Self, ScoreError> {
        match fs::read_to_string(path) {
            Ok(json) => {
                let scores: HighScores = serde_json::from_str(&json)?;
                log::info!("Loaded {} high scores", scores.entries.len());
                Ok(scores)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high scores found, starting fresh");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ScoreError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

/// Reporter that merges each record into a leaderboard file
#[derive(Debug, Clone)]
pub struct FileReporter {
    path: PathBuf,
}

impl FileReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreReporter for FileReporter {
    fn report(&mut self, record: &ScoreRecord) -> Result<(), ScoreError> {
        let mut board = HighScores::load(&self.path)?;
        match board.add(record.clone()) {
            Some(rank) => {
                log::info!("{} placed #{rank} with {}", record.player_name, record.score);
                board.save(&self.path)
            }
            None => Ok(()),
        }
    }
}

/// Reporter that only logs (no storage configured)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ScoreReporter for LogReporter {
    fn report(&mut self, record: &ScoreRecord) -> Result<(), ScoreError> {
        log::info!(
            "final score: {} ({}) = {}",
            record.player_name,
            record.game_mode,
            record.score
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(score: u32) -> ScoreRecord {
        ScoreRecord {
            player_name: "p".into(),
            game_mode: "standard".into(),
            score,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_zero_never_qualifies() {
        assert!(!HighScores::new().qualifies(0));
    }

    #[test]
    fn test_add_keeps_descending_order_and_cap() {
        let mut board = HighScores::new();
        for s in 1..=12 {
            board.add(rec(s));
        }
        assert_eq!(board.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(board.top_score(), Some(12));
        assert_eq!(board.entries.last().map(|e| e.score), Some(3));
        assert!(!board.qualifies(3));
        assert_eq!(board.potential_rank(4), Some(10));
    }

    #[test]
    fn test_file_reporter_round_trip() {
        let dir = std::env::temp_dir().join(format!("stack-arcade-hs-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scores.json");
        let _ = fs::remove_file(&path);

        let mut reporter = FileReporter::new(&path);
        reporter.report(&rec(7)).unwrap();
        reporter.report(&rec(9)).unwrap();

        let board = HighScores::load(&path).unwrap();
        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.top_score(), Some(9));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("stack-arcade-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scores.json");
        fs::write(&path, "not json").unwrap();

        let mut reporter = FileReporter::new(&path);
        assert!(matches!(reporter.report(&rec(3)), Err(ScoreError::Format(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}

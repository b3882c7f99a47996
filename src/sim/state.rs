//! Session bookkeeping
//!
//! Score, level and the heart multiplier. Only drop bookkeeping and
//! finished Scorings change these.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub level: u32,
    pub balls_dropped: u32,
    pub score: u64,
    /// Never below 1.0; hearts raise it
    pub global_scorefactor: f32,
}

impl Session {
    pub fn new(start_level: u32) -> Self {
        Self {
            level: start_level,
            balls_dropped: 0,
            score: 0,
            global_scorefactor: 1.0,
        }
    }

    /// Count a dropped ball. Returns true if this drop finished a level.
    pub fn record_drop(&mut self, balls_per_level: u32) -> bool {
        self.balls_dropped += 1;
        if self.balls_dropped % balls_per_level == 0 {
            self.level += 1;
            log::info!("Level up: {}", self.level);
            return true;
        }
        false
    }

    /// Points for a colored cascade: total weight x ball count x level x factor
    pub fn score_cascade(&mut self, weight: u32, balls: usize) -> u64 {
        let raw = weight as f64
            * balls as f64
            * self.level as f64
            * self.global_scorefactor as f64;
        let points = raw.round() as u64;
        self.score += points;
        points
    }

    /// Each scored heart adds 0.1 to the factor
    pub fn increase_score_factor(&mut self, hearts: usize) {
        self.global_scorefactor += 0.1 * hearts as f32;
    }
}

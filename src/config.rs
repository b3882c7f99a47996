//! Simulation configuration
//!
//! Rates are authored per second and converted to per-tick values once, at
//! startup. Nothing may tick before `SimConfig::validate` succeeded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Startup-time configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tick rate must be positive, got {0}")]
    TickRate(f32),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("falling speed too high: {0} tiles/tick, do not fall more than one tile per tick")]
    FallingTooFast(f32),
    #[error("number of columns must be even and non-zero, got {0}")]
    Columns(usize),
    #[error("max height must be at least 3, got {0}")]
    MaxHeight(usize),
    #[error("thrown ball apex {maxheight} must be above its drop height {dropheight}")]
    Trajectory { maxheight: f32, dropheight: f32 },
    #[error("start level must be at least 2, got {0}")]
    StartLevel(u32),
    #[error("balls per level must be non-zero")]
    BallsPerLevel,
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Authored configuration (per-second rates, board size, progression)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub max_fps: f32,
    pub falling_speed: f32,
    pub tilting_speed: f32,
    pub thrown_ball_totaltime: f32,
    pub thrown_ball_maxheight: f32,
    pub thrown_ball_flyover_height: f32,
    pub thrown_ball_dropheight: f32,
    pub scoring_speed: f32,
    pub combining_totaltime: f32,
    pub explosion_totaltime: f32,
    pub num_columns: usize,
    pub max_height: usize,
    pub start_level: u32,
    pub balls_per_level: u32,
    pub min_balls_between_specials: u32,
    /// Vertical fives merge into one ball when enabled
    pub combining_enabled: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_fps: MAX_FPS,
            falling_speed: FALLING_SPEED,
            tilting_speed: TILTING_SPEED,
            thrown_ball_totaltime: THROWN_BALL_TOTALTIME,
            thrown_ball_maxheight: THROWN_BALL_MAXHEIGHT,
            thrown_ball_flyover_height: THROWN_BALL_FLYOVER_HEIGHT,
            thrown_ball_dropheight: THROWN_BALL_DROPHEIGHT,
            scoring_speed: SCORING_SPEED,
            combining_totaltime: COMBINING_TOTALTIME,
            explosion_totaltime: EXPLOSION_TOTALTIME,
            num_columns: NUM_COLUMNS,
            max_height: MAX_HEIGHT,
            start_level: START_LEVEL,
            balls_per_level: BALLS_PER_LEVEL,
            min_balls_between_specials: MIN_BALLS_BETWEEN_SPECIALS,
            combining_enabled: false,
        }
    }
}

/// Validated, per-tick view of a `SimConfig`
#[derive(Debug, Clone, PartialEq)]
pub struct TickRates {
    pub falling_per_tick: f32,
    pub tilting_per_tick: f32,
    /// Ticks for one full tilt from one resting side to the other
    pub tilting_maxticks: u32,
    pub thrown_ball_dt: f32,
    pub thrown_ball_maxheight: f32,
    pub thrown_ball_flyover_height: f32,
    pub thrown_ball_dropheight: f32,
    pub scoring_delay: u32,
    pub combining_dt: f32,
    pub explosion_numticks: f32,
    pub num_columns: usize,
    pub max_height: usize,
    pub start_level: u32,
    pub balls_per_level: u32,
    pub min_balls_between_specials: u32,
    pub combining_enabled: bool,
}

impl TickRates {
    /// Number of seesaws on the board
    pub fn num_seesaws(&self) -> usize {
        self.num_columns / 2
    }
}

impl SimConfig {
    /// Parse a JSON document, falling back to defaults for missing keys
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Derive per-tick rates, rejecting values the simulation can't run with
    pub fn validate(&self) -> Result<TickRates, ConfigError> {
        if self.max_fps.is_nan() || self.max_fps <= 0.0 {
            return Err(ConfigError::TickRate(self.max_fps));
        }
        let positive = [
            ("falling_speed", self.falling_speed),
            ("tilting_speed", self.tilting_speed),
            ("thrown_ball_totaltime", self.thrown_ball_totaltime),
            ("scoring_speed", self.scoring_speed),
            ("combining_totaltime", self.combining_totaltime),
            ("explosion_totaltime", self.explosion_totaltime),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        let falling_per_tick = self.falling_speed / self.max_fps;
        // landing detection assumes a ball can't skip over a whole tile in one tick
        if falling_per_tick > 1.0 {
            return Err(ConfigError::FallingTooFast(falling_per_tick));
        }
        if self.num_columns == 0 || self.num_columns % 2 != 0 {
            return Err(ConfigError::Columns(self.num_columns));
        }
        if self.max_height < 3 {
            return Err(ConfigError::MaxHeight(self.max_height));
        }
        if self.thrown_ball_maxheight <= self.thrown_ball_dropheight {
            return Err(ConfigError::Trajectory {
                maxheight: self.thrown_ball_maxheight,
                dropheight: self.thrown_ball_dropheight,
            });
        }
        if self.start_level < 2 {
            return Err(ConfigError::StartLevel(self.start_level));
        }
        if self.balls_per_level == 0 {
            return Err(ConfigError::BallsPerLevel);
        }

        let tilting_per_tick = self.tilting_speed / self.max_fps;
        let rates = TickRates {
            falling_per_tick,
            tilting_per_tick,
            tilting_maxticks: (2.0 / tilting_per_tick) as u32 + 1,
            thrown_ball_dt: 2.0 / (self.max_fps * self.thrown_ball_totaltime),
            thrown_ball_maxheight: self.thrown_ball_maxheight,
            thrown_ball_flyover_height: self.thrown_ball_flyover_height,
            thrown_ball_dropheight: self.thrown_ball_dropheight,
            scoring_delay: ((self.max_fps / self.scoring_speed) as u32).max(1),
            combining_dt: 1.0 / (self.max_fps * self.combining_totaltime),
            explosion_numticks: self.explosion_totaltime * self.max_fps,
            num_columns: self.num_columns,
            max_height: self.max_height,
            start_level: self.start_level,
            balls_per_level: self.balls_per_level,
            min_balls_between_specials: self.min_balls_between_specials,
            combining_enabled: self.combining_enabled,
        };
        log::debug!(
            "Tick rates: falling {:.3}/tick, tilting {:.3}/tick, scoring delay {} ticks",
            rates.falling_per_tick,
            rates.tilting_per_tick,
            rates.scoring_delay
        );
        Ok(rates)
    }

    /// Defaults with the given tick rate
    pub fn with_fps(max_fps: f32) -> Self {
        Self {
            max_fps,
            ..Self::default()
        }
    }
}

//! Seesaw Swing - falling-ball puzzle on a row of seesaws
//!
//! Core modules:
//! - `sim`: Deterministic playfield simulation (seesaws, balls, ongoing events)
//! - `config`: Tick-rate and board configuration, validated at startup
//! - `supply`: Ball generation, depot and crane bookkeeping
//! - `game`: Session facade combining supply and simulation

pub mod config;
pub mod game;
pub mod sim;
pub mod supply;

pub use config::{ConfigError, SimConfig, TickRates};
pub use game::Game;

/// Default configuration values
pub mod consts {
    /// Ticks per second
    pub const MAX_FPS: f32 = 50.0;

    /// Falling speed in tiles/sec
    pub const FALLING_SPEED: f32 = 3.0;
    /// Tilting speed in tilts/sec (4.0 means 0.25s from balanced to resting)
    pub const TILTING_SPEED: f32 = 2.0;

    /// Time a thrown ball travels per arc (seconds, per fly-out round)
    pub const THROWN_BALL_TOTALTIME: f32 = 2.0;
    /// Apex height of a thrown ball trajectory
    pub const THROWN_BALL_MAXHEIGHT: f32 = 9.8;
    /// Height a ball re-enters at after flying off the board edge
    pub const THROWN_BALL_FLYOVER_HEIGHT: f32 = 7.0;
    /// Height where a thrown ball ends its arc above the target column
    pub const THROWN_BALL_DROPHEIGHT: f32 = 9.5;

    /// Scoring expansion speed in balls/sec
    pub const SCORING_SPEED: f32 = 5.0;
    /// Duration of a vertical combine (seconds)
    pub const COMBINING_TOTALTIME: f32 = 1.0;
    /// Duration an explosion marker stays alive (seconds)
    pub const EXPLOSION_TOTALTIME: f32 = 1.5;

    /// Board dimensions
    pub const NUM_COLUMNS: usize = 8;
    pub const MAX_HEIGHT: usize = 8;

    /// Level progression
    pub const START_LEVEL: u32 = 4;
    pub const BALLS_PER_LEVEL: u32 = 50;
    pub const MIN_BALLS_BETWEEN_SPECIALS: u32 = 3;

    /// Balls in a vertical run that combine into one
    pub const COMBINE_RUN: usize = 5;
}

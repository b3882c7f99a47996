//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - No RNG (ball supply lives outside, in `supply`)
//! - Stable iteration order (seesaw index, then event insertion order)
//! - No rendering or platform dependencies

pub mod ball;
pub mod error;
pub mod events;
pub mod playfield;
pub mod seesaw;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use ball::{Ball, BallId, BallKind, Space};
pub use error::{SimError, SimResult};
pub use events::{
    Combining, EventKind, EventQueue, Explosion, FallingBall, Ongoing, Scoring, ThrowStep,
    ThrownBall,
};
pub use playfield::{GravityMoves, Playfield};
pub use seesaw::{Combined, Dropped, ScoredRemoval, Seesaw, Side, Throw};
pub use state::Session;
pub use tick::{LandingSite, Refresh, Simulation};

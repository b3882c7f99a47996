//! Contract violations raised by the simulation core
//!
//! None of these are recoverable game states. They mean the caller (or the
//! core itself) broke an invariant, and the session should end.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("position ({x}, {y}) is outside the playfield")]
    OutOfBounds { x: i64, y: i64 },
    #[error("column {0} is outside the playfield")]
    ColumnOutOfRange(usize),
    #[error("position ({x}, {y}) is blocked by its seesaw, nothing to remove there")]
    RemoveFromBlocked { x: usize, y: usize },
    #[error("seesaw {seesaw} asked to tilt to its current position {tilt}")]
    TiltToCurrentPosition { seesaw: usize, tilt: f32 },
    #[error("ball thrown from column {column} with zero range")]
    ZeroThrowingRange { column: usize },
}

pub type SimResult<T> = Result<T, SimError>;

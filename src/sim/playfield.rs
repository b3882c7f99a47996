//! Playfield: the row of seesaws addressed by board column
//!
//! Column `2i` and `2i + 1` belong to seesaw `i`. Row 0 is the bottom of the
//! board; the lowest rows of a column may be blocked by its seesaw.

use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallId, Space};
use super::error::{SimError, SimResult};
use super::seesaw::{Combined, Dropped, ScoredRemoval, Seesaw, Side, Throw};
use crate::config::TickRates;

/// Result of one gravity pass over all seesaws
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GravityMoves {
    /// At least one seesaw is (now or still) moving
    pub moving: bool,
    /// Balls launched by seesaws that started moving in this pass
    pub throws: Vec<Throw>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playfield {
    seesaws: Vec<Seesaw>,
    num_columns: usize,
    max_height: usize,
    alive: bool,
}

impl Playfield {
    pub fn new(rates: &TickRates) -> Self {
        Self {
            seesaws: (0..rates.num_seesaws()).map(Seesaw::new).collect(),
            num_columns: rates.num_columns,
            max_height: rates.max_height,
            alive: true,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Addressable rows, `0..rows()`
    pub fn rows(&self) -> usize {
        self.max_height
    }

    pub fn seesaws(&self) -> &[Seesaw] {
        &self.seesaws
    }

    pub fn seesaw(&self, index: usize) -> Option<&Seesaw> {
        self.seesaws.get(index)
    }

    pub(crate) fn seesaw_mut(&mut self, index: usize) -> Option<&mut Seesaw> {
        self.seesaws.get_mut(index)
    }

    fn locate(&self, column: usize) -> SimResult<(usize, Side)> {
        if column >= self.num_columns {
            return Err(SimError::ColumnOutOfRange(column));
        }
        Ok((column / 2, Side::of_column(column)))
    }

    fn check_cell(&self, x: usize, y: usize) -> SimResult<(usize, Side)> {
        if x >= self.num_columns || y >= self.rows() {
            return Err(SimError::OutOfBounds {
                x: x as i64,
                y: y as i64,
            });
        }
        Ok((x / 2, Side::of_column(x)))
    }

    pub fn get_ball_at(&self, x: usize, y: usize) -> SimResult<Space> {
        let (index, side) = self.check_cell(x, y)?;
        Ok(self.seesaws[index].ball_at_height(y, side))
    }

    /// Mutable access to the ball at a cell; `None` for empty or blocked cells
    pub fn ball_at_mut(&mut self, x: usize, y: usize) -> SimResult<Option<&mut Ball>> {
        let (index, side) = self.check_cell(x, y)?;
        Ok(self.seesaws[index].ball_at_height_mut(y, side))
    }

    pub fn column_is_empty(&self, column: usize) -> SimResult<bool> {
        let (index, side) = self.locate(column)?;
        Ok(self.seesaws[index].is_empty(side))
    }

    /// Top ball of a column and the row it sits in
    pub fn top_ball(&self, column: usize) -> SimResult<Option<(Ball, usize)>> {
        let (index, side) = self.locate(column)?;
        Ok(self.seesaws[index].top_ball(side))
    }

    /// First free row of a column (fractional while its seesaw tilts)
    pub fn landing_height_of_column(&self, column: usize) -> SimResult<f32> {
        let (index, side) = self.locate(column)?;
        Ok(self.seesaws[index].landing_height(side))
    }

    /// Push onto a column without triggering anything
    pub fn add_on_top(&mut self, ball: Ball, column: usize) -> SimResult<()> {
        let (index, side) = self.locate(column)?;
        self.seesaws[index].add_on_top(ball, side);
        Ok(())
    }

    /// Current weight of a column's stack
    pub fn get_weight_of_column(&mut self, column: usize) -> SimResult<u32> {
        let (index, side) = self.locate(column)?;
        let seesaw = &mut self.seesaws[index];
        seesaw.update_weight();
        Ok(seesaw.weight(side))
    }

    /// -1 low, 0 balanced, +1 high; rounded to the nearest position while moving
    pub fn get_seesaw_state(&self, column: usize) -> SimResult<i32> {
        let (index, side) = self.locate(column)?;
        let tilt = self.seesaws[index].tilt();
        let state = match side {
            Side::Left => tilt.round_ties_even(),
            Side::Right => (-tilt).round_ties_even(),
        };
        Ok(state as i32)
    }

    /// False if any resting stack is taller than its tilt allows
    pub fn check_alive(&self) -> bool {
        self.seesaws
            .iter()
            .all(|seesaw| seesaw.check_alive(self.max_height))
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn mark_dead(&mut self) {
        self.alive = false;
    }

    /// Balls resting on the board, not counting falling or thrown ones
    pub fn get_number_of_balls(&self) -> usize {
        self.seesaws.iter().map(Seesaw::number_of_balls).sum()
    }

    pub fn any_seesaw_is_moving(&self) -> bool {
        self.seesaws.iter().any(Seesaw::is_moving)
    }

    pub fn update_weights(&mut self) {
        for seesaw in &mut self.seesaws {
            seesaw.update_weight();
        }
    }

    /// Remove one ball; the ones above it come loose
    pub fn remove_ball_at(&mut self, x: usize, y: usize) -> SimResult<Vec<Dropped>> {
        if x >= self.num_columns {
            return Err(SimError::OutOfBounds {
                x: x as i64,
                y: y as i64,
            });
        }
        self.seesaws[x / 2].remove_ball_at(Side::of_column(x), y)
    }

    /// Remove every listed ball still on the board
    pub fn remove_scored_balls(&mut self, ids: &[BallId]) -> ScoredRemoval {
        let mut result = ScoredRemoval::default();
        for seesaw in &mut self.seesaws {
            let ScoredRemoval { removed, dropped } = seesaw.remove_scored_balls(ids);
            result.removed.extend(removed);
            result.dropped.extend(dropped);
        }
        result
    }

    /// Recompute weights, start every seesaw whose tilt disagrees, and throw
    /// from the ones that just started
    pub fn gravity_moves(&mut self) -> SimResult<GravityMoves> {
        let mut result = GravityMoves::default();
        for seesaw in &mut self.seesaws {
            seesaw.update_weight();
            if seesaw.check_gravity()? {
                result.throws.extend(seesaw.throw_top_ball());
            }
            result.moving |= seesaw.is_moving();
        }
        Ok(result)
    }

    /// Lowest, then leftmost, middle ball of an unmarked horizontal three
    pub fn find_scoring_anchor(&self) -> SimResult<Option<(usize, usize, Ball)>> {
        for y in 1..self.rows() {
            for x in 1..self.num_columns.saturating_sub(1) {
                let Space::Occupied(ball) = self.get_ball_at(x, y)? else {
                    continue;
                };
                if ball.is_scoring() {
                    continue;
                }
                if !self.get_ball_at(x - 1, y)?.matches_color(&ball) {
                    continue;
                }
                if self.get_ball_at(x + 1, y)?.matches_color(&ball) {
                    return Ok(Some((x, y, ball)));
                }
            }
        }
        Ok(None)
    }

    /// Merge the first vertical run of `run` same-colored balls found, left to right
    pub fn combine(&mut self, run: usize) -> Option<Combined> {
        self.seesaws.iter_mut().find_map(|seesaw| {
            seesaw
                .combine_vertical_run(Side::Left, run)
                .or_else(|| seesaw.combine_vertical_run(Side::Right, run))
        })
    }
}

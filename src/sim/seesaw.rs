//! Seesaw: two linked column stacks and a continuous tilt
//!
//! Tilt is -1 when the left side is down (heavier), +1 when the right side is
//! down, 0 when balanced. The number of blocked cells under each stack is
//! derived from the tilt on every query, so raising or lowering a column
//! never shuffles the stacks themselves.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallId, Space};
use super::error::{SimError, SimResult};

/// Which half of a seesaw a column is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn of_column(column: usize) -> Self {
        if column % 2 == 0 { Side::Left } else { Side::Right }
    }
}

/// A ball knocked loose from a stack, to be re-emitted as a falling ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropped {
    pub ball: Ball,
    pub column: usize,
    pub height: f32,
}

impl Dropped {
    /// A loose ball is no longer part of any cascade
    fn loose(mut ball: Ball, column: usize, height: f32) -> Self {
        ball.clear_scoring_mark();
        Self {
            ball,
            column,
            height,
        }
    }
}

/// Outcome of removing a finished cascade's balls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredRemoval {
    /// Listed balls that were still on the board
    pub removed: Vec<Ball>,
    pub dropped: Vec<Dropped>,
}

/// The lighter side's top ball, launched as a seesaw starts moving
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throw {
    pub ball: Ball,
    pub origin: Vec2,
    /// Signed column count, positive throws to the right
    pub range: i32,
}

/// Result of merging a vertical run into its bottom ball
#[derive(Debug, Clone, PartialEq)]
pub struct Combined {
    pub ball: Ball,
    pub column: usize,
    pub row: usize,
    pub dropped: Vec<Dropped>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seesaw {
    index: usize,
    tilt: f32,
    weight_left: u32,
    weight_right: u32,
    /// Bottom to top
    stack_left: Vec<Ball>,
    stack_right: Vec<Ball>,
    moving: bool,
}

impl Seesaw {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            tilt: 0.0,
            weight_left: 0,
            weight_right: 0,
            stack_left: Vec::new(),
            stack_right: Vec::new(),
            moving: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn column(&self, side: Side) -> usize {
        match side {
            Side::Left => 2 * self.index,
            Side::Right => 2 * self.index + 1,
        }
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Weight as of the last `update_weight`
    pub fn weight(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.weight_left,
            Side::Right => self.weight_right,
        }
    }

    pub fn stack(&self, side: Side) -> &[Ball] {
        match side {
            Side::Left => &self.stack_left,
            Side::Right => &self.stack_right,
        }
    }

    fn stack_mut(&mut self, side: Side) -> &mut Vec<Ball> {
        match side {
            Side::Left => &mut self.stack_left,
            Side::Right => &mut self.stack_right,
        }
    }

    pub fn is_empty(&self, side: Side) -> bool {
        self.stack(side).is_empty()
    }

    pub fn number_of_balls(&self) -> usize {
        self.stack_left.len() + self.stack_right.len()
    }

    /// Blocked cells under one stack as a float in [0, 2]. Both sides always sum to 2.
    pub fn blocked_height(&self, side: Side) -> f32 {
        match side {
            Side::Left => 1.0 + self.tilt,
            Side::Right => 1.0 - self.tilt,
        }
    }

    /// Whole blocked cells under one stack (0, 1 or 2)
    pub fn blocked_rows(&self, side: Side) -> usize {
        self.blocked_height(side).round_ties_even().max(0.0) as usize
    }

    /// Height of the first free row (fractional while tilting)
    pub fn landing_height(&self, side: Side) -> f32 {
        self.blocked_height(side) + self.stack(side).len() as f32
    }

    pub fn ball_at_height(&self, height: usize, side: Side) -> Space {
        let blocked = self.blocked_rows(side);
        let stack = self.stack(side);
        if height < blocked {
            Space::Blocked
        } else if height >= blocked + stack.len() {
            Space::Empty
        } else {
            Space::Occupied(stack[height - blocked])
        }
    }

    pub fn ball_at_height_mut(&mut self, height: usize, side: Side) -> Option<&mut Ball> {
        let idx = height.checked_sub(self.blocked_rows(side))?;
        self.stack_mut(side).get_mut(idx)
    }

    /// Top ball and the row it sits in
    pub fn top_ball(&self, side: Side) -> Option<(Ball, usize)> {
        let stack = self.stack(side);
        stack
            .last()
            .map(|ball| (*ball, self.blocked_rows(side) + stack.len() - 1))
    }

    pub fn add_on_top(&mut self, ball: Ball, side: Side) {
        self.stack_mut(side).push(ball);
    }

    pub fn update_weight(&mut self) {
        self.weight_left = self.stack_left.iter().map(Ball::weight).sum();
        self.weight_right = self.stack_right.iter().map(Ball::weight).sum();
    }

    /// Resting tilt the current weights call for
    pub fn target_tilt(&self) -> f32 {
        use std::cmp::Ordering;
        match self.weight_left.cmp(&self.weight_right) {
            Ordering::Greater => -1.0,
            Ordering::Equal => 0.0,
            Ordering::Less => 1.0,
        }
    }

    /// Start moving if weights disagree with the tilt. True if this started a move.
    pub fn check_gravity(&mut self) -> SimResult<bool> {
        if self.moving {
            return Ok(false);
        }
        let target = self.target_tilt();
        if target == self.tilt {
            return Ok(false);
        }
        self.start_tilt(target)?;
        Ok(true)
    }

    fn start_tilt(&mut self, target: f32) -> SimResult<()> {
        if target == self.tilt {
            return Err(SimError::TiltToCurrentPosition {
                seesaw: self.index,
                tilt: self.tilt,
            });
        }
        log::trace!("Seesaw {} tilting {} -> {}", self.index, self.tilt, target);
        self.moving = true;
        Ok(())
    }

    /// Advance the tilt one step. Returns true on the tick the seesaw comes to rest.
    pub fn tick(&mut self, tilting_per_tick: f32) -> bool {
        if !self.moving {
            return false;
        }

        let target = self.target_tilt();
        let arrived = if target < self.tilt {
            self.tilt -= tilting_per_tick;
            self.tilt <= target
        } else {
            self.tilt += tilting_per_tick;
            self.tilt >= target
        };

        if arrived {
            self.tilt = target;
            self.moving = false;
        }
        arrived
    }

    /// Pop the lighter side's top ball. Weights must be current.
    pub fn throw_top_ball(&mut self) -> Option<Throw> {
        let range = self.weight_right as i32 - self.weight_left as i32;
        if range == 0 {
            return None;
        }
        let lighter = if range > 0 { Side::Left } else { Side::Right };
        let origin_x = self.column(lighter) as f32;
        let origin_y = (self.landing_height(lighter).round_ties_even() - 1.0).max(0.0);
        let mut ball = self.stack_mut(lighter).pop()?;
        ball.clear_scoring_mark();

        Some(Throw {
            ball,
            origin: Vec2::new(origin_x, origin_y),
            range,
        })
    }

    /// False if a resting stack is taller than its tilt allows
    pub fn check_alive(&self, max_height: usize) -> bool {
        if self.moving {
            return true;
        }
        let left = self.stack_left.len();
        let right = self.stack_right.len();
        if self.tilt == -1.0 {
            left <= max_height && right <= max_height - 2
        } else if self.tilt == 0.0 {
            left <= max_height - 1 && right <= max_height - 1
        } else {
            left <= max_height - 2 && right <= max_height
        }
    }

    /// Remove the ball at `row`; every ball above it is knocked loose, bottom first.
    /// Empty cells are a no-op, blocked cells a contract violation.
    pub fn remove_ball_at(&mut self, side: Side, row: usize) -> SimResult<Vec<Dropped>> {
        let column = self.column(side);
        let blocked = self.blocked_rows(side);
        if row < blocked {
            return Err(SimError::RemoveFromBlocked { x: column, y: row });
        }
        let idx = row - blocked;
        if idx >= self.stack(side).len() {
            return Ok(Vec::new());
        }

        let base = self.blocked_height(side);
        let stack = self.stack_mut(side);
        stack.remove(idx);
        let dropped = stack
            .drain(idx..)
            .enumerate()
            .map(|(k, ball)| Dropped::loose(ball, column, base + (idx + 1 + k) as f32))
            .collect();
        Ok(dropped)
    }

    /// Remove every listed ball; unlisted balls above a removed one fall from where they rested
    pub fn remove_scored_balls(&mut self, ids: &[BallId]) -> ScoredRemoval {
        let mut result = ScoredRemoval::default();
        for side in [Side::Left, Side::Right] {
            let column = self.column(side);
            let base = self.blocked_height(side);
            let old = std::mem::take(self.stack_mut(side));
            let mut removed_any = false;
            let mut kept = Vec::with_capacity(old.len());

            for (y, ball) in old.into_iter().enumerate() {
                if ids.contains(&ball.id) {
                    removed_any = true;
                    result.removed.push(ball);
                } else if removed_any {
                    result
                        .dropped
                        .push(Dropped::loose(ball, column, base + y as f32));
                } else {
                    kept.push(ball);
                }
            }
            *self.stack_mut(side) = kept;
        }
        result
    }

    /// Merge the lowest run of `run` same-colored balls on one side into its bottom ball
    pub fn combine_vertical_run(&mut self, side: Side, run: usize) -> Option<Combined> {
        if run < 2 {
            return None;
        }
        let stack = self.stack(side);
        let start = stack.windows(run).position(|window| {
            let Some(color) = window[0].color() else {
                return false;
            };
            window.iter().all(|b| b.color() == Some(color))
        })?;

        let column = self.column(side);
        let base = self.blocked_height(side);
        let row = self.blocked_rows(side) + start;
        let stack = self.stack_mut(side);
        let total: u32 = stack[start..start + run].iter().map(Ball::weight).sum();
        stack[start].set_weight(total);
        let ball = stack[start];
        stack.drain(start + 1..start + run);

        let dropped = stack
            .drain(start + 1..)
            .enumerate()
            .map(|(k, b)| Dropped::loose(b, column, base + (start + run + k) as f32))
            .collect();

        Some(Combined {
            ball,
            column,
            row,
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ball::BallKind;

    fn colored(id: u32, color: u32, weight: u32) -> Ball {
        Ball::new(BallId(id), BallKind::Colored { color, weight })
    }

    fn settle(seesaw: &mut Seesaw, per_tick: f32) -> u32 {
        let mut ticks = 0;
        while seesaw.is_moving() {
            seesaw.tick(per_tick);
            ticks += 1;
            assert!(ticks < 1000, "seesaw never came to rest");
        }
        ticks
    }

    #[test]
    fn test_starts_balanced() {
        let seesaw = Seesaw::new(0);
        assert_eq!(seesaw.blocked_rows(Side::Left), 1);
        assert_eq!(seesaw.blocked_rows(Side::Right), 1);
        assert_eq!(seesaw.ball_at_height(0, Side::Left), Space::Blocked);
        assert_eq!(seesaw.ball_at_height(1, Side::Left), Space::Empty);
        assert_eq!(seesaw.landing_height(Side::Right), 1.0);
    }

    #[test]
    fn test_heavier_left_tilts_down() {
        let mut seesaw = Seesaw::new(1);
        seesaw.add_on_top(colored(1, 1, 2), Side::Left);
        seesaw.update_weight();
        assert!(seesaw.check_gravity().unwrap());
        assert!(!seesaw.check_gravity().unwrap(), "already moving");

        let ticks = settle(&mut seesaw, 0.1);
        assert!((10..=11).contains(&ticks));
        assert_eq!(seesaw.tilt(), -1.0);
        assert_eq!(seesaw.blocked_rows(Side::Left), 0);
        assert_eq!(seesaw.blocked_rows(Side::Right), 2);
        assert_eq!(seesaw.top_ball(Side::Left).map(|(_, row)| row), Some(0));
        assert_eq!(seesaw.column(Side::Right), 3);
    }

    #[test]
    fn test_blocked_heights_sum_to_two_while_tilting() {
        let mut seesaw = Seesaw::new(0);
        seesaw.add_on_top(colored(1, 1, 1), Side::Right);
        seesaw.update_weight();
        seesaw.check_gravity().unwrap();
        while seesaw.is_moving() {
            let sum = seesaw.blocked_height(Side::Left) + seesaw.blocked_height(Side::Right);
            assert!((sum - 2.0).abs() < 1e-5);
            seesaw.tick(0.07);
        }
        assert_eq!(seesaw.tilt(), 1.0);
    }

    #[test]
    fn test_equal_weights_at_rest_do_nothing() {
        let mut seesaw = Seesaw::new(0);
        seesaw.update_weight();
        assert!(!seesaw.check_gravity().unwrap());
        assert!(!seesaw.tick(0.1));
    }

    #[test]
    fn test_start_tilt_to_current_position_is_a_contract_violation() {
        let mut seesaw = Seesaw::new(2);
        assert_eq!(
            seesaw.start_tilt(0.0),
            Err(SimError::TiltToCurrentPosition { seesaw: 2, tilt: 0.0 })
        );
    }

    #[test]
    fn test_throw_pops_lighter_top() {
        let mut seesaw = Seesaw::new(0);
        let light = colored(1, 1, 1);
        seesaw.add_on_top(light, Side::Left);
        seesaw.update_weight();
        seesaw.check_gravity().unwrap();
        settle(&mut seesaw, 0.1);

        seesaw.add_on_top(colored(2, 1, 3), Side::Right);
        seesaw.update_weight();
        assert!(seesaw.check_gravity().unwrap());
        let throw = seesaw.throw_top_ball().unwrap();
        assert_eq!(throw.ball, light);
        assert_eq!(throw.range, 2);
        assert_eq!(throw.origin, Vec2::new(0.0, 0.0));
        assert!(seesaw.is_empty(Side::Left));
    }

    #[test]
    fn test_balls_leaving_a_stack_lose_their_mark() {
        let mut seesaw = Seesaw::new(0);
        for id in 1..=3 {
            let mut ball = colored(id, 1, 3);
            ball.mark_for_scoring();
            seesaw.add_on_top(ball, Side::Left);
        }
        let mut marked = colored(4, 2, 1);
        marked.mark_for_scoring();
        seesaw.add_on_top(marked, Side::Right);

        let dropped = seesaw.remove_ball_at(Side::Left, 2).unwrap();
        assert_eq!(dropped.len(), 1);
        assert!(dropped.iter().all(|d| !d.ball.is_scoring()));

        seesaw.update_weight();
        let throw = seesaw.throw_top_ball().unwrap();
        assert_eq!(throw.ball.id, BallId(4));
        assert!(!throw.ball.is_scoring());
    }

    #[test]
    fn test_throw_with_empty_lighter_side() {
        let mut seesaw = Seesaw::new(0);
        seesaw.add_on_top(colored(1, 1, 1), Side::Left);
        seesaw.update_weight();
        assert!(seesaw.throw_top_ball().is_none());
    }

    #[test]
    fn test_remove_drops_everything_above_bottom_first() {
        let mut seesaw = Seesaw::new(0);
        for id in 1..=4 {
            seesaw.add_on_top(colored(id, 1, 1), Side::Left);
        }
        // balanced: one blocked row, balls at rows 1..=4
        let dropped = seesaw.remove_ball_at(Side::Left, 2).unwrap();
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped[0].ball.id, BallId(3));
        assert_eq!(dropped[0].height, 3.0);
        assert_eq!(dropped[1].ball.id, BallId(4));
        assert_eq!(dropped[1].height, 4.0);
        assert_eq!(seesaw.stack(Side::Left).len(), 1);
    }

    #[test]
    fn test_remove_from_empty_and_blocked() {
        let mut seesaw = Seesaw::new(0);
        assert!(seesaw.remove_ball_at(Side::Right, 5).unwrap().is_empty());
        assert_eq!(
            seesaw.remove_ball_at(Side::Right, 0),
            Err(SimError::RemoveFromBlocked { x: 1, y: 0 })
        );
    }

    #[test]
    fn test_remove_scored_balls() {
        let mut seesaw = Seesaw::new(0);
        seesaw.add_on_top(colored(1, 3, 1), Side::Left);
        seesaw.add_on_top(colored(2, 2, 1), Side::Left);
        seesaw.add_on_top(colored(3, 3, 1), Side::Left);
        seesaw.add_on_top(colored(4, 1, 1), Side::Left);
        seesaw.add_on_top(colored(5, 3, 1), Side::Right);

        let ScoredRemoval { removed, dropped } =
            seesaw.remove_scored_balls(&[BallId(2), BallId(3), BallId(5), BallId(9)]);
        let removed: Vec<BallId> = removed.iter().map(|ball| ball.id).collect();
        assert_eq!(removed, vec![BallId(2), BallId(3), BallId(5)]);
        assert_eq!(seesaw.stack(Side::Left).len(), 1);
        assert_eq!(seesaw.stack(Side::Left)[0].id, BallId(1));
        assert!(seesaw.is_empty(Side::Right));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].ball.id, BallId(4));
        assert_eq!(dropped[0].height, 4.0);
    }

    #[test]
    fn test_check_alive_depends_on_tilt() {
        let mut seesaw = Seesaw::new(0);
        for id in 0..7 {
            seesaw.add_on_top(colored(id, 1, 1), Side::Left);
        }
        assert!(seesaw.check_alive(8));
        seesaw.add_on_top(colored(7, 1, 1), Side::Left);
        assert!(!seesaw.check_alive(8));

        seesaw.update_weight();
        seesaw.check_gravity().unwrap();
        assert!(seesaw.check_alive(8), "moving seesaws never lose");
        settle(&mut seesaw, 0.25);
        assert!(seesaw.check_alive(8));
    }

    #[test]
    fn test_combine_vertical_run() {
        let mut seesaw = Seesaw::new(0);
        seesaw.add_on_top(colored(1, 1, 9), Side::Right);
        for id in 2..=6 {
            seesaw.add_on_top(colored(id, 2, id), Side::Right);
        }
        seesaw.add_on_top(colored(7, 3, 1), Side::Right);

        let combined = seesaw.combine_vertical_run(Side::Right, 5).unwrap();
        assert_eq!(combined.ball.id, BallId(2));
        assert_eq!(combined.ball.weight(), 2 + 3 + 4 + 5 + 6);
        assert_eq!(combined.row, 2);
        assert_eq!(combined.column, 1);
        assert_eq!(seesaw.stack(Side::Right).len(), 2);
        assert_eq!(combined.dropped.len(), 1);
        assert_eq!(combined.dropped[0].ball.id, BallId(7));
        assert_eq!(combined.dropped[0].height, 7.0);

        assert!(seesaw.combine_vertical_run(Side::Right, 5).is_none());
    }
}

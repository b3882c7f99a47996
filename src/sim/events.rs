//! Ongoing events and the run-queue
//!
//! Each event is a small state machine advanced once per tick by
//! `Simulation::tick`. Events never touch the queue they live in; the
//! simulation collects survivors into a fresh list each tick and appends
//! anything spawned during that tick behind them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallKind};
use super::error::{SimError, SimResult};
use super::playfield::Playfield;
use super::seesaw::Throw;
use super::trajectory;
use crate::config::TickRates;

/// Discriminant for queue introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    FallingBall,
    ThrownBall,
    Scoring,
    Combining,
    Explosion,
}

/// A ball dropping straight down a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingBall {
    pub ball: Ball,
    pub column: usize,
    pub height: f32,
}

impl FallingBall {
    pub fn new(ball: Ball, column: usize, height: f32) -> Self {
        Self {
            ball,
            column,
            height,
        }
    }
}

/// Outcome of one thrown-ball tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrowStep {
    Flying,
    /// Trajectory done above an in-bound column
    Landed { column: usize },
    /// Crossed a board edge and re-entered from the other side
    FlewOut,
}

/// A ball on its parabola after being launched by a seesaw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrownBall {
    pub ball: Ball,
    pub origin: Vec2,
    /// -1..=num_columns, the ends being fly-out sentinels
    pub destination: i32,
    pub pos: Vec2,
    pub remaining_range: i32,
    pub t: f32,
    pub speedup_pastmax: f32,
}

impl ThrownBall {
    pub fn launch(throw: Throw, rates: &TickRates) -> SimResult<Self> {
        if throw.range == 0 {
            return Err(SimError::ZeroThrowingRange {
                column: throw.origin.x as usize,
            });
        }
        let dest = trajectory::launch_destination(
            throw.origin.x as i32,
            throw.range,
            rates.num_columns as i32,
        );
        log::debug!(
            "Throwing {:?} from {} with range {}, destination {}, remaining {}",
            throw.ball.id,
            throw.origin,
            throw.range,
            dest.column,
            dest.remaining_range
        );

        Ok(Self {
            ball: throw.ball,
            origin: throw.origin,
            destination: dest.column,
            pos: throw.origin,
            remaining_range: dest.remaining_range,
            t: -1.0,
            speedup_pastmax: trajectory::speedup_pastmax(
                throw.origin.y,
                rates.thrown_ball_maxheight,
                rates.thrown_ball_dropheight,
            ),
        })
    }

    pub fn advance(&mut self, rates: &TickRates) -> ThrowStep {
        if self.t < 0.0 {
            self.t += rates.thrown_ball_dt;
        } else {
            self.t += rates.thrown_ball_dt * self.speedup_pastmax;
        }

        if self.t > 1.0 {
            if self.destination == -1 || self.destination == rates.num_columns as i32 {
                self.fly_out(self.destination == -1, rates);
                return ThrowStep::FlewOut;
            }
            return ThrowStep::Landed {
                column: self.destination as usize,
            };
        }

        self.pos = trajectory::position(
            self.t,
            self.origin,
            self.destination as f32,
            rates.thrown_ball_maxheight,
            rates.thrown_ball_dropheight,
        );
        ThrowStep::Flying
    }

    /// Re-enter from the opposite edge, converting the ball
    pub fn fly_out(&mut self, left: bool, rates: &TickRates) {
        let num_columns = rates.num_columns as i32;
        self.ball.convert(trajectory::fly_out_kind(self.ball.kind));

        self.t = -1.0;
        let x = if left { num_columns as f32 } else { -1.0 };
        self.pos = Vec2::new(x, rates.thrown_ball_flyover_height);
        self.origin = self.pos;

        let dest = trajectory::fly_out_destination(left, self.remaining_range, num_columns);
        self.destination = dest.column;
        self.remaining_range = dest.remaining_range;
        self.speedup_pastmax = trajectory::speedup_pastmax(
            self.origin.y,
            rates.thrown_ball_maxheight,
            rates.thrown_ball_dropheight,
        );
        log::debug!(
            "Ball {:?} flew out (left={}), now {:?}, destination {}, remaining {}",
            self.ball.id,
            left,
            self.ball.kind,
            self.destination,
            self.remaining_range
        );
    }
}

/// A connected same-color region being marked one ring at a time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    /// Marked balls, in marking order
    pub past: Vec<Ball>,
    next: Vec<(usize, usize)>,
    delay: u32,
    weight_so_far: u32,
    /// Decides what matches and how the payout works
    template: Ball,
}

impl Scoring {
    pub fn new(anchor: (usize, usize), template: Ball, delay: u32) -> Self {
        Self {
            past: Vec::new(),
            next: vec![anchor],
            delay,
            weight_so_far: 0,
            template,
        }
    }

    pub fn weight_so_far(&self) -> u32 {
        self.weight_so_far
    }

    pub fn template(&self) -> &Ball {
        &self.template
    }

    pub fn frontier(&self) -> &[(usize, usize)] {
        &self.next
    }

    /// Count down. True once the countdown hit zero and an expansion is due.
    pub fn count_down(&mut self) -> bool {
        self.delay = self.delay.saturating_sub(1);
        self.delay == 0
    }

    pub fn restart_delay(&mut self, delay: u32) {
        self.delay = delay;
    }

    /// Mark every unmarked matching ball in the frontier and queue its
    /// in-bound neighbors. True if the next frontier is non-empty.
    pub fn expand(&mut self, playfield: &mut Playfield) -> SimResult<bool> {
        let num_columns = playfield.num_columns();
        let rows = playfield.rows();
        let now = std::mem::take(&mut self.next);

        for (x, y) in now {
            let Some(ball) = playfield.ball_at_mut(x, y)? else {
                continue;
            };
            if ball.is_scoring() || !ball.matches_color(&self.template) {
                continue;
            }
            ball.mark_for_scoring();
            self.weight_so_far += ball.weight();
            self.past.push(*ball);

            let neighbors = [
                x.checked_sub(1).map(|x2| (x2, y)),
                Some((x + 1, y)),
                y.checked_sub(1).map(|y2| (x, y2)),
                Some((x, y + 1)),
            ];
            self.next.extend(
                neighbors
                    .into_iter()
                    .flatten()
                    .filter(|&(x2, y2)| x2 < num_columns && y2 < rows),
            );
        }

        log::trace!(
            "Scoring expanded: {} marked, weight {}, frontier {}",
            self.past.len(),
            self.weight_so_far,
            self.next.len()
        );
        Ok(!self.next.is_empty())
    }

    /// Hearts feed the score factor, colored balls pay points
    pub fn is_heart_scoring(&self) -> bool {
        matches!(self.template.kind, BallKind::Heart)
    }
}

/// Cosmetic marker for a vertical merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combining {
    pub column: usize,
    pub row: usize,
    pub t: f32,
    pub color: u32,
    pub weight: u32,
}

impl Combining {
    pub fn new(column: usize, row: usize, color: u32, weight: u32) -> Self {
        Self {
            column,
            row,
            t: 0.0,
            color,
            weight,
        }
    }

    /// False once finished
    pub fn advance(&mut self, combining_dt: f32) -> bool {
        self.t += combining_dt;
        self.t <= 1.0
    }
}

/// Cosmetic marker for a detonated bomb. Sits one cell up-left of the blast
/// center so a 3x3 sprite covers the whole area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub x: i32,
    pub y: i32,
    pub progress: f32,
}

impl Explosion {
    pub fn centered_at(x: usize, y: usize) -> Self {
        Self {
            x: x as i32 - 1,
            y: y as i32 + 1,
            progress: 0.0,
        }
    }

    /// False once finished
    pub fn advance(&mut self, explosion_numticks: f32) -> bool {
        self.progress += 1.0 / explosion_numticks;
        self.progress <= 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ongoing {
    FallingBall(FallingBall),
    ThrownBall(ThrownBall),
    Scoring(Scoring),
    Combining(Combining),
    Explosion(Explosion),
}

impl Ongoing {
    pub fn kind(&self) -> EventKind {
        match self {
            Ongoing::FallingBall(_) => EventKind::FallingBall,
            Ongoing::ThrownBall(_) => EventKind::ThrownBall,
            Ongoing::Scoring(_) => EventKind::Scoring,
            Ongoing::Combining(_) => EventKind::Combining,
            Ongoing::Explosion(_) => EventKind::Explosion,
        }
    }

    /// The ball carried by a falling or thrown ball
    pub fn ball(&self) -> Option<&Ball> {
        match self {
            Ongoing::FallingBall(falling) => Some(&falling.ball),
            Ongoing::ThrownBall(thrown) => Some(&thrown.ball),
            Ongoing::Scoring(_) | Ongoing::Combining(_) | Ongoing::Explosion(_) => None,
        }
    }
}

/// Insertion-ordered run-queue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueue {
    events: Vec<Ongoing>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Ongoing) {
        log::trace!("Event queued: {:?}", event.kind());
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event_type_exists(&self, kind: EventKind) -> bool {
        self.events.iter().any(|e| e.kind() == kind)
    }

    pub fn first_of_kind(&self, kind: EventKind) -> Option<&Ongoing> {
        self.events.iter().find(|e| e.kind() == kind)
    }

    pub fn count_of_kind(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn oldest(&self) -> Option<&Ongoing> {
        self.events.first()
    }

    pub fn newest(&self) -> Option<&Ongoing> {
        self.events.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ongoing> {
        self.events.iter()
    }

    pub fn reset(&mut self) {
        self.events.clear();
    }

    /// Hand out this tick's events, leaving the queue empty to collect spawns
    pub(crate) fn take_pending(&mut self) -> Vec<Ongoing> {
        std::mem::take(&mut self.events)
    }

    /// Put survivors back in front of whatever was spawned while they ticked
    pub(crate) fn restore(&mut self, mut survivors: Vec<Ongoing>) {
        survivors.append(&mut self.events);
        self.events = survivors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::sim::ball::BallId;

    fn rates() -> TickRates {
        SimConfig::with_fps(20.0).validate().unwrap()
    }

    fn colored(id: u32) -> Ball {
        Ball::new(BallId(id), BallKind::Colored { color: 1, weight: 1 })
    }

    #[test]
    fn test_queue_order_and_restore() {
        let mut queue = EventQueue::new();
        queue.push(Ongoing::FallingBall(FallingBall::new(colored(1), 0, 8.0)));
        queue.push(Ongoing::Explosion(Explosion::centered_at(3, 3)));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.oldest().map(Ongoing::kind), Some(EventKind::FallingBall));
        assert_eq!(queue.newest().map(Ongoing::kind), Some(EventKind::Explosion));

        let pending = queue.take_pending();
        assert!(queue.is_empty());
        queue.push(Ongoing::Combining(Combining::new(0, 1, 1, 5)));
        queue.restore(pending);
        let kinds: Vec<_> = queue.iter().map(Ongoing::kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::FallingBall, EventKind::Explosion, EventKind::Combining]
        );

        assert!(queue.event_type_exists(EventKind::Combining));
        assert!(!queue.event_type_exists(EventKind::Scoring));
        queue.reset();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_thrown_ball_lands_in_range() {
        let rates = rates();
        let throw = Throw {
            ball: colored(1),
            origin: Vec2::new(0.0, 1.0),
            range: 2,
        };
        let mut thrown = ThrownBall::launch(throw, &rates).unwrap();
        assert_eq!(thrown.destination, 2);

        let mut steps = 0;
        let step = loop {
            steps += 1;
            match thrown.advance(&rates) {
                ThrowStep::Flying => assert!(steps < 1000),
                other => break other,
            }
        };
        assert_eq!(step, ThrowStep::Landed { column: 2 });
    }

    #[test]
    fn test_zero_range_is_rejected() {
        let throw = Throw {
            ball: colored(1),
            origin: Vec2::new(3.0, 2.0),
            range: 0,
        };
        assert_eq!(
            ThrownBall::launch(throw, &rates()),
            Err(SimError::ZeroThrowingRange { column: 3 })
        );
    }

    #[test]
    fn test_fly_out_converts_and_reenters() {
        let rates = rates();
        let throw = Throw {
            ball: colored(7),
            origin: Vec2::new(6.0, 1.0),
            range: 22,
        };
        let mut thrown = ThrownBall::launch(throw, &rates).unwrap();
        assert_eq!(thrown.destination, 8);

        let mut fly_outs = 0;
        loop {
            match thrown.advance(&rates) {
                ThrowStep::Flying => {}
                ThrowStep::FlewOut => {
                    fly_outs += 1;
                    assert_eq!(thrown.pos.y, rates.thrown_ball_flyover_height);
                    assert_eq!(thrown.t, -1.0);
                }
                ThrowStep::Landed { column } => {
                    assert_eq!(column, 4);
                    break;
                }
            }
        }
        assert_eq!(fly_outs, 3);
        assert_eq!(thrown.ball.kind, BallKind::Heart);
        assert_eq!(thrown.ball.id, BallId(7));
    }

    #[test]
    fn test_cosmetic_countdowns_finish() {
        let rates = rates();
        let mut combining = Combining::new(0, 1, 1, 5);
        let mut ticks = 0;
        while combining.advance(rates.combining_dt) {
            ticks += 1;
        }
        assert!((19..=21).contains(&ticks));

        let mut explosion = Explosion::centered_at(0, 0);
        assert_eq!((explosion.x, explosion.y), (-1, 1));
        let mut ticks = 0;
        while explosion.advance(rates.explosion_numticks) {
            ticks += 1;
        }
        assert!((29..=31).contains(&ticks));
    }
}

//! Ball supply: generator, depot and crane
//!
//! Everything random lives here, never inside `sim`. The generator only
//! decides ball kinds; ids come from the simulation that will own the balls.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::TickRates;
use crate::sim::{Ball, BallKind, SimError, SimResult};

const SPECIALS: [BallKind; 3] = [BallKind::Bomb, BallKind::Cutter, BallKind::Heart];

/// Seeded source of upcoming ball kinds
#[derive(Debug, Clone)]
pub struct BallGenerator {
    rng: Pcg32,
    next_special: BallKind,
    /// Colored balls still to come before `next_special`
    next_special_delay: u32,
    start_level: u32,
    balls_per_level: u32,
    min_balls_between_specials: u32,
}

impl BallGenerator {
    pub fn new(seed: u64, rates: &TickRates) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            next_special: BallKind::Bomb,
            next_special_delay: 5,
            start_level: rates.start_level,
            balls_per_level: rates.balls_per_level,
            min_balls_between_specials: rates.min_balls_between_specials,
        }
    }

    pub fn next_special(&self) -> BallKind {
        self.next_special
    }

    pub fn next_special_delay(&self) -> u32 {
        self.next_special_delay
    }

    /// Next ball kind for a game at `level` with `balls_dropped` so far
    pub fn generate_ball(&mut self, level: u32, balls_dropped: u32) -> BallKind {
        if self.next_special_delay == 0 {
            let special = self.next_special;
            self.regenerate_special(level);
            return special;
        }
        self.next_special_delay -= 1;

        // the newest color shows up more often early in a level
        let early_in_level =
            balls_dropped % self.balls_per_level < (0.2 * self.balls_per_level as f32) as u32;
        let newest_color = level.saturating_sub(1).max(1);
        let color = if early_in_level && self.rng.random_bool(0.5) {
            newest_color
        } else {
            self.rng.random_range(1..=newest_color)
        };
        let weight = self.rng.random_range(1..=level.max(1));
        BallKind::Colored { color, weight }
    }

    /// Colored ball drawn from the start-level palette
    pub fn generate_starting_ball(&mut self) -> BallKind {
        let color = self.rng.random_range(1..=self.start_level.saturating_sub(1).max(1));
        let weight = self.rng.random_range(1..=self.start_level);
        BallKind::Colored { color, weight }
    }

    fn regenerate_special(&mut self, level: u32) {
        let unlocked: Vec<BallKind> = SPECIALS
            .into_iter()
            .filter(|kind| kind.level_required() <= level)
            .collect();
        // nothing unlocked yet: keep the pending special, try again later
        if let Some(&pick) = unlocked.choose(&mut self.rng) {
            self.next_special = pick;
            let required = pick.level_required();
            let low = (0.8 * required as f32) as u32;
            let high = (1.2 * required as f32) as u32;
            self.next_special_delay = self.rng.random_range(low..=high);
        }
        self.next_special_delay = self
            .next_special_delay
            .max(self.min_balls_between_specials);
        log::debug!(
            "Next special: {:?} in {} balls",
            self.next_special,
            self.next_special_delay
        );
    }
}

/// Two balls waiting above each column. The crane takes the lower one.
#[derive(Debug, Clone)]
pub struct Depot {
    /// Per column: `[upper, lower]`
    content: Vec<[Ball; 2]>,
}

impl Depot {
    pub fn new(num_columns: usize, mut fill: impl FnMut() -> Ball) -> Self {
        Self {
            content: (0..num_columns).map(|_| [fill(), fill()]).collect(),
        }
    }

    pub fn num_columns(&self) -> usize {
        self.content.len()
    }

    /// `(upper, lower)` for one column
    pub fn balls(&self, column: usize) -> Option<(Ball, Ball)> {
        self.content.get(column).map(|[upper, lower]| (*upper, *lower))
    }

    /// Take the lower ball, move the upper one down and put `replacement` on top
    pub fn next_ball(&mut self, column: usize, replacement: Ball) -> SimResult<Ball> {
        let slot = self
            .content
            .get_mut(column)
            .ok_or(SimError::ColumnOutOfRange(column))?;
        let [upper, lower] = *slot;
        *slot = [replacement, upper];
        Ok(lower)
    }
}

/// Crane position and the ball it holds
#[derive(Debug, Clone)]
pub struct Crane {
    column: usize,
    ball: Ball,
    num_columns: usize,
}

impl Crane {
    pub fn new(num_columns: usize, ball: Ball) -> Self {
        Self {
            column: 0,
            ball,
            num_columns,
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn ball(&self) -> Ball {
        self.ball
    }

    /// No-op at the left edge
    pub fn move_left(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    /// No-op at the right edge
    pub fn move_right(&mut self) {
        if self.column + 1 < self.num_columns {
            self.column += 1;
        }
    }

    pub fn move_to_column(&mut self, column: usize) -> SimResult<()> {
        if column >= self.num_columns {
            return Err(SimError::ColumnOutOfRange(column));
        }
        self.column = column;
        Ok(())
    }

    /// Hand over the held ball and hold `next` instead
    pub fn swap_ball(&mut self, next: Ball) -> Ball {
        std::mem::replace(&mut self.ball, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::sim::BallId;

    fn rates() -> TickRates {
        SimConfig::default().validate().unwrap()
    }

    #[test]
    fn test_generator_is_deterministic() {
        let mut a = BallGenerator::new(42, &rates());
        let mut b = BallGenerator::new(42, &rates());
        for dropped in 0..100 {
            assert_eq!(a.generate_ball(4, dropped), b.generate_ball(4, dropped));
        }
    }

    #[test]
    fn test_first_special_is_a_bomb_after_five() {
        let mut generator = BallGenerator::new(7, &rates());
        assert_eq!(generator.next_special(), BallKind::Bomb);
        assert_eq!(generator.next_special_delay(), 5);
        for dropped in 0..5 {
            assert!(!generator.generate_ball(4, dropped).is_special());
        }
        assert_eq!(generator.generate_ball(4, 5), BallKind::Bomb);
        assert!(generator.next_special_delay() >= 3);
    }

    #[test]
    fn test_specials_respect_level() {
        let mut generator = BallGenerator::new(3, &rates());
        for dropped in 0..500 {
            let kind = generator.generate_ball(4, dropped);
            assert_ne!(kind, BallKind::Cutter);
            if let BallKind::Colored { color, weight } = kind {
                assert!((1..=3).contains(&color));
                assert!((1..=4).contains(&weight));
            }
        }
    }

    #[test]
    fn test_starting_balls_are_colored() {
        let mut generator = BallGenerator::new(1, &rates());
        for _ in 0..100 {
            match generator.generate_starting_ball() {
                BallKind::Colored { color, weight } => {
                    assert!((1..=3).contains(&color));
                    assert!((1..=4).contains(&weight));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_depot_shifts_down() {
        let mut next = 0;
        let mut make = || {
            next += 1;
            Ball::new(BallId(next), BallKind::Heart)
        };
        let mut depot = Depot::new(8, &mut make);
        assert_eq!(depot.num_columns(), 8);
        let (upper, lower) = depot.balls(2).unwrap();

        let taken = depot.next_ball(2, make()).unwrap();
        assert_eq!(taken, lower);
        let (new_upper, new_lower) = depot.balls(2).unwrap();
        assert_eq!(new_lower, upper);
        assert_eq!(new_upper.id, BallId(17));

        assert_eq!(
            depot.next_ball(8, make()),
            Err(SimError::ColumnOutOfRange(8))
        );
    }

    #[test]
    fn test_crane_moves_within_bounds() {
        let mut crane = Crane::new(8, Ball::new(BallId(1), BallKind::Bomb));
        crane.move_left();
        assert_eq!(crane.column(), 0);
        for _ in 0..10 {
            crane.move_right();
        }
        assert_eq!(crane.column(), 7);
        assert!(crane.move_to_column(3).is_ok());
        assert_eq!(crane.column(), 3);
        assert_eq!(crane.move_to_column(8), Err(SimError::ColumnOutOfRange(8)));

        let old = crane.swap_ball(Ball::new(BallId(2), BallKind::Heart));
        assert_eq!(old.id, BallId(1));
        assert_eq!(crane.ball().id, BallId(2));
    }
}

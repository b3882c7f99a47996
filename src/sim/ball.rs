//! Board occupants: empty cells, seesaw-blocked cells and the ball kinds
//!
//! A ball's landing behavior lives in `tick.rs` (it needs the whole
//! simulation); this module only knows weights, colors and matching.

use serde::{Deserialize, Serialize};

/// Unique per simulation, allocated by `Simulation::new_ball`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId(pub u32);

/// Ball variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallKind {
    /// Plain ball, the only kind that pays out score
    Colored { color: u32, weight: u32 },
    /// Explodes a 3x3 area when landing on another ball, dormant on the ground
    Bomb,
    /// Drills through the column it lands on
    Cutter,
    /// Scores into the global score factor instead of points
    Heart,
}

impl BallKind {
    /// Level at which a special starts showing up in the supply
    pub fn level_required(&self) -> u32 {
        match self {
            BallKind::Colored { .. } => 0,
            BallKind::Bomb | BallKind::Heart => 4,
            BallKind::Cutter => 5,
        }
    }

    pub fn is_special(&self) -> bool {
        !matches!(self, BallKind::Colored { .. })
    }
}

/// A ball on the board, in flight or in the supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub kind: BallKind,
    /// Marked by an expanding Scoring
    scoring: bool,
}

impl Ball {
    pub fn new(id: BallId, kind: BallKind) -> Self {
        Self {
            id,
            kind,
            scoring: false,
        }
    }

    pub fn weight(&self) -> u32 {
        match self.kind {
            BallKind::Colored { weight, .. } => weight,
            BallKind::Bomb | BallKind::Cutter | BallKind::Heart => 0,
        }
    }

    /// Color index, `None` for specials
    pub fn color(&self) -> Option<u32> {
        match self.kind {
            BallKind::Colored { color, .. } => Some(color),
            _ => None,
        }
    }

    /// Colored balls match on color, hearts match hearts, nothing else matches
    pub fn matches_color(&self, other: &Ball) -> bool {
        match (self.kind, other.kind) {
            (BallKind::Colored { color: a, .. }, BallKind::Colored { color: b, .. }) => a == b,
            (BallKind::Heart, BallKind::Heart) => true,
            _ => false,
        }
    }

    pub fn is_scoring(&self) -> bool {
        self.scoring
    }

    /// Idempotent; only colored balls and hearts can be marked
    pub fn mark_for_scoring(&mut self) {
        if matches!(self.kind, BallKind::Colored { .. } | BallKind::Heart) {
            self.scoring = true;
        }
    }

    pub fn set_weight(&mut self, new_weight: u32) {
        if let BallKind::Colored { weight, .. } = &mut self.kind {
            *weight = new_weight;
        }
    }

    /// Drop a scoring mark, for balls leaving their stack some other way
    pub fn clear_scoring_mark(&mut self) {
        self.scoring = false;
    }

    /// Change kind in flight (fly-outs). Clears any scoring mark.
    pub fn convert(&mut self, kind: BallKind) {
        self.kind = kind;
        self.scoring = false;
    }
}

/// What occupies one board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Space {
    Empty,
    /// Raised part of a tilted seesaw
    Blocked,
    Occupied(Ball),
}

impl Space {
    pub fn weight(&self) -> u32 {
        match self {
            Space::Occupied(ball) => ball.weight(),
            Space::Empty | Space::Blocked => 0,
        }
    }

    pub fn color(&self) -> Option<u32> {
        match self {
            Space::Occupied(ball) => ball.color(),
            Space::Empty | Space::Blocked => None,
        }
    }

    pub fn matches_color(&self, other: &Ball) -> bool {
        match self {
            Space::Occupied(ball) => ball.matches_color(other),
            Space::Empty | Space::Blocked => false,
        }
    }

    pub fn is_scoring(&self) -> bool {
        match self {
            Space::Occupied(ball) => ball.is_scoring(),
            Space::Empty | Space::Blocked => false,
        }
    }

    pub fn ball(&self) -> Option<&Ball> {
        match self {
            Space::Occupied(ball) => Some(ball),
            Space::Empty | Space::Blocked => None,
        }
    }

    pub fn is_ball(&self) -> bool {
        matches!(self, Space::Occupied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored(id: u32, color: u32, weight: u32) -> Ball {
        Ball::new(BallId(id), BallKind::Colored { color, weight })
    }

    #[test]
    fn test_specials_weigh_nothing() {
        for kind in [BallKind::Bomb, BallKind::Cutter, BallKind::Heart] {
            let ball = Ball::new(BallId(1), kind);
            assert_eq!(ball.weight(), 0);
            assert_eq!(ball.color(), None);
        }
        assert_eq!(colored(1, 2, 7).weight(), 7);
    }

    #[test]
    fn test_matching() {
        let a = colored(1, 2, 1);
        let b = colored(2, 2, 5);
        let c = colored(3, 3, 1);
        let heart = Ball::new(BallId(4), BallKind::Heart);
        let heart2 = Ball::new(BallId(5), BallKind::Heart);
        let bomb = Ball::new(BallId(6), BallKind::Bomb);

        assert!(a.matches_color(&b));
        assert!(!a.matches_color(&c));
        assert!(heart.matches_color(&heart2));
        assert!(!heart.matches_color(&a));
        assert!(!bomb.matches_color(&bomb));
        assert!(!Space::Empty.matches_color(&a));
        assert!(!Space::Blocked.matches_color(&a));
    }

    #[test]
    fn test_marking() {
        let mut ball = colored(1, 1, 1);
        assert!(!ball.is_scoring());
        ball.mark_for_scoring();
        ball.mark_for_scoring();
        assert!(ball.is_scoring());

        let mut bomb = Ball::new(BallId(2), BallKind::Bomb);
        bomb.mark_for_scoring();
        assert!(!bomb.is_scoring());

        ball.clear_scoring_mark();
        assert!(!ball.is_scoring());
        ball.mark_for_scoring();
        ball.convert(BallKind::Heart);
        assert!(!ball.is_scoring());
        assert_eq!(ball.id, BallId(1));
    }
}

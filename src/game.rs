//! Game session facade
//!
//! Wires the ball supply to a `Simulation`: the crane drops, the depot
//! refills, the session counts the drop.

use crate::config::TickRates;
use crate::sim::{Ball, SimResult, Simulation};
use crate::supply::{BallGenerator, Crane, Depot};

#[derive(Debug, Clone)]
pub struct Game {
    sim: Simulation,
    depot: Depot,
    crane: Crane,
    generator: BallGenerator,
}

impl Game {
    pub fn new(rates: TickRates, seed: u64) -> Self {
        let mut generator = BallGenerator::new(seed, &rates);
        let mut sim = Simulation::new(rates);
        let (depot, crane) = Self::fresh_supply(&mut sim, &mut generator);
        Self {
            sim,
            depot,
            crane,
            generator,
        }
    }

    fn fresh_supply(sim: &mut Simulation, generator: &mut BallGenerator) -> (Depot, Crane) {
        let num_columns = sim.rates().num_columns;
        let depot = Depot::new(num_columns, || {
            let kind = generator.generate_starting_ball();
            sim.new_ball(kind)
        });
        let kind = generator.generate_starting_ball();
        let crane = Crane::new(num_columns, sim.new_ball(kind));
        (depot, crane)
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn depot(&self) -> &Depot {
        &self.depot
    }

    pub fn crane(&self) -> &Crane {
        &self.crane
    }

    pub fn crane_mut(&mut self) -> &mut Crane {
        &mut self.crane
    }

    pub fn generator(&self) -> &BallGenerator {
        &self.generator
    }

    pub fn score(&self) -> u64 {
        self.sim.session().score
    }

    pub fn level(&self) -> u32 {
        self.sim.session().level
    }

    /// Drop the crane's ball into its column and reload the crane from the depot
    pub fn drop_ball(&mut self) -> SimResult<Ball> {
        let column = self.crane.column();
        let ball = self.crane.ball();
        self.sim.drop_ball_in_column(ball, column)?;

        let session = self.sim.session();
        let kind = self
            .generator
            .generate_ball(session.level, session.balls_dropped);
        let replacement = self.sim.new_ball(kind);
        let next = self.depot.next_ball(column, replacement)?;
        self.crane.swap_ball(next);

        let balls_per_level = self.sim.rates().balls_per_level;
        self.sim.session_mut().record_drop(balls_per_level);
        Ok(ball)
    }

    /// One simulation step. Nothing moves after a loss.
    pub fn tick(&mut self) -> SimResult<()> {
        if self.is_game_over() {
            return Ok(());
        }
        self.sim.tick()
    }

    pub fn is_game_over(&self) -> bool {
        !self.sim.playfield().is_alive()
    }

    /// Back to the state of a fresh game. The RNG stream continues.
    pub fn reset(&mut self) {
        self.sim.reset();
        let (depot, crane) = Self::fresh_supply(&mut self.sim, &mut self.generator);
        self.depot = depot;
        self.crane = crane;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::sim::{EventKind, Ongoing};

    fn game() -> Game {
        let rates = SimConfig::with_fps(20.0).validate().unwrap();
        Game::new(rates, 12345)
    }

    #[test]
    fn test_new_game() {
        let game = game();
        assert_eq!(game.score(), 0);
        assert_eq!(game.level(), 4);
        assert_eq!(game.sim().session().balls_dropped, 0);
        assert_eq!(game.depot().num_columns(), 8);
        assert_eq!(game.crane().column(), 0);
        assert!(!game.is_game_over());
        assert!(game.sim().is_settled());
    }

    #[test]
    fn test_drop_starts_falling_ball() {
        let mut game = game();
        game.crane_mut().move_to_column(3).unwrap();
        let held = game.crane().ball();
        let (_, lower) = game.depot().balls(3).unwrap();

        let dropped = game.drop_ball().unwrap();
        assert_eq!(dropped.id, held.id);
        assert_eq!(game.crane().ball().id, lower.id);
        assert_eq!(game.sim().session().balls_dropped, 1);

        match game.sim().queue().newest() {
            Some(Ongoing::FallingBall(falling)) => {
                assert_eq!(falling.ball.id, held.id);
                assert_eq!(falling.column, 3);
            }
            other => panic!("expected a falling ball, got {other:?}"),
        }
        assert_eq!(game.sim().queue().count_of_kind(EventKind::FallingBall), 1);
    }

    #[test]
    fn test_level_up_after_balls_per_level() {
        let mut game = game();
        let balls_per_level = game.sim().rates().balls_per_level;
        for _ in 0..balls_per_level - 1 {
            game.drop_ball().unwrap();
        }
        assert_eq!(game.level(), 4);
        game.drop_ball().unwrap();
        assert_eq!(game.level(), 5);
    }

    #[test]
    fn test_tick_is_noop_after_game_over() {
        let mut game = game();
        game.sim_mut().playfield_mut().mark_dead();
        game.drop_ball().unwrap();
        game.tick().unwrap();
        assert_eq!(game.sim().tick_count(), 0);
        assert!(game.is_game_over());
    }

    #[test]
    fn test_reset_restores_start_state() {
        let mut game = game();
        game.crane_mut().move_right();
        for _ in 0..3 {
            game.drop_ball().unwrap();
        }
        for _ in 0..10 {
            game.tick().unwrap();
        }
        game.reset();
        assert_eq!(game.crane().column(), 0);
        assert_eq!(game.level(), 4);
        assert_eq!(game.sim().session().balls_dropped, 0);
        assert!(game.sim().queue().is_empty());
        assert_eq!(game.sim().playfield().get_number_of_balls(), 0);
    }
}

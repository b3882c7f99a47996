//! Seesaw Swing headless driver
//!
//! Loads an optional JSON config, drops a fixed script of balls and runs the
//! simulation to rest after each one.

use std::error::Error;
use std::fs;

use seesaw_swing::sim::{EventKind, Space};
use seesaw_swing::{Game, SimConfig};

/// Crane columns, one drop each
const DROP_SCRIPT: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 3, 3, 4, 4, 0, 7, 2, 5];
const SEED: u64 = 0x5EE5A3;
/// Upper bound on ticks spent settling a single drop
const MAX_SETTLE_TICKS: u32 = 10_000;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    log::info!("Seesaw Swing (headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from {path}");
            SimConfig::from_json(&fs::read_to_string(&path)?)?
        }
        None => SimConfig::default(),
    };
    let rates = config.validate()?;
    let mut game = Game::new(rates, SEED);

    for (drop, &column) in DROP_SCRIPT.iter().enumerate() {
        game.crane_mut().move_to_column(column)?;
        let ball = game.drop_ball()?;
        log::debug!("Drop {drop}: {:?} into column {column}", ball.kind);

        let mut ticks = 0;
        while !game.sim().is_settled() && ticks < MAX_SETTLE_TICKS {
            game.tick()?;
            ticks += 1;
        }
        if game.is_game_over() {
            log::warn!("Game over after {} drops", drop + 1);
            break;
        }
        if ticks == MAX_SETTLE_TICKS {
            log::warn!(
                "Drop {drop} did not settle, {} thrown balls still in flight",
                game.sim().queue().count_of_kind(EventKind::ThrownBall)
            );
        }
    }

    let playfield = game.sim().playfield();
    for row in (0..playfield.rows()).rev() {
        let line: String = (0..playfield.num_columns())
            .map(|column| match playfield.get_ball_at(column, row) {
                Ok(Space::Occupied(ball)) => match ball.color() {
                    Some(color) => char::from_digit(color % 10, 10).unwrap_or('?'),
                    None => '*',
                },
                Ok(Space::Blocked) => '#',
                _ => '.',
            })
            .collect();
        log::info!("{line}");
    }
    log::info!(
        "Finished: score {}, level {}, {} balls on the board after {} ticks",
        game.score(),
        game.level(),
        playfield.get_number_of_balls(),
        game.sim().tick_count()
    );
    Ok(())
}

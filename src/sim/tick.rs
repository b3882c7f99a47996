//! Fixed timestep simulation tick
//!
//! `Simulation` owns one playfield, one run-queue and one session. A tick
//! advances every seesaw in index order, then every queued event in
//! insertion order. Anything that may cascade only raises a pending-refresh
//! flag; the flag is drained after each seesaw tick, each event tick and
//! each public mutation, so cascades never recurse.

use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallId, BallKind, Space};
use super::error::{SimError, SimResult};
use super::events::{
    Combining, EventQueue, Explosion, FallingBall, Ongoing, Scoring, ThrowStep, ThrownBall,
};
use super::playfield::Playfield;
use super::seesaw::{Dropped, ScoredRemoval};
use super::state::Session;
use crate::config::TickRates;
use crate::consts::COMBINE_RUN;

/// Which branch of the refresh chain fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Refresh {
    /// At least one seesaw is moving
    Gravity,
    /// A new Scoring was started
    Scoring,
    /// A vertical run was merged
    Combining,
    /// Nothing to start; the alive check ran
    Quiescent,
}

/// Where a falling ball came to rest. For a landing on a ball, `row` is the
/// row of that ball; for a landing on empty ground, the first free row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingSite {
    pub column: usize,
    pub row: usize,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    rates: TickRates,
    playfield: Playfield,
    queue: EventQueue,
    session: Session,
    next_id: u32,
    refresh_pending: bool,
    tick_count: u64,
}

impl Simulation {
    pub fn new(rates: TickRates) -> Self {
        Self {
            playfield: Playfield::new(&rates),
            queue: EventQueue::new(),
            session: Session::new(rates.start_level),
            next_id: 1,
            refresh_pending: false,
            tick_count: 0,
            rates,
        }
    }

    pub fn rates(&self) -> &TickRates {
        &self.rates
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// Direct board access; mutations made here do not refresh on their own
    pub fn playfield_mut(&mut self) -> &mut Playfield {
        &mut self.playfield
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Allocate a fresh ball id
    pub fn next_ball_id(&mut self) -> BallId {
        let id = BallId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn new_ball(&mut self, kind: BallKind) -> Ball {
        let id = self.next_ball_id();
        Ball::new(id, kind)
    }

    pub fn colored_ball(&mut self, color: u32, weight: u32) -> Ball {
        self.new_ball(BallKind::Colored { color, weight })
    }

    /// Fresh board, empty run-queue, session back to the start level
    pub fn reset(&mut self) {
        self.playfield = Playfield::new(&self.rates);
        self.queue.reset();
        self.session = Session::new(self.rates.start_level);
        self.refresh_pending = false;
        self.tick_count = 0;
        log::info!("Simulation reset");
    }

    /// Nothing moving, nothing queued
    pub fn is_settled(&self) -> bool {
        self.queue.is_empty() && !self.playfield.any_seesaw_is_moving()
    }

    /// Advance one fixed step: seesaws in index order, then events in queue order
    pub fn tick(&mut self) -> SimResult<()> {
        for index in 0..self.playfield.seesaws().len() {
            let tilting_per_tick = self.rates.tilting_per_tick;
            let arrived = self
                .playfield
                .seesaw_mut(index)
                .is_some_and(|seesaw| seesaw.tick(tilting_per_tick));
            if arrived {
                log::trace!("Seesaw {index} came to rest");
                self.request_refresh();
            }
            self.drain_refresh()?;
        }

        self.tick_events()?;
        self.tick_count += 1;
        Ok(())
    }

    fn tick_events(&mut self) -> SimResult<()> {
        let pending = self.queue.take_pending();
        let mut survivors = Vec::with_capacity(pending.len());
        for event in pending {
            if let Some(event) = self.tick_event(event)? {
                survivors.push(event);
            }
            self.drain_refresh()?;
        }
        self.queue.restore(survivors);
        Ok(())
    }

    /// Advance one event. Returns it back if it is still running.
    fn tick_event(&mut self, event: Ongoing) -> SimResult<Option<Ongoing>> {
        match event {
            Ongoing::FallingBall(mut falling) => {
                falling.height -= self.rates.falling_per_tick;
                let landing = self.playfield.landing_height_of_column(falling.column)?;
                if falling.height >= landing {
                    return Ok(Some(Ongoing::FallingBall(falling)));
                }
                self.land(falling.ball, falling.column)?;
                Ok(None)
            }
            Ongoing::ThrownBall(mut thrown) => match thrown.advance(&self.rates) {
                ThrowStep::Flying | ThrowStep::FlewOut => Ok(Some(Ongoing::ThrownBall(thrown))),
                ThrowStep::Landed { column } => {
                    let height = self.rates.thrown_ball_dropheight - 2.0;
                    self.queue
                        .push(Ongoing::FallingBall(FallingBall::new(thrown.ball, column, height)));
                    Ok(None)
                }
            },
            Ongoing::Scoring(mut scoring) => {
                if !scoring.count_down() {
                    return Ok(Some(Ongoing::Scoring(scoring)));
                }
                if scoring.expand(&mut self.playfield)? {
                    scoring.restart_delay(self.rates.scoring_delay);
                    return Ok(Some(Ongoing::Scoring(scoring)));
                }
                self.finish_scoring(scoring);
                Ok(None)
            }
            Ongoing::Combining(mut combining) => {
                if combining.advance(self.rates.combining_dt) {
                    Ok(Some(Ongoing::Combining(combining)))
                } else {
                    Ok(None)
                }
            }
            Ongoing::Explosion(mut explosion) => {
                if explosion.advance(self.rates.explosion_numticks) {
                    Ok(Some(Ongoing::Explosion(explosion)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Remove the cascade's balls and pay out for the ones that were still there
    fn finish_scoring(&mut self, scoring: Scoring) {
        let ids: Vec<BallId> = scoring.past.iter().map(|ball| ball.id).collect();
        let ScoredRemoval { removed, dropped } = self.playfield.remove_scored_balls(&ids);
        if removed.len() < scoring.past.len() {
            log::debug!(
                "{} marked balls left the board before scoring finished",
                scoring.past.len() - removed.len()
            );
        }

        let count = removed.len();
        if scoring.is_heart_scoring() {
            self.session.increase_score_factor(count);
            log::info!(
                "{} hearts scored, score factor now {:.1}",
                count,
                self.session.global_scorefactor
            );
        } else {
            let weight: u32 = removed.iter().map(Ball::weight).sum();
            let points = self.session.score_cascade(weight, count);
            log::info!(
                "Scored {} balls of weight {}: +{} (total {})",
                count,
                weight,
                points,
                self.session.score
            );
        }

        self.spawn_dropped(dropped);
        self.request_refresh();
    }

    /// Start a ball falling from the top of a column
    pub fn drop_ball_in_column(&mut self, ball: Ball, column: usize) -> SimResult<()> {
        self.drop_ball_from(ball, column, self.rates.max_height as f32)
    }

    /// Start a ball falling from an arbitrary height
    pub fn drop_ball_from(&mut self, ball: Ball, column: usize, height: f32) -> SimResult<()> {
        if column >= self.playfield.num_columns() {
            return Err(SimError::ColumnOutOfRange(column));
        }
        self.queue
            .push(Ongoing::FallingBall(FallingBall::new(ball, column, height)));
        Ok(())
    }

    /// Push a ball onto a column and refresh
    pub fn land_ball_in_column(&mut self, ball: Ball, column: usize) -> SimResult<()> {
        self.playfield.add_on_top(ball, column)?;
        self.request_refresh();
        self.drain_refresh()
    }

    /// Remove one ball; everything above it starts falling from where it rested.
    /// Does not refresh.
    pub fn remove_ball_at(&mut self, x: usize, y: usize) -> SimResult<()> {
        let dropped = self.playfield.remove_ball_at(x, y)?;
        self.spawn_dropped(dropped);
        Ok(())
    }

    fn spawn_dropped(&mut self, dropped: Vec<Dropped>) {
        for Dropped {
            ball,
            column,
            height,
        } in dropped
        {
            self.queue
                .push(Ongoing::FallingBall(FallingBall::new(ball, column, height)));
        }
    }

    /// Hand a ball that reached the top of its column to its landing behavior
    fn land(&mut self, ball: Ball, column: usize) -> SimResult<()> {
        match self.playfield.top_ball(column)? {
            Some((below, row)) => self.lands_on_ball(ball, LandingSite { column, row }, below)?,
            None => {
                let row = self
                    .playfield
                    .landing_height_of_column(column)?
                    .round_ties_even() as usize;
                self.lands_on_empty(ball, LandingSite { column, row })?
            }
        }
        self.request_refresh();
        Ok(())
    }

    /// Landing on the bottom of an empty column
    pub fn lands_on_empty(&mut self, ball: Ball, site: LandingSite) -> SimResult<()> {
        match ball.kind {
            BallKind::Colored { .. } | BallKind::Heart | BallKind::Bomb => {
                self.playfield.add_on_top(ball, site.column)
            }
            BallKind::Cutter => {
                log::debug!("Cutter {:?} reached the ground in column {}", ball.id, site.column);
                Ok(())
            }
        }
    }

    /// Landing on top of another ball
    pub fn lands_on_ball(&mut self, ball: Ball, site: LandingSite, below: Ball) -> SimResult<()> {
        match ball.kind {
            BallKind::Colored { .. } | BallKind::Heart => {
                self.playfield.add_on_top(ball, site.column)
            }
            BallKind::Bomb => {
                log::debug!("Bomb {:?} hit {:?} at {:?}", ball.id, below.id, site);
                self.explode(site.column, site.row)
            }
            BallKind::Cutter => {
                log::debug!("Cutter {:?} drilling through {:?} at {:?}", ball.id, below.id, site);
                self.remove_ball_at(site.column, site.row)?;
                self.request_refresh();
                self.drop_ball_from(ball, site.column, site.row as f32)
            }
        }
    }

    /// Blow up a 3x3 area around a cell. Bombs caught in the blast chain
    /// their own 3x3 areas. The whole blast is collected on the untouched
    /// board first, then cleared top-down so nothing inside it falls.
    pub fn explode(&mut self, x: usize, y: usize) -> SimResult<()> {
        let num_columns = self.playfield.num_columns();
        let rows = self.playfield.rows();
        let mut centers = vec![(x, y)];
        let mut blast = vec![(x, y)];

        let mut next = 0;
        while let Some(&(cx, cy)) = centers.get(next) {
            next += 1;
            log::debug!("Explosion at ({cx}, {cy})");
            self.queue
                .push(Ongoing::Explosion(Explosion::centered_at(cx, cy)));

            for nx in cx.saturating_sub(1)..=(cx + 1).min(num_columns - 1) {
                for ny in cy.saturating_sub(1)..(cy + 2).min(rows) {
                    if blast.contains(&(nx, ny)) {
                        continue;
                    }
                    if let Space::Occupied(ball) = self.playfield.get_ball_at(nx, ny)? {
                        blast.push((nx, ny));
                        if ball.kind == BallKind::Bomb {
                            centers.push((nx, ny));
                        }
                    }
                }
            }
        }

        blast.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for (bx, by) in blast {
            self.remove_ball_at(bx, by)?;
        }
        self.request_refresh();
        Ok(())
    }

    fn request_refresh(&mut self) {
        self.refresh_pending = true;
    }

    fn drain_refresh(&mut self) -> SimResult<()> {
        while self.refresh_pending {
            self.refresh_pending = false;
            self.refresh_status()?;
        }
        Ok(())
    }

    /// Decide what starts next. Exactly one branch fires, highest priority first;
    /// the alive check only runs when nothing else did.
    pub fn refresh_status(&mut self) -> SimResult<Refresh> {
        let gravity = self.playfield.gravity_moves()?;
        for throw in gravity.throws {
            let thrown = ThrownBall::launch(throw, &self.rates)?;
            self.queue.push(Ongoing::ThrownBall(thrown));
        }
        if gravity.moving {
            return Ok(Refresh::Gravity);
        }

        if let Some((x, y, template)) = self.playfield.find_scoring_anchor()? {
            log::debug!("Scoring started at ({x}, {y})");
            self.queue.push(Ongoing::Scoring(Scoring::new(
                (x, y),
                template,
                self.rates.scoring_delay,
            )));
            return Ok(Refresh::Scoring);
        }

        if self.check_combining() {
            return Ok(Refresh::Combining);
        }

        if !self.playfield.check_alive() && self.playfield.is_alive() {
            log::warn!(
                "Game over after {} balls, score {}",
                self.session.balls_dropped,
                self.session.score
            );
            self.playfield.mark_dead();
        }
        Ok(Refresh::Quiescent)
    }

    fn check_combining(&mut self) -> bool {
        if !self.rates.combining_enabled {
            return false;
        }
        let Some(combined) = self.playfield.combine(COMBINE_RUN) else {
            return false;
        };
        log::debug!(
            "Combined {} balls into weight {} at ({}, {})",
            COMBINE_RUN,
            combined.ball.weight(),
            combined.column,
            combined.row
        );
        self.queue.push(Ongoing::Combining(Combining::new(
            combined.column,
            combined.row,
            combined.ball.color().unwrap_or_default(),
            combined.ball.weight(),
        )));
        self.spawn_dropped(combined.dropped);
        // another run may be waiting elsewhere
        self.request_refresh();
        true
    }
}

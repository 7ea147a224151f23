//! The simulation instance: balls, lines, infection and game over
//!
//! Owns every ball and line. The frame driver calls `update` once per frame
//! and funnels pointer input through `start_line`/`update_line`/`end_line`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, StepContext};
use super::effects::Effect;
use super::line::{ContainmentLine, LineId};
use crate::consts::*;

/// Population and pacing for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub entity_count: usize,
    pub entity_radius: f32,
    /// Multiplier on the base speed range
    pub speed_scale: f32,
    pub infection_duration_ms: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            entity_count: DEFAULT_BALL_COUNT,
            entity_radius: DEFAULT_BALL_RADIUS,
            speed_scale: 1.0,
            infection_duration_ms: DEFAULT_INFECTION_DURATION_MS,
        }
    }
}

impl SimConfig {
    #[inline]
    pub fn infection_duration_secs(&self) -> f32 {
        self.infection_duration_ms as f32 / 1000.0
    }
}

/// Result of a game over check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverCheck {
    pub is_over: bool,
    /// Balls that are not dead
    pub survivors: usize,
}

/// One game's worth of state
pub struct Simulation<R: Rng = Pcg32> {
    pub(super) config: SimConfig,
    pub(super) arena: Vec2,
    pub(super) balls: Vec<Ball>,
    /// Finished lines (complete or fading)
    pub(super) lines: Vec<ContainmentLine>,
    /// Line currently being dragged out
    pub(super) drawing: Option<ContainmentLine>,
    infection_started: bool,
    /// Simulation clock, seconds since reset
    time: f32,
    /// Bumped on every reset so deferred work can tell it is stale
    generation: u64,
    next_line_id: u32,
    effects: Vec<Effect>,
    rng: R,
}

impl Simulation<Pcg32> {
    /// Create a simulation with a seeded PCG generator
    pub fn new(arena: Vec2, config: SimConfig, seed: u64) -> Self {
        Self::with_rng(arena, config, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Create a simulation drawing all randomness from `rng`
    pub fn with_rng(arena: Vec2, config: SimConfig, rng: R) -> Self {
        let mut sim = Self {
            config,
            arena,
            balls: Vec::new(),
            lines: Vec::new(),
            drawing: None,
            infection_started: false,
            time: 0.0,
            generation: 0,
            next_line_id: 1,
            effects: Vec::new(),
            rng,
        };
        sim.reset();
        sim
    }

    /// Fresh random population, no lines, infection not started
    pub fn reset(&mut self) {
        let radius = self.config.entity_radius;
        let scale = self.config.speed_scale;
        let arena = self.arena;
        let rng = &mut self.rng;

        self.balls = (0..self.config.entity_count)
            .map(|i| {
                let speed = rng.random_range(BALL_MIN_SPEED..=BALL_MAX_SPEED) * scale;
                Ball::spawn(i as u32, arena, radius, speed, &mut *rng)
            })
            .collect();
        self.lines.clear();
        self.drawing = None;
        self.infection_started = false;
        self.time = 0.0;
        self.generation += 1;
        self.effects.clear();

        log::info!(
            "Simulation reset: {} balls in {}x{} arena",
            self.balls.len(),
            self.arena.x,
            self.arena.y
        );
    }

    /// Change arena size; always starts over with a new population
    pub fn resize(&mut self, arena: Vec2) {
        self.arena = arena;
        self.reset();
    }

    /// Infect one random live ball, at most once per reset
    ///
    /// Returns the id of the seeded ball.
    pub fn start_infection(&mut self) -> Option<u32> {
        if self.infection_started {
            return None;
        }
        self.infection_started = true;

        let live: Vec<usize> = (0..self.balls.len())
            .filter(|&i| !self.balls[i].is_dead())
            .collect();
        if live.is_empty() {
            return None;
        }

        let idx = live[self.rng.random_range(0..live.len())];
        let ball = &mut self.balls[idx];
        ball.infect(self.time, &mut self.effects);
        log::info!("Infection seeded in ball {}", ball.id);
        Some(ball.id)
    }

    /// Advance one frame
    ///
    /// When `active` is false (attract/game over backdrop) balls ignore lines
    /// and lines do not age.
    pub fn update(&mut self, dt: f32, active: bool) {
        self.time += dt;
        let ctx = StepContext {
            dt,
            now: self.time,
            arena: self.arena,
            infection_duration: self.config.infection_duration_secs(),
        };

        let barriers: Vec<&ContainmentLine> = if active {
            self.lines.iter().filter(|l| !l.is_disappearing()).collect()
        } else {
            Vec::new()
        };
        for ball in &mut self.balls {
            ball.update(&ctx, &barriers, &mut self.rng, &mut self.effects);
        }

        if active {
            for line in &mut self.lines {
                line.update(dt);
            }
            let before = self.lines.len();
            self.lines.retain(|l| !l.is_fully_disappeared());
            if self.lines.len() != before {
                let lines = &self.lines;
                for ball in &mut self.balls {
                    ball.forget_lines(|id| lines.iter().any(|l| l.id() == id));
                }
            }
        }

        for i in 0..self.balls.len() {
            let (head, tail) = self.balls.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail {
                a.check_collision_with(b, self.time, &mut self.effects);
            }
        }
    }

    /// Begin a new line at `(x, y)`
    ///
    /// An unfinished line is completed first.
    pub fn start_line(&mut self, x: f32, y: f32) {
        if self.drawing.is_some() {
            self.end_line();
        }
        let id = LineId(self.next_line_id);
        self.next_line_id += 1;
        self.drawing = Some(ContainmentLine::new(id, Vec2::new(x, y)));
    }

    /// Extend the line being drawn; returns true if it touched a live ball
    ///
    /// A breached line stops drawing at once and starts to fade.
    pub fn update_line(&mut self, x: f32, y: f32) -> bool {
        let Some(line) = self.drawing.as_mut() else {
            return false;
        };
        line.add_point(Vec2::new(x, y));

        let Some(victim) = self
            .balls
            .iter()
            .find(|b| !b.is_dead() && line.collides_with_ball(b))
        else {
            return false;
        };
        log::debug!("Line {:?} breached by ball {}", line.id(), victim.id);

        line.start_disappearing();
        self.effects.push(Effect::LineVanished {
            points: line.points().to_vec(),
        });
        if let Some(line) = self.drawing.take() {
            self.lines.push(line);
        }
        true
    }

    /// Release the line being drawn as a finished barrier
    pub fn end_line(&mut self) {
        if let Some(mut line) = self.drawing.take() {
            line.complete();
            self.lines.push(line);
        }
    }

    /// Drop lines that are still fading out
    ///
    /// Lines only age while active, so a breach right before the game ends
    /// would otherwise hang half-faded in the backdrop.
    pub fn clear_fading_lines(&mut self) {
        self.lines.retain(|l| !l.is_disappearing());
    }

    /// Has the game reached an end state?
    ///
    /// Never over before the infection starts. Afterwards it is over once no
    /// ball is infected and either someone died or everyone is alive.
    pub fn check_game_over(&self) -> GameOverCheck {
        let total = self.balls.len();
        let dead = self.balls.iter().filter(|b| b.is_dead()).count();
        let infected = self.balls.iter().filter(|b| b.is_infected()).count();
        let survivors = total - dead;

        let is_over =
            self.infection_started && infected == 0 && (dead > 0 || survivors == total);
        GameOverCheck { is_over, survivors }
    }

    /// Take the effect signals produced since the last drain
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    /// Finished lines still on the field (complete or fading)
    pub fn lines(&self) -> &[ContainmentLine] {
        &self.lines
    }

    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    #[inline]
    pub fn has_started_infection(&self) -> bool {
        self.infection_started
    }

    #[inline]
    pub fn arena(&self) -> Vec2 {
        self.arena
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Reset counter; changes every time the population is replaced
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Direct access for scripted setups
    pub fn balls_mut(&mut self) -> &mut [Ball] {
        &mut self.balls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ball::Health;

    fn small_config(count: usize) -> SimConfig {
        SimConfig {
            entity_count: count,
            entity_radius: 10.0,
            speed_scale: 1.0,
            infection_duration_ms: 1000,
        }
    }

    #[test]
    fn test_reset_population() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(20), 7);
        sim.start_line(10.0, 10.0);
        sim.end_line();
        sim.start_infection();

        let gen_before = sim.generation();
        sim.reset();

        assert_eq!(sim.balls().len(), 20);
        assert!(sim.balls().iter().all(|b| b.health == Health::Healthy));
        assert!(sim.lines().is_empty());
        assert!(!sim.is_drawing());
        assert!(!sim.has_started_infection());
        assert!(sim.generation() > gen_before);
    }

    #[test]
    fn test_start_infection_only_once() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(10), 11);

        let first = sim.start_infection();
        assert!(first.is_some());
        assert!(sim.start_infection().is_none());

        let infected = sim.balls().iter().filter(|b| b.is_infected()).count();
        assert_eq!(infected, 1);
    }

    #[test]
    fn test_no_game_over_before_infection() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(5), 3);
        for _ in 0..100 {
            sim.update(0.05, true);
            assert!(!sim.check_game_over().is_over);
        }
    }

    #[test]
    fn test_game_over_after_death() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(3), 5);
        sim.start_infection();

        let mut effects = Vec::new();
        for ball in sim.balls_mut() {
            if ball.is_infected() {
                ball.die(&mut effects);
            }
        }

        let check = sim.check_game_over();
        assert!(check.is_over);
        assert_eq!(check.survivors, 2);
    }

    #[test]
    fn test_game_over_perfect_save() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(4), 5);
        sim.start_infection();
        assert!(!sim.check_game_over().is_over);

        let mut effects = Vec::new();
        for ball in sim.balls_mut() {
            ball.cure(&mut effects);
        }

        let check = sim.check_game_over();
        assert!(check.is_over);
        assert_eq!(check.survivors, 4);
    }

    #[test]
    fn test_end_line_completes() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(0), 1);
        sim.start_line(10.0, 10.0);
        assert!(!sim.update_line(100.0, 10.0));
        sim.end_line();

        assert_eq!(sim.lines().len(), 1);
        assert!(sim.lines()[0].is_complete());
        assert!(!sim.is_drawing());

        // Further input without a new start is ignored
        assert!(!sim.update_line(200.0, 10.0));
        sim.end_line();
        assert_eq!(sim.lines().len(), 1);
    }

    #[test]
    fn test_breach_stops_drawing() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(1), 1);
        sim.balls_mut()[0].pos = Vec2::new(400.0, 300.0);
        sim.drain_effects();

        sim.start_line(300.0, 300.0);
        assert!(sim.update_line(500.0, 300.0));

        assert!(!sim.is_drawing());
        assert_eq!(sim.lines().len(), 1);
        assert!(sim.lines()[0].is_disappearing());
        assert!(
            sim.drain_effects()
                .iter()
                .any(|e| matches!(e, Effect::LineVanished { .. }))
        );
    }

    #[test]
    fn test_dead_balls_do_not_breach() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(1), 1);
        let mut effects = Vec::new();
        sim.balls_mut()[0].pos = Vec2::new(400.0, 300.0);
        sim.balls_mut()[0].die(&mut effects);

        sim.start_line(300.0, 300.0);
        assert!(!sim.update_line(500.0, 300.0));
        assert!(sim.is_drawing());
    }

    #[test]
    fn test_line_ids_are_unique() {
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), small_config(0), 1);
        for i in 0..5 {
            sim.start_line(i as f32 * 10.0, 0.0);
            sim.update_line(i as f32 * 10.0, 100.0);
            sim.end_line();
        }
        let mut ids: Vec<_> = sim.lines().iter().map(|l| l.id()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_seeded_runs_match() {
        let mut a = Simulation::new(Vec2::new(800.0, 600.0), small_config(15), 2024);
        let mut b = Simulation::new(Vec2::new(800.0, 600.0), small_config(15), 2024);
        a.start_infection();
        b.start_infection();
        for _ in 0..200 {
            a.update(1.0 / 60.0, true);
            b.update(1.0 / 60.0, true);
        }
        for (x, y) in a.balls().iter().zip(b.balls()) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.health, y.health);
        }
    }

    #[test]
    fn test_clear_fading_lines_keeps_complete_ones() {
        let config = SimConfig {
            entity_count: 1,
            entity_radius: 10.0,
            ..Default::default()
        };
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), config, 4);
        sim.balls_mut()[0] = Ball::new(0, Vec2::new(400.0, 300.0), Vec2::new(0.0, 90.0), 10.0);

        sim.start_line(10.0, 10.0);
        sim.update_line(10.0, 60.0);
        sim.end_line();
        sim.start_line(350.0, 300.0);
        assert!(sim.update_line(450.0, 300.0));
        assert_eq!(sim.lines().len(), 2);

        sim.clear_fading_lines();
        assert_eq!(sim.lines().len(), 1);
        assert!(sim.lines()[0].is_complete());
    }
}

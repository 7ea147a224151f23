//! Frame driver: game phases, pointer input and the delayed seed infection
//!
//! Sits between the platform layer (canvas events, animation frames) and the
//! simulation. Everything here is synchronous; the host calls `tick` once per
//! frame and `draw` right after.

use glam::Vec2;

use super::draw::DrawSurface;
use super::particles::ParticleField;
use super::world::Simulation;
use crate::consts::MAX_FRAME_DT;
use crate::settings::Settings;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Menu backdrop: balls wander, no lines, no infection
    Attract,
    /// Active gameplay
    Playing,
    /// Run ended; backdrop keeps animating
    GameOver,
}

/// How a finished run went
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub survivors: usize,
    pub total: usize,
    /// Seconds from start to containment
    pub elapsed_secs: f32,
}

impl Outcome {
    /// Everyone made it
    pub fn is_perfect(&self) -> bool {
        self.survivors == self.total
    }
}

/// Seed infection scheduled for later in the current game
///
/// Bound to the simulation generation it was scheduled for; a reset in the
/// meantime makes it a no-op.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingInfection {
    generation: u64,
    remaining: f32,
}

/// One player's session: simulation, particles and phase
pub struct Session {
    sim: Simulation,
    particles: ParticleField,
    phase: GamePhase,
    /// Seconds since `start`
    elapsed: f32,
    infection_delay: f32,
    pending: Option<PendingInfection>,
    outcome: Option<Outcome>,
}

impl Session {
    pub fn new(arena: Vec2, settings: &Settings, seed: u64) -> Self {
        Self {
            sim: Simulation::new(arena, settings.sim.clone(), seed),
            particles: ParticleField::new(settings.max_particles(), seed ^ 0x5eed),
            phase: GamePhase::Attract,
            elapsed: 0.0,
            infection_delay: settings.infection_delay_ms as f32 / 1000.0,
            pending: None,
            outcome: None,
        }
    }

    /// Begin a new game with a fresh population
    pub fn start(&mut self) {
        self.sim.reset();
        self.particles.clear();
        self.phase = GamePhase::Playing;
        self.elapsed = 0.0;
        self.outcome = None;
        self.pending = Some(PendingInfection {
            generation: self.sim.generation(),
            remaining: self.infection_delay,
        });
        log::info!("Game started, infection in {:.1}s", self.infection_delay);
    }

    /// New arena size; the population is replaced
    pub fn resize(&mut self, arena: Vec2) {
        self.sim.resize(arena);
        self.particles.clear();
        self.pending = None;
        if self.phase == GamePhase::Playing {
            log::info!("Arena resized mid-game, returning to menu");
            self.phase = GamePhase::Attract;
        }
    }

    /// Advance one frame
    ///
    /// Returns the outcome on the frame the game ends.
    pub fn tick(&mut self, dt: f32) -> Option<Outcome> {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let mut finished = None;

        if self.phase == GamePhase::Playing {
            self.fire_pending(dt);
            self.sim.update(dt, true);
            self.elapsed += dt;

            let check = self.sim.check_game_over();
            if check.is_over {
                let outcome = Outcome {
                    survivors: check.survivors,
                    total: self.sim.balls().len(),
                    elapsed_secs: self.elapsed,
                };
                log::info!(
                    "Game over: {}/{} survived in {:.1}s",
                    outcome.survivors,
                    outcome.total,
                    outcome.elapsed_secs
                );
                self.sim.end_line();
                self.sim.clear_fading_lines();
                self.phase = GamePhase::GameOver;
                self.outcome = Some(outcome);
                finished = Some(outcome);
            }
        } else {
            self.sim.update(dt, false);
        }

        for effect in self.sim.drain_effects() {
            self.particles.spawn(&effect);
        }
        self.particles.update(dt);

        finished
    }

    fn fire_pending(&mut self, dt: f32) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.remaining -= dt;
        if pending.remaining > 0.0 {
            return;
        }

        let generation = pending.generation;
        self.pending = None;
        if generation == self.sim.generation() {
            self.sim.start_infection();
        } else {
            log::debug!("Dropping stale infection timer");
        }
    }

    /// Pointer pressed at arena coordinates
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if self.phase == GamePhase::Playing {
            self.sim.start_line(x, y);
        }
    }

    /// Pointer dragged; returns true if the line was breached
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        if self.phase != GamePhase::Playing || !self.sim.is_drawing() {
            return false;
        }
        self.sim.update_line(x, y)
    }

    /// Pointer released
    pub fn pointer_up(&mut self) {
        if self.sim.is_drawing() {
            self.sim.end_line();
        }
    }

    pub fn draw<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        self.sim.draw(surface, self.phase != GamePhase::Playing);
        self.particles.draw(surface);
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Outcome of the last finished game
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimConfig;

    fn settings(count: usize) -> Settings {
        Settings {
            infection_delay_ms: 500,
            sim: SimConfig {
                entity_count: count,
                entity_radius: 10.0,
                speed_scale: 1.0,
                infection_duration_ms: 1000,
            },
            ..Default::default()
        }
    }

    fn run(session: &mut Session, secs: f32) -> Option<Outcome> {
        let mut outcome = None;
        let frames = (secs / 0.05).round() as usize;
        for _ in 0..frames {
            if let Some(o) = session.tick(0.05) {
                outcome = Some(o);
            }
        }
        outcome
    }

    #[test]
    fn test_infection_fires_after_delay() {
        let mut session = Session::new(Vec2::new(800.0, 600.0), &settings(10), 1);
        session.start();

        run(&mut session, 0.4);
        assert!(!session.simulation().has_started_infection());

        run(&mut session, 0.2);
        assert!(session.simulation().has_started_infection());
    }

    #[test]
    fn test_resize_cancels_pending_infection() {
        let mut session = Session::new(Vec2::new(800.0, 600.0), &settings(10), 1);
        session.start();
        session.resize(Vec2::new(640.0, 480.0));
        assert_eq!(session.phase(), GamePhase::Attract);

        run(&mut session, 2.0);
        assert!(!session.simulation().has_started_infection());
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut session = Session::new(Vec2::new(800.0, 600.0), &settings(10), 1);
        session.start();
        // Population replaced behind the timer's back
        session.simulation_mut().reset();

        run(&mut session, 1.0);
        assert!(!session.simulation().has_started_infection());
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_pointer_ignored_outside_play() {
        let mut session = Session::new(Vec2::new(800.0, 600.0), &settings(0), 1);
        session.pointer_down(10.0, 10.0);
        assert!(!session.pointer_move(100.0, 10.0));
        session.pointer_up();
        assert!(session.simulation().lines().is_empty());

        session.start();
        session.pointer_down(10.0, 10.0);
        session.pointer_move(100.0, 10.0);
        session.pointer_up();
        assert_eq!(session.simulation().lines().len(), 1);
    }

    #[test]
    fn test_single_ball_game_ends() {
        let mut session = Session::new(Vec2::new(800.0, 600.0), &settings(1), 9);
        session.start();

        let outcome = run(&mut session, 3.0).expect("game should end");
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(outcome.total, 1);
        assert!(outcome.survivors <= 1);
        // Seeded at ~0.5s, resolves one infection duration later
        assert!(outcome.elapsed_secs >= 1.4);
    }

    #[test]
    fn test_effects_feed_particles() {
        let mut session = Session::new(Vec2::new(800.0, 600.0), &settings(5), 2);
        session.start();
        run(&mut session, 0.55);
        assert!(session.simulation().has_started_infection());
        assert!(!session.particles().is_empty());
    }

    #[test]
    fn test_game_over_drops_fading_lines() {
        let mut settings = settings(1);
        settings.infection_delay_ms = 0;
        settings.sim.infection_duration_ms = 100;
        let mut session = Session::new(Vec2::new(800.0, 600.0), &settings, 3);
        session.start();

        assert!(session.tick(0.01).is_none());
        assert!(session.simulation().has_started_infection());

        // Breach a line right on top of the ball
        let pos = session.simulation().balls()[0].pos;
        session.pointer_down(pos.x - 40.0, pos.y);
        assert!(session.pointer_move(pos.x + 40.0, pos.y));
        assert!(session.simulation().lines()[0].is_disappearing());

        assert!(session.tick(0.1).is_some());
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert!(session.simulation().lines().is_empty());
    }
}

//! Decorative particles driven by effect signals
//!
//! Purely visual. Uses its own RNG so spawning particles never changes the
//! gameplay random stream.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::draw::{DrawSurface, palette};
use super::effects::Effect;
use crate::unit_from_angle;

/// A particle for visual effects
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: [f32; 4],
    /// 0-1, decreases over time
    pub life: f32,
    pub size: f32,
}

/// Burst parameters per effect kind
struct Burst {
    count: usize,
    speed: f32,
    size: f32,
    color: [f32; 4],
}

/// All live particles
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    max_particles: usize,
    rng: Pcg32,
}

impl ParticleField {
    pub fn new(max_particles: usize, seed: u64) -> Self {
        Self {
            particles: Vec::with_capacity(max_particles),
            max_particles,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Emit particles for one effect signal
    pub fn spawn(&mut self, effect: &Effect) {
        match effect {
            Effect::Infected { pos } => self.burst(
                *pos,
                Burst { count: 14, speed: 90.0, size: 3.0, color: palette::INFECTED },
            ),
            Effect::Cured { pos } => self.burst(
                *pos,
                Burst { count: 12, speed: 70.0, size: 3.0, color: palette::HEALTHY },
            ),
            Effect::Died { pos } => self.burst(
                *pos,
                Burst { count: 20, speed: 50.0, size: 4.0, color: palette::DEAD },
            ),
            Effect::Collision { pos } => self.burst(
                *pos,
                Burst { count: 6, speed: 120.0, size: 2.0, color: palette::INFECTED },
            ),
            Effect::LineVanished { points } => {
                for &p in points.iter().step_by(2) {
                    self.burst(
                        p,
                        Burst { count: 2, speed: 40.0, size: 2.5, color: palette::LINE_BREACHED },
                    );
                }
            }
        }
    }

    fn burst(&mut self, origin: Vec2, burst: Burst) {
        for _ in 0..burst.count {
            if self.particles.len() >= self.max_particles {
                return;
            }
            let dir = unit_from_angle(self.rng.random_range(0.0..std::f32::consts::TAU));
            let speed = burst.speed * self.rng.random_range(0.5..1.0);
            self.particles.push(Particle {
                pos: origin,
                vel: dir * speed,
                color: burst.color,
                life: 1.0,
                size: burst.size * self.rng.random_range(0.7..1.3),
            });
        }
    }

    /// Drift, drag and fade
    pub fn update(&mut self, dt: f32) {
        for particle in self.particles.iter_mut() {
            particle.pos += particle.vel * dt;
            particle.vel *= 0.96;
            particle.life -= dt * 1.5;
            particle.size *= 0.995;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn draw<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        for p in &self.particles {
            let [r, g, b, a] = p.color;
            surface.circle(p.pos, p.size, [r, g, b, a * p.life]);
        }
    }
}

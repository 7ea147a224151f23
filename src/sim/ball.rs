//! Ball entity: motion, bounces and the infection state machine

use glam::Vec2;
use rand::Rng;

use super::effects::Effect;
use super::geometry::{collision_info, normalize_to_speed, reflect_velocity};
use super::line::{ContainmentLine, LineId};
use crate::consts::*;
use crate::{midpoint, unit_from_angle};

/// Health of a ball
///
/// `Dead` is terminal. `Infected` carries the simulation time the infection
/// started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Health {
    Healthy,
    Infected { since: f32 },
    Dead,
}

/// Per-frame inputs shared by every ball
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// Frame delta, seconds
    pub dt: f32,
    /// Simulation clock after this frame's advance, seconds
    pub now: f32,
    /// Arena width and height
    pub arena: Vec2,
    /// How long an infection lasts before it resolves, seconds
    pub infection_duration: f32,
}

/// A single life in the population
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Speed magnitude the ball keeps for its whole life
    pub base_speed: f32,
    pub health: Health,
    /// Current visual scale (eases toward `target_scale`)
    pub scale: f32,
    pub target_scale: f32,
    /// Animation phase in radians
    pub pulse: f32,
    /// Last bounce time per line
    line_hits: Vec<(LineId, f32)>,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            base_speed: vel.length(),
            health: Health::Healthy,
            scale: SCALE_HEALTHY,
            target_scale: SCALE_HEALTHY,
            pulse: 0.0,
            line_hits: Vec::new(),
        }
    }

    /// Place a ball at a random spot inside the arena, heading in a random direction
    pub fn spawn<R: Rng + ?Sized>(
        id: u32,
        arena: Vec2,
        radius: f32,
        base_speed: f32,
        rng: &mut R,
    ) -> Self {
        let pos = Vec2::new(
            random_coord(rng, arena.x, radius),
            random_coord(rng, arena.y, radius),
        );
        let theta = rng.random_range(0.0..std::f32::consts::TAU);
        Self::new(id, pos, unit_from_angle(theta) * base_speed, radius)
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health == Health::Dead
    }

    #[inline]
    pub fn is_infected(&self) -> bool {
        matches!(self.health, Health::Infected { .. })
    }

    /// Radius to draw with, including scale and infection pulse
    pub fn visual_radius(&self) -> f32 {
        let pulse = if self.is_infected() {
            1.0 + 0.08 * self.pulse.sin()
        } else {
            1.0
        };
        self.radius * self.scale * pulse
    }

    /// Infect a live, non-infected ball
    pub fn infect(&mut self, now: f32, effects: &mut Vec<Effect>) {
        if self.is_infected() || self.is_dead() {
            return;
        }
        self.health = Health::Infected { since: now };
        self.target_scale = SCALE_INFECTED;
        effects.push(Effect::Infected { pos: self.pos });
    }

    /// Return an infected ball to health
    pub fn cure(&mut self, effects: &mut Vec<Effect>) {
        if !self.is_infected() {
            return;
        }
        self.health = Health::Healthy;
        self.target_scale = SCALE_HEALTHY;
        effects.push(Effect::Cured { pos: self.pos });
    }

    /// Kill the ball; it stops and never moves again
    pub fn die(&mut self, effects: &mut Vec<Effect>) {
        self.health = Health::Dead;
        self.vel = Vec2::ZERO;
        self.target_scale = SCALE_DEAD;
        effects.push(Effect::Died { pos: self.pos });
    }

    /// Advance one frame: move, bounce off walls and lines, resolve infection
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        ctx: &StepContext,
        lines: &[&ContainmentLine],
        rng: &mut R,
        effects: &mut Vec<Effect>,
    ) {
        if self.is_dead() {
            return;
        }

        let prev_pos = self.pos;
        let prev_vel = self.vel;

        self.pos += self.vel * ctx.dt;
        self.bounce_walls(ctx.arena);

        for line in lines {
            if self.on_cooldown(line.id(), ctx.now) {
                continue;
            }

            let contact = collision_info(self.pos, self.radius, line.points());
            if !contact.hit {
                continue;
            }

            if contact.corrected.distance(prev_pos) > 2.0 * self.radius {
                // Tunneled through: discard this frame's motion
                self.pos = prev_pos;
                self.vel = prev_vel;
            } else {
                self.pos = contact.corrected;
                self.vel = normalize_to_speed(
                    reflect_velocity(self.vel, contact.normal),
                    self.base_speed,
                );
            }
            self.record_hit(line.id(), ctx.now);
        }

        let pulse_rate = if self.is_infected() { 8.0 } else { 2.0 };
        self.pulse = (self.pulse + pulse_rate * ctx.dt) % std::f32::consts::TAU;
        self.scale += (self.target_scale - self.scale) * (ctx.dt * 10.0).min(1.0);

        if let Health::Infected { since } = self.health {
            if ctx.now - since >= ctx.infection_duration {
                if rng.random_bool(0.5) {
                    self.die(effects);
                } else {
                    self.cure(effects);
                }
            }
        }

        if !self.is_dead() {
            self.vel = normalize_to_speed(self.vel, self.base_speed);
        }
    }

    /// Keep the ball inside `[0, arena]` on both axes
    fn bounce_walls(&mut self, arena: Vec2) {
        let mut bounced = false;

        if self.pos.x - self.radius < 0.0 {
            self.pos.x = self.radius;
            self.vel.x = self.vel.x.abs();
            bounced = true;
        } else if self.pos.x + self.radius > arena.x {
            self.pos.x = arena.x - self.radius;
            self.vel.x = -self.vel.x.abs();
            bounced = true;
        }

        if self.pos.y - self.radius < 0.0 {
            self.pos.y = self.radius;
            self.vel.y = self.vel.y.abs();
            bounced = true;
        } else if self.pos.y + self.radius > arena.y {
            self.pos.y = arena.y - self.radius;
            self.vel.y = -self.vel.y.abs();
            bounced = true;
        }

        if bounced {
            self.vel = normalize_to_speed(self.vel, self.base_speed);
        }
    }

    fn on_cooldown(&self, line: LineId, now: f32) -> bool {
        self.line_hits
            .iter()
            .any(|&(id, at)| id == line && now - at < LINE_COLLISION_COOLDOWN)
    }

    fn record_hit(&mut self, line: LineId, now: f32) {
        match self.line_hits.iter_mut().find(|(id, _)| *id == line) {
            Some(entry) => entry.1 = now,
            None => self.line_hits.push((line, now)),
        }
    }

    /// Drop cooldown entries for lines that no longer exist
    pub fn forget_lines(&mut self, live: impl Fn(LineId) -> bool) {
        self.line_hits.retain(|&(id, _)| live(id));
    }

    /// Ball-ball contact: spread infection and push the pair apart
    ///
    /// Each ball leaves along the center-to-center axis at its own base
    /// speed. Overlap is resolved by velocity alone.
    pub fn check_collision_with(&mut self, other: &mut Ball, now: f32, effects: &mut Vec<Effect>) {
        if self.is_dead() || other.is_dead() {
            return;
        }

        let delta = other.pos - self.pos;
        let dist = delta.length();
        if dist >= self.radius + other.radius {
            return;
        }

        match (self.is_infected(), other.is_infected()) {
            (true, false) => {
                other.infect(now, effects);
                effects.push(Effect::Collision { pos: midpoint(self.pos, other.pos) });
            }
            (false, true) => {
                self.infect(now, effects);
                effects.push(Effect::Collision { pos: midpoint(self.pos, other.pos) });
            }
            _ => {}
        }

        let normal = if dist > EPSILON { delta / dist } else { Vec2::X };
        self.vel = -normal * self.base_speed;
        other.vel = normal * other.base_speed;
    }
}

/// Random coordinate along one axis, keeping the ball fully inside
fn random_coord<R: Rng + ?Sized>(rng: &mut R, extent: f32, radius: f32) -> f32 {
    if extent > 2.0 * radius {
        rng.random_range(radius..=extent - radius)
    } else {
        extent * 0.5
    }
}

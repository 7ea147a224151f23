//! Outbreak - contain the infection before it consumes the population
//!
//! Core modules:
//! - `sim`: Simulation (ball physics, containment lines, infection, game over)
//! - `renderer`: Tessellation and WebGPU rendering pipeline
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: Key/value storage for settings and leaderboards
//! - `highscores`: Ranked score and time leaderboards

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use highscores::Leaderboards;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the driver will feed the simulation
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default arena size used by headless runs
    pub const DEFAULT_ARENA_WIDTH: f32 = 800.0;
    pub const DEFAULT_ARENA_HEIGHT: f32 = 600.0;

    /// Ball defaults
    pub const DEFAULT_BALL_COUNT: usize = 25;
    pub const DEFAULT_BALL_RADIUS: f32 = 12.0;
    /// Base speed range (pixels/s) before `speed_scale` is applied
    pub const BALL_MIN_SPEED: f32 = 80.0;
    pub const BALL_MAX_SPEED: f32 = 120.0;

    /// Infection defaults
    pub const DEFAULT_INFECTION_DURATION_MS: u32 = 5000;
    /// Delay between game start and the seed infection
    pub const DEFAULT_INFECTION_DELAY_MS: u32 = 2000;
    /// Visual scale targets per health state
    pub const SCALE_HEALTHY: f32 = 1.0;
    pub const SCALE_INFECTED: f32 = 1.3;
    pub const SCALE_DEAD: f32 = 0.6;

    /// Containment lines
    /// Minimum spacing between stored line points
    pub const LINE_MIN_POINT_SPACING: f32 = 5.0;
    /// Segments shorter than this are skipped by collision math
    pub const MIN_SEGMENT_LENGTH: f32 = 1.0;
    /// Per (ball, line) cooldown after a bounce, seconds
    pub const LINE_COLLISION_COOLDOWN: f32 = 0.1;
    /// Time a breached line takes to fade out, seconds
    pub const LINE_DISAPPEAR_DURATION: f32 = 0.5;
    pub const LINE_WIDTH: f32 = 4.0;

    /// Tolerance for coincident points
    pub const EPSILON: f32 = 1e-6;
}

/// Direction vector for an angle in radians
#[inline]
pub fn unit_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Midpoint between two points
#[inline]
pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    (a + b) * 0.5
}

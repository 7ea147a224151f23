//! Simulation module
//!
//! All gameplay logic lives here:
//! - Ball motion, bounces and infection
//! - Containment lines and breach detection
//! - Game over evaluation
//! - No rendering or platform dependencies; randomness is injected

pub mod ball;
pub mod draw;
pub mod effects;
pub mod geometry;
pub mod line;
pub mod particles;
pub mod session;
pub mod world;

pub use ball::{Ball, Health, StepContext};
pub use draw::{DrawSurface, palette};
pub use effects::Effect;
pub use geometry::{
    LineContact, closest_point_on_segment, collision_info, normalize_to_speed, reflect_velocity,
    segment_distance,
};
pub use line::{ContainmentLine, LineId, LineState};
pub use particles::{Particle, ParticleField};
pub use session::{GamePhase, Outcome, Session};
pub use world::{GameOverCheck, SimConfig, Simulation};

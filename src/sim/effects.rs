//! Fire-and-forget visual effect signals
//!
//! The simulation pushes these while it updates. A particle renderer drains
//! them once per frame; nothing in the simulation reads them back.

use glam::Vec2;

/// A notification for the decorative particle layer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A ball became infected
    Infected { pos: Vec2 },
    /// An infected ball recovered
    Cured { pos: Vec2 },
    /// An infected ball died
    Died { pos: Vec2 },
    /// Contact between two balls spread the infection
    Collision { pos: Vec2 },
    /// A breached line started to fade
    LineVanished { points: Vec<Vec2> },
}

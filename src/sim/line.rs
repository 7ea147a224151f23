//! Player-drawn containment lines

use glam::Vec2;

use super::ball::Ball;
use super::geometry::{LineContact, collision_info, touches_polyline};
use crate::consts::{LINE_DISAPPEAR_DURATION, LINE_MIN_POINT_SPACING};

/// Stable handle for a line; never reused within a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub u32);

/// Lifecycle of a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineState {
    /// Still being dragged out
    Drawing,
    /// Released without touching a live ball
    Complete,
    /// Breached while drawing; fading out
    Disappearing { elapsed: f32 },
}

/// A polyline barrier
#[derive(Debug, Clone)]
pub struct ContainmentLine {
    id: LineId,
    points: Vec<Vec2>,
    state: LineState,
}

impl ContainmentLine {
    pub fn new(id: LineId, start: Vec2) -> Self {
        Self {
            id,
            points: vec![start],
            state: LineState::Drawing,
        }
    }

    #[inline]
    pub fn id(&self) -> LineId {
        self.id
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn state(&self) -> LineState {
        self.state
    }

    /// Append a point if it is far enough from the last stored one
    ///
    /// Returns whether the point was kept.
    pub fn add_point(&mut self, point: Vec2) -> bool {
        let far_enough = self
            .points
            .last()
            .is_none_or(|last| last.distance(point) > LINE_MIN_POINT_SPACING);
        if far_enough {
            self.points.push(point);
        }
        far_enough
    }

    /// Does any segment pass within the ball's radius of its center?
    pub fn collides_with_ball(&self, ball: &Ball) -> bool {
        touches_polyline(ball.pos, ball.radius, &self.points)
    }

    /// Full contact info for bouncing `ball` off this line
    pub fn collision_info(&self, ball: &Ball) -> LineContact {
        collision_info(ball.pos, ball.radius, &self.points)
    }

    /// Mark as a finished barrier
    pub fn complete(&mut self) {
        if self.state == LineState::Drawing {
            self.state = LineState::Complete;
        }
    }

    pub fn start_disappearing(&mut self) {
        if !self.is_disappearing() {
            self.state = LineState::Disappearing { elapsed: 0.0 };
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state == LineState::Complete
    }

    #[inline]
    pub fn is_disappearing(&self) -> bool {
        matches!(self.state, LineState::Disappearing { .. })
    }

    /// Advance the fade timer
    pub fn update(&mut self, dt: f32) {
        if let LineState::Disappearing { elapsed } = &mut self.state {
            *elapsed += dt;
        }
    }

    pub fn is_fully_disappeared(&self) -> bool {
        matches!(self.state, LineState::Disappearing { elapsed } if elapsed >= LINE_DISAPPEAR_DURATION)
    }

    /// Remaining opacity while fading (1.0 otherwise)
    pub fn opacity(&self) -> f32 {
        match self.state {
            LineState::Disappearing { elapsed } => {
                (1.0 - elapsed / LINE_DISAPPEAR_DURATION).clamp(0.0, 1.0)
            }
            _ => 1.0,
        }
    }
}

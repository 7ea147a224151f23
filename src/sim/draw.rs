//! Read-only drawing pass over simulation state
//!
//! The simulation only describes what to draw through `DrawSurface`; the
//! renderer decides how.

use glam::Vec2;
use rand::Rng;

use super::ball::{Ball, Health};
use super::line::{ContainmentLine, LineState};
use super::world::Simulation;
use crate::consts::LINE_WIDTH;

/// Something the simulation can paint onto
pub trait DrawSurface {
    /// Filled circle
    fn circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]);
    /// Stroked polyline of the given width
    fn polyline(&mut self, points: &[Vec2], width: f32, color: [f32; 4]);
}

/// Colors for simulation elements
pub mod palette {
    pub const HEALTHY: [f32; 4] = [0.3, 0.85, 0.45, 1.0];
    pub const INFECTED: [f32; 4] = [0.95, 0.25, 0.25, 1.0];
    pub const DEAD: [f32; 4] = [0.35, 0.35, 0.4, 1.0];
    pub const LINE_DRAWING: [f32; 4] = [1.0, 1.0, 1.0, 0.8];
    pub const LINE_COMPLETE: [f32; 4] = [0.4, 0.75, 1.0, 1.0];
    pub const LINE_BREACHED: [f32; 4] = [1.0, 0.45, 0.2, 1.0];
    /// Alpha multiplier for the attract/game over backdrop
    pub const BACKGROUND_ALPHA: f32 = 0.35;
}

#[inline]
fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * alpha]
}

fn ball_color(ball: &Ball) -> [f32; 4] {
    match ball.health {
        Health::Healthy => palette::HEALTHY,
        Health::Infected { .. } => palette::INFECTED,
        Health::Dead => palette::DEAD,
    }
}

fn line_color(line: &ContainmentLine) -> [f32; 4] {
    match line.state() {
        LineState::Drawing => palette::LINE_DRAWING,
        LineState::Complete => palette::LINE_COMPLETE,
        LineState::Disappearing { .. } => with_alpha(palette::LINE_BREACHED, line.opacity()),
    }
}

impl<R: Rng> Simulation<R> {
    /// Paint lines then balls
    ///
    /// `background` dims everything for the non-interactive backdrop.
    pub fn draw<S: DrawSurface + ?Sized>(&self, surface: &mut S, background: bool) {
        let alpha = if background {
            palette::BACKGROUND_ALPHA
        } else {
            1.0
        };

        for line in self.lines.iter().chain(self.drawing.as_ref()) {
            if line.points().len() >= 2 {
                surface.polyline(line.points(), LINE_WIDTH, with_alpha(line_color(line), alpha));
            }
        }

        // Dead first so live balls render on top
        let (dead, live): (Vec<&Ball>, Vec<&Ball>) = self.balls.iter().partition(|b| b.is_dead());
        for ball in dead.into_iter().chain(live) {
            surface.circle(
                ball.pos,
                ball.visual_radius(),
                with_alpha(ball_color(ball), alpha),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::SimConfig;

    #[derive(Default)]
    struct Recorder {
        circles: Vec<(Vec2, f32, [f32; 4])>,
        polylines: usize,
    }

    impl DrawSurface for Recorder {
        fn circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
            self.circles.push((center, radius, color));
        }

        fn polyline(&mut self, _points: &[Vec2], _width: f32, _color: [f32; 4]) {
            self.polylines += 1;
        }
    }

    #[test]
    fn test_draw_every_ball_and_line() {
        let config = SimConfig {
            entity_count: 6,
            ..Default::default()
        };
        let mut sim = Simulation::new(Vec2::new(800.0, 600.0), config, 1);
        sim.start_line(0.0, 0.0);
        sim.update_line(0.0, 50.0);
        sim.end_line();
        sim.start_line(700.0, 0.0);
        sim.update_line(700.0, 50.0);

        let mut surface = Recorder::default();
        sim.draw(&mut surface, false);

        assert_eq!(surface.circles.len(), 6);
        assert_eq!(surface.polylines, 2);
        assert!(surface.circles.iter().all(|c| c.2[3] == 1.0));
    }

    #[test]
    fn test_background_dims() {
        let sim = Simulation::new(Vec2::new(800.0, 600.0), SimConfig::default(), 1);
        let mut surface = Recorder::default();
        sim.draw(&mut surface, true);
        assert!(
            surface
                .circles
                .iter()
                .all(|c| (c.2[3] - palette::BACKGROUND_ALPHA).abs() < 1e-6)
        );
    }
}

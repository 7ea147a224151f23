//! CPU-side triangle list built from draw calls

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::sim::DrawSurface;

/// Triangles for one frame, in arena pixel coordinates
#[derive(Debug, Default)]
pub struct VertexBatch {
    vertices: Vec<Vertex>,
}

impl VertexBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop last frame's geometry but keep the allocation
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Arena frame drawn under everything else
    pub fn arena_border(&mut self, size: Vec2) {
        self.vertices
            .extend(shapes::rect_outline(size, 2.0, colors::ARENA_BORDER));
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl DrawSurface for VertexBatch {
    fn circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        if radius <= 0.0 {
            return;
        }
        self.vertices.extend(shapes::circle(
            center,
            radius,
            color,
            shapes::circle_segments(radius),
        ));
    }

    fn polyline(&mut self, points: &[Vec2], width: f32, color: [f32; 4]) {
        self.vertices.extend(shapes::polyline(points, width, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimConfig, Simulation};

    #[test]
    fn test_simulation_paints_into_batch() {
        let config = SimConfig {
            entity_count: 3,
            ..Default::default()
        };
        let sim = Simulation::new(Vec2::new(400.0, 300.0), config, 9);

        let mut batch = VertexBatch::new();
        sim.draw(&mut batch, false);
        assert!(!batch.is_empty());
        assert_eq!(batch.len() % 3, 0);

        batch.clear();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_zero_radius_circle_is_skipped() {
        let mut batch = VertexBatch::new();
        batch.circle(Vec2::ZERO, 0.0, [1.0; 4]);
        assert!(batch.is_empty());
    }
}

//! Collision primitives for circles against polylines
//!
//! Balls are circles, containment lines are polylines made of short
//! segments. Everything here is pure math over `Vec2`.

use glam::Vec2;

use crate::consts::{EPSILON, MIN_SEGMENT_LENGTH};

/// Result of a circle vs polyline check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineContact {
    /// Whether the circle overlaps the polyline
    pub hit: bool,
    /// Closest point on the polyline to the circle center
    pub point: Vec2,
    /// Unit normal from `point` toward the circle center
    pub normal: Vec2,
    /// Position that places the circle just outside the line
    pub corrected: Vec2,
}

impl LineContact {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            corrected: Vec2::ZERO,
        }
    }
}

/// Closest point to `p` on segment `[a, b]`
///
/// Returns `None` for segments shorter than `MIN_SEGMENT_LENGTH`, which
/// would otherwise divide by a near-zero length.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Option<Vec2> {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq < MIN_SEGMENT_LENGTH * MIN_SEGMENT_LENGTH {
        return None;
    }

    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    Some(a + seg * t)
}

/// Distance from `p` to segment `[a, b]` (`None` for degenerate segments)
#[inline]
pub fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> Option<f32> {
    closest_point_on_segment(p, a, b).map(|c| p.distance(c))
}

/// Check a circle against every segment of a polyline
///
/// Finds the globally closest point across all segments. If it is closer
/// than `radius`, reports a hit with the push-out normal and the corrected
/// center position.
pub fn collision_info(center: Vec2, radius: f32, points: &[Vec2]) -> LineContact {
    let closest = points
        .windows(2)
        .filter_map(|seg| closest_point_on_segment(center, seg[0], seg[1]))
        .map(|c| (c, center.distance_squared(c)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let Some((point, dist_sq)) = closest else {
        return LineContact::miss();
    };

    let dist = dist_sq.sqrt();
    if dist >= radius {
        return LineContact::miss();
    }

    // Center sitting exactly on the line has no preferred side
    let normal = if dist > EPSILON {
        (center - point) / dist
    } else {
        Vec2::X
    };

    LineContact {
        hit: true,
        point,
        normal,
        corrected: point + normal * radius,
    }
}

/// True if any segment of the polyline passes within `radius` of `center`
pub fn touches_polyline(center: Vec2, radius: f32, points: &[Vec2]) -> bool {
    points
        .windows(2)
        .filter_map(|seg| segment_distance(center, seg[0], seg[1]))
        .any(|d| d < radius)
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Rescale `velocity` to magnitude `speed`, leaving zero vectors alone
#[inline]
pub fn normalize_to_speed(velocity: Vec2, speed: f32) -> Vec2 {
    let len = velocity.length();
    if len > EPSILON {
        velocity * (speed / len)
    } else {
        velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_point_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);

        let mid = closest_point_on_segment(Vec2::new(5.0, 3.0), a, b).unwrap();
        assert!((mid - Vec2::new(5.0, 0.0)).length() < 1e-5);

        let before = closest_point_on_segment(Vec2::new(-4.0, 2.0), a, b).unwrap();
        assert_eq!(before, a);

        let after = closest_point_on_segment(Vec2::new(20.0, -2.0), a, b).unwrap();
        assert_eq!(after, b);
    }

    #[test]
    fn test_degenerate_segment_skipped() {
        let a = Vec2::new(3.0, 3.0);
        let b = Vec2::new(3.5, 3.0);
        assert!(closest_point_on_segment(Vec2::ZERO, a, b).is_none());

        // A polyline made only of tiny segments never collides
        let result = collision_info(Vec2::new(3.0, 3.0), 10.0, &[a, b]);
        assert!(!result.hit);
    }

    #[test]
    fn test_collision_info_picks_global_closest() {
        // L-shaped polyline, ball near the vertical leg
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
        ];
        let center = Vec2::new(95.0, 50.0);

        let result = collision_info(center, 8.0, &points);
        assert!(result.hit);
        assert!((result.point - Vec2::new(100.0, 50.0)).length() < 1e-4);
        assert!((result.normal - Vec2::new(-1.0, 0.0)).length() < 1e-4);
        assert!((result.corrected - Vec2::new(92.0, 50.0)).length() < 1e-4);
    }

    #[test]
    fn test_collision_info_miss() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
        let result = collision_info(Vec2::new(50.0, 20.0), 8.0, &points);
        assert!(!result.hit);
    }

    #[test]
    fn test_collision_info_center_on_line_defaults_normal() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
        let result = collision_info(Vec2::new(50.0, 0.0), 8.0, &points);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::X);
        assert!((result.corrected - Vec2::new(58.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_touches_polyline() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 100.0)];
        assert!(touches_polyline(Vec2::new(5.0, 50.0), 8.0, &points));
        assert!(!touches_polyline(Vec2::new(9.0, 50.0), 8.0, &points));
        assert!(!touches_polyline(Vec2::new(5.0, 50.0), 8.0, &points[..1]));
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let velocity = Vec2::new(100.0, 0.0);
        let normal = Vec2::new(-1.0, 0.0);

        let reflected = reflect_velocity(velocity, normal);
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_normalize_to_speed() {
        let v = normalize_to_speed(Vec2::new(3.0, 4.0), 10.0);
        assert!((v.length() - 10.0).abs() < 1e-4);
        assert_eq!(normalize_to_speed(Vec2::ZERO, 10.0), Vec2::ZERO);
    }
}

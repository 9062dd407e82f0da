//! Overlap tests for axis-aligned boxes and circles
//!
//! Boxes are described by center and half-extents. All comparisons are
//! strict, so touching edges do not count as a hit.

use glam::Vec2;

/// Box vs box overlap
#[inline]
pub fn rects_overlap(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2) -> bool {
    rects_overlap_inset(a_pos, a_half, b_pos, b_half, Vec2::ZERO)
}

/// Box vs box overlap with the combined extents shrunk by `inset`
///
/// Used for forgiving contact hitboxes (the boss shrinks by (4, 8)).
#[inline]
pub fn rects_overlap_inset(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2, inset: Vec2) -> bool {
    let d = (a_pos - b_pos).abs();
    let reach = a_half + b_half - inset;
    d.x < reach.x && d.y < reach.y
}

/// Point strictly inside a box
#[inline]
pub fn point_in_rect(point: Vec2, center: Vec2, half: Vec2) -> bool {
    let d = (point - center).abs();
    d.x < half.x && d.y < half.y
}

/// Circle vs box proximity: the box grown by the radius on each axis
///
/// Slightly generous at the corners compared with a true circle test.
#[inline]
pub fn circle_near_rect(circle_pos: Vec2, radius: f32, center: Vec2, half: Vec2) -> bool {
    point_in_rect(circle_pos, center, half + Vec2::splat(radius))
}

/// Distance between two points strictly below `radius`
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rects_overlap() {
        let half = Vec2::new(10.0, 5.0);
        assert!(rects_overlap(Vec2::ZERO, half, Vec2::new(19.0, 0.0), half));
        assert!(!rects_overlap(Vec2::ZERO, half, Vec2::new(20.0, 0.0), half));
        assert!(!rects_overlap(Vec2::ZERO, half, Vec2::new(0.0, 10.0), half));
    }

    #[test]
    fn test_rects_overlap_inset() {
        let half = Vec2::new(10.0, 10.0);
        let other = Vec2::new(17.0, 0.0);
        assert!(rects_overlap(Vec2::ZERO, half, other, half));
        assert!(!rects_overlap_inset(Vec2::ZERO, half, other, half, Vec2::new(4.0, 8.0)));
    }

    #[test]
    fn test_point_in_rect() {
        let half = Vec2::new(16.0, 10.0);
        assert!(point_in_rect(Vec2::new(5.0, 5.0), Vec2::ZERO, half));
        assert!(!point_in_rect(Vec2::new(16.0, 0.0), Vec2::ZERO, half));
        assert!(!point_in_rect(Vec2::new(0.0, -11.0), Vec2::ZERO, half));
    }

    #[test]
    fn test_circle_near_rect() {
        let half = Vec2::new(16.0, 12.0);
        assert!(circle_near_rect(Vec2::new(25.0, 0.0), 10.0, Vec2::ZERO, half));
        assert!(!circle_near_rect(Vec2::new(27.0, 0.0), 10.0, Vec2::ZERO, half));
        // Corner case counts as near
        assert!(circle_near_rect(Vec2::new(24.0, 20.0), 10.0, Vec2::ZERO, half));
    }

    #[test]
    fn test_within_radius() {
        assert!(within_radius(Vec2::ZERO, Vec2::new(3.0, 4.0), 5.1));
        assert!(!within_radius(Vec2::ZERO, Vec2::new(3.0, 4.0), 5.0));
    }
}

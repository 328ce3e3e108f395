//! Math types for Earshot

pub use glam::Vec3;

/// Returns true if `b` lies within `range` of `a` (inclusive).
pub fn within_range(a: Vec3, b: Vec3, range: f32) -> bool {
    a.distance_squared(b) <= range * range
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_range_is_inclusive() {
        let origin = Vec3::ZERO;
        assert!(within_range(origin, Vec3::new(3.0, 4.0, 0.0), 5.0));
        assert!(!within_range(origin, Vec3::new(3.0, 4.1, 0.0), 5.0));
        assert!(within_range(origin, origin, 0.0));
    }
}

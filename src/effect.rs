//! Proximity volume transform applied to every outgoing sound.

use crate::config::HearingConfig;
use crate::math::Vec3;
use crate::sound::SoundDescriptor;
use crate::subject::Subject;

/// Computes the volume a subject perceives for a sound at some source.
///
/// - A deaf subject hears nothing, and no further checks are made.
/// - A source outside the subject's view is muffled by a fixed divisor.
/// - The result is always scaled by the terrain coefficient at the subject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityEffect {
    out_of_view_divisor: f32,
}

impl Default for ProximityEffect {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl ProximityEffect {
    pub fn new(out_of_view_divisor: f32) -> Self {
        Self {
            out_of_view_divisor,
        }
    }

    pub fn from_config(config: &HearingConfig) -> Self {
        Self::new(config.out_of_view_divisor)
    }

    pub fn out_of_view_divisor(&self) -> f32 {
        self.out_of_view_divisor
    }

    pub fn apply(
        &self,
        sound: SoundDescriptor,
        subject: &dyn Subject,
        source: Vec3,
        range: f32,
    ) -> SoundDescriptor {
        if subject.is_deaf() {
            return sound.with_volume(0.0);
        }

        let mut volume = sound.volume();
        if !subject.can_perceive(source, range) {
            volume /= self.out_of_view_divisor;
        }
        volume *= subject.terrain_coefficient();

        sound.with_volume(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::Body;

    fn sound(volume: f32) -> SoundDescriptor {
        SoundDescriptor::new("sound/machines/engine.ogg", volume)
    }

    #[test]
    fn test_deaf_subject_hears_nothing() {
        let body = Body::new(Vec3::ZERO);
        body.set_deaf(true);
        body.set_terrain_coefficient(3.0);

        let heard = ProximityEffect::default().apply(sound(10.0), &*body, Vec3::X, 7.0);
        assert_eq!(heard.volume(), 0.0);
    }

    #[test]
    fn test_out_of_range_is_muffled_then_scaled() {
        let body = Body::new(Vec3::ZERO);
        body.set_terrain_coefficient(0.5);

        let far = Vec3::new(20.0, 0.0, 0.0);
        let heard = ProximityEffect::default().apply(sound(100.0), &*body, far, 7.0);
        assert!((heard.volume() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_in_view_only_scaled_by_terrain() {
        let body = Body::new(Vec3::ZERO);
        body.set_terrain_coefficient(0.5);

        let near = Vec3::new(2.0, 0.0, 0.0);
        let heard = ProximityEffect::default().apply(sound(100.0), &*body, near, 7.0);
        assert!((heard.volume() - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_blocked_sight_counts_as_out_of_view() {
        let body = Body::new(Vec3::ZERO);
        body.set_sight_blocked(true);

        let heard = ProximityEffect::new(4.0).apply(sound(80.0), &*body, Vec3::X, 7.0);
        assert!((heard.volume() - 20.0).abs() < 1e-5);
        assert_eq!(heard.file(), Some("sound/machines/engine.ogg"));
    }
}

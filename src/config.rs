//! Configuration for Earshot

use crate::error::{EarshotError, Result};
use crate::sound::ChannelId;

/// Configuration shared by every listener context built from it.
#[derive(Debug, Clone)]
pub struct HearingConfig {
    /// Lowest reservable channel (inclusive)
    pub min_channel: u16,
    /// Highest reservable channel (inclusive)
    pub max_channel: u16,
    /// Radius within which emitters are considered in view
    pub hearing_range: f32,
    /// Volume divisor applied to emitters outside the subject's view
    pub out_of_view_divisor: f32,
}

impl Default for HearingConfig {
    fn default() -> Self {
        Self {
            min_channel: 1,
            max_channel: 512,
            hearing_range: 7.0,
            out_of_view_divisor: 5.0,
        }
    }
}

impl HearingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_range(mut self, min: u16, max: u16) -> Self {
        self.min_channel = min;
        self.max_channel = max;
        self
    }

    pub fn hearing_range(mut self, range: f32) -> Self {
        self.hearing_range = range;
        self
    }

    pub fn out_of_view_divisor(mut self, divisor: f32) -> Self {
        self.out_of_view_divisor = divisor;
        self
    }

    pub fn min_channel_id(&self) -> ChannelId {
        ChannelId::new(self.min_channel)
    }

    pub fn max_channel_id(&self) -> ChannelId {
        ChannelId::new(self.max_channel)
    }

    /// Number of channels each context may reserve at once.
    pub fn capacity(&self) -> usize {
        if self.min_channel > self.max_channel {
            0
        } else {
            (self.max_channel - self.min_channel) as usize + 1
        }
    }

    /// Checks the configuration for values no context can work with.
    ///
    /// Channel 0 is reserved as the "any channel" value of the playback side,
    /// so the reservable range must start at 1 or above.
    pub fn validate(&self) -> Result<()> {
        if self.min_channel == 0 {
            return Err(EarshotError::Configuration(
                "min_channel must be at least 1".to_string(),
            ));
        }
        if self.min_channel > self.max_channel {
            return Err(EarshotError::Configuration(format!(
                "min_channel {} exceeds max_channel {}",
                self.min_channel, self.max_channel
            )));
        }
        if !self.hearing_range.is_finite() || self.hearing_range < 0.0 {
            return Err(EarshotError::Configuration(format!(
                "hearing_range must be a non-negative finite number, got {}",
                self.hearing_range
            )));
        }
        if !self.out_of_view_divisor.is_finite() || self.out_of_view_divisor <= 0.0 {
            return Err(EarshotError::Configuration(format!(
                "out_of_view_divisor must be positive, got {}",
                self.out_of_view_divisor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HearingConfig::default();
        assert_eq!(config.min_channel, 1);
        assert_eq!(config.max_channel, 512);
        assert_eq!(config.capacity(), 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(HearingConfig::new().channel_range(0, 10).validate().is_err());
        assert!(HearingConfig::new().channel_range(10, 9).validate().is_err());
        assert!(HearingConfig::new().hearing_range(-1.0).validate().is_err());
        assert!(HearingConfig::new().hearing_range(f32::NAN).validate().is_err());
        assert!(HearingConfig::new().out_of_view_divisor(0.0).validate().is_err());

        let single = HearingConfig::new().channel_range(4, 4);
        assert!(single.validate().is_ok());
        assert_eq!(single.capacity(), 1);
    }
}

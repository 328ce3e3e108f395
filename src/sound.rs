//! Sound descriptors and channel identifiers.
//!
//! A [`SoundDescriptor`] is an immutable value: every handler that forwards a
//! sound builds a fresh descriptor with the builder methods below rather than
//! editing one shared copy in place.

use std::fmt;
use std::sync::Arc;

/// Opaque numeric playback slot on a listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u16);

impl ChannelId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

/// How the playback endpoint should treat a delivery on an occupied channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    /// Start the stream from the beginning
    #[default]
    Restart,
    /// Keep the current stream position and only apply the new parameters
    Update,
}

/// Everything the transmission sink needs to play, adjust, or silence a sound.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundDescriptor {
    file: Option<Arc<str>>,
    channel: Option<ChannelId>,
    volume: f32,
    mode: PlaybackMode,
    repeat: bool,
}

impl SoundDescriptor {
    /// A restartable, non-repeating sound at the given volume.
    pub fn new(file: impl Into<Arc<str>>, volume: f32) -> Self {
        Self {
            file: Some(file.into()),
            channel: None,
            volume,
            mode: PlaybackMode::Restart,
            repeat: false,
        }
    }

    /// The canonical "silence this channel" command: no stream, given channel.
    pub fn silence(channel: ChannelId) -> Self {
        Self {
            file: None,
            channel: Some(channel),
            volume: 0.0,
            mode: PlaybackMode::Restart,
            repeat: false,
        }
    }

    pub fn with_channel(mut self, channel: ChannelId) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_mode(mut self, mode: PlaybackMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn repeating(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat
    }

    pub fn is_silence(&self) -> bool {
        self.file.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_descriptor() {
        let stop = SoundDescriptor::silence(ChannelId::new(7));
        assert!(stop.is_silence());
        assert_eq!(stop.channel(), Some(ChannelId::new(7)));
        assert_eq!(stop.file(), None);
    }

    #[test]
    fn test_builder_leaves_original_untouched() {
        let base = SoundDescriptor::new("sound/ambience/hum.ogg", 40.0).repeating(true);
        let outgoing = base
            .clone()
            .with_channel(ChannelId::new(3))
            .with_mode(PlaybackMode::Update);

        assert_eq!(base.channel(), None);
        assert_eq!(base.mode(), PlaybackMode::Restart);
        assert_eq!(outgoing.channel(), Some(ChannelId::new(3)));
        assert_eq!(outgoing.mode(), PlaybackMode::Update);
        assert!(outgoing.is_repeating());
        assert_eq!(outgoing.file(), Some("sound/ambience/hum.ogg"));
    }
}

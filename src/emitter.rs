//! Sound-emitting entities as seen by a listener.

use crate::math::Vec3;
use crate::sound::SoundDescriptor;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Stable identity of an emitter. Two emitters with identical state are
/// still distinct keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmitterId(Uuid);

impl EmitterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EmitterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmitterId({})", self.0)
    }
}

/// Read-only view of an emitter's playback state.
///
/// Listeners never mutate emitters; they only query them when a range
/// transition or emitter event arrives.
pub trait Emitter: Send + Sync + fmt::Debug {
    fn id(&self) -> EmitterId;

    /// World position used for the in-view test.
    fn position(&self) -> Vec3;

    fn is_playing(&self) -> bool;

    /// The sound currently being played, if any.
    fn active_sound(&self) -> Option<SoundDescriptor>;
}

/// Shared reference to an emitter, passed through zone and event messages.
pub type EmitterHandle = Arc<dyn Emitter>;

#[derive(Debug)]
struct EmitterState {
    position: Vec3,
    sound: Option<SoundDescriptor>,
}

/// A minimal emitter that plays at most one sound at a time.
#[derive(Debug)]
pub struct SoundEmitter {
    id: EmitterId,
    state: Mutex<EmitterState>,
}

impl SoundEmitter {
    pub fn new(position: Vec3) -> Arc<Self> {
        Arc::new(Self {
            id: EmitterId::new(),
            state: Mutex::new(EmitterState {
                position,
                sound: None,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, EmitterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_position(&self, position: Vec3) {
        self.state().position = position;
    }

    /// Starts (or replaces) the active sound.
    pub fn play(&self, sound: SoundDescriptor) {
        self.state().sound = Some(sound);
    }

    /// Replaces the active sound's parameters. Ignored when nothing is playing.
    pub fn update(&self, sound: SoundDescriptor) -> bool {
        let mut state = self.state();
        if state.sound.is_none() {
            return false;
        }
        state.sound = Some(sound);
        true
    }

    pub fn stop(&self) {
        self.state().sound = None;
    }
}

impl Emitter for SoundEmitter {
    fn id(&self) -> EmitterId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.state().position
    }

    fn is_playing(&self) -> bool {
        self.state().sound.is_some()
    }

    fn active_sound(&self) -> Option<SoundDescriptor> {
        self.state().sound.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_not_value_equality() {
        let a = SoundEmitter::new(Vec3::ZERO);
        let b = SoundEmitter::new(Vec3::ZERO);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_play_update_stop() {
        let emitter = SoundEmitter::new(Vec3::ZERO);
        assert!(!emitter.is_playing());
        assert!(!emitter.update(SoundDescriptor::new("a.ogg", 50.0)));

        emitter.play(SoundDescriptor::new("a.ogg", 50.0));
        assert!(emitter.is_playing());
        assert!(emitter.update(SoundDescriptor::new("a.ogg", 25.0)));
        assert_eq!(emitter.active_sound().map(|s| s.volume()), Some(25.0));

        emitter.stop();
        assert!(!emitter.is_playing());
        assert!(emitter.active_sound().is_none());
    }
}

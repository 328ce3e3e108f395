//! Event types for Earshot

use crate::emitter::{EmitterHandle, EmitterId};
use crate::error::Result;
use crate::sound::SoundDescriptor;
use std::fmt;

/// The four emitter lifecycle events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitterEventKind {
    /// The emitter began playing its active sound
    Started,
    /// The emitter stopped playing
    Stopped,
    /// The active sound's parameters changed mid-playback
    Updated,
    /// A one-shot sound with no channel tracking
    Pushed,
}

impl EmitterEventKind {
    pub const ALL: [Self; 4] = [Self::Started, Self::Stopped, Self::Updated, Self::Pushed];
}

impl fmt::Display for EmitterEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Updated => "updated",
            Self::Pushed => "pushed",
        };
        f.write_str(name)
    }
}

/// An event published by an emitter.
#[derive(Debug, Clone)]
pub enum EmitterEvent {
    Started { emitter: EmitterHandle },
    Stopped { emitter: EmitterHandle },
    Updated { emitter: EmitterHandle },
    Pushed {
        emitter: EmitterHandle,
        sound: SoundDescriptor,
    },
}

impl EmitterEvent {
    pub fn kind(&self) -> EmitterEventKind {
        match self {
            Self::Started { .. } => EmitterEventKind::Started,
            Self::Stopped { .. } => EmitterEventKind::Stopped,
            Self::Updated { .. } => EmitterEventKind::Updated,
            Self::Pushed { .. } => EmitterEventKind::Pushed,
        }
    }

    pub fn emitter(&self) -> &EmitterHandle {
        match self {
            Self::Started { emitter }
            | Self::Stopped { emitter }
            | Self::Updated { emitter }
            | Self::Pushed { emitter, .. } => emitter,
        }
    }

    pub fn emitter_id(&self) -> EmitterId {
        self.emitter().id()
    }

    /// Routes the event to the handler method for its kind.
    pub fn dispatch_to<H: EmitterEventHandler + ?Sized>(self, handler: &mut H) -> Result<()> {
        match self {
            Self::Started { emitter } => handler.on_started(&emitter),
            Self::Stopped { emitter } => handler.on_stopped(&emitter),
            Self::Updated { emitter } => handler.on_updated(&emitter),
            Self::Pushed { emitter, sound } => handler.on_pushed(&emitter, sound),
        }
    }
}

/// One handler method per [`EmitterEventKind`].
pub trait EmitterEventHandler {
    fn on_started(&mut self, emitter: &EmitterHandle) -> Result<()>;
    fn on_stopped(&mut self, emitter: &EmitterHandle) -> Result<()>;
    fn on_updated(&mut self, emitter: &EmitterHandle) -> Result<()>;
    fn on_pushed(&mut self, emitter: &EmitterHandle, sound: SoundDescriptor) -> Result<()>;
}

/// Everything that can land in a listener's inbox.
#[derive(Debug, Clone)]
pub enum ListenerMessage {
    /// The zone service reports an emitter coming into range
    EnteredRange(EmitterHandle),
    /// The zone service reports an emitter leaving range
    ExitedRange(EmitterId),
    /// Full list of in-range emitters, sent when a listener registers
    Resync(Vec<EmitterHandle>),
    /// An event from an emitter this listener subscribed to
    Emitter(EmitterEvent),
}

impl ListenerMessage {
    pub fn is_range_transition(&self) -> bool {
        matches!(
            self,
            Self::EnteredRange(_) | Self::ExitedRange(_) | Self::Resync(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::SoundEmitter;
    use crate::math::Vec3;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<EmitterEventKind>,
    }

    impl EmitterEventHandler for Recorder {
        fn on_started(&mut self, _: &EmitterHandle) -> Result<()> {
            self.calls.push(EmitterEventKind::Started);
            Ok(())
        }

        fn on_stopped(&mut self, _: &EmitterHandle) -> Result<()> {
            self.calls.push(EmitterEventKind::Stopped);
            Ok(())
        }

        fn on_updated(&mut self, _: &EmitterHandle) -> Result<()> {
            self.calls.push(EmitterEventKind::Updated);
            Ok(())
        }

        fn on_pushed(&mut self, _: &EmitterHandle, _: SoundDescriptor) -> Result<()> {
            self.calls.push(EmitterEventKind::Pushed);
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let emitter: EmitterHandle = SoundEmitter::new(Vec3::ZERO);
        let events = vec![
            EmitterEvent::Pushed {
                emitter: emitter.clone(),
                sound: SoundDescriptor::new("beep.ogg", 10.0),
            },
            EmitterEvent::Started {
                emitter: emitter.clone(),
            },
            EmitterEvent::Updated {
                emitter: emitter.clone(),
            },
            EmitterEvent::Stopped {
                emitter: emitter.clone(),
            },
        ];

        let mut recorder = Recorder::default();
        for event in events {
            assert_eq!(event.emitter_id(), emitter.id());
            let kind = event.kind();
            event.dispatch_to(&mut recorder).unwrap();
            assert_eq!(recorder.calls.last(), Some(&kind));
        }
        assert_eq!(recorder.calls.len(), EmitterEventKind::ALL.len());
    }
}

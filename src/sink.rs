//! Hand-off point between listeners and the playback transport.

use crate::error::{EarshotError, Result};
use crate::sound::SoundDescriptor;
use crate::subject::OwnerId;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;

/// Receives finished sound descriptors for delivery to an owner.
///
/// A descriptor with no file and a channel set is the "silence this channel"
/// command; implementations must forward it like any other delivery.
pub trait TransmissionSink: Send + Sync {
    fn deliver(&self, owner: OwnerId, sound: SoundDescriptor) -> Result<()>;
}

pub type SinkHandle = Arc<dyn TransmissionSink>;

/// One delivery as seen by the consumer of a [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    pub owner: OwnerId,
    pub sound: SoundDescriptor,
}

/// A sink that forwards every delivery over a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<Transmission>,
}

impl ChannelSink {
    /// Creates the sink together with the receiving end of its channel.
    pub fn new() -> (Self, Receiver<Transmission>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl TransmissionSink for ChannelSink {
    fn deliver(&self, owner: OwnerId, sound: SoundDescriptor) -> Result<()> {
        self.sender
            .send(Transmission { owner, sound })
            .map_err(|e| EarshotError::Transmission(format!("Failed to deliver sound: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::ChannelId;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (sink, receiver) = ChannelSink::new();
        let owner = OwnerId::new();

        sink.deliver(owner, SoundDescriptor::new("a.ogg", 10.0)).unwrap();
        let stop = SoundDescriptor::silence(ChannelId::new(1));
        sink.deliver(owner, stop).unwrap();

        let received: Vec<Transmission> = receiver.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].sound.file(), Some("a.ogg"));
        assert!(received[1].sound.is_silence());
        assert!(received.iter().all(|t| t.owner == owner));
    }

    #[test]
    fn test_channel_sink_reports_hangup() {
        let (sink, receiver) = ChannelSink::new();
        drop(receiver);

        let result = sink.deliver(OwnerId::new(), SoundDescriptor::new("a.ogg", 10.0));
        assert!(matches!(result, Err(EarshotError::Transmission(_))));
    }
}

//! World API for Earshot

use crate::config::HearingConfig;
use crate::context::{HearingServices, HearingStats, ListenerContext, ListenerId};
use crate::dispatch::EventDispatcher;
use crate::error::Result;
use crate::subject::{OwnerId, SubjectHandle};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of listener contexts, one per owner.
///
/// `HearingWorld` is the entry point most callers want. It creates a
/// [`ListenerContext`] the first time an owner is attached to a subject and
/// from then on swaps subjects in place with
/// [`ListenerContext::reset_proxy`], so re-attaching never restarts sounds the
/// owner is already hearing.
///
/// # Architecture
///
/// - **Zone service**: decides what is in range and queues range transitions
/// - **Event dispatcher**: queues emitter events for subscribed listeners
/// - **World**: drains every context's inbox on [`HearingWorld::pump`]
pub struct HearingWorld {
    config: HearingConfig,
    services: HearingServices,
    contexts: HashMap<OwnerId, ListenerContext>,
}

impl HearingWorld {
    pub fn new(config: HearingConfig, services: HearingServices) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            services,
            contexts: HashMap::new(),
        })
    }

    pub fn config(&self) -> &HearingConfig {
        &self.config
    }

    /// The dispatcher emitters publish their events through.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.services.dispatcher
    }

    /// Points `owner`'s hearing at `subject`.
    ///
    /// Creates the owner's context on first attach. Later attaches keep the
    /// existing context and swap its subject; attaching the subject that is
    /// already in place does nothing.
    pub fn attach(&mut self, owner: OwnerId, subject: SubjectHandle) -> Result<ListenerId> {
        if let Some(context) = self.contexts.get_mut(&owner) {
            if context.subject().id() != subject.id() {
                context.reset_proxy(subject);
            }
            return Ok(context.id());
        }

        let context = ListenerContext::new(owner, subject, &self.config, self.services.clone())?;
        let id = context.id();
        self.contexts.insert(owner, context);
        Ok(id)
    }

    /// Tears down `owner`'s context, returning its final counters.
    pub fn detach(&mut self, owner: OwnerId) -> Option<HearingStats> {
        self.contexts.remove(&owner).map(ListenerContext::close)
    }

    pub fn context(&self, owner: OwnerId) -> Option<&ListenerContext> {
        self.contexts.get(&owner)
    }

    pub fn context_mut(&mut self, owner: OwnerId) -> Option<&mut ListenerContext> {
        self.contexts.get_mut(&owner)
    }

    pub fn owners(&self) -> Vec<OwnerId> {
        self.contexts.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Drains every context's inbox. Returns the number of messages handled.
    pub fn pump(&mut self) -> usize {
        self.contexts
            .values_mut()
            .map(ListenerContext::process_pending)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{Emitter, EmitterHandle, SoundEmitter};
    use crate::events::EmitterEvent;
    use crate::math::Vec3;
    use crate::sink::{ChannelSink, Transmission};
    use crate::sound::SoundDescriptor;
    use crate::subject::Body;
    use crate::zone::RadiusZone;
    use crossbeam_channel::Receiver;

    fn world() -> (HearingWorld, Arc<RadiusZone>, Receiver<Transmission>) {
        let zone = Arc::new(RadiusZone::new());
        let (sink, transmissions) = ChannelSink::new();
        let services = HearingServices {
            zone: zone.clone(),
            dispatcher: Arc::new(EventDispatcher::new()),
            sink: Arc::new(sink),
        };
        let world = HearingWorld::new(HearingConfig::default(), services).unwrap();
        (world, zone, transmissions)
    }

    #[test]
    fn test_reattach_keeps_context_and_sounds() {
        let (mut world, zone, transmissions) = world();
        let emitter = SoundEmitter::new(Vec3::new(2.0, 0.0, 0.0));
        emitter.play(SoundDescriptor::new("music.ogg", 30.0).repeating(true));
        zone.add_emitter(emitter.clone());

        let owner = OwnerId::new();
        let first = world.attach(owner, Body::new(Vec3::ZERO)).unwrap();
        world.pump();
        assert_eq!(transmissions.try_iter().count(), 1);

        let second = world
            .attach(owner, Body::new(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        world.pump();

        assert_eq!(first, second);
        assert_eq!(world.len(), 1);
        assert!(world.context(owner).unwrap().is_audible(emitter.id()));
        assert_eq!(transmissions.try_iter().count(), 0);
    }

    #[test]
    fn test_detach_silences_owner() {
        let (mut world, zone, transmissions) = world();
        let emitter = SoundEmitter::new(Vec3::ZERO);
        let handle: EmitterHandle = emitter.clone();
        zone.add_emitter(handle.clone());

        let owner = OwnerId::new();
        world.attach(owner, Body::new(Vec3::ZERO)).unwrap();
        world.pump();

        emitter.play(SoundDescriptor::new("drill.ogg", 80.0));
        world.dispatcher().publish(EmitterEvent::Started { emitter: handle });
        world.pump();

        let stats = world.detach(owner).unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.silenced, 1);
        assert!(world.is_empty());
        assert_eq!(zone.listener_count(), 0);
        assert!(world.detach(owner).is_none());

        let sent: Vec<Transmission> = transmissions.try_iter().collect();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].sound.is_silence());
        assert!(sent.iter().all(|t| t.owner == owner));
    }
}

//! Emitter event routing.
//!
//! The dispatcher keeps an explicit handler table keyed by
//! `(emitter, event kind)`, holding the inbox of every listener registered for
//! that pair. Publishing an event queues a [`ListenerMessage::Emitter`] in each
//! matching inbox; listeners drain their inbox one message at a time, which
//! gives serialized delivery per listener without any locking on their side.

use crate::context::ListenerId;
use crate::emitter::EmitterId;
use crate::events::{EmitterEvent, EmitterEventKind, ListenerMessage};
use crossbeam_channel::Sender;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

type RouteKey = (EmitterId, EmitterEventKind);
type RouteTable = HashMap<RouteKey, HashMap<ListenerId, Sender<ListenerMessage>>>;

#[derive(Debug, Default)]
pub struct EventDispatcher {
    routes: Mutex<RouteTable>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn routes(&self) -> MutexGuard<'_, RouteTable> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `listener` for one event kind of `source`.
    ///
    /// Returns false if the registration already existed.
    pub fn register(
        &self,
        source: EmitterId,
        listener: ListenerId,
        kind: EmitterEventKind,
        inbox: &Sender<ListenerMessage>,
    ) -> bool {
        let inserted = self
            .routes()
            .entry((source, kind))
            .or_default()
            .insert(listener, inbox.clone())
            .is_none();
        if inserted {
            log::trace!("{} registered for {} events of {}", listener, kind, source);
        }
        inserted
    }

    /// Removes one registration. Returns false if there was none.
    pub fn unregister(
        &self,
        source: EmitterId,
        listener: ListenerId,
        kind: EmitterEventKind,
    ) -> bool {
        let mut routes = self.routes();
        let Some(listeners) = routes.get_mut(&(source, kind)) else {
            return false;
        };
        let removed = listeners.remove(&listener).is_some();
        if listeners.is_empty() {
            routes.remove(&(source, kind));
        }
        if removed {
            log::trace!("{} unregistered from {} events of {}", listener, kind, source);
        }
        removed
    }

    pub fn is_registered(
        &self,
        source: EmitterId,
        listener: ListenerId,
        kind: EmitterEventKind,
    ) -> bool {
        self.routes()
            .get(&(source, kind))
            .is_some_and(|listeners| listeners.contains_key(&listener))
    }

    /// Number of listeners registered for `kind` events of `source`.
    pub fn subscriber_count(&self, source: EmitterId, kind: EmitterEventKind) -> usize {
        self.routes()
            .get(&(source, kind))
            .map_or(0, |listeners| listeners.len())
    }

    /// Total number of live registrations across all emitters and kinds.
    pub fn registration_count(&self) -> usize {
        self.routes().values().map(|listeners| listeners.len()).sum()
    }

    /// Queues `event` for every listener registered for its emitter and kind.
    ///
    /// Listeners whose inbox has been dropped are pruned from the table.
    /// Returns the number of inboxes the event reached.
    pub fn publish(&self, event: EmitterEvent) -> usize {
        let key = (event.emitter_id(), event.kind());
        let mut routes = self.routes();
        let Some(listeners) = routes.get_mut(&key) else {
            return 0;
        };

        let mut delivered = 0;
        listeners.retain(|listener, inbox| {
            match inbox.send(ListenerMessage::Emitter(event.clone())) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    log::debug!("Pruning {}: inbox disconnected", listener);
                    false
                }
            }
        });
        if listeners.is_empty() {
            routes.remove(&key);
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{EmitterHandle, SoundEmitter};
    use crate::math::Vec3;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_register_is_keyed_per_listener_and_kind() {
        let dispatcher = EventDispatcher::new();
        let emitter = EmitterId::new();
        let (first, second) = (ListenerId::new(), ListenerId::new());
        let (tx, _rx) = unbounded();

        assert!(dispatcher.register(emitter, first, EmitterEventKind::Started, &tx));
        assert!(!dispatcher.register(emitter, first, EmitterEventKind::Started, &tx));
        assert!(dispatcher.register(emitter, second, EmitterEventKind::Started, &tx));
        assert!(dispatcher.register(emitter, first, EmitterEventKind::Stopped, &tx));

        assert_eq!(dispatcher.subscriber_count(emitter, EmitterEventKind::Started), 2);
        assert_eq!(dispatcher.subscriber_count(emitter, EmitterEventKind::Updated), 0);

        assert!(dispatcher.unregister(emitter, first, EmitterEventKind::Started));
        assert!(!dispatcher.unregister(emitter, first, EmitterEventKind::Started));
        assert!(dispatcher.is_registered(emitter, second, EmitterEventKind::Started));
        assert!(dispatcher.is_registered(emitter, first, EmitterEventKind::Stopped));
        assert_eq!(dispatcher.registration_count(), 2);
    }

    #[test]
    fn test_publish_reaches_only_matching_kind() {
        let dispatcher = EventDispatcher::new();
        let emitter: EmitterHandle = SoundEmitter::new(Vec3::ZERO);
        let listener = ListenerId::new();
        let (tx, rx) = unbounded();

        dispatcher.register(emitter.id(), listener, EmitterEventKind::Stopped, &tx);

        let started = EmitterEvent::Started {
            emitter: emitter.clone(),
        };
        assert_eq!(dispatcher.publish(started), 0);
        assert!(rx.try_recv().is_err());

        let stopped = EmitterEvent::Stopped {
            emitter: emitter.clone(),
        };
        assert_eq!(dispatcher.publish(stopped), 1);
        match rx.try_recv() {
            Ok(ListenerMessage::Emitter(event)) => {
                assert_eq!(event.kind(), EmitterEventKind::Stopped)
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_publish_prunes_disconnected_inboxes() {
        let dispatcher = EventDispatcher::new();
        let emitter: EmitterHandle = SoundEmitter::new(Vec3::ZERO);
        let (tx, rx) = unbounded();
        dispatcher.register(emitter.id(), ListenerId::new(), EmitterEventKind::Started, &tx);
        drop(rx);

        let event = EmitterEvent::Started {
            emitter: emitter.clone(),
        };
        assert_eq!(dispatcher.publish(event), 0);
        assert_eq!(dispatcher.registration_count(), 0);
    }
}

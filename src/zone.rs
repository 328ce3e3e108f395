//! Zone service interface and a distance-based reference implementation.
//!
//! A zone service decides which emitters each registered listener can hear and
//! reports range transitions by queueing messages in the listener's inbox. It
//! never calls into a listener directly.

use crate::context::ListenerId;
use crate::emitter::{EmitterHandle, EmitterId};
use crate::events::ListenerMessage;
use crate::math::within_range;
use crate::subject::SubjectHandle;
use crossbeam_channel::Sender;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What a listener hands the zone service when it registers.
#[derive(Debug, Clone)]
pub struct ListenerRegistration {
    pub listener: ListenerId,
    pub subject: SubjectHandle,
    pub range: f32,
    pub inbox: Sender<ListenerMessage>,
}

pub trait ZoneService: Send + Sync {
    /// Starts tracking a listener. Implementations are expected to follow up
    /// with an audibility sync for the registered subject.
    fn register_listener(&self, registration: ListenerRegistration);

    /// Stops tracking a listener. No further messages are queued for it.
    fn unregister_listener(&self, listener: ListenerId);
}

pub type ZoneHandle = Arc<dyn ZoneService>;

#[derive(Debug)]
struct TrackedListener {
    registration: ListenerRegistration,
    in_range: HashSet<EmitterId>,
}

#[derive(Debug, Default)]
struct ZoneState {
    emitters: Vec<EmitterHandle>,
    listeners: HashMap<ListenerId, TrackedListener>,
}

impl ZoneState {
    fn in_range_of(&self, registration: &ListenerRegistration) -> Vec<EmitterHandle> {
        let origin = registration.subject.position();
        self.emitters
            .iter()
            .filter(|emitter| within_range(origin, emitter.position(), registration.range))
            .cloned()
            .collect()
    }
}

/// Puts an emitter in range of a listener when it is within the listener's
/// hearing range of the listener's subject.
///
/// Transitions are computed on [`RadiusZone::refresh`], which the owner of
/// the zone calls whenever positions may have changed.
#[derive(Debug, Default)]
pub struct RadiusZone {
    state: Mutex<ZoneState>,
}

impl RadiusZone {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ZoneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts tracking an emitter. Takes effect on the next refresh.
    pub fn add_emitter(&self, emitter: EmitterHandle) {
        let mut state = self.state();
        if state.emitters.iter().any(|e| e.id() == emitter.id()) {
            return;
        }
        state.emitters.push(emitter);
    }

    /// Stops tracking an emitter, reporting it out of range to every listener
    /// that could hear it.
    pub fn remove_emitter(&self, emitter: EmitterId) {
        let mut state = self.state();
        state.emitters.retain(|e| e.id() != emitter);
        state.listeners.retain(|listener, tracked| {
            if !tracked.in_range.remove(&emitter) {
                return true;
            }
            let sent = tracked
                .registration
                .inbox
                .send(ListenerMessage::ExitedRange(emitter));
            if sent.is_err() {
                log::debug!("Dropping {} from zone: inbox disconnected", listener);
            }
            sent.is_ok()
        });
    }

    pub fn emitter_count(&self) -> usize {
        self.state().emitters.len()
    }

    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }

    pub fn is_registered(&self, listener: ListenerId) -> bool {
        self.state().listeners.contains_key(&listener)
    }

    /// Recomputes every listener's in-range set and queues the differences.
    ///
    /// Exits are queued before enters. Returns the number of transitions sent.
    pub fn refresh(&self) -> usize {
        let mut guard = self.state();
        let state = &mut *guard;
        let mut transitions = 0;
        let mut disconnected = Vec::new();

        for (listener, tracked) in state.listeners.iter_mut() {
            let now: Vec<EmitterHandle> = {
                let origin = tracked.registration.subject.position();
                state
                    .emitters
                    .iter()
                    .filter(|e| within_range(origin, e.position(), tracked.registration.range))
                    .cloned()
                    .collect()
            };
            let now_ids: HashSet<EmitterId> = now.iter().map(|e| e.id()).collect();

            let mut messages = Vec::new();
            for gone in tracked.in_range.difference(&now_ids) {
                messages.push(ListenerMessage::ExitedRange(*gone));
            }
            for emitter in now.iter().filter(|e| !tracked.in_range.contains(&e.id())) {
                messages.push(ListenerMessage::EnteredRange(emitter.clone()));
            }

            let count = messages.len();
            if messages
                .into_iter()
                .any(|message| tracked.registration.inbox.send(message).is_err())
            {
                disconnected.push(*listener);
                continue;
            }
            tracked.in_range = now_ids;
            transitions += count;
        }

        for listener in disconnected {
            log::debug!("Dropping {} from zone: inbox disconnected", listener);
            state.listeners.remove(&listener);
        }
        transitions
    }
}

impl ZoneService for RadiusZone {
    fn register_listener(&self, registration: ListenerRegistration) {
        let mut state = self.state();
        let in_range = state.in_range_of(&registration);
        let in_range_ids = in_range.iter().map(|e| e.id()).collect();

        if registration
            .inbox
            .send(ListenerMessage::Resync(in_range))
            .is_err()
        {
            log::debug!(
                "Not registering {}: inbox disconnected",
                registration.listener
            );
            return;
        }

        log::debug!(
            "Zone registered {} for subject {}",
            registration.listener,
            registration.subject.id()
        );
        state.listeners.insert(
            registration.listener,
            TrackedListener {
                registration,
                in_range: in_range_ids,
            },
        );
    }

    fn unregister_listener(&self, listener: ListenerId) {
        if self.state().listeners.remove(&listener).is_some() {
            log::debug!("Zone unregistered {}", listener);
        }
    }
}

//! Per-listener channel reservations, subscriptions, and audibility.

use crate::config::HearingConfig;
use crate::dispatch::EventDispatcher;
use crate::effect::ProximityEffect;
use crate::emitter::{EmitterHandle, EmitterId};
use crate::error::{EarshotError, Result};
use crate::events::{EmitterEventHandler, EmitterEventKind, ListenerMessage};
use crate::pool::ChannelPool;
use crate::sink::SinkHandle;
use crate::sound::{ChannelId, PlaybackMode, SoundDescriptor};
use crate::subject::{OwnerId, SubjectHandle};
use crate::zone::{ListenerRegistration, ZoneHandle};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

/// The external collaborators a listener context talks to.
#[derive(Clone)]
pub struct HearingServices {
    pub zone: ZoneHandle,
    pub dispatcher: Arc<EventDispatcher>,
    pub sink: SinkHandle,
}

/// Running counters for one listener context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HearingStats {
    /// Sounds handed to the sink, silence commands excluded
    pub delivered: u64,
    /// Silence commands sent for released channels
    pub silenced: u64,
    /// Sounds dropped because the channel pool was empty
    pub exhausted: u64,
    /// Events ignored because they raced a stop, exit, or update
    pub stale_events: u64,
}

/// Tracks what one owner can hear through one subject.
///
/// The context owns its own [`ChannelPool`], so reservations never collide
/// with other listeners. Range transitions and emitter events arrive through
/// the context's inbox and are handled one at a time by
/// [`ListenerContext::process_pending`] or [`ListenerContext::handle`].
///
/// Invariants:
/// - every emitter holding a channel is also audible
/// - an emitter is audible iff this context is subscribed to its events
/// - an emitter holds at most one channel
/// - a deferred emitter is neither audible nor subscribed
///
/// An in-range emitter that could not get a channel is deferred. It is
/// entered again as soon as a stop frees a channel, and forgotten when it
/// leaves range.
///
/// Dropping the context silences every reserved channel, cancels every
/// subscription, and unregisters from the zone service, in that order.
pub struct ListenerContext {
    id: ListenerId,
    owner: Option<OwnerId>,
    subject: SubjectHandle,
    pool: ChannelPool,
    channel_of: HashMap<EmitterId, ChannelId>,
    audible: HashMap<EmitterId, EmitterHandle>,
    deferred: Vec<EmitterHandle>,
    hearing_range: f32,
    effect: ProximityEffect,
    services: HearingServices,
    inbox: Sender<ListenerMessage>,
    receiver: Receiver<ListenerMessage>,
    stats: HearingStats,
}

impl ListenerContext {
    /// Creates a context and registers it with the zone service.
    pub fn new(
        owner: OwnerId,
        subject: SubjectHandle,
        config: &HearingConfig,
        services: HearingServices,
    ) -> Result<Self> {
        config.validate()?;

        let (inbox, receiver) = unbounded();
        let context = Self {
            id: ListenerId::new(),
            owner: Some(owner),
            subject,
            pool: ChannelPool::new(config.min_channel_id(), config.max_channel_id()),
            channel_of: HashMap::new(),
            audible: HashMap::new(),
            deferred: Vec::new(),
            hearing_range: config.hearing_range,
            effect: ProximityEffect::from_config(config),
            services,
            inbox,
            receiver,
            stats: HearingStats::default(),
        };

        log::debug!(
            "{} created for {} via {}",
            context.id,
            owner,
            context.subject.id()
        );
        context.services.zone.register_listener(context.registration());
        Ok(context)
    }

    fn registration(&self) -> ListenerRegistration {
        ListenerRegistration {
            listener: self.id,
            subject: self.subject.clone(),
            range: self.hearing_range,
            inbox: self.inbox.clone(),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// The owner sounds are delivered to. `None` once torn down.
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn subject(&self) -> &SubjectHandle {
        &self.subject
    }

    pub fn hearing_range(&self) -> f32 {
        self.hearing_range
    }

    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    pub fn stats(&self) -> HearingStats {
        self.stats
    }

    pub fn channel_of(&self, emitter: EmitterId) -> Option<ChannelId> {
        self.channel_of.get(&emitter).copied()
    }

    pub fn is_audible(&self, emitter: EmitterId) -> bool {
        self.audible.contains_key(&emitter)
    }

    pub fn audible(&self) -> impl Iterator<Item = EmitterId> + '_ {
        self.audible.keys().copied()
    }

    pub fn audible_count(&self) -> usize {
        self.audible.len()
    }

    /// True if the emitter is in range but waiting for a free channel.
    pub fn is_deferred(&self, emitter: EmitterId) -> bool {
        self.deferred.iter().any(|e| e.id() == emitter)
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    pub fn reserved_count(&self) -> usize {
        self.channel_of.len()
    }

    /// Number of messages waiting in the inbox.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the emitter's channel, reserving one if it has none yet.
    ///
    /// Returns `None` only when the emitter has no channel and the pool is
    /// exhausted. Callers must only assign channels to audible emitters.
    pub(crate) fn assign_channel(&mut self, emitter: EmitterId) -> Option<ChannelId> {
        if let Some(&channel) = self.channel_of.get(&emitter) {
            return Some(channel);
        }
        let channel = self.pool.reserve()?;
        self.channel_of.insert(emitter, channel);
        log::trace!("{} reserved {} for {}", self.id, channel, emitter);
        Some(channel)
    }

    /// Silences and frees the emitter's channel. No-op without a reservation.
    ///
    /// The channel is freed even if the silence command cannot be delivered.
    pub fn release(&mut self, emitter: EmitterId) -> Result<()> {
        let Some(&channel) = self.channel_of.get(&emitter) else {
            return Ok(());
        };
        let silenced = self.transmit(SoundDescriptor::silence(channel));
        self.channel_of.remove(&emitter);
        self.pool.release(channel);
        log::trace!("{} released {} from {}", self.id, channel, emitter);
        silenced
    }

    /// Registers for all four event kinds of `emitter`.
    pub fn subscribe_to(&self, emitter: EmitterId) {
        for kind in EmitterEventKind::ALL {
            self.services
                .dispatcher
                .register(emitter, self.id, kind, &self.inbox);
        }
    }

    /// Removes all four event registrations for `emitter`.
    pub fn unsubscribe_from(&self, emitter: EmitterId) {
        for kind in EmitterEventKind::ALL {
            self.services.dispatcher.unregister(emitter, self.id, kind);
        }
    }

    /// Starts hearing an emitter that came into range.
    ///
    /// A playing emitter gets a channel first; only once that succeeds is the
    /// context subscribed and the emitter marked audible. On
    /// [`EarshotError::PoolExhausted`] the emitter is deferred, unsubscribed,
    /// until a channel frees up. On any other error nothing is kept. An
    /// emitter that is already audible is left alone.
    pub fn on_enter_range(&mut self, emitter: &EmitterHandle) -> Result<()> {
        let id = emitter.id();
        if self.audible.contains_key(&id) {
            log::trace!("{} already hears {}", self.id, id);
            return Ok(());
        }
        self.deferred.retain(|e| e.id() != id);

        if let Err(e) = self.start_hearing(emitter) {
            if let Err(silence_error) = self.release(id) {
                log::debug!("{} could not silence {}: {}", self.id, id, silence_error);
            }
            if matches!(e, EarshotError::PoolExhausted { .. }) {
                log::debug!("{} deferring {} until a channel frees up", self.id, id);
                self.deferred.push(emitter.clone());
            }
            return Err(e);
        }

        self.subscribe_to(id);
        self.audible.insert(id, emitter.clone());
        Ok(())
    }

    /// Stops hearing an emitter that left range.
    ///
    /// Playback is stopped before the subscription is torn down. The emitter
    /// is forgotten even if the silence command fails, and that failure is
    /// returned afterwards.
    pub fn on_exit_range(&mut self, emitter: EmitterId) -> Result<()> {
        self.deferred.retain(|e| e.id() != emitter);
        let stopped = self.stop_hearing(emitter);
        self.unsubscribe_from(emitter);
        self.audible.remove(&emitter);
        stopped
    }

    /// Plays the emitter's active sound from the beginning on its channel.
    ///
    /// Does nothing if the emitter is not playing. Playback always restarts:
    /// a repeated start or a re-entry replays from the top rather than
    /// resuming mid-stream.
    pub fn start_hearing(&mut self, emitter: &EmitterHandle) -> Result<()> {
        if !emitter.is_playing() {
            return Ok(());
        }
        let Some(sound) = emitter.active_sound() else {
            return Ok(());
        };

        let id = emitter.id();
        let Some(channel) = self.assign_channel(id) else {
            self.stats.exhausted += 1;
            return Err(EarshotError::PoolExhausted {
                listener: self.id,
                emitter: id,
            });
        };

        let outgoing = sound
            .with_mode(PlaybackMode::Restart)
            .with_channel(channel);
        self.deliver_from(emitter, outgoing)
    }

    /// Plays a one-shot sound without reserving or tracking a channel.
    pub fn hear_once(&mut self, sound: SoundDescriptor, emitter: &EmitterHandle) -> Result<()> {
        self.deliver_from(emitter, sound)
    }

    /// Silences the emitter's channel and hands it to a deferred emitter.
    pub fn stop_hearing(&mut self, emitter: EmitterId) -> Result<()> {
        let released = self.release(emitter);
        self.resume_deferred();
        released
    }

    /// Enters deferred emitters, oldest first, while channels are free.
    fn resume_deferred(&mut self) {
        let mut waiting = std::mem::take(&mut self.deferred).into_iter();
        while !self.pool.is_exhausted() {
            let Some(emitter) = waiting.next() else {
                break;
            };
            log::debug!("{} retrying deferred {}", self.id, emitter.id());
            if let Err(e) = self.on_enter_range(&emitter) {
                log::warn!("{} could not resume {}: {}", self.id, emitter.id(), e);
            }
        }
        self.deferred.extend(waiting);
    }

    /// Applies new parameters to a sound this context is already playing.
    ///
    /// Ignored when the emitter holds no channel here or has no active sound;
    /// both happen routinely when an update races a stop or an entry.
    pub fn on_sound_update(&mut self, emitter: &EmitterHandle) -> Result<()> {
        let Some(channel) = self.channel_of(emitter.id()) else {
            self.note_stale(emitter.id(), EmitterEventKind::Updated);
            return Ok(());
        };
        let Some(sound) = emitter.active_sound() else {
            self.note_stale(emitter.id(), EmitterEventKind::Updated);
            return Ok(());
        };

        let outgoing = sound.with_mode(PlaybackMode::Update).with_channel(channel);
        self.deliver_from(emitter, outgoing)
    }

    /// Swaps the subject without tearing the context down.
    ///
    /// The zone service is told to forget the old subject before it learns
    /// the new one, and resyncs audibility on registration.
    pub fn reset_proxy(&mut self, subject: SubjectHandle) {
        log::debug!(
            "{} swapping subject {} -> {}",
            self.id,
            self.subject.id(),
            subject.id()
        );
        self.services.zone.unregister_listener(self.id);
        self.subject = subject;
        self.services.zone.register_listener(self.registration());
    }

    /// Brings `audible` in line with a full list of in-range emitters.
    ///
    /// Emitters no longer listed are exited first, then new ones are entered.
    /// Emitters heard before and after are not touched. Every emitter is
    /// processed even if some fail; the first error is returned.
    pub fn sync_audible(&mut self, in_range: Vec<EmitterHandle>) -> Result<()> {
        let keep: HashSet<EmitterId> = in_range.iter().map(|e| e.id()).collect();
        self.deferred.retain(|e| keep.contains(&e.id()));
        let gone: Vec<EmitterId> = self
            .audible
            .keys()
            .filter(|id| !keep.contains(*id))
            .copied()
            .collect();

        let mut first_error = None;
        for id in gone {
            if let Err(e) = self.on_exit_range(id) {
                Self::keep_first(self.id, &mut first_error, e);
            }
        }
        for emitter in &in_range {
            if let Err(e) = self.on_enter_range(emitter) {
                Self::keep_first(self.id, &mut first_error, e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn keep_first(listener: ListenerId, slot: &mut Option<EarshotError>, error: EarshotError) {
        if slot.is_some() {
            log::warn!("{} resync: {}", listener, error);
        } else {
            *slot = Some(error);
        }
    }

    /// Handles one inbox message.
    ///
    /// Emitter events for emitters that are not audible are dropped; they
    /// were queued before an exit and must not reach this context.
    pub fn handle(&mut self, message: ListenerMessage) -> Result<()> {
        if message.is_range_transition() {
            log::trace!("{} handling range transition", self.id);
        }
        match message {
            ListenerMessage::EnteredRange(emitter) => self.on_enter_range(&emitter),
            ListenerMessage::ExitedRange(emitter) => self.on_exit_range(emitter),
            ListenerMessage::Resync(in_range) => self.sync_audible(in_range),
            ListenerMessage::Emitter(event) => {
                if !self.audible.contains_key(&event.emitter_id()) {
                    self.note_stale(event.emitter_id(), event.kind());
                    return Ok(());
                }
                event.dispatch_to(self)
            }
        }
    }

    /// Drains the inbox, logging and dropping any sound that fails.
    ///
    /// Returns the number of messages handled.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(message) = self.receiver.try_recv() {
            processed += 1;
            if let Err(e) = self.handle(message) {
                log::warn!("{} dropped a sound: {}", self.id, e);
            }
        }
        processed
    }

    /// Tears the context down now and returns its final counters.
    pub fn close(mut self) -> HearingStats {
        self.teardown();
        self.stats
    }

    fn note_stale(&mut self, emitter: EmitterId, kind: EmitterEventKind) {
        self.stats.stale_events += 1;
        log::trace!("{} ignored stale {} event from {}", self.id, kind, emitter);
    }

    fn deliver_from(&mut self, emitter: &EmitterHandle, sound: SoundDescriptor) -> Result<()> {
        let outgoing = self.effect.apply(
            sound,
            &*self.subject,
            emitter.position(),
            self.hearing_range,
        );
        self.transmit(outgoing)
    }

    fn transmit(&mut self, sound: SoundDescriptor) -> Result<()> {
        let Some(owner) = self.owner else {
            return Ok(());
        };
        let silence = sound.is_silence();
        self.services.sink.deliver(owner, sound)?;
        if silence {
            self.stats.silenced += 1;
        } else {
            self.stats.delivered += 1;
        }
        Ok(())
    }

    fn teardown(&mut self) {
        let Some(owner) = self.owner else {
            return;
        };

        self.deferred.clear();
        let reserved: Vec<EmitterId> = self.channel_of.keys().copied().collect();
        for emitter in reserved {
            if let Err(e) = self.release(emitter) {
                log::warn!("{} could not silence {} on teardown: {}", self.id, emitter, e);
            }
        }

        let audible: Vec<EmitterId> = self.audible.drain().map(|(id, _)| id).collect();
        for emitter in audible {
            self.unsubscribe_from(emitter);
        }

        self.services.zone.unregister_listener(self.id);
        let discarded = self.receiver.try_iter().count();
        self.owner = None;

        log::debug!(
            "{} torn down for {} ({} queued messages discarded)",
            self.id,
            owner,
            discarded
        );
    }
}

impl EmitterEventHandler for ListenerContext {
    fn on_started(&mut self, emitter: &EmitterHandle) -> Result<()> {
        if !emitter.is_playing() {
            self.note_stale(emitter.id(), EmitterEventKind::Started);
            return Ok(());
        }
        self.start_hearing(emitter)
    }

    fn on_stopped(&mut self, emitter: &EmitterHandle) -> Result<()> {
        if !self.channel_of.contains_key(&emitter.id()) {
            self.note_stale(emitter.id(), EmitterEventKind::Stopped);
            return Ok(());
        }
        self.stop_hearing(emitter.id())
    }

    fn on_updated(&mut self, emitter: &EmitterHandle) -> Result<()> {
        self.on_sound_update(emitter)
    }

    fn on_pushed(&mut self, emitter: &EmitterHandle, sound: SoundDescriptor) -> Result<()> {
        self.hear_once(sound, emitter)
    }
}

impl Drop for ListenerContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

//! # Earshot
//!
//! Per-listener audio channel bookkeeping.
//!
//! Every listener owns an independent, finite pool of playback channels and
//! tracks which emitters it can currently hear. Emitters far apart never
//! collide on a shared channel number, because there is no shared registry.
//!
//! ## Quick Start
//!
//! ```no_run
//! use earshot::*;
//! use std::sync::Arc;
//!
//! let zone = Arc::new(RadiusZone::new());
//! let (sink, transmissions) = ChannelSink::new();
//! let services = HearingServices {
//!     zone: zone.clone(),
//!     dispatcher: Arc::new(EventDispatcher::new()),
//!     sink: Arc::new(sink),
//! };
//! let mut world = HearingWorld::new(HearingConfig::default(), services)?;
//!
//! // A radio playing next to the player
//! let radio = SoundEmitter::new(Vec3::new(2.0, 0.0, 0.0));
//! radio.play(SoundDescriptor::new("sound/music/radio.ogg", 50.0));
//! zone.add_emitter(radio.clone());
//!
//! // Attach the player's body; the zone resyncs and the radio is heard
//! let player = OwnerId::new();
//! world.attach(player, Body::new(Vec3::ZERO))?;
//! world.pump();
//!
//! for transmission in transmissions.try_iter() {
//!     println!("{} <- {:?}", transmission.owner, transmission.sound);
//! }
//! # Ok::<(), EarshotError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`ChannelPool`]**: fixed-capacity allocator handing out the lowest free channel
//! - **[`ListenerContext`]**: reservations, subscriptions, and audibility for one owner
//! - **[`EventDispatcher`]**: routes emitter events to subscribed listeners
//! - **[`ProximityEffect`]**: deafness, out-of-view muffling, and terrain scaling
//! - **[`HearingWorld`]**: one context per owner, subjects swapped in place
//!
//! ## Collaborators
//!
//! Range detection ([`ZoneService`]), emitter state ([`Emitter`]), subject
//! senses ([`Subject`]), and playback transport ([`TransmissionSink`]) are
//! traits. [`RadiusZone`], [`SoundEmitter`], [`Body`], and [`ChannelSink`]
//! are plain implementations of each.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod effect;
pub mod emitter;
pub mod error;
pub mod events;
pub mod math;
pub mod pool;
pub mod sink;
pub mod sound;
pub mod subject;
pub mod world;
pub mod zone;

pub use config::HearingConfig;
pub use context::{HearingServices, HearingStats, ListenerContext, ListenerId};
pub use dispatch::EventDispatcher;
pub use effect::ProximityEffect;
pub use emitter::{Emitter, EmitterHandle, EmitterId, SoundEmitter};
pub use error::EarshotError;
pub use events::{EmitterEvent, EmitterEventHandler, EmitterEventKind, ListenerMessage};
pub use math::Vec3;
pub use pool::ChannelPool;
pub use sink::{ChannelSink, SinkHandle, Transmission, TransmissionSink};
pub use sound::{ChannelId, PlaybackMode, SoundDescriptor};
pub use subject::{Body, OwnerId, Subject, SubjectHandle, SubjectId};
pub use world::HearingWorld;
pub use zone::{ListenerRegistration, RadiusZone, ZoneHandle, ZoneService};

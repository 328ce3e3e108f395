//! Owners and subjects of a listener.
//!
//! The owner is who receives the sound; the subject is whose position and
//! senses decide what is audible. They are often the same entity, but a
//! subject may be swapped while the owner stays put.

use crate::math::{Vec3, within_range};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Identity of the entity sounds are delivered to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubjectId(Uuid);

impl SubjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

/// The entity whose position and senses determine what a listener hears.
pub trait Subject: Send + Sync + fmt::Debug {
    fn id(&self) -> SubjectId;

    fn position(&self) -> Vec3;

    fn is_deaf(&self) -> bool {
        false
    }

    /// Whether a source at `source` is in view within `range`.
    ///
    /// Sources that fail this test are heard muffled, as through a wall.
    fn can_perceive(&self, source: Vec3, range: f32) -> bool {
        within_range(self.position(), source, range)
    }

    /// Terrain/occlusion multiplier at the subject's current position.
    fn terrain_coefficient(&self) -> f32 {
        1.0
    }
}

pub type SubjectHandle = Arc<dyn Subject>;

#[derive(Debug)]
struct BodyState {
    position: Vec3,
    deaf: bool,
    sight_blocked: bool,
    terrain_coefficient: f32,
}

/// A plain subject with settable senses.
#[derive(Debug)]
pub struct Body {
    id: SubjectId,
    state: Mutex<BodyState>,
}

impl Body {
    pub fn new(position: Vec3) -> Arc<Self> {
        Arc::new(Self {
            id: SubjectId::new(),
            state: Mutex::new(BodyState {
                position,
                deaf: false,
                sight_blocked: false,
                terrain_coefficient: 1.0,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, BodyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_position(&self, position: Vec3) {
        self.state().position = position;
    }

    pub fn set_deaf(&self, deaf: bool) {
        self.state().deaf = deaf;
    }

    /// Blocks line of sight so every source counts as out of view.
    pub fn set_sight_blocked(&self, blocked: bool) {
        self.state().sight_blocked = blocked;
    }

    pub fn set_terrain_coefficient(&self, coefficient: f32) {
        self.state().terrain_coefficient = coefficient;
    }
}

impl Subject for Body {
    fn id(&self) -> SubjectId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.state().position
    }

    fn is_deaf(&self) -> bool {
        self.state().deaf
    }

    fn can_perceive(&self, source: Vec3, range: f32) -> bool {
        let state = self.state();
        !state.sight_blocked && within_range(state.position, source, range)
    }

    fn terrain_coefficient(&self) -> f32 {
        self.state().terrain_coefficient
    }
}

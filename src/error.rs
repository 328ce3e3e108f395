//! Error types for Earshot

use crate::context::ListenerId;
use crate::emitter::EmitterId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EarshotError {
    #[error("Channel pool exhausted: no free channel for emitter {emitter} on listener {listener}")]
    PoolExhausted {
        listener: ListenerId,
        emitter: EmitterId,
    },

    #[error("Transmission error: {0}")]
    Transmission(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EarshotError {
    /// True for errors that only cost one sound and leave the listener usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. } | Self::Transmission(_))
    }
}

pub type Result<T> = std::result::Result<T, EarshotError>;

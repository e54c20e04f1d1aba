//! Inbound event shapes and their normalization into canonical events.

pub mod canonical;
pub mod inbound;
pub mod normalizer;

pub use canonical::{CanonicalEvent, EventBody, EventKind, MeetingId};
pub use normalizer::{normalize, InboundEvent, ValidationError};

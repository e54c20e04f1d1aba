//! Meeting session model: the aggregator applying events, the finalizer
//! archiving ended meetings, and the read-side queries.

pub mod aggregator;
pub mod error;
pub mod finalizer;
pub mod queries;


pub use aggregator::{ApplyOutcome, SessionAggregator};
pub use error::SessionError;
pub use finalizer::ArchivalFinalizer;
pub use queries::{MeetingStatus, MeetingSummary, SessionQueries, TranscriptView};

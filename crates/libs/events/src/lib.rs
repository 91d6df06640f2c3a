//! Engine Events — lifecycle event emission against `EventSink` and
//! `ClusterEventSink` destinations (spec.md §6): CloudEvents envelope
//! construction and a bounded, retrying, per-sink delivery queue.

pub mod emitter;
pub mod envelope;
pub mod error;

pub use emitter::{Deliver, Emitter, EmitterMetrics, HttpDeliverer, MAX_ATTEMPTS, QUEUE_CAPACITY};
pub use envelope::{build_event, EventContext, EventKind};
pub use error::EventError;

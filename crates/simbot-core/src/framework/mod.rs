//! Framework layer - Event processing.
//!
//! Components push every event they produce into an [`EventProcessor`]. The
//! [`ListenerDispatcher`] is the processor used by the runtime: listeners are
//! registered against an [`EventKey`](crate::EventKey) and receive every event
//! whose key descends from it.

pub mod processor;

pub use processor::{
    BoxedEventProcessor, EventListener, EventProcessingResult, EventProcessor, ListenerDispatcher,
};

pub mod event_consumer;
pub mod event_queue;

pub use event_consumer::EventConsumer;
pub use event_queue::{DEFAULT_MAX_QUEUE_SIZE, EnqueueError, Event, EventQueue};

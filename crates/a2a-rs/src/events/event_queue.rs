use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::debug;

use crate::events::event_consumer::EventConsumer;
pub use crate::types::Event;

pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1024;

/// Event queue for A2A responses from an agent.
///
/// Acts as a buffer between the agent's asynchronous execution and the
/// server's response handling (e.g. streaming via SSE). Clones share the same
/// channel; the paired [`EventConsumer`] sees the stream end once every clone
/// has been dropped.
#[derive(Clone)]
pub struct EventQueue {
    sender: mpsc::Sender<Event>,
    is_closed: Arc<RwLock<bool>>,
}

impl EventQueue {
    /// Creates a queue and the consumer that drains it.
    pub fn new(max_queue_size: usize) -> (Self, EventConsumer) {
        let (sender, receiver) = mpsc::channel(max_queue_size.max(1));
        let is_closed = Arc::new(RwLock::new(false));

        debug!("EventQueue initialized.");

        (
            Self {
                sender,
                is_closed: is_closed.clone(),
            },
            EventConsumer::new(receiver, is_closed),
        )
    }

    /// Enqueues an event.
    ///
    /// Events pushed after the queue was closed are dropped.
    pub async fn enqueue_event(&self, event: Event) -> Result<(), EnqueueError> {
        if *self.is_closed.read().await {
            debug!("Queue is closed. Event will not be enqueued.");
            return Ok(());
        }

        match &event {
            Event::Task(task) => debug!(task_id = %task.id, "Enqueuing Task event"),
            Event::TaskStatusUpdate(update) => debug!(
                task_id = %update.task_id,
                state = ?update.status.state,
                "Enqueuing TaskStatusUpdate event"
            ),
            Event::TaskArtifactUpdate(update) => {
                debug!(task_id = %update.task_id, "Enqueuing TaskArtifactUpdate event")
            }
            Event::Message(msg) => debug!(task_id = ?msg.task_id, "Enqueuing Message event"),
        }

        self.sender
            .send(event)
            .await
            .map_err(|_| EnqueueError::ConsumerGone)
    }

    /// Closes the queue for future push events.
    pub async fn close(&self) {
        let mut is_closed = self.is_closed.write().await;
        if !*is_closed {
            debug!("Closing EventQueue.");
            *is_closed = true;
        }
    }

    pub async fn is_closed(&self) -> bool {
        *self.is_closed.read().await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("event consumer is gone")]
    ConsumerGone,
}

impl From<EnqueueError> for crate::errors::A2aServerError {
    fn from(e: EnqueueError) -> Self {
        crate::errors::A2aServerError::internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, MessageRole, Part};

    fn message(text: &str) -> Event {
        Event::Message(Message {
            message_id: text.to_string(),
            context_id: None,
            task_id: None,
            role: MessageRole::Agent,
            parts: vec![Part::text(text)],
            reference_task_ids: vec![],
            metadata: Default::default(),
        })
    }

    #[tokio::test]
    async fn test_closed_queue_drops_events() {
        let (queue, mut consumer) = EventQueue::new(4);
        queue.close().await;
        assert!(queue.is_closed().await);

        queue.enqueue_event(message("dropped")).await.unwrap();
        drop(queue);

        assert!(consumer.consume_one().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_without_consumer_fails() {
        let (queue, consumer) = EventQueue::new(4);
        drop(consumer);

        let res = queue.enqueue_event(message("lost")).await;
        assert!(matches!(res, Err(EnqueueError::ConsumerGone)));
    }
}

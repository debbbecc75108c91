use std::sync::Arc;

use futures::Stream;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

use crate::types::Event;

/// Consumer to read events from the agent event queue.
pub struct EventConsumer {
    receiver: mpsc::Receiver<Event>,
    queue_closed: Arc<RwLock<bool>>,
}

impl EventConsumer {
    pub(crate) fn new(receiver: mpsc::Receiver<Event>, queue_closed: Arc<RwLock<bool>>) -> Self {
        debug!("EventConsumer initialized");
        Self {
            receiver,
            queue_closed,
        }
    }

    /// Waits for the next event. `None` once every producer has gone away.
    pub async fn consume_one(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Consume all the generated streaming events from the agent.
    ///
    /// Yields events in enqueue order until a final event has been yielded
    /// (the queue is then closed for the producer) or the producer side is
    /// dropped.
    pub fn consume_all(mut self) -> impl Stream<Item = Event> + Send {
        async_stream::stream! {
            while let Some(event) = self.receiver.recv().await {
                let is_final_event = event.is_final();
                yield event;

                if is_final_event {
                    debug!("Stopping event consumption after final event.");
                    *self.queue_closed.write().await = true;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventQueue;
    use crate::types::{TaskState, TaskStatus, TaskStatusUpdateEvent};
    use futures::StreamExt;

    fn status(state: TaskState, final_: bool) -> Event {
        Event::TaskStatusUpdate(TaskStatusUpdateEvent {
            task_id: "t1".to_string(),
            context_id: "c1".to_string(),
            status: TaskStatus {
                state,
                message: None,
                timestamp: None,
            },
            final_,
            metadata: Default::default(),
        })
    }

    #[tokio::test]
    async fn test_consume_all_stops_at_final_event() {
        let (queue, consumer) = EventQueue::new(8);
        queue.enqueue_event(status(TaskState::Working, false)).await.unwrap();
        queue.enqueue_event(status(TaskState::Completed, true)).await.unwrap();
        queue.enqueue_event(status(TaskState::Working, false)).await.unwrap();

        let events: Vec<Event> = consumer.consume_all().collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_final());

        // the queue is closed for the producer once the final event went out
        assert!(queue.is_closed().await);
    }

    #[tokio::test]
    async fn test_consume_all_ends_when_producer_drops() {
        let (queue, consumer) = EventQueue::new(8);
        let producer = tokio::spawn(async move {
            queue.enqueue_event(status(TaskState::Working, false)).await.unwrap();
        });

        let events: Vec<Event> = consumer.consume_all().collect().await;
        producer.await.unwrap();
        assert_eq!(events, vec![status(TaskState::Working, false)]);
    }

    #[tokio::test]
    async fn test_consume_all_on_silent_producer_is_empty() {
        let (queue, consumer) = EventQueue::new(8);
        drop(queue);

        let events: Vec<Event> = consumer.consume_all().collect().await;
        assert!(events.is_empty());
    }
}

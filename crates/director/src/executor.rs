use std::sync::Arc;

use a2a_rs::{
    agent_execution::{AgentExecutor, BoxedFuture, RequestContext},
    errors::A2aServerError,
    events::EventQueue,
    types::Event,
    utils::new_task,
};
use futures::StreamExt;
use tracing::info;

use crate::{agent::DirectorAgent, translate::translate};

/// Runs the director agent for each incoming A2A message.
pub struct DirectorAgentExecutor {
    agent: Arc<DirectorAgent>,
}

impl DirectorAgentExecutor {
    pub fn new(agent: Arc<DirectorAgent>) -> Self {
        Self { agent }
    }
}

impl AgentExecutor for DirectorAgentExecutor {
    fn execute<'a>(&'a self, context: RequestContext, event_queue: EventQueue) -> BoxedFuture<'a> {
        Box::pin(async move {
            let query = context.get_user_input("\n");

            let task = match context.current_task() {
                Some(task) => task.clone(),
                None => {
                    let message = context
                        .message()
                        .ok_or_else(|| A2aServerError::invalid_params("request has no message"))?;
                    let task = new_task(message)?;
                    event_queue.enqueue_event(Event::Task(task.clone())).await?;
                    task
                }
            };
            info!(task_id = %task.id, context_id = %task.context_id, "Executing director task");

            let updates = self.agent.stream(
                query,
                task.context_id.clone(),
                context.authorization().map(str::to_string),
            );
            let events = translate(updates, task.id.clone(), task.context_id.clone());
            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                event_queue.enqueue_event(event).await?;
            }
            Ok(())
        })
    }

    fn cancel<'a>(&'a self, _context: RequestContext, _event_queue: EventQueue) -> BoxedFuture<'a> {
        Box::pin(async { Err(A2aServerError::unsupported("cancel not supported")) })
    }
}

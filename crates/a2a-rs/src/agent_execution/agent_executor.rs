use std::future::Future;
use std::pin::Pin;

use crate::{
    agent_execution::context::RequestContext, errors::A2aServerError, events::EventQueue,
};

pub type BoxedFuture<'a> = Pin<Box<dyn Future<Output = Result<(), A2aServerError>> + Send + 'a>>;

/// Agent Executor interface.
///
/// Implementations contain the core logic of the agent, executing tasks based
/// on requests and publishing updates to an event queue.
pub trait AgentExecutor: Send + Sync {
    /// Execute the agent's logic for a given request context.
    ///
    /// The agent reads what it needs from `context` and publishes `Task`,
    /// `TaskStatusUpdateEvent` or `TaskArtifactUpdateEvent` events to the
    /// `event_queue`. Returns once execution for this request is complete or
    /// the agent yields control (e.g. enters an input-required state).
    fn execute<'a>(&'a self, context: RequestContext, event_queue: EventQueue) -> BoxedFuture<'a>;

    /// Request the agent to cancel an ongoing task.
    fn cancel<'a>(&'a self, context: RequestContext, event_queue: EventQueue) -> BoxedFuture<'a>;
}

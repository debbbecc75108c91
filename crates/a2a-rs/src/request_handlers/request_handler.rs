use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::{
    errors::A2aServerError,
    service::ServerCallContext,
    types::{
        MessageSendParams, SendMessageSuccessResponseResult,
        SendStreamingMessageSuccessResponseResult, Task, TaskIdParams, TaskQueryParams,
    },
};

pub type TaskSubscriptionStream = Pin<
    Box<
        dyn Stream<Item = Result<SendStreamingMessageSuccessResponseResult, A2aServerError>> + Send,
    >,
>;

/// A2A request handler interface.
///
/// The methods an A2A server implementation provides to handle incoming
/// JSON-RPC requests. Every method receives the call context so request-scoped
/// data (such as the caller's credentials) travels explicitly.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles 'tasks/get': retrieves the state and history of a task.
    async fn on_get_task(
        &self,
        params: TaskQueryParams,
        context: &ServerCallContext,
    ) -> Result<Task, A2aServerError>;

    /// Handles 'tasks/cancel': asks the agent to cancel an ongoing task.
    async fn on_cancel_task(
        &self,
        params: TaskIdParams,
        context: &ServerCallContext,
    ) -> Result<Task, A2aServerError>;

    /// Handles 'message/send' (non-streaming).
    ///
    /// Runs the agent to its final event and returns the resulting `Task`
    /// (or `Message`).
    async fn on_message_send(
        &self,
        params: MessageSendParams,
        context: &ServerCallContext,
    ) -> Result<SendMessageSuccessResponseResult, A2aServerError>;

    /// Handles 'message/stream'.
    ///
    /// Yields task, status-update and artifact-update events as the agent
    /// produces them.
    async fn on_message_send_stream(
        &self,
        params: MessageSendParams,
        context: &ServerCallContext,
    ) -> Result<TaskSubscriptionStream, A2aServerError>;
}

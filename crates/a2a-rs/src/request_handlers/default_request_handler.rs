use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    agent_execution::{AgentExecutor, RequestContext},
    errors::A2aServerError,
    events::{DEFAULT_MAX_QUEUE_SIZE, EventConsumer, EventQueue},
    request_handlers::request_handler::{RequestHandler, TaskSubscriptionStream},
    service::ServerCallContext,
    tasks::{TaskManager, TaskStore},
    types::{
        Event, MessageSendParams, SendMessageSuccessResponseResult, Task, TaskIdParams,
        TaskQueryParams,
    },
};

type ProducerHandle = JoinHandle<Result<(), A2aServerError>>;

/// Default request handler for all incoming requests.
///
/// Coordinates the `AgentExecutor` with the `TaskStore`: every message runs
/// the agent on its own tokio task, with an event queue connecting it to the
/// caller.
pub struct DefaultRequestHandler {
    agent_executor: Arc<dyn AgentExecutor>,
    task_store: Arc<dyn TaskStore>,
    max_queue_size: usize,
}

impl DefaultRequestHandler {
    pub fn new(agent_executor: Arc<dyn AgentExecutor>, task_store: Arc<dyn TaskStore>) -> Self {
        Self {
            agent_executor,
            task_store,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
        }
    }

    /// Common setup logic for both streaming and non-streaming message handling.
    async fn setup_message_execution(
        &self,
        params: MessageSendParams,
        call_context: &ServerCallContext,
    ) -> Result<(TaskManager, EventConsumer, ProducerHandle), A2aServerError> {
        let task = match params.message.task_id {
            Some(ref task_id) => Some(
                self.task_store
                    .get(task_id)
                    .await?
                    .ok_or_else(|| A2aServerError::task_not_found(task_id))?,
            ),
            None => None,
        };

        if let Some(ref task) = task
            && task.status.state.is_terminal()
        {
            return Err(A2aServerError::invalid_params(format!(
                "Task {} is in terminal state: {:?}",
                task.id, task.status.state
            )));
        }

        let request_context = RequestContext::new(
            Some(params),
            task.as_ref().map(|t| t.id.clone()),
            task.as_ref().map(|t| t.context_id.clone()),
            task,
        )?
        .with_authorization(call_context.authorization());

        let task_id = request_context
            .task_id()
            .ok_or_else(|| A2aServerError::internal("Task ID not set in request context"))?
            .to_string();
        let context_id = request_context
            .context_id()
            .ok_or_else(|| A2aServerError::internal("Context ID not set in request context"))?
            .to_string();

        let (queue, consumer) = EventQueue::new(self.max_queue_size);
        let agent_executor = self.agent_executor.clone();
        let producer = tokio::spawn(async move {
            info!("Starting agent execution task");
            let res = agent_executor.execute(request_context, queue).await;
            if let Err(ref e) = res {
                error!("Agent execution failed: {}", e);
            }
            info!("Agent execution task completed");
            res
        });

        Ok((
            TaskManager::new(self.task_store.clone(), task_id, context_id),
            consumer,
            producer,
        ))
    }
}

/// Surfaces the agent's own error when its stream ended without a final event.
async fn producer_outcome(producer: ProducerHandle) -> Result<(), A2aServerError> {
    match producer.await {
        Ok(res) => res,
        Err(e) => Err(A2aServerError::internal(format!(
            "Agent execution task failed: {e}"
        ))),
    }
}

#[async_trait]
impl RequestHandler for DefaultRequestHandler {
    async fn on_get_task(
        &self,
        params: TaskQueryParams,
        _context: &ServerCallContext,
    ) -> Result<Task, A2aServerError> {
        let mut task = self
            .task_store
            .get(&params.id)
            .await?
            .ok_or_else(|| A2aServerError::task_not_found(&params.id))?;

        if let Some(history_length) = params.history_length {
            let keep = usize::try_from(history_length).unwrap_or(0);
            let skip = task.history.len().saturating_sub(keep);
            task.history.drain(..skip);
        }
        Ok(task)
    }

    async fn on_cancel_task(
        &self,
        params: TaskIdParams,
        _context: &ServerCallContext,
    ) -> Result<Task, A2aServerError> {
        let task = self
            .task_store
            .get(&params.id)
            .await?
            .ok_or_else(|| A2aServerError::task_not_found(&params.id))?;

        if task.status.state.is_terminal() {
            return Err(A2aServerError::TaskNotCancelableError(
                crate::errors::Error::new(format!(
                    "Task cannot be canceled - current state: {:?}",
                    task.status.state
                )),
            ));
        }

        let mut task_manager =
            TaskManager::new(self.task_store.clone(), task.id.clone(), task.context_id.clone());
        let (queue, consumer) = EventQueue::new(self.max_queue_size);
        let request_context = RequestContext::new(
            None,
            Some(task.id.clone()),
            Some(task.context_id.clone()),
            Some(task),
        )?;

        self.agent_executor.cancel(request_context, queue).await?;

        let events = consumer.consume_all();
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            task_manager.process(&event).await?;
        }

        task_manager
            .get_task()
            .await?
            .ok_or_else(|| A2aServerError::task_not_found(&params.id))
    }

    async fn on_message_send(
        &self,
        params: MessageSendParams,
        context: &ServerCallContext,
    ) -> Result<SendMessageSuccessResponseResult, A2aServerError> {
        let (mut task_manager, consumer, producer) =
            self.setup_message_execution(params, context).await?;

        let events = consumer.consume_all();
        futures::pin_mut!(events);

        let mut result = None;
        let mut saw_final = false;
        while let Some(event) = events.next().await {
            saw_final = event.is_final();
            result = Some(match task_manager.process(&event).await? {
                Some(task) => Event::Task(task),
                None => event,
            });
        }

        if !saw_final {
            producer_outcome(producer).await?;
        }

        result.ok_or_else(|| A2aServerError::internal("Agent did not return any response"))
    }

    async fn on_message_send_stream(
        &self,
        params: MessageSendParams,
        context: &ServerCallContext,
    ) -> Result<TaskSubscriptionStream, A2aServerError> {
        let (mut task_manager, consumer, producer) =
            self.setup_message_execution(params, context).await?;

        let stream = async_stream::stream! {
            let events = consumer.consume_all();
            futures::pin_mut!(events);

            let mut saw_final = false;
            while let Some(event) = events.next().await {
                if let Err(e) = task_manager.process(&event).await {
                    warn!("Failed to persist event: {}", e);
                    yield Err(e);
                    return;
                }
                saw_final = event.is_final();
                yield Ok(event);
            }

            if saw_final {
                debug!("Stream reached a final event");
            } else if let Err(e) = producer_outcome(producer).await {
                yield Err(e);
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent_execution::BoxedFuture,
        tasks::InMemoryTaskStore,
        types::{
            Message, MessageRole, Part, TaskState, TaskStatus, TaskStatusUpdateEvent,
        },
        utils::{new_agent_text_message, new_task},
    };
    use serde_json::Map;
    use std::sync::Mutex;

    /// Echoes the user's text back and records the authorization it saw.
    #[derive(Default)]
    struct EchoExecutor {
        seen_authorization: Mutex<Option<String>>,
    }

    impl AgentExecutor for EchoExecutor {
        fn execute<'a>(&'a self, context: RequestContext, queue: EventQueue) -> BoxedFuture<'a> {
            Box::pin(async move {
                *self.seen_authorization.lock().unwrap() =
                    context.authorization().map(str::to_string);

                let message = context.message().cloned().ok_or_else(|| {
                    A2aServerError::invalid_params("missing message")
                })?;
                let task = new_task(&message)?;
                let (task_id, context_id) = (task.id.clone(), task.context_id.clone());
                queue
                    .enqueue_event(Event::Task(task))
                    .await?;

                let reply = new_agent_text_message(
                    context.get_user_input(" "),
                    Some(context_id.clone()),
                    Some(task_id.clone()),
                );
                queue
                    .enqueue_event(Event::TaskStatusUpdate(TaskStatusUpdateEvent {
                        task_id,
                        context_id,
                        status: TaskStatus {
                            state: TaskState::Completed,
                            message: Some(reply),
                            timestamp: None,
                        },
                        final_: true,
                        metadata: Map::new(),
                    }))
                    .await?;
                Ok(())
            })
        }

        fn cancel<'a>(&'a self, _context: RequestContext, _queue: EventQueue) -> BoxedFuture<'a> {
            Box::pin(async { Err(A2aServerError::unsupported("cancel not supported")) })
        }
    }

    /// Fails before publishing anything.
    struct FailingExecutor;

    impl AgentExecutor for FailingExecutor {
        fn execute<'a>(&'a self, _context: RequestContext, _queue: EventQueue) -> BoxedFuture<'a> {
            Box::pin(async { Err(A2aServerError::internal("boom")) })
        }

        fn cancel<'a>(&'a self, _context: RequestContext, _queue: EventQueue) -> BoxedFuture<'a> {
            Box::pin(async { Ok(()) })
        }
    }

    fn user_message(text: &str) -> MessageSendParams {
        MessageSendParams {
            message: Message {
                message_id: "m1".to_string(),
                context_id: None,
                task_id: None,
                role: MessageRole::User,
                parts: vec![Part::text(text)],
                reference_task_ids: vec![],
                metadata: Map::new(),
            },
            configuration: None,
            metadata: Map::new(),
        }
    }

    fn call_context(authorization: Option<&'static str>) -> ServerCallContext {
        let mut context = ServerCallContext::default();
        if let Some(value) = authorization {
            context.headers.insert(
                http::header::AUTHORIZATION,
                http::HeaderValue::from_static(value),
            );
        }
        context
    }

    #[tokio::test]
    async fn test_stream_relays_events_and_threads_authorization() {
        let executor = Arc::new(EchoExecutor::default());
        let store = Arc::new(InMemoryTaskStore::new());
        let handler = DefaultRequestHandler::new(executor.clone(), store.clone());

        let stream = handler
            .on_message_send_stream(user_message("hello"), &call_context(Some("Bearer t")))
            .await
            .unwrap();
        let events: Vec<_> = stream.collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(Event::Task(_))));
        let Ok(Event::TaskStatusUpdate(ref update)) = events[1] else {
            panic!("expected status update, got {:?}", events[1]);
        };
        assert!(update.final_);
        assert_eq!(
            executor.seen_authorization.lock().unwrap().as_deref(),
            Some("Bearer t")
        );

        let stored = store.get(&update.task_id).await.unwrap().unwrap();
        assert_eq!(stored.status.state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_message_send_returns_final_task() {
        let handler = DefaultRequestHandler::new(
            Arc::new(EchoExecutor::default()),
            Arc::new(InMemoryTaskStore::new()),
        );

        let res = handler
            .on_message_send(user_message("ping"), &call_context(None))
            .await
            .unwrap();
        let Event::Task(task) = res else {
            panic!("expected task result");
        };
        assert_eq!(task.status.state, TaskState::Completed);

        let fetched = handler
            .on_get_task(
                TaskQueryParams {
                    id: task.id.clone(),
                    history_length: Some(0),
                    metadata: Map::new(),
                },
                &call_context(None),
            )
            .await
            .unwrap();
        assert!(fetched.history.is_empty());
        assert_eq!(fetched.status, task.status);
    }

    #[tokio::test]
    async fn test_agent_error_is_surfaced() {
        let handler =
            DefaultRequestHandler::new(Arc::new(FailingExecutor), Arc::new(InMemoryTaskStore::new()));

        let stream = handler
            .on_message_send_stream(user_message("hello"), &call_context(None))
            .await
            .unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(A2aServerError::InternalError(_))));

        let res = handler
            .on_message_send(user_message("hello"), &call_context(None))
            .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_unknown_task_is_rejected() {
        let handler = DefaultRequestHandler::new(
            Arc::new(EchoExecutor::default()),
            Arc::new(InMemoryTaskStore::new()),
        );

        let mut params = user_message("hello");
        params.message.task_id = Some("missing".to_string());
        let res = handler.on_message_send_stream(params, &call_context(None)).await;
        assert!(matches!(res, Err(A2aServerError::TaskNotFoundError(_))));

        let res = handler
            .on_cancel_task(
                TaskIdParams {
                    id: "missing".to_string(),
                    metadata: Map::new(),
                },
                &call_context(None),
            )
            .await;
        assert!(matches!(res, Err(A2aServerError::TaskNotFoundError(_))));
    }

    #[tokio::test]
    async fn test_cancel_propagates_agent_refusal() {
        let executor = Arc::new(EchoExecutor::default());
        let store = Arc::new(InMemoryTaskStore::new());
        let handler = DefaultRequestHandler::new(executor, store.clone());

        let mut message = user_message("hello").message;
        message.task_id = Some("t1".to_string());
        message.context_id = Some("c1".to_string());
        let mut task = new_task(&message).unwrap();
        task.status.state = TaskState::Working;
        store.save(&task).await.unwrap();

        let res = handler
            .on_cancel_task(
                TaskIdParams {
                    id: "t1".to_string(),
                    metadata: Map::new(),
                },
                &call_context(None),
            )
            .await;
        assert!(matches!(
            res,
            Err(A2aServerError::UnsupportedOperationError(_))
        ));
    }
}

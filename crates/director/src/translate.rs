//! Turns director stream updates into A2A task events.

use a2a_rs::{
    types::{Event, TaskArtifactUpdateEvent, TaskState, TaskStatus, TaskStatusUpdateEvent},
    utils::{new_agent_text_message, new_text_artifact},
};
use futures::{Stream, StreamExt};
use serde_json::Map;

pub const RESULT_ARTIFACT_NAME: &str = "current_result";
pub const RESULT_ARTIFACT_DESCRIPTION: &str = "Result of request to agent.";

/// One progress record from the director agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    pub is_task_complete: bool,
    pub require_user_input: bool,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Working,
    InputRequired,
    Completed,
}

impl StreamUpdate {
    pub fn working(content: impl Into<String>) -> Self {
        Self {
            is_task_complete: false,
            require_user_input: false,
            content: content.into(),
        }
    }

    pub fn input_required(content: impl Into<String>) -> Self {
        Self {
            is_task_complete: false,
            require_user_input: true,
            content: content.into(),
        }
    }

    pub fn completed(content: impl Into<String>) -> Self {
        Self {
            is_task_complete: true,
            require_user_input: false,
            content: content.into(),
        }
    }

    /// A request for user input takes precedence over completion.
    pub fn state(&self) -> UpdateState {
        match (self.is_task_complete, self.require_user_input) {
            (false, false) => UpdateState::Working,
            (_, true) => UpdateState::InputRequired,
            (true, false) => UpdateState::Completed,
        }
    }
}

fn status_update(
    task_id: &str,
    context_id: &str,
    state: TaskState,
    content: Option<&str>,
    final_: bool,
) -> Event {
    Event::TaskStatusUpdate(TaskStatusUpdateEvent {
        task_id: task_id.to_string(),
        context_id: context_id.to_string(),
        status: TaskStatus {
            state,
            message: content.map(|text| {
                new_agent_text_message(
                    text,
                    Some(context_id.to_string()),
                    Some(task_id.to_string()),
                )
            }),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        },
        final_,
        metadata: Map::new(),
    })
}

/// The protocol events for a single update, in emission order.
pub fn events_for_update(update: &StreamUpdate, task_id: &str, context_id: &str) -> Vec<Event> {
    match update.state() {
        UpdateState::Working => vec![status_update(
            task_id,
            context_id,
            TaskState::Working,
            Some(&update.content),
            false,
        )],
        UpdateState::InputRequired => vec![status_update(
            task_id,
            context_id,
            TaskState::InputRequired,
            Some(&update.content),
            true,
        )],
        UpdateState::Completed => vec![
            Event::TaskArtifactUpdate(TaskArtifactUpdateEvent {
                task_id: task_id.to_string(),
                context_id: context_id.to_string(),
                artifact: new_text_artifact(
                    RESULT_ARTIFACT_NAME,
                    RESULT_ARTIFACT_DESCRIPTION,
                    update.content.clone(),
                ),
                append: Some(false),
                last_chunk: Some(true),
                metadata: Map::new(),
            }),
            status_update(task_id, context_id, TaskState::Completed, None, true),
        ],
    }
}

/// Translates a stream of updates, stopping after the first terminal one.
pub fn translate<S>(
    updates: S,
    task_id: String,
    context_id: String,
) -> impl Stream<Item = Event> + Send
where
    S: Stream<Item = StreamUpdate> + Send,
{
    async_stream::stream! {
        futures::pin_mut!(updates);
        while let Some(update) = updates.next().await {
            let terminal = update.state() != UpdateState::Working;
            for event in events_for_update(&update, &task_id, &context_id) {
                yield event;
            }
            if terminal {
                break;
            }
        }
    }
}

//! Constructors for the protocol objects agents emit most often.

use serde_json::Map;
use uuid::Uuid;

use crate::{
    errors::A2aServerError,
    types::{Artifact, Message, MessageRole, Part, Task, TaskState, TaskStatus},
};

/// Creates a new `submitted` task for an incoming user message.
///
/// The message must already carry its task and context ids (the request
/// context fills them in); the message becomes the first history entry.
pub fn new_task(request: &Message) -> Result<Task, A2aServerError> {
    let id = request
        .task_id
        .clone()
        .ok_or_else(|| A2aServerError::invalid_params("message has no task id"))?;
    let context_id = request
        .context_id
        .clone()
        .ok_or_else(|| A2aServerError::invalid_params("message has no context id"))?;
    if request.parts.is_empty() {
        return Err(A2aServerError::invalid_params("message parts cannot be empty"));
    }

    Ok(Task {
        id,
        context_id,
        status: TaskStatus {
            state: TaskState::Submitted,
            message: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        },
        artifacts: vec![],
        history: vec![request.clone()],
        metadata: Map::new(),
    })
}

/// Creates an agent-role message with a single text part.
pub fn new_agent_text_message(
    text: impl Into<String>,
    context_id: Option<String>,
    task_id: Option<String>,
) -> Message {
    Message {
        message_id: Uuid::new_v4().to_string(),
        context_id,
        task_id,
        role: MessageRole::Agent,
        parts: vec![Part::text(text)],
        reference_task_ids: vec![],
        metadata: Map::new(),
    }
}

/// Creates a user-role message with a single text part.
pub fn new_user_text_message(text: impl Into<String>) -> Message {
    Message {
        message_id: Uuid::new_v4().simple().to_string(),
        context_id: None,
        task_id: None,
        role: MessageRole::User,
        parts: vec![Part::text(text)],
        reference_task_ids: vec![],
        metadata: Map::new(),
    }
}

/// Creates a named text artifact with a fresh id.
pub fn new_text_artifact(
    name: impl Into<String>,
    description: impl Into<String>,
    text: impl Into<String>,
) -> Artifact {
    Artifact {
        artifact_id: Uuid::new_v4().to_string(),
        name: Some(name.into()),
        description: Some(description.into()),
        parts: vec![Part::text(text)],
        metadata: Map::new(),
    }
}

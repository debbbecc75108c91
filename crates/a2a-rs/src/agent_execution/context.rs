use uuid::Uuid;

use crate::{
    errors::A2aServerError,
    types::{Message, MessageSendParams, Part, Task},
};

/// Request Context.
///
/// Holds what the server knows about the request being processed: the
/// incoming message, task and context identifiers, the current task and the
/// caller's authorization header, which agents forward to downstream calls.
#[derive(Debug, Clone)]
pub struct RequestContext {
    params: Option<MessageSendParams>,
    task_id: Option<String>,
    context_id: Option<String>,
    current_task: Option<Task>,
    authorization: Option<String>,
}

impl RequestContext {
    /// Initializes the RequestContext.
    ///
    /// Missing task and context ids are taken from the message or generated,
    /// and written back into the message. A supplied task must agree with them.
    pub fn new(
        request: Option<MessageSendParams>,
        task_id: Option<String>,
        context_id: Option<String>,
        task: Option<Task>,
    ) -> Result<Self, A2aServerError> {
        let mut context = Self {
            params: request,
            task_id,
            context_id,
            current_task: task,
            authorization: None,
        };

        if context.task_id.is_none() {
            context.check_or_generate_task_id();
        }
        if context.context_id.is_none() {
            context.check_or_generate_context_id();
        }

        if let Some(ref mut params) = context.params {
            if let Some(ref task_id) = context.task_id {
                params.message.task_id = Some(task_id.clone());
                if let Some(ref task) = context.current_task
                    && &task.id != task_id
                {
                    return Err(A2aServerError::invalid_params("bad task id"));
                }
            }

            if let Some(ref context_id) = context.context_id {
                params.message.context_id = Some(context_id.clone());
                if let Some(ref task) = context.current_task
                    && &task.context_id != context_id
                {
                    return Err(A2aServerError::invalid_params("bad context id"));
                }
            }
        }

        Ok(context)
    }

    /// Attaches the caller's `Authorization` header value.
    pub fn with_authorization(mut self, authorization: Option<String>) -> Self {
        self.authorization = authorization;
        self
    }

    /// Extracts text content from the user's message parts.
    pub fn get_user_input(&self, delimiter: &str) -> String {
        match self.params {
            Some(ref params) => get_message_text(&params.message, delimiter),
            None => String::new(),
        }
    }

    /// The incoming `Message` object from the request, if available.
    pub fn message(&self) -> Option<&Message> {
        self.params.as_ref().map(|p| &p.message)
    }

    /// The current `Task` object being processed.
    pub fn current_task(&self) -> Option<&Task> {
        self.current_task.as_ref()
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn context_id(&self) -> Option<&str> {
        self.context_id.as_deref()
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    fn check_or_generate_task_id(&mut self) {
        if let Some(ref mut params) = self.params {
            let task_id = params
                .message
                .task_id
                .get_or_insert_with(|| Uuid::new_v4().to_string());
            self.task_id = Some(task_id.clone());
        }
    }

    fn check_or_generate_context_id(&mut self) {
        if let Some(ref mut params) = self.params {
            let context_id = params
                .message
                .context_id
                .get_or_insert_with(|| Uuid::new_v4().to_string());
            self.context_id = Some(context_id.clone());
        }
    }
}

/// Extracts text content from a message by concatenating its text parts.
pub fn get_message_text(message: &Message, delimiter: &str) -> String {
    message
        .parts
        .iter()
        .filter_map(|part| match part {
            Part::TextPart(text_part) => Some(text_part.text.as_str()),
            _ => None,
        })
        .collect::<Vec<&str>>()
        .join(delimiter)
}

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Serialize, Serializer};
use thiserror::Error;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Default, Serialize)]
pub struct Error {
    pub message: String,
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing)]
    pub source: Option<DynError>,
}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<DynError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum A2aServerError {
    #[error("JSON parse error: {}", .0.message)]
    JsonParseError(Error),
    #[error("Invalid request: {}", .0.message)]
    InvalidRequest(Error),
    #[error("Method not found: {}", .0.message)]
    MethodNotFoundError(Error),
    #[error("Invalid params: {}", .0.message)]
    InvalidParamsError(Error),
    #[error("Internal error: {}", .0.message)]
    InternalError(Error),
    #[error("Task not found: {}", .0.message)]
    TaskNotFoundError(Error),
    #[error("Task not cancelable: {}", .0.message)]
    TaskNotCancelableError(Error),
    #[error("Push notification not supported: {}", .0.message)]
    PushNotificationNotSupportedError(Error),
    #[error("Unsupported operation: {}", .0.message)]
    UnsupportedOperationError(Error),
    #[error("Content type not supported: {}", .0.message)]
    ContentTypeNotSupportedError(Error),
    #[error("Invalid agent response: {}", .0.message)]
    InvalidAgentResponseError(Error),
}

impl A2aServerError {
    pub fn internal(message: impl Into<String>) -> Self {
        A2aServerError::InternalError(Error::new(message))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        A2aServerError::InvalidParamsError(Error::new(message))
    }

    pub fn method_not_found(method: &str) -> Self {
        A2aServerError::MethodNotFoundError(Error::new(format!("Method not found: {method}")))
    }

    pub fn task_not_found(task_id: &str) -> Self {
        A2aServerError::TaskNotFoundError(Error::new(format!("Task {task_id} not found")))
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        A2aServerError::UnsupportedOperationError(Error::new(message))
    }

    fn inner(&self) -> &Error {
        match self {
            A2aServerError::JsonParseError(err)
            | A2aServerError::InvalidRequest(err)
            | A2aServerError::MethodNotFoundError(err)
            | A2aServerError::InvalidParamsError(err)
            | A2aServerError::InternalError(err)
            | A2aServerError::TaskNotFoundError(err)
            | A2aServerError::TaskNotCancelableError(err)
            | A2aServerError::PushNotificationNotSupportedError(err)
            | A2aServerError::UnsupportedOperationError(err)
            | A2aServerError::ContentTypeNotSupportedError(err)
            | A2aServerError::InvalidAgentResponseError(err) => err,
        }
    }

    pub fn json_rpc_code(&self) -> i32 {
        match self {
            A2aServerError::JsonParseError(_) => -32700,
            A2aServerError::InvalidRequest(_) => -32600,
            A2aServerError::MethodNotFoundError(_) => -32601,
            A2aServerError::InvalidParamsError(_) => -32602,
            A2aServerError::InternalError(_) => -32603,
            A2aServerError::TaskNotFoundError(_) => -32001,
            A2aServerError::TaskNotCancelableError(_) => -32002,
            A2aServerError::PushNotificationNotSupportedError(_) => -32003,
            A2aServerError::UnsupportedOperationError(_) => -32004,
            A2aServerError::ContentTypeNotSupportedError(_) => -32005,
            A2aServerError::InvalidAgentResponseError(_) => -32006,
        }
    }

    pub fn message(&self) -> String {
        self.inner().message.clone()
    }

    pub fn data(&self) -> Option<serde_json::Value> {
        self.inner().data.clone()
    }
}

impl Serialize for A2aServerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.inner().serialize(serializer)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    name: String,
    message: String,
}

impl IntoResponse for A2aServerError {
    fn into_response(self) -> Response {
        let status = match self {
            A2aServerError::JsonParseError(_)
            | A2aServerError::InvalidRequest(_)
            | A2aServerError::InvalidParamsError(_) => http::StatusCode::BAD_REQUEST,
            A2aServerError::MethodNotFoundError(_) | A2aServerError::TaskNotFoundError(_) => {
                http::StatusCode::NOT_FOUND
            }
            _ => http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                name: "A2aServerError".into(),
                message: self.message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_follow_jsonrpc() {
        assert_eq!(A2aServerError::internal("x").json_rpc_code(), -32603);
        assert_eq!(A2aServerError::method_not_found("x").json_rpc_code(), -32601);
        assert_eq!(A2aServerError::unsupported("x").json_rpc_code(), -32004);
        assert_eq!(A2aServerError::task_not_found("t").json_rpc_code(), -32001);
    }

    #[test]
    fn test_display_includes_message() {
        let err = A2aServerError::unsupported("cancel not supported");
        assert_eq!(err.to_string(), "Unsupported operation: cancel not supported");
        assert_eq!(err.message(), "cancel not supported");
    }
}

//! A2A Protocol Types
//!
//! Wire types for the subset of the agent-to-agent protocol this workspace speaks:
//! messages, tasks, task events, agent cards and the JSON-RPC envelope.

use axum::{Json, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{PartialSchema, ToSchema};

use crate::errors::A2aServerError;

pub type TaskId = String;
pub type ContextId = String;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    AuthRequired,
    Unknown,
}

impl TaskState {
    /// States after which the task accepts no further work.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed | TaskState::Rejected
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TextPart {
    pub text: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DataPart {
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind")]
pub enum Part {
    #[serde(rename = "text")]
    TextPart(TextPart),
    #[serde(rename = "data")]
    DataPart(DataPart),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::TextPart(TextPart {
            text: text.into(),
            metadata: Map::new(),
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ContextId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub role: MessageRole,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_task_ids: Vec<TaskId>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub context_id: ContextId,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    pub task_id: TaskId,
    pub context_id: ContextId,
    pub status: TaskStatus,
    #[serde(rename = "final")]
    pub final_: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    pub task_id: TaskId,
    pub context_id: ContextId,
    pub artifact: Artifact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_chunk: Option<bool>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_output_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_length: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendParams {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<MessageSendConfiguration>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdParams {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_transition_history: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_modes: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub protocol_version: String,
    pub preferred_transport: String,
    pub capabilities: AgentCapabilities,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    pub skills: Vec<AgentSkill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

impl ToSchema for AgentCard {}

impl PartialSchema for AgentCard {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        utoipa::openapi::RefOr::T(utoipa::openapi::Schema::Object(
            utoipa::openapi::ObjectBuilder::new().build(),
        ))
    }
}

/// Anything the agent side can put on a task's event stream.
///
/// Serialized with the protocol's `kind` discriminator so it doubles as the
/// result payload of `message/stream` and `message/send`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind")]
pub enum Event {
    #[serde(rename = "message")]
    Message(Message),
    #[serde(rename = "task")]
    Task(Task),
    #[serde(rename = "status-update")]
    TaskStatusUpdate(TaskStatusUpdateEvent),
    #[serde(rename = "artifact-update")]
    TaskArtifactUpdate(TaskArtifactUpdateEvent),
}

impl Event {
    /// Whether the event ends the stream for the current request.
    pub fn is_final(&self) -> bool {
        match self {
            Event::TaskStatusUpdate(update) => update.final_,
            Event::Message(_) => true,
            Event::Task(task) => {
                task.status.state.is_terminal() || task.status.state == TaskState::InputRequired
            }
            Event::TaskArtifactUpdate(_) => false,
        }
    }
}

pub type SendStreamingMessageSuccessResponseResult = Event;
pub type SendMessageSuccessResponseResult = Event;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum JsonrpcRequestId {
    String(String),
    Integer(i64),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JsonrpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<JsonrpcRequestId>,
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ToSchema for JsonrpcRequest {}

impl PartialSchema for JsonrpcRequest {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        utoipa::openapi::RefOr::T(utoipa::openapi::Schema::Object(
            utoipa::openapi::ObjectBuilder::new().build(),
        ))
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
pub struct CustomJsonrpcError {
    ///A Number that indicates the error type that occurred.
    pub code: i32,
    ///Additional information about the error. May be omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    ///A short description of the error.
    pub message: String,
}

impl From<A2aServerError> for CustomJsonrpcError {
    fn from(value: A2aServerError) -> Self {
        CustomJsonrpcError {
            code: value.json_rpc_code(),
            data: value.data(),
            message: value.message(),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub enum CustomJsonRpcPayload<Data> {
    #[serde(rename = "error")]
    Err(CustomJsonrpcError),
    #[serde(rename = "result")]
    Ok(Data),
}

#[derive(Serialize, Clone, Debug)]
pub struct CustomJsonrpcResponse<Data> {
    pub id: Option<JsonrpcRequestId>,
    ///Always exactly "2.0".
    pub jsonrpc: String,
    #[serde(flatten)]
    pub data: CustomJsonRpcPayload<Data>,
}

impl<Data> CustomJsonrpcResponse<Data> {
    pub fn new_err(id: Option<JsonrpcRequestId>, error: CustomJsonrpcError) -> Self {
        Self::new(id, CustomJsonRpcPayload::Err(error))
    }

    pub fn new_ok(id: Option<JsonrpcRequestId>, data: Data) -> Self {
        Self::new(id, CustomJsonRpcPayload::Ok(data))
    }

    pub fn new(id: Option<JsonrpcRequestId>, data: CustomJsonRpcPayload<Data>) -> Self {
        CustomJsonrpcResponse {
            id,
            jsonrpc: "2.0".to_string(),
            data,
        }
    }
}

impl<Result: Serialize> IntoResponse for CustomJsonrpcResponse<Result> {
    fn into_response(self) -> axum::response::Response {
        (http::StatusCode::OK, Json(self)).into_response()
    }
}

impl<Data> From<Result<Data, A2aServerError>> for CustomJsonRpcPayload<Data> {
    fn from(result: Result<Data, A2aServerError>) -> Self {
        match result {
            Ok(data) => CustomJsonRpcPayload::Ok(data),
            Err(err) => CustomJsonRpcPayload::Err(err.into()),
        }
    }
}

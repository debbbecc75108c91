use async_trait::async_trait;

use crate::{
    errors::A2aServerError,
    types::{Task, TaskId},
};

/// Where the request handler keeps tasks between protocol calls.
///
/// `save` replaces any stored task with the same id.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn save(&self, task: &Task) -> Result<(), A2aServerError>;

    async fn get(&self, id: &TaskId) -> Result<Option<Task>, A2aServerError>;
}

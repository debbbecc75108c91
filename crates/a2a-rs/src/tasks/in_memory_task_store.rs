use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    errors::A2aServerError,
    tasks::store::TaskStore,
    types::{Task, TaskId},
};

/// In-memory implementation of TaskStore.
///
/// Task data is lost when the server process stops.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, task: &Task) -> Result<(), A2aServerError> {
        self.tasks.write().await.insert(task.id.clone(), task.clone());
        debug!("Task {} saved successfully.", task.id);
        Ok(())
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>, A2aServerError> {
        let task = self.tasks.read().await.get(id).cloned();
        match &task {
            Some(_) => debug!("Task {} retrieved successfully.", id),
            None => debug!("Task {} not found.", id),
        }
        Ok(task)
    }
}

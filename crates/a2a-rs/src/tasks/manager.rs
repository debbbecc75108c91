use std::sync::Arc;

use serde_json::Map;
use tracing::debug;

use crate::{
    errors::A2aServerError,
    tasks::store::TaskStore,
    types::{
        ContextId, Event, Task, TaskArtifactUpdateEvent, TaskId, TaskState, TaskStatus,
        TaskStatusUpdateEvent,
    },
};

/// Helps manage a task's lifecycle during execution of a request.
///
/// Folds the events an agent publishes into the stored `Task`, so that
/// `tasks/get` and `message/send` observe the latest state.
#[derive(Clone)]
pub struct TaskManager {
    task_store: Arc<dyn TaskStore>,
    task_id: TaskId,
    context_id: ContextId,
    current_task: Option<Task>,
}

impl TaskManager {
    pub fn new(task_store: Arc<dyn TaskStore>, task_id: TaskId, context_id: ContextId) -> Self {
        Self {
            task_store,
            task_id,
            context_id,
            current_task: None,
        }
    }

    /// The task as last saved by this manager, or as found in the store.
    pub async fn get_task(&mut self) -> Result<Option<Task>, A2aServerError> {
        if self.current_task.is_none() {
            self.current_task = self.task_store.get(&self.task_id).await?;
        }
        Ok(self.current_task.clone())
    }

    /// Applies one agent event to the stored task.
    ///
    /// Returns the updated task, or `None` for events that do not describe a
    /// task (plain messages).
    pub async fn process(&mut self, event: &Event) -> Result<Option<Task>, A2aServerError> {
        match event {
            Event::Task(task) => {
                self.check_ids(&task.id, &task.context_id)?;
                self.save(task.clone()).await.map(Some)
            }
            Event::TaskStatusUpdate(update) => self.apply_status_update(update).await.map(Some),
            Event::TaskArtifactUpdate(update) => {
                self.apply_artifact_update(update).await.map(Some)
            }
            Event::Message(_) => Ok(None),
        }
    }

    async fn apply_status_update(
        &mut self,
        event: &TaskStatusUpdateEvent,
    ) -> Result<Task, A2aServerError> {
        self.check_ids(&event.task_id, &event.context_id)?;

        let mut task = match self.get_task().await? {
            Some(task) => task,
            None => {
                debug!("Creating new task {} from TaskStatusUpdate event", self.task_id);
                Task {
                    id: self.task_id.clone(),
                    context_id: self.context_id.clone(),
                    status: TaskStatus {
                        state: TaskState::Submitted,
                        message: None,
                        timestamp: None,
                    },
                    artifacts: vec![],
                    history: vec![],
                    metadata: Map::new(),
                }
            }
        };

        if let Some(message) = task.status.message.take() {
            task.history.push(message);
        }
        task.status = event.status.clone();
        self.save(task).await
    }

    async fn apply_artifact_update(
        &mut self,
        event: &TaskArtifactUpdateEvent,
    ) -> Result<Task, A2aServerError> {
        self.check_ids(&event.task_id, &event.context_id)?;

        let mut task = self.get_task().await?.ok_or_else(|| {
            A2aServerError::internal("Task not found when processing artifact update")
        })?;

        let artifact = event.artifact.clone();
        match task
            .artifacts
            .iter_mut()
            .find(|a| a.artifact_id == artifact.artifact_id)
        {
            Some(existing) if event.append == Some(true) => {
                existing.parts.extend(artifact.parts);
            }
            Some(existing) => *existing = artifact,
            None => task.artifacts.push(artifact),
        }

        self.save(task).await
    }

    async fn save(&mut self, task: Task) -> Result<Task, A2aServerError> {
        debug!(
            "Saving task with id: {}, context_id: {}",
            task.id, task.context_id
        );
        self.task_store.save(&task).await?;
        self.current_task = Some(task.clone());
        Ok(task)
    }

    fn check_ids(&self, task_id: &str, context_id: &str) -> Result<(), A2aServerError> {
        if task_id != self.task_id {
            return Err(A2aServerError::internal(
                "Task manager task ID does not match event Task ID",
            ));
        }
        if context_id != self.context_id {
            return Err(A2aServerError::internal(
                "Task manager context ID does not match event context ID",
            ));
        }
        Ok(())
    }
}

use std::sync::Arc;

use storage::repository::{NewTaskRecord, StorageError, TaskRepository};
use taskboard_core::model::{ProjectId, Task, TaskId};

use crate::error::TaskServiceError;

/// Task CRUD, always addressed through the owning project.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
}

impl TaskService {
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }

    /// # Errors
    ///
    /// Returns `TaskServiceError::Storage` if the project is missing or
    /// repository access fails.
    pub async fn list_tasks(&self, project_id: ProjectId) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = self.tasks.list_tasks(project_id).await?;
        Ok(tasks)
    }

    /// Append a new, not yet completed task to a project.
    ///
    /// # Errors
    ///
    /// Returns `TaskServiceError::Task` for validation failures.
    /// Returns `TaskServiceError::Storage` if the project is missing or
    /// persistence fails.
    pub async fn create_task(
        &self,
        project_id: ProjectId,
        title: String,
        description: Option<String>,
    ) -> Result<Task, TaskServiceError> {
        let draft = Task::new(TaskId::new(0), title, description)?;
        let id = self
            .tasks
            .insert_new_task(project_id, NewTaskRecord::from_task(&draft))
            .await?;
        tracing::info!(project_id = %project_id, task_id = %id, "task created");

        let task = Task::new(id, draft.title(), draft.description().map(str::to_owned))?;
        Ok(task)
    }

    /// Returns `Ok(None)` when the task is not part of the project.
    ///
    /// # Errors
    ///
    /// Returns `TaskServiceError::Storage` if repository access fails.
    pub async fn get_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<Option<Task>, TaskServiceError> {
        let task = self.tasks.get_task(project_id, task_id).await?;
        Ok(task)
    }

    /// Replace title and description, keeping the completion flag.
    ///
    /// # Errors
    ///
    /// Returns `TaskServiceError::Task` if validation fails.
    /// Returns `TaskServiceError::Storage` if the task is missing or
    /// repository access fails.
    pub async fn update_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        title: String,
        description: Option<String>,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self.require(project_id, task_id).await?;
        task.edit(title, description)?;
        self.tasks.update_task(project_id, &task).await?;
        tracing::info!(project_id = %project_id, task_id = %task_id, "task updated");
        Ok(task)
    }

    /// Flip the completion flag of exactly one task.
    ///
    /// # Errors
    ///
    /// Returns `TaskServiceError::Storage` if the task is missing or
    /// repository access fails.
    pub async fn toggle_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self.require(project_id, task_id).await?;
        let completed = task.toggle();
        self.tasks.update_task(project_id, &task).await?;
        tracing::debug!(project_id = %project_id, task_id = %task_id, completed, "task toggled");
        Ok(task)
    }

    /// Set the completion flag to a known value. Used when replaying a
    /// toggle whose outcome is already decided.
    ///
    /// # Errors
    ///
    /// Returns `TaskServiceError::Storage` if the task is missing or
    /// repository access fails.
    pub async fn set_task_completed(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        completed: bool,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self.require(project_id, task_id).await?;
        if task.is_completed() != completed {
            task.set_completed(completed);
            self.tasks.update_task(project_id, &task).await?;
        }
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `TaskServiceError::Storage` if the task is missing or
    /// repository access fails.
    pub async fn delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<(), TaskServiceError> {
        self.tasks.delete_task(project_id, task_id).await?;
        tracing::info!(project_id = %project_id, task_id = %task_id, "task deleted");
        Ok(())
    }

    async fn require(&self, project_id: ProjectId, task_id: TaskId) -> Result<Task, TaskServiceError> {
        let task = self
            .tasks
            .get_task(project_id, task_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::{InMemoryRepository, NewProjectRecord, ProjectRepository};
    use taskboard_core::time::fixed_now;

    async fn seeded() -> (TaskService, ProjectId) {
        let repo = InMemoryRepository::new();
        let project_id = repo
            .insert_new_project(NewProjectRecord {
                title: "P".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        (TaskService::new(Arc::new(repo)), project_id)
    }

    #[tokio::test]
    async fn new_tasks_start_open() {
        let (service, pid) = seeded().await;
        let task = service
            .create_task(pid, "Write".into(), Some("draft".into()))
            .await
            .unwrap();
        assert!(!task.is_completed());
        assert_eq!(task.description(), Some("draft"));
        assert_eq!(service.list_tasks(pid).await.unwrap(), vec![task]);
    }

    #[tokio::test]
    async fn toggle_flips_only_the_addressed_task() {
        let (service, pid) = seeded().await;
        let a = service.create_task(pid, "A".into(), None).await.unwrap();
        let b = service.create_task(pid, "B".into(), None).await.unwrap();

        let toggled = service.toggle_task(pid, a.id()).await.unwrap();
        assert!(toggled.is_completed());

        let tasks = service.list_tasks(pid).await.unwrap();
        assert!(tasks[0].is_completed());
        assert!(!tasks[1].is_completed());
        assert_eq!(tasks[1].id(), b.id());

        let back = service.toggle_task(pid, a.id()).await.unwrap();
        assert!(!back.is_completed());
    }

    #[tokio::test]
    async fn set_completed_is_idempotent() {
        let (service, pid) = seeded().await;
        let a = service.create_task(pid, "A".into(), None).await.unwrap();
        service.set_task_completed(pid, a.id(), true).await.unwrap();
        let again = service.set_task_completed(pid, a.id(), true).await.unwrap();
        assert!(again.is_completed());
    }

    #[tokio::test]
    async fn task_under_wrong_project_is_not_found() {
        let (service, pid) = seeded().await;
        let a = service.create_task(pid, "A".into(), None).await.unwrap();
        let other = ProjectId::new(pid.value() + 1);

        assert!(service.get_task(other, a.id()).await.unwrap().is_none());
        assert!(service.toggle_task(other, a.id()).await.unwrap_err().is_not_found());
        assert!(service.delete_task(other, a.id()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn edit_keeps_completion() {
        let (service, pid) = seeded().await;
        let a = service.create_task(pid, "A".into(), None).await.unwrap();
        service.toggle_task(pid, a.id()).await.unwrap();

        let edited = service
            .update_task(pid, a.id(), "A2".into(), None)
            .await
            .unwrap();
        assert_eq!(edited.title(), "A2");
        assert!(edited.is_completed());

        let err = service
            .update_task(pid, a.id(), String::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskServiceError::Task(_)));
    }
}

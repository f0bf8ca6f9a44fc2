use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use taskboard_core::model::{Project, ProjectId, Task, TaskId, Theme};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a project whose id the backend assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProjectRecord {
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewProjectRecord {
    #[must_use]
    pub fn from_project(project: &Project) -> Self {
        Self {
            title: project.title().to_owned(),
            description: project.description().map(str::to_owned),
            created_at: project.created_at(),
        }
    }
}

/// Insert shape for a task whose id the backend assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskRecord {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl NewTaskRecord {
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title().to_owned(),
            description: task.description().map(str::to_owned),
            completed: task.is_completed(),
        }
    }
}

/// Repository contract for projects. A project owns its tasks: reads return
/// them (or server-tracked counters) and deletes cascade.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a project and return the id the backend assigned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the project cannot be stored.
    async fn insert_new_project(&self, project: NewProjectRecord)
    -> Result<ProjectId, StorageError>;

    /// Fetch a project with its full task list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. A missing project is `Ok(None)`.
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError>;

    /// List every project in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_projects(&self) -> Result<Vec<Project>, StorageError>;

    /// Persist a project's title and description. Tasks are not touched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the project does not exist.
    async fn update_project(&self, project: &Project) -> Result<(), StorageError>;

    /// Delete a project and all of its tasks as one operation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the project does not exist.
    async fn delete_project(&self, id: ProjectId) -> Result<(), StorageError>;
}

/// Repository contract for tasks, always addressed through their project.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Append a task to a project and return its new id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the project does not exist.
    async fn insert_new_task(
        &self,
        project_id: ProjectId,
        task: NewTaskRecord,
    ) -> Result<TaskId, StorageError>;

    /// List a project's tasks in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the project does not exist.
    async fn list_tasks(&self, project_id: ProjectId) -> Result<Vec<Task>, StorageError>;

    /// Fetch one task. A task that exists under another project is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<Option<Task>, StorageError>;

    /// Persist title, description and completion flag of an existing task.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the task is not in the project.
    async fn update_task(&self, project_id: ProjectId, task: &Task) -> Result<(), StorageError>;

    /// Delete one task.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the task is not in the project.
    async fn delete_task(&self, project_id: ProjectId, task_id: TaskId)
    -> Result<(), StorageError>;
}

/// Persisted UI preferences.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Read the stored theme, `None` if never set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or an unreadable value.
    async fn get_theme(&self) -> Result<Option<Theme>, StorageError>;

    /// Store the theme.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError>;
}

#[derive(Default)]
struct MemoryState {
    last_project_id: u64,
    last_task_id: u64,
    projects: BTreeMap<ProjectId, Project>,
    theme: Option<Theme>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// All state sits behind one lock, so a cascading delete is atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn rebuild_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn insert_new_project(
        &self,
        project: NewProjectRecord,
    ) -> Result<ProjectId, StorageError> {
        let mut guard = self.lock()?;
        let id = ProjectId::new(guard.last_project_id + 1);
        let project = Project::new(id, project.title, project.description, project.created_at)
            .map_err(rebuild_err)?;
        guard.last_project_id = id.value();
        guard.projects.insert(id, project);
        Ok(id)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.projects.get(&id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.projects.values().cloned().collect())
    }

    async fn update_project(&self, project: &Project) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let stored = guard
            .projects
            .get_mut(&project.id())
            .ok_or(StorageError::NotFound)?;
        stored
            .edit(
                project.title(),
                project.description().map(str::to_owned),
            )
            .map_err(rebuild_err)
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .projects
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl TaskRepository for InMemoryRepository {
    async fn insert_new_task(
        &self,
        project_id: ProjectId,
        task: NewTaskRecord,
    ) -> Result<TaskId, StorageError> {
        let mut guard = self.lock()?;
        let id = TaskId::new(guard.last_task_id + 1);
        let task = Task::from_persisted(id, task.title, task.description, task.completed)
            .map_err(rebuild_err)?;
        let project = guard
            .projects
            .get_mut(&project_id)
            .ok_or(StorageError::NotFound)?;
        project.add_task(task).map_err(|_| StorageError::Conflict)?;
        guard.last_task_id = id.value();
        Ok(id)
    }

    async fn list_tasks(&self, project_id: ProjectId) -> Result<Vec<Task>, StorageError> {
        let guard = self.lock()?;
        guard
            .projects
            .get(&project_id)
            .map(|p| p.tasks().to_vec())
            .ok_or(StorageError::NotFound)
    }

    async fn get_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<Option<Task>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .projects
            .get(&project_id)
            .and_then(|p| p.task(task_id))
            .cloned())
    }

    async fn update_task(&self, project_id: ProjectId, task: &Task) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let project = guard
            .projects
            .get_mut(&project_id)
            .ok_or(StorageError::NotFound)?;
        project
            .replace_task(task.clone())
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let project = guard
            .projects
            .get_mut(&project_id)
            .ok_or(StorageError::NotFound)?;
        project
            .remove_task(task_id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryRepository {
    async fn get_theme(&self) -> Result<Option<Theme>, StorageError> {
        Ok(self.lock()?.theme)
    }

    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.lock()?.theme = Some(theme);
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub projects: Arc<dyn ProjectRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub preferences: Arc<dyn PreferencesRepository>,
}

impl Storage {
    /// Wire one repository value into all three roles.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: ProjectRepository + TaskRepository + PreferencesRepository + Clone + 'static,
    {
        let projects: Arc<dyn ProjectRepository> = Arc::new(repo.clone());
        let tasks: Arc<dyn TaskRepository> = Arc::new(repo.clone());
        let preferences: Arc<dyn PreferencesRepository> = Arc::new(repo);
        Self {
            projects,
            tasks,
            preferences,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::time::fixed_now;

    fn new_project(title: &str) -> NewProjectRecord {
        NewProjectRecord {
            title: title.to_owned(),
            description: None,
            created_at: fixed_now(),
        }
    }

    fn new_task(title: &str) -> NewTaskRecord {
        NewTaskRecord {
            title: title.to_owned(),
            description: None,
            completed: false,
        }
    }

    #[tokio::test]
    async fn assigns_sequential_ids() {
        let repo = InMemoryRepository::new();
        let a = repo.insert_new_project(new_project("A")).await.unwrap();
        let b = repo.insert_new_project(new_project("B")).await.unwrap();
        assert_eq!(a, ProjectId::new(1));
        assert_eq!(b, ProjectId::new(2));

        let listed = repo.list_projects().await.unwrap();
        let titles: Vec<&str> = listed.iter().map(Project::title).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[tokio::test]
    async fn delete_project_cascades_tasks() {
        let repo = InMemoryRepository::new();
        let pid = repo.insert_new_project(new_project("A")).await.unwrap();
        let tid = repo.insert_new_task(pid, new_task("t")).await.unwrap();

        repo.delete_project(pid).await.unwrap();

        assert!(repo.get_project(pid).await.unwrap().is_none());
        assert!(repo.get_task(pid, tid).await.unwrap().is_none());
        assert!(matches!(
            repo.list_tasks(pid).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.delete_project(pid).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn task_under_wrong_project_is_not_found() {
        let repo = InMemoryRepository::new();
        let a = repo.insert_new_project(new_project("A")).await.unwrap();
        let b = repo.insert_new_project(new_project("B")).await.unwrap();
        let tid = repo.insert_new_task(a, new_task("t")).await.unwrap();

        assert!(repo.get_task(b, tid).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_task(b, tid).await,
            Err(StorageError::NotFound)
        ));
        assert!(repo.get_task(a, tid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_task_persists_completion() {
        let repo = InMemoryRepository::new();
        let pid = repo.insert_new_project(new_project("A")).await.unwrap();
        let tid = repo.insert_new_task(pid, new_task("t")).await.unwrap();

        let mut task = repo.get_task(pid, tid).await.unwrap().unwrap();
        task.toggle();
        repo.update_task(pid, &task).await.unwrap();

        let project = repo.get_project(pid).await.unwrap().unwrap();
        assert_eq!(project.progress(), 100);
    }

    #[tokio::test]
    async fn theme_defaults_to_unset() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get_theme().await.unwrap(), None);
        repo.save_theme(Theme::Dark).await.unwrap();
        assert_eq!(repo.get_theme().await.unwrap(), Some(Theme::Dark));
    }
}

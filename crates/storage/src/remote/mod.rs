//! REST backend for the project/task API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use taskboard_core::model::{Project, ProjectId, Task, TaskId};

use crate::repository::{
    NewProjectRecord, NewTaskRecord, PreferencesRepository, ProjectRepository, Storage,
    StorageError, TaskRepository,
};

mod config;
mod dto;

pub use config::{API_TOKEN_ENV, API_URL_ENV, RemoteConfig, RemoteConfigError};
use dto::{ProjectBody, ProjectDto, TaskBody, TaskDto};

/// Maps a non-success HTTP status onto the storage taxonomy.
#[must_use]
pub fn status_error(status: StatusCode) -> StorageError {
    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::CONFLICT => StorageError::Conflict,
        other => StorageError::Connection(format!("unexpected status {other}")),
    }
}

fn transport(e: reqwest::Error) -> StorageError {
    if e.is_decode() {
        StorageError::Serialization(e.to_string())
    } else {
        StorageError::Connection(e.to_string())
    }
}

#[derive(Clone)]
pub struct RestRepository {
    client: Client,
    config: RemoteConfig,
}

impl RestRepository {
    #[must_use]
    pub fn new(config: RemoteConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    #[must_use]
    pub fn with_client(client: Client, config: RemoteConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StorageError> {
        let request = match self.config.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, url = %response.url(), "api request failed");
            return Err(status_error(status));
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StorageError> {
        self.send(request).await?.json().await.map_err(transport)
    }

    /// Like `fetch`, but a 404 is `Ok(None)`.
    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, StorageError> {
        match self.fetch(request).await {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn project_url(&self, id: ProjectId) -> url::Url {
        self.config.endpoint(&["projects", id.to_string().as_str()])
    }

    fn tasks_url(&self, project_id: ProjectId) -> url::Url {
        self.config
            .endpoint(&["projects", project_id.to_string().as_str(), "tasks"])
    }

    fn task_url(&self, project_id: ProjectId, task_id: TaskId) -> url::Url {
        self.config.endpoint(&[
            "projects",
            project_id.to_string().as_str(),
            "tasks",
            task_id.to_string().as_str(),
        ])
    }
}

#[async_trait]
impl ProjectRepository for RestRepository {
    async fn insert_new_project(
        &self,
        project: NewProjectRecord,
    ) -> Result<ProjectId, StorageError> {
        let body = ProjectBody {
            title: &project.title,
            description: project.description.as_deref(),
        };
        let created: ProjectDto = self
            .fetch(self.client.post(self.config.endpoint(&["projects"])).json(&body))
            .await?;
        Ok(ProjectId::new(created.id))
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        let Some(dto) = self
            .fetch_optional::<ProjectDto>(self.client.get(self.project_url(id)))
            .await?
        else {
            return Ok(None);
        };
        let mut project = dto.into_project()?;
        let tasks = self.list_tasks(id).await?;
        project
            .set_tasks(tasks)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(project))
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let dtos: Vec<ProjectDto> = self
            .fetch(self.client.get(self.config.endpoint(&["projects"])))
            .await?;
        dtos.into_iter().map(ProjectDto::into_project).collect()
    }

    async fn update_project(&self, project: &Project) -> Result<(), StorageError> {
        let body = ProjectBody {
            title: project.title(),
            description: project.description(),
        };
        self.send(self.client.put(self.project_url(project.id())).json(&body))
            .await?;
        Ok(())
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StorageError> {
        self.send(self.client.delete(self.project_url(id))).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for RestRepository {
    async fn insert_new_task(
        &self,
        project_id: ProjectId,
        task: NewTaskRecord,
    ) -> Result<TaskId, StorageError> {
        let body = TaskBody {
            title: &task.title,
            description: task.description.as_deref(),
            completed: task.completed,
        };
        let created: TaskDto = self
            .fetch(self.client.post(self.tasks_url(project_id)).json(&body))
            .await?;
        Ok(TaskId::new(created.id))
    }

    async fn list_tasks(&self, project_id: ProjectId) -> Result<Vec<Task>, StorageError> {
        let dtos: Vec<TaskDto> = self.fetch(self.client.get(self.tasks_url(project_id))).await?;
        dtos.into_iter().map(TaskDto::into_task).collect()
    }

    async fn get_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<Option<Task>, StorageError> {
        self.fetch_optional::<TaskDto>(self.client.get(self.task_url(project_id, task_id)))
            .await?
            .map(TaskDto::into_task)
            .transpose()
    }

    async fn update_task(&self, project_id: ProjectId, task: &Task) -> Result<(), StorageError> {
        let body = TaskBody {
            title: task.title(),
            description: task.description(),
            completed: task.is_completed(),
        };
        self.send(
            self.client
                .put(self.task_url(project_id, task.id()))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<(), StorageError> {
        self.send(self.client.delete(self.task_url(project_id, task_id)))
            .await?;
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` over the REST API. The API has no preferences
    /// endpoint, so the theme lives in `preferences`.
    #[must_use]
    pub fn remote(config: RemoteConfig, preferences: Arc<dyn PreferencesRepository>) -> Self {
        let repo = RestRepository::new(config);
        let projects: Arc<dyn ProjectRepository> = Arc::new(repo.clone());
        let tasks: Arc<dyn TaskRepository> = Arc::new(repo);
        Self {
            projects,
            tasks,
            preferences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_onto_storage_errors() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND),
            StorageError::NotFound
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT),
            StorageError::Conflict
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR),
            StorageError::Connection(msg) if msg.contains("500")
        ));
    }

    #[test]
    fn task_urls_are_nested_under_their_project() {
        let repo = RestRepository::new(RemoteConfig::new("http://localhost:8080").unwrap());
        assert_eq!(
            repo.task_url(ProjectId::new(4), TaskId::new(11)).as_str(),
            "http://localhost:8080/projects/4/tasks/11"
        );
        assert_eq!(
            repo.project_url(ProjectId::new(4)).as_str(),
            "http://localhost:8080/projects/4"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        // port 9 (discard) on loopback is closed in test environments
        let repo = RestRepository::new(RemoteConfig::new("http://127.0.0.1:9").unwrap());
        assert!(matches!(
            repo.list_projects().await,
            Err(StorageError::Connection(_))
        ));
    }
}

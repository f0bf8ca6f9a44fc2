use std::sync::Arc;

use storage::repository::{NewProjectRecord, ProjectRepository, StorageError};
use taskboard_core::model::{Project, ProjectId};

use crate::Clock;
use crate::error::ProjectServiceError;

/// Orchestrates project creation, edits and cascading deletes.
#[derive(Clone)]
pub struct ProjectService {
    clock: Clock,
    projects: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    #[must_use]
    pub fn new(clock: Clock, projects: Arc<dyn ProjectRepository>) -> Self {
        Self { clock, projects }
    }

    /// Validate and persist a new, empty project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::Project` for validation failures.
    /// Returns `ProjectServiceError::Storage` if persistence fails.
    pub async fn create_project(
        &self,
        title: String,
        description: Option<String>,
    ) -> Result<Project, ProjectServiceError> {
        let draft = Project::new(ProjectId::new(0), title, description, self.clock.now())?;
        let id = self
            .projects
            .insert_new_project(NewProjectRecord::from_project(&draft))
            .await?;
        tracing::info!(project_id = %id, "project created");

        let project = Project::new(
            id,
            draft.title(),
            draft.description().map(str::to_owned),
            draft.created_at(),
        )?;
        Ok(project)
    }

    /// List projects in creation order.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::Storage` if repository access fails.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ProjectServiceError> {
        let projects = self.projects.list_projects().await?;
        tracing::debug!(count = projects.len(), "projects listed");
        Ok(projects)
    }

    /// Fetch a project with its tasks.
    ///
    /// Returns `Ok(None)` when the project does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::Storage` if repository access fails.
    pub async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, ProjectServiceError> {
        let project = self.projects.get_project(id).await?;
        Ok(project)
    }

    /// Replace a project's title and description.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::Project` if validation fails.
    /// Returns `ProjectServiceError::Storage` if the project is missing or
    /// repository access fails.
    pub async fn update_project(
        &self,
        id: ProjectId,
        title: String,
        description: Option<String>,
    ) -> Result<Project, ProjectServiceError> {
        let mut project = self
            .projects
            .get_project(id)
            .await?
            .ok_or(StorageError::NotFound)?;

        project.edit(title, description)?;
        self.projects.update_project(&project).await?;
        tracing::info!(project_id = %id, "project updated");
        Ok(project)
    }

    /// Delete a project together with all of its tasks.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::Storage` if the project is missing or
    /// repository access fails.
    pub async fn delete_project(&self, id: ProjectId) -> Result<(), ProjectServiceError> {
        self.projects.delete_project(id).await?;
        tracing::info!(project_id = %id, "project deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::InMemoryRepository;
    use taskboard_core::time::{fixed_clock, fixed_now};

    fn service() -> ProjectService {
        ProjectService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn create_returns_project_with_assigned_id() {
        let service = service();
        let project = service
            .create_project("  Garden ".into(), Some("  ".into()))
            .await
            .unwrap();

        assert_eq!(project.id(), ProjectId::new(1));
        assert_eq!(project.title(), "Garden");
        assert_eq!(project.description(), None);
        assert_eq!(project.created_at(), fixed_now());
        assert_eq!(project.progress(), 0);
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_storage() {
        let service = service();
        let err = service
            .create_project("   ".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectServiceError::Project(_)));
        assert!(service.list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_project_is_not_found() {
        let err = service()
            .update_project(ProjectId::new(42), "x".into(), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

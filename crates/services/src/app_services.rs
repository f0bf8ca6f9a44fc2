use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::{AuthBackend, AuthService, LocalAuthBackend};
use crate::error::AppServicesError;
use crate::preferences_service::ThemeService;
use crate::project_service::ProjectService;
use crate::task_service::TaskService;

/// Assembles app-facing services over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    projects: Arc<ProjectService>,
    tasks: Arc<TaskService>,
    theme: Arc<ThemeService>,
    auth: Arc<AuthService>,
}

impl AppServices {
    /// Wire services over an already-built storage and auth backend.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, auth: Arc<dyn AuthBackend>) -> Self {
        Self {
            projects: Arc::new(ProjectService::new(clock, Arc::clone(&storage.projects))),
            tasks: Arc::new(TaskService::new(Arc::clone(&storage.tasks))),
            theme: Arc::new(ThemeService::new(Arc::clone(&storage.preferences))),
            auth: Arc::new(AuthService::new(auth)),
        }
    }

    /// Build services backed by `SQLite` storage and the local auth stub.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(
            &storage,
            clock,
            Arc::new(LocalAuthBackend::new()),
        ))
    }

    /// In-memory storage and local auth; nothing outlives the process.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(
            &Storage::in_memory(),
            clock,
            Arc::new(LocalAuthBackend::new()),
        )
    }

    #[must_use]
    pub fn projects(&self) -> Arc<ProjectService> {
        Arc::clone(&self.projects)
    }

    #[must_use]
    pub fn tasks(&self) -> Arc<TaskService> {
        Arc::clone(&self.tasks)
    }

    #[must_use]
    pub fn theme(&self) -> Arc<ThemeService> {
        Arc::clone(&self.theme)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }
}

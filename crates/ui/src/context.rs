use std::sync::Arc;

use services::{AppServices, AuthService, ProjectService, TaskService, ThemeService};

pub trait UiApp: Send + Sync {
    fn projects(&self) -> Arc<ProjectService>;
    fn tasks(&self) -> Arc<TaskService>;
    fn theme(&self) -> Arc<ThemeService>;
    fn auth(&self) -> Arc<AuthService>;
}

impl UiApp for AppServices {
    fn projects(&self) -> Arc<ProjectService> {
        AppServices::projects(self)
    }

    fn tasks(&self) -> Arc<TaskService> {
        AppServices::tasks(self)
    }

    fn theme(&self) -> Arc<ThemeService> {
        AppServices::theme(self)
    }

    fn auth(&self) -> Arc<AuthService> {
        AppServices::auth(self)
    }
}

/// Services handed to controllers by the composition root.
#[derive(Clone)]
pub struct AppContext {
    projects: Arc<ProjectService>,
    tasks: Arc<TaskService>,
    theme: Arc<ThemeService>,
    auth: Arc<AuthService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            projects: app.projects(),
            tasks: app.tasks(),
            theme: app.theme(),
            auth: app.auth(),
        }
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

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

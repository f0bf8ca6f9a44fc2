#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod error;
pub mod preferences_service;
pub mod project_service;
pub mod task_service;

pub use taskboard_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthBackend, AuthService, LocalAuthBackend, RemoteAuthBackend};
pub use error::{
    AppServicesError, AuthError, PreferencesServiceError, ProjectServiceError, TaskServiceError,
};
pub use preferences_service::ThemeService;
pub use project_service::ProjectService;
pub use task_service::TaskService;

mod account;
mod ids;
mod project;
mod task;
mod text;
mod theme;

pub use account::{Credentials, CredentialsError, MIN_PASSWORD_CHARS, Session, SignUp, SignUpDraft};
pub use ids::{ParseIdError, ProjectId, TaskId};
pub use project::{Project, ProjectError};
pub use task::{Task, TaskError};
pub use text::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS, TextError};
pub use theme::{ParseThemeError, Theme};

use thiserror::Error;

use crate::model::{CredentialsError, ParseIdError, ProjectError, TaskError};
use crate::progress::ProgressError;

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use services::{PreferencesServiceError, ProjectServiceError, TaskServiceError};
use taskboard_core::model::{ProjectError, ProjectId, TaskError, TaskId};
use thiserror::Error;

/// Whether the initial project fetch is in flight.
///
/// Clones share one flag, so a view can keep a handle and poll it while
/// [`ProjectBoard::load`](super::ProjectBoard::load) holds the board.
#[derive(Clone, Debug, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raise the flag until the returned guard is dropped, including when
    /// the fetch future is cancelled.
    pub(crate) fn begin(&self) -> LoadingGuard {
        self.0.store(true, Ordering::Release);
        LoadingGuard(self.clone())
    }
}

pub(crate) struct LoadingGuard(LoadingFlag);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::Release);
    }
}

/// Which modal is showing, and for what.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogState<Id> {
    Closed,
    Creating,
    Editing(Id),
}

impl<Id> Default for DialogState<Id> {
    fn default() -> Self {
        Self::Closed
    }
}

impl<Id: Copy> DialogState<Id> {
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    #[must_use]
    pub fn editing(&self) -> Option<Id> {
        match self {
            Self::Editing(id) => Some(*id),
            _ => None,
        }
    }
}

/// Title/description input shared by the project and task dialogs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemForm {
    pub title: String,
    pub description: String,
}

pub type ProjectForm = ItemForm;
pub type TaskForm = ItemForm;

impl ItemForm {
    #[must_use]
    pub fn prefilled(title: &str, description: Option<&str>) -> Self {
        Self {
            title: title.to_owned(),
            description: description.unwrap_or_default().to_owned(),
        }
    }

    /// Submit stays disabled while the title is blank.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty()
    }

    #[must_use]
    pub fn description_value(&self) -> Option<String> {
        let trimmed = self.description.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    /// The initial fetch failed.
    Load,
    /// A create, update, delete or toggle failed.
    Mutation,
}

/// Blocking notice shown until dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    #[must_use]
    pub fn load(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Load,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn mutation(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Mutation,
            message: message.into(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BoardError {
    #[error("title is required")]
    SubmitDisabled,
    #[error("no project selected")]
    NoProjectSelected,
    #[error("no dialog is open")]
    DialogClosed,
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error(transparent)]
    InvalidProject(#[from] ProjectError),
    #[error(transparent)]
    InvalidTask(#[from] TaskError),
    #[error(transparent)]
    Projects(#[from] ProjectServiceError),
    #[error(transparent)]
    Tasks(#[from] TaskServiceError),
    #[error(transparent)]
    Theme(#[from] PreferencesServiceError),
}

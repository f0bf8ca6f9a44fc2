use thiserror::Error;

use crate::model::ids::TaskId;
use crate::model::text::{TextError, normalize_description, normalize_title};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    #[error("invalid task title: {0}")]
    InvalidTitle(TextError),

    #[error("invalid task description: {0}")]
    InvalidDescription(TextError),
}

//
// ─── TASK ──────────────────────────────────────────────────────────────────────
//

/// A unit of work inside a project.
///
/// Tasks have no life of their own: they are created, edited and removed
/// through their owning [`Project`](crate::model::Project).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    completed: bool,
}

impl Task {
    /// Creates a new, not yet completed task.
    ///
    /// # Errors
    ///
    /// Returns `TaskError` if the title is blank or either field is too long.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, TaskError> {
        Self::from_persisted(id, title, description, false)
    }

    /// Rebuilds a task from storage, keeping its completion flag.
    ///
    /// # Errors
    ///
    /// Returns `TaskError` if the stored fields no longer validate.
    pub fn from_persisted(
        id: TaskId,
        title: impl Into<String>,
        description: Option<String>,
        completed: bool,
    ) -> Result<Self, TaskError> {
        let title = normalize_title(&title.into()).map_err(TaskError::InvalidTitle)?;
        let description =
            normalize_description(description).map_err(TaskError::InvalidDescription)?;

        Ok(Self {
            id,
            title,
            description,
            completed,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Replaces title and description. The completion flag is untouched.
    ///
    /// # Errors
    ///
    /// Returns `TaskError` on validation failure; the task is left unchanged.
    pub fn edit(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<(), TaskError> {
        let title = normalize_title(&title.into()).map_err(TaskError::InvalidTitle)?;
        let description =
            normalize_description(description).map_err(TaskError::InvalidDescription)?;
        self.title = title;
        self.description = description;
        Ok(())
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_open() {
        let task = Task::new(TaskId::new(1), "Write docs", None).unwrap();
        assert!(!task.is_completed());
        assert_eq!(task.title(), "Write docs");
    }

    #[test]
    fn rejects_blank_title() {
        let err = Task::new(TaskId::new(1), "  ", None).unwrap_err();
        assert_eq!(err, TaskError::InvalidTitle(TextError::Empty));
    }

    #[test]
    fn toggle_flips_back_and_forth() {
        let mut task = Task::new(TaskId::new(1), "t", None).unwrap();
        assert!(task.toggle());
        assert!(!task.toggle());
    }

    #[test]
    fn failed_edit_keeps_previous_values() {
        let mut task =
            Task::from_persisted(TaskId::new(3), "Ship", Some("v1".into()), true).unwrap();
        let err = task.edit("", Some("v2".into())).unwrap_err();
        assert_eq!(err, TaskError::InvalidTitle(TextError::Empty));
        assert_eq!(task.title(), "Ship");
        assert_eq!(task.description(), Some("v1"));
        assert!(task.is_completed());
    }

    #[test]
    fn edit_preserves_completion() {
        let mut task = Task::from_persisted(TaskId::new(3), "Ship", None, true).unwrap();
        task.edit("Ship it", Some("  soon ".into())).unwrap();
        assert_eq!(task.title(), "Ship it");
        assert_eq!(task.description(), Some("soon"));
        assert!(task.is_completed());
    }
}

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ProjectId, TaskId};
use crate::model::task::Task;
use crate::model::text::{TextError, normalize_description, normalize_title};
use crate::progress::TaskCounts;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProjectError {
    #[error("invalid project title: {0}")]
    InvalidTitle(TextError),

    #[error("invalid project description: {0}")]
    InvalidDescription(TextError),

    #[error("task {0} already exists in this project")]
    DuplicateTask(TaskId),
}

//
// ─── PROJECT ───────────────────────────────────────────────────────────────────
//

/// A titled container of tasks.
///
/// The task list keeps insertion order. When a project comes from a listing
/// that only reports counters, `tracked` carries those counters until the
/// real task list is attached with [`Project::set_tasks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    tasks: Vec<Task>,
    tracked: Option<TaskCounts>,
}

impl Project {
    /// Creates a new, empty project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError` if the title is blank or a field is too long.
    pub fn new(
        id: ProjectId,
        title: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProjectError> {
        Self::from_persisted(id, title, description, created_at, Vec::new())
    }

    /// Rebuilds a project together with its tasks.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError` on validation failure or duplicate task ids.
    pub fn from_persisted(
        id: ProjectId,
        title: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
        tasks: Vec<Task>,
    ) -> Result<Self, ProjectError> {
        let title = normalize_title(&title.into()).map_err(ProjectError::InvalidTitle)?;
        let description =
            normalize_description(description).map_err(ProjectError::InvalidDescription)?;
        check_unique(&tasks)?;

        Ok(Self {
            id,
            title,
            description,
            created_at,
            tasks,
            tracked: None,
        })
    }

    /// Attaches server-tracked counters for a project whose tasks were not fetched.
    #[must_use]
    pub fn with_tracked_counts(mut self, counts: TaskCounts) -> Self {
        self.tracked = Some(counts);
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ProjectId {
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
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// True when progress comes from server counters rather than the task list.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.tracked.is_some()
    }

    #[must_use]
    pub fn counts(&self) -> TaskCounts {
        self.tracked
            .unwrap_or_else(|| TaskCounts::from_tasks(&self.tasks))
    }

    /// Completion percentage, 0 for a project without tasks.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.counts().percent()
    }

    /// Replaces title and description.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError` on validation failure; the project is left unchanged.
    pub fn edit(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<(), ProjectError> {
        let title = normalize_title(&title.into()).map_err(ProjectError::InvalidTitle)?;
        let description =
            normalize_description(description).map_err(ProjectError::InvalidDescription)?;
        self.title = title;
        self.description = description;
        Ok(())
    }

    /// Replaces the task list, dropping any tracked counters.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::DuplicateTask` if two tasks share an id.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) -> Result<(), ProjectError> {
        check_unique(&tasks)?;
        self.tasks = tasks;
        self.tracked = None;
        Ok(())
    }

    /// Appends a task at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::DuplicateTask` if the id is already present.
    pub fn add_task(&mut self, task: Task) -> Result<(), ProjectError> {
        if self.task(task.id()).is_some() {
            return Err(ProjectError::DuplicateTask(task.id()));
        }
        if let Some(counts) = self.tracked.as_mut() {
            counts.record_added(task.is_completed());
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Replaces the task with the same id in place, keeping its position.
    ///
    /// Returns the previous version, or `None` if the task is not in this project.
    pub fn replace_task(&mut self, task: Task) -> Option<Task> {
        let slot = self.tasks.iter_mut().find(|t| t.id() == task.id())?;
        let before = std::mem::replace(slot, task);
        let now_completed = slot.is_completed();
        if before.is_completed() != now_completed {
            if let Some(counts) = self.tracked.as_mut() {
                counts.record_toggled(now_completed);
            }
        }
        Some(before)
    }

    /// Flips one task's completion flag. Sibling tasks are untouched.
    ///
    /// Returns the new flag, or `None` if the task is not in this project.
    pub fn toggle_task(&mut self, id: TaskId) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id() == id)?;
        let completed = task.toggle();
        if let Some(counts) = self.tracked.as_mut() {
            counts.record_toggled(completed);
        }
        Some(completed)
    }

    /// Removes a task, returning it if it belonged to this project.
    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id() == id)?;
        let task = self.tasks.remove(index);
        if let Some(counts) = self.tracked.as_mut() {
            counts.record_removed(task.is_completed());
        }
        Some(task)
    }
}

fn check_unique(tasks: &[Task]) -> Result<(), ProjectError> {
    for (i, task) in tasks.iter().enumerate() {
        if tasks[..i].iter().any(|t| t.id() == task.id()) {
            return Err(ProjectError::DuplicateTask(task.id()));
        }
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

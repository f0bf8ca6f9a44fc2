use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_core::TaskCounts;
use taskboard_core::model::{Project, ProjectId, Task, TaskId};

use crate::repository::StorageError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub task_count: Option<u32>,
    #[serde(default)]
    pub completed_task_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProjectBody<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskBody<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub completed: bool,
}

/// Accepts RFC 3339 and zone-less `LocalDateTime` output (read as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn invalid<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

impl ProjectDto {
    /// Listing payloads carry counters instead of tasks; keep them so
    /// progress works without fetching every task list.
    pub(crate) fn into_project(self) -> Result<Project, StorageError> {
        let created_at = self
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_default();
        let project = Project::new(
            ProjectId::new(self.id),
            self.title,
            self.description,
            created_at,
        )
        .map_err(invalid)?;

        match self.task_count {
            Some(total) => {
                let counts = TaskCounts::new(total, self.completed_task_count.unwrap_or(0))
                    .map_err(invalid)?;
                Ok(project.with_tracked_counts(counts))
            }
            None => Ok(project),
        }
    }
}

impl TaskDto {
    pub(crate) fn into_task(self) -> Result<Task, StorageError> {
        Task::from_persisted(TaskId::new(self.id), self.title, self.description, self.completed)
            .map_err(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_counters_drive_progress() {
        let dto: ProjectDto = serde_json::from_str(
            r#"{"id":3,"title":"Launch","description":null,
                "createdAt":"2024-03-01T09:30:00","taskCount":3,"completedTaskCount":1}"#,
        )
        .unwrap();
        let project = dto.into_project().unwrap();

        assert!(project.is_tracked());
        assert_eq!(project.progress(), 33);
        assert_eq!(project.created_at().to_rfc3339(), "2024-03-01T09:30:00+00:00");
    }

    #[test]
    fn inconsistent_counters_are_rejected() {
        let dto: ProjectDto = serde_json::from_str(
            r#"{"id":3,"title":"Launch","taskCount":1,"completedTaskCount":2}"#,
        )
        .unwrap();
        assert!(matches!(
            dto.into_project(),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn task_payload_ignores_unknown_fields() {
        let dto: TaskDto = serde_json::from_str(
            r#"{"id":9,"title":"Ship","description":"","completed":true,"project":{"id":3}}"#,
        )
        .unwrap();
        let task = dto.into_task().unwrap();
        assert_eq!(task.id(), TaskId::new(9));
        assert_eq!(task.description(), None);
        assert!(task.is_completed());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_core::model::{Project, ProjectId, Task, TaskId};

use crate::repository::StorageError;

/// One entry of the `"projects"` array. Ids are decimal strings and an
/// absent description is stored as `""`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

pub(crate) fn parse_raw_id(raw: &str) -> Result<u64, StorageError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| StorageError::Serialization(format!("invalid stored id: {raw:?}")))
}

pub(crate) fn same_id(raw: &str, id: u64) -> bool {
    raw.trim().parse::<u64>().is_ok_and(|v| v == id)
}

fn description_out(description: Option<&str>) -> String {
    description.unwrap_or_default().to_owned()
}

fn description_in(description: &str) -> Option<String> {
    (!description.trim().is_empty()).then(|| description.to_owned())
}

impl TaskRecord {
    pub(crate) fn from_parts(
        id: TaskId,
        title: &str,
        description: Option<&str>,
        completed: bool,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_owned(),
            description: description_out(description),
            completed,
        }
    }

    pub(crate) fn from_task(task: &Task) -> Self {
        Self::from_parts(task.id(), task.title(), task.description(), task.is_completed())
    }

    pub(crate) fn to_task(&self) -> Result<Task, StorageError> {
        Task::from_persisted(
            TaskId::new(parse_raw_id(&self.id)?),
            self.title.clone(),
            description_in(&self.description),
            self.completed,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

impl ProjectRecord {
    pub(crate) fn to_project(&self) -> Result<Project, StorageError> {
        let id = parse_raw_id(&self.id)?;
        // Ids were minted from the creation time in milliseconds.
        let created_at = self
            .created_at
            .or_else(|| i64::try_from(id).ok().and_then(DateTime::<Utc>::from_timestamp_millis))
            .unwrap_or_default();
        let tasks = self
            .tasks
            .iter()
            .map(TaskRecord::to_task)
            .collect::<Result<Vec<_>, _>>()?;

        Project::from_persisted(
            ProjectId::new(id),
            self.title.clone(),
            description_in(&self.description),
            created_at,
            tasks,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_documents_written_by_the_browser_app() {
        let raw = r#"[{"id":"1700000000000","title":"Garden","description":"",
            "tasks":[{"id":"1700000000001","title":"Dig","description":"","completed":true}]}]"#;
        let records: Vec<ProjectRecord> = serde_json::from_str(raw).unwrap();
        let project = records[0].to_project().unwrap();

        assert_eq!(project.id(), ProjectId::new(1_700_000_000_000));
        assert_eq!(project.description(), None);
        assert_eq!(project.created_at().timestamp(), 1_700_000_000);
        assert_eq!(project.tasks().len(), 1);
        assert!(project.tasks()[0].is_completed());
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let record = TaskRecord {
            id: "abc".into(),
            title: "x".into(),
            description: String::new(),
            completed: false,
        };
        assert!(matches!(record.to_task(), Err(StorageError::Serialization(_))));
    }

    #[test]
    fn absent_description_serializes_as_empty_string() {
        let record = TaskRecord::from_parts(TaskId::new(7), "Dig", None, false);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["description"], "");
    }
}

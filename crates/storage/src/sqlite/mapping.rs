use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use taskboard_core::model::{Project, ProjectId, Task, TaskId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn project_id_from_i64(v: i64) -> Result<ProjectId, StorageError> {
    Ok(ProjectId::new(i64_to_u64("project_id", v)?))
}

pub(crate) fn task_id_from_i64(v: i64) -> Result<TaskId, StorageError> {
    Ok(TaskId::new(i64_to_u64("task_id", v)?))
}

pub(crate) fn project_id_to_i64(id: ProjectId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("project_id overflow".into()))
}

pub(crate) fn task_id_to_i64(id: TaskId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("task_id overflow".into()))
}

/// Maps a `projects` row; tasks are attached by the caller.
pub(crate) fn map_project_row(row: &SqliteRow) -> Result<Project, StorageError> {
    Project::new(
        project_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_task_row(row: &SqliteRow) -> Result<Task, StorageError> {
    let completed: i64 = row.try_get("completed").map_err(ser)?;
    Task::from_persisted(
        task_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        completed != 0,
    )
    .map_err(ser)
}

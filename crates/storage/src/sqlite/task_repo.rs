use taskboard_core::model::{ProjectId, Task, TaskId};

use super::SqliteRepository;
use super::mapping::{conn, map_task_row, project_id_to_i64, task_id_from_i64, task_id_to_i64};
use crate::repository::{NewTaskRecord, StorageError, TaskRepository};

impl SqliteRepository {
    async fn project_exists(&self, raw_project_id: i64) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM projects WHERE id = ?1")
            .bind(raw_project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        Ok(row.is_some())
    }
}

#[async_trait::async_trait]
impl TaskRepository for SqliteRepository {
    async fn insert_new_task(
        &self,
        project_id: ProjectId,
        task: NewTaskRecord,
    ) -> Result<TaskId, StorageError> {
        let raw_project_id = project_id_to_i64(project_id)?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM projects WHERE id = ?1")
            .bind(raw_project_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let res = sqlx::query(
            r"
            INSERT INTO tasks (project_id, title, description, completed, position)
            VALUES (
                ?1, ?2, ?3, ?4,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM tasks WHERE project_id = ?1)
            )
            ",
        )
        .bind(raw_project_id)
        .bind(task.title)
        .bind(task.description)
        .bind(i64::from(task.completed))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        task_id_from_i64(res.last_insert_rowid())
    }

    async fn list_tasks(&self, project_id: ProjectId) -> Result<Vec<Task>, StorageError> {
        let raw_project_id = project_id_to_i64(project_id)?;
        if !self.project_exists(raw_project_id).await? {
            return Err(StorageError::NotFound);
        }

        let rows = sqlx::query(
            r"
            SELECT id, title, description, completed
            FROM tasks
            WHERE project_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(raw_project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(map_task_row(&row)?);
        }
        Ok(tasks)
    }

    async fn get_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<Option<Task>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, completed
            FROM tasks
            WHERE id = ?1 AND project_id = ?2
            ",
        )
        .bind(task_id_to_i64(task_id)?)
        .bind(project_id_to_i64(project_id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_task_row).transpose()
    }

    async fn update_task(&self, project_id: ProjectId, task: &Task) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE tasks
            SET title = ?3, description = ?4, completed = ?5
            WHERE id = ?1 AND project_id = ?2
            ",
        )
        .bind(task_id_to_i64(task.id())?)
        .bind(project_id_to_i64(project_id)?)
        .bind(task.title())
        .bind(task.description())
        .bind(i64::from(task.is_completed()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND project_id = ?2")
            .bind(task_id_to_i64(task_id)?)
            .bind(project_id_to_i64(project_id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

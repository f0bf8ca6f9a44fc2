use std::collections::HashMap;

use taskboard_core::model::{Project, ProjectId, Task};

use super::SqliteRepository;
use super::mapping::{conn, map_project_row, map_task_row, project_id_from_i64, project_id_to_i64, ser};
use crate::repository::{NewProjectRecord, ProjectRepository, StorageError};

#[async_trait::async_trait]
impl ProjectRepository for SqliteRepository {
    async fn insert_new_project(
        &self,
        project: NewProjectRecord,
    ) -> Result<ProjectId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO projects (title, description, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(project.title)
        .bind(project.description)
        .bind(project.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        project_id_from_i64(res.last_insert_rowid())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        let raw_id = project_id_to_i64(id)?;
        let row = sqlx::query(
            r"
            SELECT id, title, description, created_at
            FROM projects WHERE id = ?1
            ",
        )
        .bind(raw_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut project = map_project_row(&row)?;

        let task_rows = sqlx::query(
            r"
            SELECT id, title, description, completed
            FROM tasks
            WHERE project_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(raw_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut tasks = Vec::with_capacity(task_rows.len());
        for row in task_rows {
            tasks.push(map_task_row(&row)?);
        }
        project.set_tasks(tasks).map_err(ser)?;
        Ok(Some(project))
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, created_at
            FROM projects
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let task_rows = sqlx::query(
            r"
            SELECT id, project_id, title, description, completed
            FROM tasks
            ORDER BY project_id ASC, position ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut by_project: HashMap<i64, Vec<Task>> = HashMap::new();
        for row in task_rows {
            let project_id: i64 = sqlx::Row::try_get(&row, "project_id").map_err(ser)?;
            by_project
                .entry(project_id)
                .or_default()
                .push(map_task_row(&row)?);
        }

        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            let mut project = map_project_row(&row)?;
            let key = project_id_to_i64(project.id())?;
            if let Some(tasks) = by_project.remove(&key) {
                project.set_tasks(tasks).map_err(ser)?;
            }
            projects.push(project);
        }
        Ok(projects)
    }

    async fn update_project(&self, project: &Project) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE projects
            SET title = ?2, description = ?3
            WHERE id = ?1
            ",
        )
        .bind(project_id_to_i64(project.id())?)
        .bind(project.title())
        .bind(project.description())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StorageError> {
        let raw_id = project_id_to_i64(id)?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Explicit even though the FK cascades: the delete must not depend on
        // the connection having foreign_keys enabled.
        sqlx::query("DELETE FROM tasks WHERE project_id = ?1")
            .bind(raw_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        let res = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(raw_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            // dropping `tx` rolls back
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}

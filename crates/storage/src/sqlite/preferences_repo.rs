use async_trait::async_trait;
use sqlx::Row;
use taskboard_core::model::Theme;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{PreferencesRepository, StorageError};

#[async_trait]
impl PreferencesRepository for SqliteRepository {
    async fn get_theme(&self) -> Result<Option<Theme>, StorageError> {
        let row = sqlx::query("SELECT theme FROM preferences WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("theme").map_err(ser)?;
        raw.parse::<Theme>().map(Some).map_err(ser)
    }

    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO preferences (id, theme)
            VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET theme = excluded.theme
            ",
        )
        .bind(theme.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}

use std::sync::Arc;

use storage::repository::PreferencesRepository;
use taskboard_core::model::Theme;

use crate::error::PreferencesServiceError;

/// Reads and persists the dark-mode preference.
#[derive(Clone)]
pub struct ThemeService {
    preferences: Arc<dyn PreferencesRepository>,
}

impl ThemeService {
    #[must_use]
    pub fn new(preferences: Arc<dyn PreferencesRepository>) -> Self {
        Self { preferences }
    }

    /// The stored theme, light when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError::Storage` if repository access fails.
    pub async fn load(&self) -> Result<Theme, PreferencesServiceError> {
        Ok(self.preferences.get_theme().await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `PreferencesServiceError::Storage` if the value cannot be saved.
    pub async fn set(&self, theme: Theme) -> Result<(), PreferencesServiceError> {
        self.preferences.save_theme(theme).await?;
        tracing::debug!(%theme, "theme saved");
        Ok(())
    }

    /// Switch between light and dark, returning the new theme.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError::Storage` if repository access fails.
    pub async fn toggle(&self) -> Result<Theme, PreferencesServiceError> {
        let next = self.load().await?.toggled();
        self.set(next).await?;
        Ok(next)
    }
}

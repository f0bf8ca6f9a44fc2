//! Headless controller for the projects page.
//!
//! [`ProjectBoard`] owns the in-memory project list and the transient UI
//! state around it (selection, dialogs, forms, alert). Edits, toggles and
//! deletes are applied locally first and rolled back to a snapshot when the
//! store rejects them. Creates wait for the store, since it assigns ids.

use std::sync::Arc;

use services::{AuthService, ProjectService, TaskService, ThemeService};
use taskboard_core::model::{Project, ProjectId, TaskId, Theme};

use crate::context::AppContext;
use crate::routes::Route;
use crate::vm::{
    BoardHeaderVm, ProjectCardVm, TaskRowVm, map_board_header, map_project_cards, map_task_rows,
};

mod state;

pub use state::{
    Alert, AlertKind, BoardError, DialogState, ItemForm, LoadingFlag, ProjectForm, TaskForm,
};

/// Everything a failed mutation must put back.
struct Snapshot {
    projects: Vec<Project>,
    selected: Option<ProjectId>,
    project_dialog: DialogState<ProjectId>,
    task_dialog: DialogState<TaskId>,
    project_form: ProjectForm,
    task_form: TaskForm,
}

pub struct ProjectBoard {
    project_service: Arc<ProjectService>,
    task_service: Arc<TaskService>,
    theme_service: Arc<ThemeService>,
    auth: Arc<AuthService>,

    projects: Vec<Project>,
    selected: Option<ProjectId>,
    project_dialog: DialogState<ProjectId>,
    task_dialog: DialogState<TaskId>,
    project_form: ProjectForm,
    task_form: TaskForm,
    alert: Option<Alert>,
    loading: LoadingFlag,
    theme: Theme,
}

impl ProjectBoard {
    #[must_use]
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            project_service: ctx.projects(),
            task_service: ctx.tasks(),
            theme_service: ctx.theme(),
            auth: ctx.auth(),
            projects: Vec::new(),
            selected: None,
            project_dialog: DialogState::Closed,
            task_dialog: DialogState::Closed,
            project_form: ProjectForm::default(),
            task_form: TaskForm::default(),
            alert: None,
            loading: LoadingFlag::default(),
            theme: Theme::default(),
        }
    }

    // Accessors

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    #[must_use]
    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id() == id)
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<ProjectId> {
        self.selected
    }

    #[must_use]
    pub fn selected_project(&self) -> Option<&Project> {
        self.selected.and_then(|id| self.project(id))
    }

    #[must_use]
    pub fn project_dialog(&self) -> DialogState<ProjectId> {
        self.project_dialog
    }

    #[must_use]
    pub fn task_dialog(&self) -> DialogState<TaskId> {
        self.task_dialog
    }

    #[must_use]
    pub fn project_form(&self) -> &ProjectForm {
        &self.project_form
    }

    pub fn project_form_mut(&mut self) -> &mut ProjectForm {
        &mut self.project_form
    }

    #[must_use]
    pub fn task_form(&self) -> &TaskForm {
        &self.task_form
    }

    pub fn task_form_mut(&mut self) -> &mut TaskForm {
        &mut self.task_form
    }

    #[must_use]
    pub fn can_submit_project(&self) -> bool {
        self.project_dialog.is_open() && self.project_form.can_submit()
    }

    #[must_use]
    pub fn can_submit_task(&self) -> bool {
        self.task_dialog.is_open() && self.task_form.can_submit()
    }

    #[must_use]
    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Handle that stays readable while `load` borrows the board.
    #[must_use]
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn project_cards(&self) -> Vec<ProjectCardVm> {
        map_project_cards(&self.projects, self.selected)
    }

    #[must_use]
    pub fn task_rows(&self) -> Vec<TaskRowVm> {
        self.selected_project()
            .map(|p| map_task_rows(p.tasks()))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn header(&self) -> BoardHeaderVm {
        map_board_header(&self.projects, self.selected_project())
    }

    // Loading

    /// Initial fetch of projects and the stored theme.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Projects` when the list cannot be fetched; an
    /// alert of kind `Load` is raised as well.
    pub async fn load(&mut self) -> Result<(), BoardError> {
        let fetched = {
            let _loading = self.loading.begin();
            self.project_service.list_projects().await
        };

        let projects = match fetched {
            Ok(projects) => projects,
            Err(e) => {
                tracing::error!(error = %e, "loading projects failed");
                self.alert = Some(Alert::load(format!("Could not load projects: {e}")));
                return Err(e.into());
            }
        };
        tracing::debug!(count = projects.len(), "board loaded");
        self.projects = projects;
        if self.selected.is_some_and(|id| self.project(id).is_none()) {
            self.clear_selection();
        }

        match self.theme_service.load().await {
            Ok(theme) => self.theme = theme,
            Err(e) => tracing::warn!(error = %e, "theme unavailable, keeping current"),
        }
        Ok(())
    }

    // Selection

    /// Select a project. Projects listed with counters only get their
    /// tasks fetched here.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::ProjectNotFound` for an unknown id, or
    /// `BoardError::Tasks` if the task list cannot be fetched.
    pub async fn select_project(&mut self, id: ProjectId) -> Result<(), BoardError> {
        let tracked = self
            .project(id)
            .ok_or(BoardError::ProjectNotFound(id))?
            .is_tracked();

        if tracked {
            let tasks = match self.task_service.list_tasks(id).await {
                Ok(tasks) => tasks,
                Err(e) => {
                    tracing::error!(project_id = %id, error = %e, "loading tasks failed");
                    self.alert = Some(Alert::load(format!("Could not load tasks: {e}")));
                    return Err(e.into());
                }
            };
            if let Some(project) = self.project_mut(id) {
                project.set_tasks(tasks)?;
            }
        }

        if self.selected != Some(id) {
            self.task_dialog = DialogState::Closed;
            self.task_form.clear();
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.task_dialog = DialogState::Closed;
        self.task_form.clear();
    }

    // Project dialog

    pub fn open_create_project(&mut self) {
        self.project_form.clear();
        self.project_dialog = DialogState::Creating;
    }

    /// # Errors
    ///
    /// Returns `BoardError::ProjectNotFound` for an unknown id.
    pub fn open_edit_project(&mut self, id: ProjectId) -> Result<(), BoardError> {
        let project = self.project(id).ok_or(BoardError::ProjectNotFound(id))?;
        self.project_form = ProjectForm::prefilled(project.title(), project.description());
        self.project_dialog = DialogState::Editing(id);
        Ok(())
    }

    pub fn cancel_project_dialog(&mut self) {
        self.project_dialog = DialogState::Closed;
        self.project_form.clear();
    }

    /// Create or update, depending on how the dialog was opened. The
    /// dialog closes only on success.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::SubmitDisabled` for a blank title,
    /// `BoardError::DialogClosed` if no dialog is open, and the store error
    /// when persisting fails (after rolling back and raising an alert).
    pub async fn submit_project_dialog(&mut self) -> Result<(), BoardError> {
        let dialog = self.project_dialog;
        if !dialog.is_open() {
            return Err(BoardError::DialogClosed);
        }
        if !self.project_form.can_submit() {
            return Err(BoardError::SubmitDisabled);
        }
        let title = self.project_form.title.clone();
        let description = self.project_form.description_value();

        match dialog {
            DialogState::Closed => return Err(BoardError::DialogClosed),
            DialogState::Creating => {
                match self
                    .project_service
                    .create_project(title, description)
                    .await
                {
                    Ok(project) => self.projects.push(project),
                    Err(e) => return Err(self.mutation_failed("create project", e)),
                }
            }
            DialogState::Editing(id) => {
                let snapshot = self.snapshot();
                self.project_mut(id)
                    .ok_or(BoardError::ProjectNotFound(id))?
                    .edit(title.as_str(), description.clone())?;

                if let Err(e) = self
                    .project_service
                    .update_project(id, title, description)
                    .await
                {
                    self.restore(snapshot);
                    return Err(self.mutation_failed("update project", e));
                }
            }
        }

        self.cancel_project_dialog();
        Ok(())
    }

    /// Delete a project and its tasks; clears the selection if it was the
    /// selected one.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::ProjectNotFound` for an unknown id, or the store
    /// error after rolling back.
    pub async fn delete_project(&mut self, id: ProjectId) -> Result<(), BoardError> {
        if self.project(id).is_none() {
            return Err(BoardError::ProjectNotFound(id));
        }
        let snapshot = self.snapshot();
        self.projects.retain(|p| p.id() != id);
        if self.selected == Some(id) {
            self.clear_selection();
        }
        if self.project_dialog.editing() == Some(id) {
            self.cancel_project_dialog();
        }

        if let Err(e) = self.project_service.delete_project(id).await {
            self.restore(snapshot);
            return Err(self.mutation_failed("delete project", e));
        }
        Ok(())
    }

    // Task dialog

    /// # Errors
    ///
    /// Returns `BoardError::NoProjectSelected` without a selection.
    pub fn open_create_task(&mut self) -> Result<(), BoardError> {
        self.require_selected()?;
        self.task_form.clear();
        self.task_dialog = DialogState::Creating;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `BoardError::NoProjectSelected` without a selection and
    /// `BoardError::TaskNotFound` if the task is not in the selected project.
    pub fn open_edit_task(&mut self, task_id: TaskId) -> Result<(), BoardError> {
        let project = self
            .selected_project()
            .ok_or(BoardError::NoProjectSelected)?;
        let task = project
            .task(task_id)
            .ok_or(BoardError::TaskNotFound(task_id))?;
        self.task_form = TaskForm::prefilled(task.title(), task.description());
        self.task_dialog = DialogState::Editing(task_id);
        Ok(())
    }

    pub fn cancel_task_dialog(&mut self) {
        self.task_dialog = DialogState::Closed;
        self.task_form.clear();
    }

    /// Create or update a task in the selected project.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit_project_dialog`], plus
    /// `BoardError::NoProjectSelected`.
    pub async fn submit_task_dialog(&mut self) -> Result<(), BoardError> {
        let project_id = self.require_selected()?;
        let dialog = self.task_dialog;
        if !dialog.is_open() {
            return Err(BoardError::DialogClosed);
        }
        if !self.task_form.can_submit() {
            return Err(BoardError::SubmitDisabled);
        }
        let title = self.task_form.title.clone();
        let description = self.task_form.description_value();

        match dialog {
            DialogState::Closed => return Err(BoardError::DialogClosed),
            DialogState::Creating => {
                let task = match self
                    .task_service
                    .create_task(project_id, title, description)
                    .await
                {
                    Ok(task) => task,
                    Err(e) => return Err(self.mutation_failed("add task", e)),
                };
                self.project_mut(project_id)
                    .ok_or(BoardError::ProjectNotFound(project_id))?
                    .add_task(task)?;
            }
            DialogState::Editing(task_id) => {
                let snapshot = self.snapshot();
                let project = self
                    .project_mut(project_id)
                    .ok_or(BoardError::ProjectNotFound(project_id))?;
                let mut task = project
                    .task(task_id)
                    .cloned()
                    .ok_or(BoardError::TaskNotFound(task_id))?;
                task.edit(title.as_str(), description.clone())?;
                project.replace_task(task);

                if let Err(e) = self
                    .task_service
                    .update_task(project_id, task_id, title, description)
                    .await
                {
                    self.restore(snapshot);
                    return Err(self.mutation_failed("update task", e));
                }
            }
        }

        self.cancel_task_dialog();
        Ok(())
    }

    /// Flip one task of the selected project.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::NoProjectSelected`, `BoardError::TaskNotFound`,
    /// or the store error after rolling back.
    pub async fn toggle_task(&mut self, task_id: TaskId) -> Result<(), BoardError> {
        let project_id = self.require_selected()?;
        let snapshot = self.snapshot();
        let completed = self
            .project_mut(project_id)
            .and_then(|p| p.toggle_task(task_id))
            .ok_or(BoardError::TaskNotFound(task_id))?;

        if let Err(e) = self
            .task_service
            .set_task_completed(project_id, task_id, completed)
            .await
        {
            self.restore(snapshot);
            return Err(self.mutation_failed("update task", e));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `BoardError::NoProjectSelected`, `BoardError::TaskNotFound`,
    /// or the store error after rolling back.
    pub async fn delete_task(&mut self, task_id: TaskId) -> Result<(), BoardError> {
        let project_id = self.require_selected()?;
        let snapshot = self.snapshot();
        self.project_mut(project_id)
            .and_then(|p| p.remove_task(task_id))
            .ok_or(BoardError::TaskNotFound(task_id))?;
        if self.task_dialog.editing() == Some(task_id) {
            self.cancel_task_dialog();
        }

        if let Err(e) = self.task_service.delete_task(project_id, task_id).await {
            self.restore(snapshot);
            return Err(self.mutation_failed("delete task", e));
        }
        Ok(())
    }

    // Misc

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// End the session and reset the board. The caller navigates to the
    /// returned route.
    pub fn logout(&mut self) -> Route {
        self.auth.logout();
        self.projects.clear();
        self.clear_selection();
        self.cancel_project_dialog();
        self.alert = None;
        Route::SignIn
    }

    /// # Errors
    ///
    /// Returns `BoardError::Theme` if the preference cannot be saved; the
    /// current theme is kept and an alert raised.
    pub async fn toggle_theme(&mut self) -> Result<Theme, BoardError> {
        let next = self.theme.toggled();
        if let Err(e) = self.theme_service.set(next).await {
            return Err(self.mutation_failed("save theme", e));
        }
        self.theme = next;
        Ok(next)
    }

    /// Persist an explicit theme choice.
    ///
    /// # Errors
    ///
    /// Same as [`Self::toggle_theme`].
    pub async fn set_theme(&mut self, theme: Theme) -> Result<(), BoardError> {
        if let Err(e) = self.theme_service.set(theme).await {
            return Err(self.mutation_failed("save theme", e));
        }
        self.theme = theme;
        Ok(())
    }

    // Internals

    fn project_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id() == id)
    }

    fn require_selected(&self) -> Result<ProjectId, BoardError> {
        self.selected.ok_or(BoardError::NoProjectSelected)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            projects: self.projects.clone(),
            selected: self.selected,
            project_dialog: self.project_dialog,
            task_dialog: self.task_dialog,
            project_form: self.project_form.clone(),
            task_form: self.task_form.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.projects = snapshot.projects;
        self.selected = snapshot.selected;
        self.project_dialog = snapshot.project_dialog;
        self.task_dialog = snapshot.task_dialog;
        self.project_form = snapshot.project_form;
        self.task_form = snapshot.task_form;
    }

    fn mutation_failed<E>(&mut self, action: &str, error: E) -> BoardError
    where
        E: std::fmt::Display + Into<BoardError>,
    {
        tracing::error!(action, error = %error, "mutation failed");
        self.alert = Some(Alert::mutation(format!("Could not {action}: {error}")));
        error.into()
    }
}

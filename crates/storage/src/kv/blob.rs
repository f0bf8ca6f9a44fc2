use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taskboard_core::Clock;
use taskboard_core::model::{Project, ProjectId, Task, TaskId, Theme};

use super::wire::{ProjectRecord, TaskRecord, parse_raw_id, same_id};
use super::{KeyValueStore, PROJECTS_KEY, THEME_KEY};
use crate::repository::{
    NewProjectRecord, NewTaskRecord, PreferencesRepository, ProjectRepository, StorageError,
    TaskRepository,
};

/// Repository over a [`KeyValueStore`] holding the full project list as one
/// JSON document.
///
/// Every mutation is a read-modify-write of the whole document, serialized
/// by an internal lock. Ids come from the clock in milliseconds, bumped past
/// the largest id already stored.
pub struct BlobRepository<S> {
    store: Arc<S>,
    clock: Clock,
    write_lock: Arc<Mutex<()>>,
}

impl<S> Clone for BlobRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock,
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<S: KeyValueStore> BlobRepository<S> {
    #[must_use]
    pub fn new(store: S, clock: Clock) -> Self {
        Self {
            store: Arc::new(store),
            clock,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn load(&self) -> Result<Vec<ProjectRecord>, StorageError> {
        match self.store.get(PROJECTS_KEY)? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| StorageError::Serialization(e.to_string())),
        }
    }

    fn save(&self, records: &[ProjectRecord]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(records)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(PROJECTS_KEY, &raw)
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&[ProjectRecord]) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let records = self.load()?;
        f(&records)
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Vec<ProjectRecord>, u64) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records = self.load()?;
        let next_id = next_id(&records, self.clock.timestamp_millis())?;
        let out = f(&mut records, next_id)?;
        self.save(&records)?;
        Ok(out)
    }
}

fn next_id(records: &[ProjectRecord], now_millis: u64) -> Result<u64, StorageError> {
    let mut max_seen = 0;
    for project in records {
        max_seen = max_seen.max(parse_raw_id(&project.id)?);
        for task in &project.tasks {
            max_seen = max_seen.max(parse_raw_id(&task.id)?);
        }
    }
    let after_max = max_seen.checked_add(1).ok_or(StorageError::Conflict)?;
    Ok(now_millis.max(after_max))
}

fn find_project(
    records: &mut [ProjectRecord],
    id: ProjectId,
) -> Result<&mut ProjectRecord, StorageError> {
    records
        .iter_mut()
        .find(|p| same_id(&p.id, id.value()))
        .ok_or(StorageError::NotFound)
}

#[async_trait]
impl<S: KeyValueStore + 'static> ProjectRepository for BlobRepository<S> {
    async fn insert_new_project(
        &self,
        project: NewProjectRecord,
    ) -> Result<ProjectId, StorageError> {
        self.mutate(|records, next| {
            records.push(ProjectRecord {
                id: next.to_string(),
                title: project.title,
                description: project.description.unwrap_or_default(),
                created_at: Some(project.created_at),
                tasks: Vec::new(),
            });
            Ok(ProjectId::new(next))
        })
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        self.read(|records| {
            records
                .iter()
                .find(|p| same_id(&p.id, id.value()))
                .map(ProjectRecord::to_project)
                .transpose()
        })
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        self.read(|records| records.iter().map(ProjectRecord::to_project).collect())
    }

    async fn update_project(&self, project: &Project) -> Result<(), StorageError> {
        self.mutate(|records, _| {
            let stored = find_project(records, project.id())?;
            stored.title = project.title().to_owned();
            stored.description = project.description().unwrap_or_default().to_owned();
            Ok(())
        })
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StorageError> {
        self.mutate(|records, _| {
            let before = records.len();
            records.retain(|p| !same_id(&p.id, id.value()));
            if records.len() == before {
                return Err(StorageError::NotFound);
            }
            Ok(())
        })
    }
}

#[async_trait]
impl<S: KeyValueStore + 'static> TaskRepository for BlobRepository<S> {
    async fn insert_new_task(
        &self,
        project_id: ProjectId,
        task: NewTaskRecord,
    ) -> Result<TaskId, StorageError> {
        self.mutate(|records, next| {
            let project = find_project(records, project_id)?;
            let id = TaskId::new(next);
            project.tasks.push(TaskRecord::from_parts(
                id,
                &task.title,
                task.description.as_deref(),
                task.completed,
            ));
            Ok(id)
        })
    }

    async fn list_tasks(&self, project_id: ProjectId) -> Result<Vec<Task>, StorageError> {
        self.read(|records| {
            let project = records
                .iter()
                .find(|p| same_id(&p.id, project_id.value()))
                .ok_or(StorageError::NotFound)?;
            project.tasks.iter().map(TaskRecord::to_task).collect()
        })
    }

    async fn get_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<Option<Task>, StorageError> {
        self.read(|records| {
            records
                .iter()
                .find(|p| same_id(&p.id, project_id.value()))
                .and_then(|p| p.tasks.iter().find(|t| same_id(&t.id, task_id.value())))
                .map(TaskRecord::to_task)
                .transpose()
        })
    }

    async fn update_task(&self, project_id: ProjectId, task: &Task) -> Result<(), StorageError> {
        self.mutate(|records, _| {
            let project = find_project(records, project_id)?;
            let slot = project
                .tasks
                .iter_mut()
                .find(|t| same_id(&t.id, task.id().value()))
                .ok_or(StorageError::NotFound)?;
            *slot = TaskRecord::from_task(task);
            Ok(())
        })
    }

    async fn delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<(), StorageError> {
        self.mutate(|records, _| {
            let project = find_project(records, project_id)?;
            let before = project.tasks.len();
            project.tasks.retain(|t| !same_id(&t.id, task_id.value()));
            if project.tasks.len() == before {
                return Err(StorageError::NotFound);
            }
            Ok(())
        })
    }
}

#[async_trait]
impl<S: KeyValueStore + 'static> PreferencesRepository for BlobRepository<S> {
    async fn get_theme(&self) -> Result<Option<Theme>, StorageError> {
        let Some(raw) = self.store.get(THEME_KEY)? else {
            return Ok(None);
        };
        match raw.parse::<Theme>() {
            Ok(theme) => Ok(Some(theme)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable theme value");
                Ok(None)
            }
        }
    }

    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.store.set(THEME_KEY, theme.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use taskboard_core::time::{fixed_clock, fixed_now};

    fn repo() -> (MemoryKeyValueStore, BlobRepository<MemoryKeyValueStore>) {
        let store = MemoryKeyValueStore::new();
        (store.clone(), BlobRepository::new(store, fixed_clock()))
    }

    fn project(title: &str) -> NewProjectRecord {
        NewProjectRecord {
            title: title.into(),
            description: None,
            created_at: fixed_now(),
        }
    }

    fn task(title: &str) -> NewTaskRecord {
        NewTaskRecord {
            title: title.into(),
            description: None,
            completed: false,
        }
    }

    #[tokio::test]
    async fn ids_are_time_based_and_unique() {
        let (_, repo) = repo();
        let a = repo.insert_new_project(project("A")).await.unwrap();
        let b = repo.insert_new_project(project("B")).await.unwrap();
        let t = repo.insert_new_task(a, task("T")).await.unwrap();

        assert_eq!(a.value(), 1_700_000_000_000);
        assert_eq!(b.value(), a.value() + 1);
        assert_eq!(t.value(), b.value() + 1);
    }

    #[tokio::test]
    async fn writes_the_browser_document_shape() {
        let (store, repo) = repo();
        let pid = repo.insert_new_project(project("Garden")).await.unwrap();
        repo.insert_new_task(pid, task("Dig")).await.unwrap();

        let raw = store.get(PROJECTS_KEY).unwrap().unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &doc[0];
        assert_eq!(entry["id"], pid.to_string());
        assert_eq!(entry["title"], "Garden");
        assert_eq!(entry["description"], "");
        assert_eq!(entry["tasks"][0]["title"], "Dig");
        assert_eq!(entry["tasks"][0]["completed"], false);
        assert!(entry["tasks"][0]["id"].is_string());
    }

    #[tokio::test]
    async fn delete_project_drops_its_tasks() {
        let (_, repo) = repo();
        let keep = repo.insert_new_project(project("Keep")).await.unwrap();
        let gone = repo.insert_new_project(project("Gone")).await.unwrap();
        let task_id = repo.insert_new_task(gone, task("T")).await.unwrap();

        repo.delete_project(gone).await.unwrap();

        assert!(repo.get_project(gone).await.unwrap().is_none());
        assert!(repo.get_task(gone, task_id).await.unwrap().is_none());
        assert_eq!(repo.list_projects().await.unwrap().len(), 1);
        assert!(matches!(
            repo.delete_project(gone).await,
            Err(StorageError::NotFound)
        ));
        assert!(repo.get_project(keep).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_task_touches_only_that_task() {
        let (_, repo) = repo();
        let pid = repo.insert_new_project(project("P")).await.unwrap();
        let a = repo.insert_new_task(pid, task("A")).await.unwrap();
        let b = repo.insert_new_task(pid, task("B")).await.unwrap();

        let mut stored = repo.get_task(pid, a).await.unwrap().unwrap();
        stored.toggle();
        repo.update_task(pid, &stored).await.unwrap();

        let tasks = repo.list_tasks(pid).await.unwrap();
        assert!(tasks.iter().find(|t| t.id() == a).unwrap().is_completed());
        assert!(!tasks.iter().find(|t| t.id() == b).unwrap().is_completed());
    }

    #[tokio::test]
    async fn theme_is_stored_as_plain_string() {
        let (store, repo) = repo();
        assert_eq!(repo.get_theme().await.unwrap(), None);
        repo.save_theme(Theme::Dark).await.unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(repo.get_theme().await.unwrap(), Some(Theme::Dark));

        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(repo.get_theme().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let (store, repo) = repo();
        store.set(PROJECTS_KEY, "{not json").unwrap();
        assert!(matches!(
            repo.list_projects().await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn exhausted_id_space_is_a_conflict() {
        let (store, repo) = repo();
        let doc = format!(
            r#"[{{"id":"{}","title":"Last","description":"","tasks":[]}}]"#,
            u64::MAX
        );
        store.set(PROJECTS_KEY, &doc).unwrap();

        assert!(matches!(
            repo.insert_new_project(project("Next")).await,
            Err(StorageError::Conflict)
        ));
        let listed = repo.list_projects().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), ProjectId::new(u64::MAX));
    }
}

use storage::repository::{
    NewProjectRecord, NewTaskRecord, PreferencesRepository, ProjectRepository, StorageError,
    TaskRepository,
};
use storage::sqlite::SqliteRepository;
use taskboard_core::model::{ProjectId, TaskId, Theme};
use taskboard_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn project(title: &str, description: Option<&str>) -> NewProjectRecord {
    NewProjectRecord {
        title: title.to_owned(),
        description: description.map(str::to_owned),
        created_at: fixed_now(),
    }
}

fn task(title: &str, completed: bool) -> NewTaskRecord {
    NewTaskRecord {
        title: title.to_owned(),
        description: None,
        completed,
    }
}

#[tokio::test]
async fn sqlite_roundtrip_keeps_task_order_and_progress() {
    let repo = connect("memdb_roundtrip").await;

    let pid = repo
        .insert_new_project(project("Website", Some("Relaunch")))
        .await
        .unwrap();
    repo.insert_new_task(pid, task("A", true)).await.unwrap();
    repo.insert_new_task(pid, task("B", false)).await.unwrap();
    repo.insert_new_task(pid, task("C", false)).await.unwrap();

    let fetched = repo.get_project(pid).await.unwrap().expect("project");
    assert_eq!(fetched.title(), "Website");
    assert_eq!(fetched.description(), Some("Relaunch"));
    assert_eq!(fetched.created_at(), fixed_now());
    let titles: Vec<&str> = fetched.tasks().iter().map(|t| t.title()).collect();
    assert_eq!(titles, ["A", "B", "C"]);
    assert_eq!(fetched.progress(), 33);

    repo.insert_new_task(pid, task("D", true)).await.unwrap();
    let listed = repo.list_projects().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].progress(), 50);
}

#[tokio::test]
async fn sqlite_delete_project_cascades_to_tasks() {
    let repo = connect("memdb_cascade").await;

    let keep = repo.insert_new_project(project("Keep", None)).await.unwrap();
    let gone = repo.insert_new_project(project("Gone", None)).await.unwrap();
    let kept_task = repo.insert_new_task(keep, task("stay", false)).await.unwrap();
    let gone_task = repo.insert_new_task(gone, task("go", false)).await.unwrap();

    repo.delete_project(gone).await.unwrap();

    assert!(repo.get_project(gone).await.unwrap().is_none());
    assert!(repo.get_task(gone, gone_task).await.unwrap().is_none());
    assert!(matches!(
        repo.list_tasks(gone).await,
        Err(StorageError::NotFound)
    ));
    assert!(repo.get_task(keep, kept_task).await.unwrap().is_some());

    let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE project_id = ?1")
        .bind(i64::try_from(gone.value()).unwrap())
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(orphans, 0);

    assert!(matches!(
        repo.delete_project(gone).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_tasks_are_scoped_to_their_project() {
    let repo = connect("memdb_scoped").await;

    let a = repo.insert_new_project(project("A", None)).await.unwrap();
    let b = repo.insert_new_project(project("B", None)).await.unwrap();
    let tid = repo.insert_new_task(a, task("only in A", false)).await.unwrap();

    assert!(repo.get_task(b, tid).await.unwrap().is_none());
    assert!(matches!(
        repo.delete_task(b, tid).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.insert_new_task(ProjectId::new(999), task("nowhere", false))
            .await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.delete_task(a, TaskId::new(999)).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_update_task_toggles_only_that_task() {
    let repo = connect("memdb_toggle").await;

    let pid = repo.insert_new_project(project("P", None)).await.unwrap();
    let first = repo.insert_new_task(pid, task("first", false)).await.unwrap();
    let second = repo.insert_new_task(pid, task("second", false)).await.unwrap();

    let mut stored = repo.get_task(pid, first).await.unwrap().unwrap();
    assert!(stored.toggle());
    stored.edit("first, renamed", Some("now with notes".into())).unwrap();
    repo.update_task(pid, &stored).await.unwrap();

    let first_after = repo.get_task(pid, first).await.unwrap().unwrap();
    let second_after = repo.get_task(pid, second).await.unwrap().unwrap();
    assert!(first_after.is_completed());
    assert_eq!(first_after.title(), "first, renamed");
    assert_eq!(first_after.description(), Some("now with notes"));
    assert!(!second_after.is_completed());
}

#[tokio::test]
async fn sqlite_update_project_keeps_tasks() {
    let repo = connect("memdb_update_project").await;

    let pid = repo.insert_new_project(project("Old", None)).await.unwrap();
    repo.insert_new_task(pid, task("t", false)).await.unwrap();

    let mut stored = repo.get_project(pid).await.unwrap().unwrap();
    stored.edit("New", Some("desc".into())).unwrap();
    repo.update_project(&stored).await.unwrap();

    let after = repo.get_project(pid).await.unwrap().unwrap();
    assert_eq!(after.title(), "New");
    assert_eq!(after.tasks().len(), 1);

    let mut ghost = after.clone();
    repo.delete_project(pid).await.unwrap();
    ghost.edit("Ghost", None).unwrap();
    assert!(matches!(
        repo.update_project(&ghost).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_theme_upserts_single_row() {
    let repo = connect("memdb_theme").await;

    assert_eq!(repo.get_theme().await.unwrap(), None);
    repo.save_theme(Theme::Dark).await.unwrap();
    repo.save_theme(Theme::Light).await.unwrap();
    assert_eq!(repo.get_theme().await.unwrap(), Some(Theme::Light));

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM preferences")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    assert!(repo.list_projects().await.unwrap().is_empty());
}

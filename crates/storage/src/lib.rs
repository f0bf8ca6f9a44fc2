#![forbid(unsafe_code)]

pub mod kv;
pub mod remote;
pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, NewProjectRecord, NewTaskRecord, PreferencesRepository,
    ProjectRepository, Storage, StorageError, TaskRepository,
};

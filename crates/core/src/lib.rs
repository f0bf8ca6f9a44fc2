//! Domain model for the task board: projects, tasks, progress and the
//! small account/theme types the shell needs.

#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod progress;
pub mod time;

pub use error::Error;
pub use progress::{ProgressError, TaskCounts, progress};
pub use time::Clock;

#![forbid(unsafe_code)]

pub mod board;
pub mod context;
pub mod routes;
pub mod vm;

pub use board::{Alert, AlertKind, BoardError, DialogState, LoadingFlag, ProjectBoard};
pub use context::{AppContext, UiApp, build_app_context};
pub use routes::Route;

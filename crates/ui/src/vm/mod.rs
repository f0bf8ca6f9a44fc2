mod header_vm;
mod project_vm;
mod task_vm;
mod time_fmt;

pub use header_vm::{BoardHeaderVm, map_board_header};
pub use project_vm::{ProjectCardVm, map_project_cards};
pub use task_vm::{TaskRowVm, map_task_rows};
pub use time_fmt::format_date;

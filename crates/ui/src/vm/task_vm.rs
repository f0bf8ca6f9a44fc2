use taskboard_core::model::{Task, TaskId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskRowVm {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl TaskRowVm {
    #[must_use]
    pub fn checkbox(&self) -> &'static str {
        if self.completed { "[x]" } else { "[ ]" }
    }
}

impl From<&Task> for TaskRowVm {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            description: task.description().map(str::to_owned),
            completed: task.is_completed(),
        }
    }
}

#[must_use]
pub fn map_task_rows(tasks: &[Task]) -> Vec<TaskRowVm> {
    tasks.iter().map(TaskRowVm::from).collect()
}

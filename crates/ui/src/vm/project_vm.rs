use taskboard_core::model::{Project, ProjectId};

use crate::vm::time_fmt::format_date;

/// One card in the project grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectCardVm {
    pub id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub created_str: String,
    pub completed: u32,
    pub total: u32,
    pub percent: u8,
    pub selected: bool,
}

impl ProjectCardVm {
    /// `"2/3 tasks"`
    #[must_use]
    pub fn tasks_label(&self) -> String {
        format!("{}/{} tasks", self.completed, self.total)
    }

    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{}%", self.percent)
    }
}

impl From<&Project> for ProjectCardVm {
    fn from(project: &Project) -> Self {
        let counts = project.counts();
        Self {
            id: project.id(),
            title: project.title().to_owned(),
            description: project.description().map(str::to_owned),
            created_str: format_date(project.created_at()),
            completed: counts.completed(),
            total: counts.total(),
            percent: project.progress(),
            selected: false,
        }
    }
}

#[must_use]
pub fn map_project_cards(projects: &[Project], selected: Option<ProjectId>) -> Vec<ProjectCardVm> {
    projects
        .iter()
        .map(|project| {
            let mut card = ProjectCardVm::from(project);
            card.selected = selected == Some(project.id());
            card
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::model::{Task, TaskId};
    use taskboard_core::time::fixed_now;

    #[test]
    fn card_reports_counts_and_progress() {
        let tasks = vec![
            Task::from_persisted(TaskId::new(1), "A", None, true).unwrap(),
            Task::from_persisted(TaskId::new(2), "B", None, false).unwrap(),
            Task::from_persisted(TaskId::new(3), "C", None, false).unwrap(),
        ];
        let project =
            Project::from_persisted(ProjectId::new(7), "Site", None, fixed_now(), tasks).unwrap();

        let cards = map_project_cards(&[project], Some(ProjectId::new(7)));
        let card = &cards[0];
        assert_eq!(card.tasks_label(), "1/3 tasks");
        assert_eq!(card.percent_label(), "33%");
        assert_eq!(card.created_str, "2023-11-14");
        assert!(card.selected);
    }
}

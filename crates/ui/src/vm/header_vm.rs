use taskboard_core::model::Project;

/// Page header: the project count, or the selected project's summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardHeaderVm {
    pub title: String,
    pub subtitle: String,
}

#[must_use]
pub fn map_board_header(projects: &[Project], selected: Option<&Project>) -> BoardHeaderVm {
    match selected {
        Some(project) => {
            let counts = project.counts();
            BoardHeaderVm {
                title: project.title().to_owned(),
                subtitle: format!(
                    "{}/{} tasks completed ({}%)",
                    counts.completed(),
                    counts.total(),
                    project.progress()
                ),
            }
        }
        None => BoardHeaderVm {
            title: "Projects".to_owned(),
            subtitle: match projects.len() {
                1 => "1 project".to_owned(),
                n => format!("{n} projects"),
            },
        },
    }
}

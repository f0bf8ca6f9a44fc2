use std::fmt;

use chrono::{DateTime, Utc};
use storage::repository::{NewProjectRecord, NewTaskRecord, Storage};
use taskboard_core::model::{Project, ProjectId, Task, TaskId};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    title: String,
    description: Option<String>,
    tasks: u32,
    completed: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTasks { raw: String },
    InvalidCompleted { raw: String },
    TooManyCompleted { tasks: u32, completed: u32 },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTasks { raw } => write!(f, "invalid --tasks value: {raw}"),
            ArgsError::InvalidCompleted { raw } => write!(f, "invalid --completed value: {raw}"),
            ArgsError::TooManyCompleted { tasks, completed } => {
                write!(f, "--completed ({completed}) exceeds --tasks ({tasks})")
            }
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TASKBOARD_DB_URL")
            .unwrap_or_else(|_| "sqlite://taskboard.sqlite3?mode=rwc".into());
        let mut title = "Demo project".to_owned();
        let mut description = Some("Seeded sample data".to_owned());
        let mut tasks = 4;
        let mut completed = 1;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--title" => {
                    title = require_value(&mut args, "--title")?;
                }
                "--description" => {
                    description = Some(require_value(&mut args, "--description")?);
                }
                "--tasks" => {
                    let value = require_value(&mut args, "--tasks")?;
                    tasks = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidTasks { raw: value.clone() })?;
                }
                "--completed" => {
                    let value = require_value(&mut args, "--completed")?;
                    completed = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCompleted { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if completed > tasks {
            return Err(ArgsError::TooManyCompleted { tasks, completed });
        }

        Ok(Self {
            db_url,
            title,
            description,
            tasks,
            completed,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://taskboard.sqlite3?mode=rwc)");
    eprintln!("  --title <text>            Project title (default: Demo project)");
    eprintln!("  --description <text>      Project description");
    eprintln!("  --tasks <n>               Number of sample tasks (default: 4)");
    eprintln!("  --completed <n>           How many of them start completed (default: 1)");
    eprintln!("  --now <rfc3339>           Fixed creation time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TASKBOARD_DB_URL");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    // Validate through the domain type before handing the record to storage.
    let draft = Project::new(
        ProjectId::new(0),
        args.title.clone(),
        args.description.clone(),
        now,
    )?;
    let project_id = storage
        .projects
        .insert_new_project(NewProjectRecord::from_project(&draft))
        .await?;

    let samples = [
        "Write the brief",
        "Collect requirements",
        "Sketch the layout",
        "Review with the team",
        "Ship it",
    ];
    for i in 0..args.tasks {
        let idx = (i as usize) % samples.len();
        let mut task = Task::new(TaskId::new(0), samples[idx], None)?;
        task.set_completed(i < args.completed);
        storage
            .tasks
            .insert_new_task(project_id, NewTaskRecord::from_task(&task))
            .await?;
    }

    let seeded = storage
        .projects
        .get_project(project_id)
        .await?
        .map_or(0, |p| p.progress());
    println!(
        "Seeded project {} with {} tasks ({}% done) into {}",
        project_id, args.tasks, seeded, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use taskboard_core::model::{ParseIdError, ProjectId, TaskId, Theme};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidId(ParseIdError),
    InvalidBackend { raw: String },
    InvalidDbUrl { raw: String },
    InvalidTheme { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidId(e) => write!(f, "{e}"),
            ArgsError::InvalidBackend { raw } => {
                write!(f, "invalid --backend value (sqlite|file|remote|memory): {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTheme { raw } => {
                write!(f, "invalid theme (light|dark|toggle): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<ParseIdError> for ArgsError {
    fn from(e: ParseIdError) -> Self {
        Self::InvalidId(e)
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    File,
    Remote,
    Memory,
}

impl FromStr for Backend {
    type Err = ArgsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "file" => Ok(Self::File),
            "remote" => Ok(Self::Remote),
            "memory" => Ok(Self::Memory),
            _ => Err(ArgsError::InvalidBackend { raw: s.to_owned() }),
        }
    }
}

/// Where data lives. Flags override the `TASKBOARD_*` environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub db_url: String,
    pub data_dir: PathBuf,
    pub api_url: Option<String>,
    pub api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ArgsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ArgsError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let backend = match non_empty("TASKBOARD_BACKEND") {
            Some(raw) => raw.parse()?,
            None => Backend::Sqlite,
        };
        Ok(Self {
            backend,
            db_url: non_empty("TASKBOARD_DB_URL")
                .map_or_else(|| "sqlite://taskboard.sqlite3".into(), normalize_sqlite_url),
            data_dir: non_empty("TASKBOARD_DATA_DIR")
                .map_or_else(|| PathBuf::from(".taskboard"), PathBuf::from),
            api_url: non_empty("TASKBOARD_API_URL"),
            api_token: non_empty("TASKBOARD_API_TOKEN"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    Show,
    Set(Theme),
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Show {
        project: ProjectId,
    },
    AddProject {
        title: String,
        description: Option<String>,
    },
    EditProject {
        project: ProjectId,
        title: String,
        description: Option<String>,
    },
    DeleteProject {
        project: ProjectId,
    },
    AddTask {
        project: ProjectId,
        title: String,
        description: Option<String>,
    },
    EditTask {
        project: ProjectId,
        task: TaskId,
        title: String,
        description: Option<String>,
    },
    Toggle {
        project: ProjectId,
        task: TaskId,
    },
    DeleteTask {
        project: ProjectId,
        task: TaskId,
    },
    Theme(ThemeArg),
    Login {
        email: String,
        password: String,
    },
    Register {
        name: String,
        email: String,
        password: String,
        confirm_password: String,
    },
    Logout,
    Help,
}

#[derive(Debug)]
pub struct Invocation {
    pub config: Config,
    pub command: Command,
}

/// Positional arguments plus the command's own `--flag value` pairs.
#[derive(Default)]
struct CommandArgs {
    positional: Vec<String>,
    flags: Vec<(String, String)>,
}

impl CommandArgs {
    fn next(&mut self, name: &'static str) -> Result<String, ArgsError> {
        if self.positional.is_empty() {
            return Err(ArgsError::MissingArgument { name });
        }
        Ok(self.positional.remove(0))
    }

    fn next_project(&mut self) -> Result<ProjectId, ArgsError> {
        Ok(self.next("project")?.parse()?)
    }

    fn next_task(&mut self) -> Result<TaskId, ArgsError> {
        Ok(self.next("task")?.parse()?)
    }

    fn flag(&mut self, name: &str) -> Option<String> {
        let index = self.flags.iter().position(|(k, _)| k == name)?;
        Some(self.flags.remove(index).1)
    }

    fn required_flag(&mut self, name: &'static str) -> Result<String, ArgsError> {
        self.flag(name).ok_or(ArgsError::MissingValue { flag: name })
    }

    fn finish(self) -> Result<(), ArgsError> {
        if let Some(extra) = self.positional.into_iter().next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        if let Some((flag, _)) = self.flags.into_iter().next() {
            return Err(ArgsError::UnknownArg(flag));
        }
        Ok(())
    }
}

const COMMAND_FLAGS: [&str; 6] = [
    "--description",
    "--email",
    "--password",
    "--name",
    "--confirm",
    "--title",
];

fn command_flag(flag: &str) -> &'static str {
    COMMAND_FLAGS
        .iter()
        .copied()
        .find(|known| *known == flag)
        .unwrap_or("--description")
}

impl Invocation {
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        mut config: Config,
    ) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let mut name: Option<String> = None;
        let mut rest = CommandArgs::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--backend" => config.backend = require_value(&mut args, "--backend")?.parse()?,
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    config.db_url = normalize_sqlite_url(value);
                }
                "--data-dir" => {
                    config.data_dir = PathBuf::from(require_value(&mut args, "--data-dir")?);
                }
                "--api-url" => config.api_url = Some(require_value(&mut args, "--api-url")?),
                "--api-token" => config.api_token = Some(require_value(&mut args, "--api-token")?),
                "--help" | "-h" => {
                    return Ok(Self {
                        config,
                        command: Command::Help,
                    });
                }
                flag if COMMAND_FLAGS.contains(&flag) => {
                    let value = require_value(&mut args, command_flag(flag))?;
                    rest.flags.push((arg, value));
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if name.is_none() => name = Some(arg),
                _ => rest.positional.push(arg),
            }
        }

        let command = match name.as_deref() {
            None | Some("list") => Command::List,
            Some("show") => Command::Show {
                project: rest.next_project()?,
            },
            Some("add-project") => Command::AddProject {
                title: rest.next("title")?,
                description: rest.flag("--description"),
            },
            Some("edit-project") => Command::EditProject {
                project: rest.next_project()?,
                title: rest.next("title")?,
                description: rest.flag("--description"),
            },
            Some("delete-project") => Command::DeleteProject {
                project: rest.next_project()?,
            },
            Some("add-task") => Command::AddTask {
                project: rest.next_project()?,
                title: rest.next("title")?,
                description: rest.flag("--description"),
            },
            Some("edit-task") => Command::EditTask {
                project: rest.next_project()?,
                task: rest.next_task()?,
                title: rest.next("title")?,
                description: rest.flag("--description"),
            },
            Some("toggle") => Command::Toggle {
                project: rest.next_project()?,
                task: rest.next_task()?,
            },
            Some("delete-task") => Command::DeleteTask {
                project: rest.next_project()?,
                task: rest.next_task()?,
            },
            Some("theme") => {
                let arg = match rest.positional.first().map(String::as_str) {
                    None => ThemeArg::Show,
                    Some("toggle") => ThemeArg::Toggle,
                    Some(raw) => ThemeArg::Set(raw.parse::<Theme>().map_err(|_| {
                        ArgsError::InvalidTheme {
                            raw: raw.to_owned(),
                        }
                    })?),
                };
                if !rest.positional.is_empty() {
                    rest.positional.remove(0);
                }
                Command::Theme(arg)
            }
            Some("login") => Command::Login {
                email: rest.required_flag("--email")?,
                password: rest.required_flag("--password")?,
            },
            Some("register") => {
                let password = rest.required_flag("--password")?;
                Command::Register {
                    name: rest.required_flag("--name")?,
                    email: rest.required_flag("--email")?,
                    confirm_password: rest.flag("--confirm").unwrap_or_else(|| password.clone()),
                    password,
                }
            }
            Some("logout") => Command::Logout,
            Some("help") => Command::Help,
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        rest.finish()?;

        Ok(Self { config, command })
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  taskboard [global options] <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list                                        Projects with progress (default)");
    eprintln!("  show <project>                              Tasks of one project");
    eprintln!("  add-project <title> [--description <text>]");
    eprintln!("  edit-project <project> <title> [--description <text>]");
    eprintln!("  delete-project <project>                    Deletes its tasks too");
    eprintln!("  add-task <project> <title> [--description <text>]");
    eprintln!("  edit-task <project> <task> <title> [--description <text>]");
    eprintln!("  toggle <project> <task>                     Flip completion");
    eprintln!("  delete-task <project> <task>");
    eprintln!("    edit-*: without --description the current one is kept;");
    eprintln!("    --description \"\" clears it");
    eprintln!("  theme [light|dark|toggle]");
    eprintln!("  login --email <email> --password <password>");
    eprintln!("  register --name <name> --email <email> --password <pw> [--confirm <pw>]");
    eprintln!("  logout");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --backend <sqlite|file|remote|memory>       (default: sqlite)");
    eprintln!("  --db <sqlite_url>                           (default: sqlite://taskboard.sqlite3)");
    eprintln!("  --data-dir <dir>                            File store directory (default: .taskboard)");
    eprintln!("  --api-url <url>                             REST base URL");
    eprintln!("  --api-token <token>                         Bearer token for the REST API");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TASKBOARD_BACKEND, TASKBOARD_DB_URL, TASKBOARD_DATA_DIR,");
    eprintln!("  TASKBOARD_API_URL, TASKBOARD_API_TOKEN, TASKBOARD_LOG_JSON, RUST_LOG");
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:")
    {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn parse(args: &[&str]) -> Result<Invocation, ArgsError> {
        Invocation::parse(args.iter().map(|s| (*s).to_owned()), config())
    }

    #[test]
    fn defaults_to_listing_on_sqlite() {
        let inv = parse(&[]).unwrap();
        assert_eq!(inv.command, Command::List);
        assert_eq!(inv.config.backend, Backend::Sqlite);
        assert_eq!(inv.config.db_url, "sqlite://taskboard.sqlite3");
    }

    #[test]
    fn global_flags_mix_with_command_args() {
        let inv = parse(&[
            "add-task",
            "--backend",
            "memory",
            "12",
            "Write docs",
            "--description",
            "all of them",
        ])
        .unwrap();
        assert_eq!(inv.config.backend, Backend::Memory);
        assert_eq!(
            inv.command,
            Command::AddTask {
                project: ProjectId::new(12),
                title: "Write docs".into(),
                description: Some("all of them".into()),
            }
        );
    }

    #[test]
    fn ids_must_be_numeric() {
        assert!(matches!(
            parse(&["toggle", "1", "abc"]),
            Err(ArgsError::InvalidId(_))
        ));
        assert!(matches!(
            parse(&["show"]),
            Err(ArgsError::MissingArgument { name: "project" })
        ));
    }

    #[test]
    fn empty_description_flag_is_kept_for_clearing() {
        let inv = parse(&["edit-task", "3", "7", "Ship", "--description", ""]).unwrap();
        assert_eq!(
            inv.command,
            Command::EditTask {
                project: ProjectId::new(3),
                task: TaskId::new(7),
                title: "Ship".into(),
                description: Some(String::new()),
            }
        );

        let inv = parse(&["edit-project", "3", "Ship"]).unwrap();
        assert!(matches!(
            inv.command,
            Command::EditProject {
                description: None,
                ..
            }
        ));
    }

    #[test]
    fn theme_argument_is_optional() {
        assert_eq!(parse(&["theme"]).unwrap().command, Command::Theme(ThemeArg::Show));
        assert_eq!(
            parse(&["theme", "DARK"]).unwrap().command,
            Command::Theme(ThemeArg::Set(Theme::Dark))
        );
        assert_eq!(
            parse(&["theme", "toggle"]).unwrap().command,
            Command::Theme(ThemeArg::Toggle)
        );
        assert!(matches!(
            parse(&["theme", "sepia"]),
            Err(ArgsError::InvalidTheme { .. })
        ));
    }

    #[test]
    fn login_needs_both_flags() {
        assert!(matches!(
            parse(&["login", "--email", "a@b.c"]),
            Err(ArgsError::MissingValue { flag: "--password" })
        ));
        let inv = parse(&["login", "--email", "a@b.c", "--password", "pw"]).unwrap();
        assert!(matches!(inv.command, Command::Login { .. }));
    }

    #[test]
    fn stray_arguments_are_rejected() {
        assert!(matches!(
            parse(&["delete-project", "1", "2"]),
            Err(ArgsError::UnknownArg(arg)) if arg == "2"
        ));
        assert!(matches!(
            parse(&["list", "--colour", "red"]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse(&["frobnicate"]),
            Err(ArgsError::UnknownCommand(_))
        ));
    }

    #[test]
    fn environment_selects_backend() {
        let config = Config::from_lookup(|key| match key {
            "TASKBOARD_BACKEND" => Some("remote".into()),
            "TASKBOARD_API_URL" => Some("http://localhost:8080".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.backend, Backend::Remote);
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/tasks.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/tasks.db"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}

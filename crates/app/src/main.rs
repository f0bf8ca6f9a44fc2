use std::error::Error;
use std::sync::Arc;

use services::{AppServices, AuthBackend, Clock, LocalAuthBackend, RemoteAuthBackend};
use storage::remote::{API_URL_ENV, RemoteConfig, RemoteConfigError};
use storage::repository::Storage;
use taskboard_core::model::SignUpDraft;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use ui::{BoardError, ProjectBoard, UiApp, build_app_context};

mod cli;

use cli::{ArgsError, Backend, Command, Config, Invocation, ThemeArg, print_usage};

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if env_bool("TASKBOARD_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn remote_config(config: &Config) -> Result<Option<RemoteConfig>, RemoteConfigError> {
    let Some(url) = config.api_url.as_deref() else {
        return Ok(None);
    };
    let remote = RemoteConfig::new(url)?;
    Ok(Some(match config.api_token.as_deref() {
        Some(token) => remote.with_token(token),
        None => remote,
    }))
}

async fn build_storage(
    config: &Config,
    remote: Option<&RemoteConfig>,
) -> Result<Storage, Box<dyn Error>> {
    let storage = match config.backend {
        Backend::Sqlite => {
            prepare_sqlite_file(&config.db_url)?;
            Storage::sqlite(&config.db_url).await?
        }
        Backend::File => Storage::json_file(&config.data_dir)?,
        Backend::Memory => Storage::in_memory(),
        Backend::Remote => {
            let remote = remote.ok_or(RemoteConfigError::Missing(API_URL_ENV))?;
            let local = Storage::json_file(&config.data_dir)?;
            Storage::remote(remote.clone(), local.preferences)
        }
    };
    tracing::debug!(backend = ?config.backend, "storage ready");
    Ok(storage)
}

/// Turn a failed board operation into the message the board raised for it.
fn surface<T>(board: &ProjectBoard, result: Result<T, BoardError>) -> Result<T, Box<dyn Error>> {
    result.map_err(|err| match board.alert() {
        Some(alert) => format!("{alert} ({err})").into(),
        None => Box::new(err) as Box<dyn Error>,
    })
}

fn print_projects(board: &ProjectBoard) {
    let header = board.header();
    println!("{} ({})", header.title, header.subtitle);
    for card in board.project_cards() {
        println!(
            "#{:<6} {:<32} {:>10} {:>5}  {}",
            card.id,
            card.title,
            card.tasks_label(),
            card.percent_label(),
            card.created_str
        );
    }
}

fn print_selected(board: &ProjectBoard) {
    let header = board.header();
    println!("{}", header.title);
    println!("{}", header.subtitle);
    if let Some(description) = board.selected_project().and_then(|p| p.description()) {
        println!("{description}");
    }
    for row in board.task_rows() {
        match row.description.as_deref() {
            Some(description) => {
                println!("  {} #{:<6} {} ({description})", row.checkbox(), row.id, row.title);
            }
            None => println!("  {} #{:<6} {}", row.checkbox(), row.id, row.title),
        }
    }
}

/// `None` keeps the prefilled description; an empty string clears it.
fn fill_form(form: &mut ui::board::ItemForm, title: String, description: Option<String>) {
    form.title = title;
    if let Some(description) = description {
        form.description = description;
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let invocation = Invocation::parse(std::env::args().skip(1), Config::from_env()?)?;
    let Invocation { config, command } = invocation;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    let clock = Clock::default_clock();
    let remote = remote_config(&config)?;
    let storage = build_storage(&config, remote.as_ref()).await?;
    let auth: Arc<dyn AuthBackend> = match remote {
        Some(remote) => Arc::new(RemoteAuthBackend::new(remote)),
        None => Arc::new(LocalAuthBackend::permissive()),
    };
    let app: Arc<dyn UiApp> = Arc::new(AppServices::from_storage(&storage, clock, auth));
    let ctx = build_app_context(&app);

    match command {
        Command::Login { email, password } => {
            let session = ctx.auth().login(&email, &password).await?;
            println!("signed in as {}", session.email());
            if config.api_url.is_some() {
                println!("export TASKBOARD_API_TOKEN={}", session.token());
            }
            return Ok(());
        }
        Command::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            ctx.auth()
                .register(SignUpDraft {
                    name,
                    email: email.clone(),
                    password,
                    confirm_password,
                })
                .await?;
            println!("registered {email}; sign in with `taskboard login`");
            return Ok(());
        }
        _ => {}
    }

    let mut board = ProjectBoard::new(&ctx);
    let loaded = board.load().await;
    surface(&board, loaded)?;

    match command {
        Command::List => print_projects(&board),
        Command::Show { project } => {
            let selected = board.select_project(project).await;
            surface(&board, selected)?;
            print_selected(&board);
        }
        Command::AddProject { title, description } => {
            board.open_create_project();
            fill_form(board.project_form_mut(), title, description);
            let submitted = board.submit_project_dialog().await;
            surface(&board, submitted)?;
            print_projects(&board);
        }
        Command::EditProject {
            project,
            title,
            description,
        } => {
            let opened = board.open_edit_project(project);
            surface(&board, opened)?;
            fill_form(board.project_form_mut(), title, description);
            let submitted = board.submit_project_dialog().await;
            surface(&board, submitted)?;
            print_projects(&board);
        }
        Command::DeleteProject { project } => {
            let deleted = board.delete_project(project).await;
            surface(&board, deleted)?;
            print_projects(&board);
        }
        Command::AddTask {
            project,
            title,
            description,
        } => {
            let selected = board.select_project(project).await;
            surface(&board, selected)?;
            let opened = board.open_create_task();
            surface(&board, opened)?;
            fill_form(board.task_form_mut(), title, description);
            let submitted = board.submit_task_dialog().await;
            surface(&board, submitted)?;
            print_selected(&board);
        }
        Command::EditTask {
            project,
            task,
            title,
            description,
        } => {
            let selected = board.select_project(project).await;
            surface(&board, selected)?;
            let opened = board.open_edit_task(task);
            surface(&board, opened)?;
            fill_form(board.task_form_mut(), title, description);
            let submitted = board.submit_task_dialog().await;
            surface(&board, submitted)?;
            print_selected(&board);
        }
        Command::Toggle { project, task } => {
            let selected = board.select_project(project).await;
            surface(&board, selected)?;
            let toggled = board.toggle_task(task).await;
            surface(&board, toggled)?;
            print_selected(&board);
        }
        Command::DeleteTask { project, task } => {
            let selected = board.select_project(project).await;
            surface(&board, selected)?;
            let deleted = board.delete_task(task).await;
            surface(&board, deleted)?;
            print_selected(&board);
        }
        Command::Theme(ThemeArg::Show) => println!("{}", board.theme()),
        Command::Theme(ThemeArg::Set(theme)) => {
            let saved = board.set_theme(theme).await;
            surface(&board, saved)?;
            println!("{}", board.theme());
        }
        Command::Theme(ThemeArg::Toggle) => {
            let toggled = board.toggle_theme().await;
            println!("{}", surface(&board, toggled)?);
        }
        Command::Logout => {
            let next = board.logout();
            println!("signed out; continue at {next}");
        }
        Command::Login { .. } | Command::Register { .. } | Command::Help => {}
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn Error>> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        if err.downcast_ref::<ArgsError>().is_some() {
            print_usage();
            std::process::exit(2);
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ui::board::ItemForm;

    #[test]
    fn omitted_description_keeps_the_current_one() {
        let mut form = ItemForm::prefilled("Old", Some("notes"));
        fill_form(&mut form, "New".into(), None);
        assert_eq!(form.title, "New");
        assert_eq!(form.description_value().as_deref(), Some("notes"));
    }

    #[test]
    fn empty_description_clears_it() {
        let mut form = ItemForm::prefilled("Old", Some("notes"));
        fill_form(&mut form, "Old".into(), Some(String::new()));
        assert_eq!(form.description_value(), None);
    }
}

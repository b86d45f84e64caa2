use clap::Parser;
use std::io;
use todo_manager_cli::cli::{Cli, Command};
use todo_manager_cli::menu::Menu;
use todo_manager_cli::render::{error_lines, task_json, tasks_json, tasks_table};
use todo_manager_core::config::{self, Config, ConfigOverrides, Palette, palette_for_theme};
use todo_manager_core::storage::json_store;
use todo_manager_core::{AppError, Task, TaskEdit, TaskFilter, TaskStore, parse_due_date};
use tracing_subscriber::filter::LevelFilter;

fn init_logging(config: &Config) {
    let level = config
        .effective_log_level()
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::WARN);
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn load_config(overrides: &[String]) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    let overrides = ConfigOverrides::parse(overrides)?;
    let config = config::merge_overrides(&loaded.config, &overrides);

    init_logging(&config);
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "ignoring configuration file");
    }
    Ok(config)
}

fn report(err: &AppError) {
    for line in error_lines(err) {
        eprintln!("{line}");
    }
}

fn print_tasks(tasks: &[Task], json: bool, palette: &Palette) -> Result<(), AppError> {
    if json {
        println!("{}", tasks_json(tasks)?);
    } else {
        println!("{}", tasks_table(tasks, palette));
    }
    Ok(())
}

fn fail(err: &AppError) -> ! {
    eprintln!("ERROR: {err}");
    std::process::exit(1);
}

/// Opens the store for a one-shot command. Unlike the menu, a command never
/// continues with an empty store over a file it could not read.
fn open_store(config: &Config) -> Result<TaskStore, AppError> {
    let path = json_store::store_path_with_config(config)?;
    let opened = TaskStore::open(path);
    match opened.error {
        Some(err) => Err(err),
        None => Ok(opened.store),
    }
}

fn run_command(cli: Cli, mut store: TaskStore, palette: &Palette) -> Result<(), AppError> {
    match cli.command {
        Command::Add {
            title,
            description,
            due,
        } => {
            let due_date = parse_due_date(&due)?;
            let id = store.add(&title, &description, due_date)?;
            let task = store
                .tasks()
                .iter()
                .find(|task| task.id == id)
                .ok_or_else(|| AppError::not_found(&title))?;
            if cli.json {
                println!("{}", task_json(task)?);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::List => {
            let tasks = store.list()?;
            print_tasks(&tasks, cli.json, palette)?;
        }
        Command::Filter { which } => {
            let tasks = store.filter(TaskFilter::from(which))?;
            print_tasks(&tasks, cli.json, palette)?;
        }
        Command::Find { query } => {
            let task = store.find_by_title_substring(&query)?;
            if cli.json {
                println!("{}", task_json(task)?);
            } else {
                println!("{}", task.render());
            }
        }
        Command::Status { query, state } => {
            let task = store.set_status(&query, state.is_completed())?;
            if cli.json {
                println!("{}", task_json(&task)?);
            } else {
                println!("Marked task {}: {} ({})", task.status_label(), task.title, task.id);
            }
        }
        Command::Edit {
            query,
            title,
            description,
            due,
        } => {
            let outcome = store.edit(
                &query,
                TaskEdit {
                    title,
                    description,
                    due_date: due,
                },
            )?;
            if let Some(err) = outcome.rejected_due_date.as_ref() {
                report(err);
            }
            if cli.json {
                println!("{}", task_json(&outcome.task)?);
            } else if outcome.changed {
                println!("Updated task: {} ({})", outcome.task.title, outcome.task.id);
            } else {
                println!("No changes: {} ({})", outcome.task.title, outcome.task.id);
            }
        }
        Command::Delete { query } => {
            let task = store.delete(&query)?;
            if cli.json {
                println!("{}", task_json(&task)?);
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let config = load_config(&[])?;
    let palette = palette_for_theme(config.theme.as_deref());
    let path = json_store::store_path_with_config(&config)?;

    let opened = TaskStore::open(path);
    if let Some(err) = opened.error.as_ref() {
        eprintln!("ERROR: {err}");
        eprintln!(
            "WARNING: starting with an empty task list; any change will replace {}",
            opened.store.path().display()
        );
    }

    let stdin = io::stdin();
    let menu = Menu::new(opened.store, palette, stdin.lock(), io::stdout(), io::stderr());
    menu.run()
        .map(|_| ())
        .map_err(|err| AppError::persistence(format!("console I/O failed: {err}")))
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            fail(&err);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let rendered = err.to_string();
            let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
            let message = first_line.strip_prefix("error: ").unwrap_or(first_line);
            fail(&AppError::validation(message));
        }
    };

    let config = load_config(&cli.config_override).unwrap_or_else(|err| fail(&err));
    let palette = palette_for_theme(config.theme.as_deref());
    let store = open_store(&config).unwrap_or_else(|err| fail(&err));

    if let Err(err) = run_command(cli, store, &palette) {
        report(&err);
        std::process::exit(1);
    }
}

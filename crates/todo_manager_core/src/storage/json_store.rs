use crate::config;
use crate::error::AppError;
use crate::model::Task;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "TODO_MANAGER_STORE_PATH";

pub fn store_path_with_config(config: &config::Config) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = config.store_path.as_ref() {
        return Ok(path.clone());
    }

    Ok(config::app_dir()?.join(STORE_FILE_NAME))
}

/// Reads the task array at `path`. A missing or blank file is an empty store.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no backing file, starting empty");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::persistence(format!("{}: {}", path.display(), err)))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let tasks: Vec<Task> = serde_json::from_str(&content).map_err(|err| {
        AppError::persistence(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    check_invariants(&tasks)?;

    tracing::debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

fn check_invariants(tasks: &[Task]) -> Result<(), AppError> {
    let mut ids = HashSet::new();
    let mut titles = HashSet::new();

    for task in tasks {
        if task.title.trim().is_empty() {
            return Err(AppError::persistence("stored task has an empty title"));
        }
        if task.description.trim().is_empty() {
            return Err(AppError::persistence(format!(
                "stored task '{}' has an empty description",
                task.title
            )));
        }
        if !ids.insert(task.id) {
            return Err(AppError::persistence(format!("duplicate task id {}", task.id)));
        }
        if !titles.insert(task.title.trim().to_lowercase()) {
            return Err(AppError::persistence(format!(
                "duplicate task title '{}'",
                task.title
            )));
        }
    }

    Ok(())
}

/// Writes the whole collection to a sibling temp file, then renames it over
/// `path` so readers never see a truncated file.
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| AppError::persistence(err.to_string()))?;
    }

    let content = serde_json::to_string_pretty(tasks)
        .map_err(|err| AppError::persistence(err.to_string()))?;
    let tmp = temp_sibling(path);

    if let Err(err) = write_and_replace(&tmp, path, &content) {
        std::fs::remove_file(&tmp).ok();
        return Err(err);
    }

    tracing::debug!(path = %path.display(), count = tasks.len(), "saved tasks");
    Ok(())
}

fn write_and_replace(tmp: &Path, path: &Path, content: &str) -> Result<(), AppError> {
    std::fs::write(tmp, content).map_err(|err| AppError::persistence(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(tmp, permissions)
            .map_err(|err| AppError::persistence(err.to_string()))?;
    }

    std::fs::rename(tmp, path).map_err(|err| {
        AppError::persistence(format!("failed to replace {}: {}", path.display(), err))
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| STORE_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}

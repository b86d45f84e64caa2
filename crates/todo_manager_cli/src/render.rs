use tabled::{Table, Tabled};
use todo_manager_core::config::Palette;
use todo_manager_core::{AppError, Task};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "ID")]
    id: String,
}

pub fn tasks_table(tasks: &[Task], palette: &Palette) -> String {
    let rows = tasks.iter().map(|task| TaskRow {
        title: palette.accentize(&task.title),
        due: task.due_date.date().to_string(),
        status: task.status_label(),
        description: task.description.clone(),
        id: palette.mutedize(&task.id.to_string()),
    });
    Table::new(rows).to_string()
}

pub fn task_json(task: &Task) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(task).map_err(|err| AppError::persistence(err.to_string()))
}

pub fn tasks_json(tasks: &[Task]) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(tasks).map_err(|err| AppError::persistence(err.to_string()))
}

/// Message shown for a failure; save failures also say the change is only in memory.
pub fn error_lines(err: &AppError) -> Vec<String> {
    let mut lines = vec![format!("ERROR: {err}")];
    if matches!(err, AppError::Persistence(_)) {
        lines.push(
            "WARNING: the change is kept for this session but may not survive a restart"
                .to_string(),
        );
    }
    lines
}

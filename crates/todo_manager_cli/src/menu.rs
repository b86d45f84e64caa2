//! Numbered console menu driving a [`TaskStore`].
//!
//! Reads one answer per line. Blank answers to the edit prompts mean "keep".
//! End of input behaves like choosing Exit.

use crate::render::error_lines;
use std::io::{self, BufRead, Write};
use todo_manager_core::config::Palette;
use todo_manager_core::{AppError, TaskEdit, TaskFilter, TaskStore, parse_due_date};

enum MenuError {
    App(AppError),
    Io(io::Error),
    Closed,
}

impl From<AppError> for MenuError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<io::Error> for MenuError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

pub struct Menu<R, W, E> {
    store: TaskStore,
    palette: Palette,
    input: R,
    out: W,
    err: E,
}

impl<R: BufRead, W: Write, E: Write> Menu<R, W, E> {
    pub fn new(store: TaskStore, palette: Palette, input: R, out: W, err: E) -> Self {
        Self {
            store,
            palette,
            input,
            out,
            err,
        }
    }

    /// Runs until Exit or end of input, saves anything still unsaved, and hands
    /// the store back. A session that changed nothing leaves the file alone.
    pub fn run(mut self) -> io::Result<TaskStore> {
        loop {
            writeln!(self.out, "{}", self.palette.accentize("=== Todo Manager ==="))?;
            writeln!(self.out, "1. Add Task")?;
            writeln!(self.out, "2. Show Tasks")?;
            writeln!(self.out, "3. Search Tasks")?;
            writeln!(self.out, "4. Update Task Status")?;
            writeln!(self.out, "5. Delete Task")?;
            writeln!(self.out, "6. Edit Task")?;
            writeln!(self.out, "0. Exit")?;

            let choice = match self.read_line() {
                Ok(line) => line,
                Err(MenuError::Closed) => break,
                Err(MenuError::Io(err)) => return Err(err),
                Err(MenuError::App(err)) => {
                    self.report(&err)?;
                    continue;
                }
            };

            let result = match choice.trim() {
                "1" => self.add_task(),
                "2" => self.show(TaskFilter::All),
                "3" => self.search(),
                "4" => self.update_status(),
                "5" => self.delete_task(),
                "6" => self.edit_task(),
                "0" => break,
                _ => {
                    writeln!(self.out, "Invalid input. Please try again.")?;
                    Ok(())
                }
            };

            match result {
                Ok(()) => {}
                Err(MenuError::App(err)) => self.report(&err)?,
                Err(MenuError::Io(err)) => return Err(err),
                Err(MenuError::Closed) => break,
            }
            writeln!(self.out)?;
        }

        if self.store.has_unsaved_changes()
            && let Err(err) = self.store.save()
        {
            self.report(&err)?;
        }
        writeln!(self.out, "Exiting...")?;
        self.out.flush()?;
        Ok(self.store)
    }

    fn add_task(&mut self) -> Result<(), MenuError> {
        let title = self.prompt("Enter Task Title:")?;
        let description = self.prompt("Enter Task Description:")?;
        let mut answer = self.prompt("Enter Task Due Date (yyyy-MM-dd):")?;
        let due_date = loop {
            match parse_due_date(&answer) {
                Ok(parsed) => break parsed,
                Err(_) => {
                    answer = self.prompt("Invalid date format. Please enter again (yyyy-MM-dd):")?;
                }
            }
        };

        self.store.add(&title, &description, due_date)?;
        writeln!(self.out, "Task added.")?;
        Ok(())
    }

    fn show(&mut self, filter: TaskFilter) -> Result<(), MenuError> {
        let tasks = self.store.filter(filter)?;
        let heading = match filter {
            TaskFilter::All => "Tasks:",
            TaskFilter::CompletedOnly => "Completed Tasks:",
            TaskFilter::PendingOnly => "Pending Tasks:",
        };
        writeln!(self.out, "{}", self.palette.accentize(heading))?;
        for task in &tasks {
            writeln!(self.out, "{}", task.render())?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn search(&mut self) -> Result<(), MenuError> {
        loop {
            let choice = self.prompt(
                "Enter Task Filter:\n1. Show All Tasks\n2. Show Completed Tasks\n3. Show Pending Tasks\n0. Exit Search",
            )?;
            let filter = match choice.trim() {
                "1" => TaskFilter::All,
                "2" => TaskFilter::CompletedOnly,
                "3" => TaskFilter::PendingOnly,
                "0" => {
                    writeln!(self.out, "Exiting search...")?;
                    return Ok(());
                }
                _ => {
                    self.report(&AppError::validation(
                        "invalid filter option, enter 1, 2, 3 or 0",
                    ))?;
                    continue;
                }
            };

            // an empty result ends that pick, not the search loop
            match self.show(filter) {
                Err(MenuError::App(err)) => self.report(&err)?,
                other => other?,
            }
        }
    }

    fn update_status(&mut self) -> Result<(), MenuError> {
        let query = self.prompt("Enter Task Title:")?;
        let current = self.store.find_by_title_substring(&query)?.status_label();
        writeln!(self.out, "Current Status: {current}")?;

        let answer = self.prompt("Enter New Status: 'Done' or 'Pending'")?;
        let completed = match answer.trim().to_lowercase().as_str() {
            "done" => true,
            "pending" => false,
            _ => {
                let err = AppError::validation("invalid status, enter 'Done' or 'Pending'");
                return Err(err.into());
            }
        };

        self.store.set_status(&query, completed)?;
        let label = if completed { "completed" } else { "pending" };
        writeln!(self.out, "Task marked as {label}.")?;
        Ok(())
    }

    fn delete_task(&mut self) -> Result<(), MenuError> {
        let query = self.prompt("Enter Task Title:")?;
        let removed = self.store.delete(&query)?;
        writeln!(self.out, "Task deleted: {}", removed.title)?;
        Ok(())
    }

    fn edit_task(&mut self) -> Result<(), MenuError> {
        let query = self.prompt("Enter Task Title to edit:")?;
        let title = self.store.find_by_title_substring(&query)?.title.clone();
        writeln!(self.out, "Editing Task: {title}")?;

        let edit = TaskEdit {
            title: Some(self.prompt("New Title (leave blank to keep current):")?),
            description: Some(self.prompt("New Description (leave blank to keep current):")?),
            due_date: Some(self.prompt("New Due Date (yyyy-MM-dd) or press Enter to skip:")?),
        };

        let outcome = self.store.edit(&query, edit)?;
        if let Some(err) = outcome.rejected_due_date.as_ref() {
            self.report(err)?;
        }
        if outcome.changed {
            writeln!(self.out, "Task Updated")?;
        } else {
            writeln!(self.out, "No changes.")?;
        }
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> Result<String, MenuError> {
        writeln!(self.out, "{label}")?;
        self.read_line()
    }

    fn read_line(&mut self) -> Result<String, MenuError> {
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MenuError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn report(&mut self, err: &AppError) -> io::Result<()> {
        for line in error_lines(err) {
            writeln!(self.err, "{line}")?;
        }
        Ok(())
    }
}

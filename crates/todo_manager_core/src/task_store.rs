use crate::dates::parse_due_date;
use crate::error::AppError;
use crate::model::{Task, TaskFilter};
use crate::storage::json_store;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use uuid::Uuid;

/// In-memory task collection backed by a JSON file.
///
/// Every mutating operation writes the whole collection back. A failed write
/// is returned to the caller but the in-memory change is kept, and the store
/// stays marked unsaved until a later save succeeds.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
    unsaved: bool,
}

/// Result of [`TaskStore::open`]: the store plus any load failure, in which
/// case the store is empty.
#[derive(Debug)]
pub struct StoreOpen {
    pub store: TaskStore,
    pub error: Option<AppError>,
}

/// Fields to overwrite in [`TaskStore::edit`]. `None` or blank means keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub task: Task,
    /// Set when the new due date text could not be parsed; the old date is kept.
    pub rejected_due_date: Option<AppError>,
    pub changed: bool,
}

impl TaskStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            tasks: Vec::new(),
            unsaved: false,
        }
    }

    pub fn open<P: Into<PathBuf>>(path: P) -> StoreOpen {
        let mut store = Self::new(path);
        let error = store.load().err();
        if let Some(err) = error.as_ref() {
            tracing::warn!(
                path = %store.path.display(),
                error = %err,
                "starting with an empty store"
            );
        }
        StoreOpen { store, error }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// True when the collection differs from what was last loaded or saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Replaces the collection with the backing file's content. On failure the
    /// store is left empty, never partially populated.
    pub fn load(&mut self) -> Result<(), AppError> {
        self.unsaved = false;
        match json_store::load_tasks(&self.path) {
            Ok(tasks) => {
                self.tasks = tasks;
                Ok(())
            }
            Err(err) => {
                self.tasks.clear();
                Err(err)
            }
        }
    }

    pub fn save(&mut self) -> Result<(), AppError> {
        json_store::save_tasks(&self.path, &self.tasks).inspect_err(|err| {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to save tasks");
        })?;
        self.unsaved = false;
        Ok(())
    }

    pub fn add(
        &mut self,
        title: &str,
        description: &str,
        due_date: OffsetDateTime,
    ) -> Result<Uuid, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("title cannot be empty"));
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::validation("description cannot be empty"));
        }

        if due_date < OffsetDateTime::now_utc() {
            return Err(AppError::validation("due date cannot be in the past"));
        }

        if self.title_taken(title, None) {
            return Err(AppError::duplicate_title(title));
        }

        let task = Task::new(title.to_string(), description.to_string(), due_date);
        let id = task.id;
        self.tasks.push(task);
        self.unsaved = true;
        tracing::info!(%id, title, "added task");

        self.save()?;
        Ok(id)
    }

    /// All tasks ordered by due date.
    pub fn list(&self) -> Result<Vec<Task>, AppError> {
        self.filter(TaskFilter::All)
    }

    pub fn filter(&self, filter: TaskFilter) -> Result<Vec<Task>, AppError> {
        let mut matching: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();

        if matching.is_empty() {
            return Err(AppError::empty_store(filter.empty_message()));
        }

        // stable: equal due dates keep store order
        matching.sort_by_key(|task| task.due_date);
        Ok(matching)
    }

    /// First task in store order whose title contains `query`, ignoring case.
    pub fn find_by_title_substring(&self, query: &str) -> Result<&Task, AppError> {
        let index = self.position_of(query)?;
        Ok(&self.tasks[index])
    }

    pub fn set_status(&mut self, query: &str, completed: bool) -> Result<Task, AppError> {
        let index = self.position_of(query)?;
        let task = &mut self.tasks[index];
        task.is_completed = completed;
        let updated = task.clone();
        self.unsaved = true;
        tracing::info!(id = %updated.id, completed, "updated task status");

        self.save()?;
        Ok(updated)
    }

    pub fn edit(&mut self, query: &str, edit: TaskEdit) -> Result<EditOutcome, AppError> {
        let index = self.position_of(query)?;

        let new_title = non_blank(edit.title.as_deref());
        let new_description = non_blank(edit.description.as_deref());

        if let Some(title) = new_title
            && self.title_taken(title, Some(index))
        {
            return Err(AppError::duplicate_title(title));
        }

        let mut rejected_due_date = None;
        let new_due_date = match non_blank(edit.due_date.as_deref()) {
            Some(text) => match parse_due_date(text) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    tracing::warn!(error = %err, "keeping previous due date");
                    rejected_due_date = Some(err);
                    None
                }
            },
            None => None,
        };

        let task = &mut self.tasks[index];
        let mut changed = false;

        if let Some(title) = new_title
            && task.title != title
        {
            task.title = title.to_string();
            changed = true;
        }
        if let Some(description) = new_description
            && task.description != description
        {
            task.description = description.to_string();
            changed = true;
        }
        if let Some(due_date) = new_due_date
            && task.due_date != due_date
        {
            task.due_date = due_date;
            changed = true;
        }

        let updated = task.clone();
        if changed {
            self.unsaved = true;
            tracing::info!(id = %updated.id, "edited task");
            self.save()?;
        }

        Ok(EditOutcome {
            task: updated,
            rejected_due_date,
            changed,
        })
    }

    pub fn delete(&mut self, query: &str) -> Result<Task, AppError> {
        let index = self.position_of(query)?;
        let removed = self.tasks.remove(index);
        self.unsaved = true;
        tracing::info!(id = %removed.id, title = %removed.title, "deleted task");

        self.save()?;
        Ok(removed)
    }

    fn position_of(&self, query: &str) -> Result<usize, AppError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(AppError::not_found_blank());
        }

        if self.tasks.is_empty() {
            return Err(AppError::empty_store("no tasks available"));
        }

        let needle = trimmed.to_lowercase();
        self.tasks
            .iter()
            .position(|task| task.title.to_lowercase().contains(&needle))
            .ok_or_else(|| AppError::not_found(trimmed))
    }

    fn title_taken(&self, title: &str, except: Option<usize>) -> bool {
        let folded = title.trim().to_lowercase();
        self.tasks
            .iter()
            .enumerate()
            .any(|(index, task)| Some(index) != except && task.title.trim().to_lowercase() == folded)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{TaskEdit, TaskStore};
    use crate::model::{Task, TaskFilter};
    use crate::storage::json_store;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("todo-manager-{nanos}-{file_name}"))
    }

    fn future() -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::days(30)
    }

    fn task(title: &str, due_date: OffsetDateTime) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{title} details"),
            due_date,
            is_completed: false,
        }
    }

    /// A, B, C due March, January, February 2025.
    fn seeded_store(file_name: &str) -> TaskStore {
        let path = temp_path(file_name);
        let tasks = vec![
            task("A", datetime!(2025-03-01 00:00:00 UTC)),
            task("B", datetime!(2025-01-01 00:00:00 UTC)),
            task("C", datetime!(2025-02-01 00:00:00 UTC)),
        ];
        json_store::save_tasks(&path, &tasks).unwrap();
        let opened = TaskStore::open(&path);
        assert!(opened.error.is_none());
        opened.store
    }

    fn cleanup(store: &TaskStore) {
        std::fs::remove_file(store.path()).ok();
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.title.as_str()).collect()
    }

    #[test]
    fn add_persists_and_is_findable_by_full_title() {
        let path = temp_path("add.json");
        let mut store = TaskStore::new(&path);

        let id = store.add("Buy milk", "two litres", future()).unwrap();
        let found = store.find_by_title_substring("Buy milk").unwrap().clone();
        let reopened = TaskStore::open(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(found.id, id);
        assert!(!found.is_completed);
        assert!(reopened.error.is_none());
        assert_eq!(reopened.store.tasks(), &[found]);
    }

    #[test]
    fn add_trims_title_and_description() {
        let path = temp_path("add-trim.json");
        let mut store = TaskStore::new(&path);

        store.add("  Buy milk ", "\ttwo litres ", future()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(store.tasks()[0].title, "Buy milk");
        assert_eq!(store.tasks()[0].description, "two litres");
    }

    #[test]
    fn add_rejects_blank_title() {
        let path = temp_path("blank-title.json");
        let mut store = TaskStore::new(&path);

        let err = store.add("  ", "desc", future()).unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn add_rejects_blank_description() {
        let mut store = TaskStore::new(temp_path("blank-description.json"));

        let err = store.add("title", " \n", future()).unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert!(store.is_empty());
    }

    #[test]
    fn add_rejects_past_due_date() {
        let mut store = TaskStore::new(temp_path("past.json"));
        let yesterday = OffsetDateTime::now_utc() - Duration::days(1);

        let err = store.add("title", "desc", yesterday).unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert!(store.is_empty());
    }

    #[test]
    fn add_rejects_duplicate_title_ignoring_case() {
        let path = temp_path("duplicate.json");
        let mut store = TaskStore::new(&path);
        store.add("Buy Milk", "first", future()).unwrap();

        let err = store
            .add("bUY mILK", "other description", future() + Duration::days(3))
            .unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "duplicate_title");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn list_orders_by_due_date() {
        let store = seeded_store("list-order.json");
        let listed = store.list().unwrap();
        cleanup(&store);

        assert_eq!(titles(&listed), vec!["B", "C", "A"]);
    }

    #[test]
    fn list_keeps_store_order_for_equal_due_dates() {
        let due = datetime!(2025-05-01 12:00:00 UTC);
        let store = TaskStore {
            path: temp_path("ties.json"),
            tasks: vec![task("first", due), task("second", due), task("third", due)],
            unsaved: false,
        };

        let listed = store.list().unwrap();

        assert_eq!(titles(&listed), vec!["first", "second", "third"]);
    }

    #[test]
    fn list_on_empty_store_fails() {
        let store = TaskStore::new(temp_path("empty-list.json"));
        assert_eq!(store.list().unwrap_err().code(), "empty_store");
    }

    #[test]
    fn filter_completed_after_set_status() {
        let mut store = seeded_store("filter-completed.json");

        store.set_status("A", true).unwrap();
        let completed = store.filter(TaskFilter::CompletedOnly).unwrap();
        let pending = store.filter(TaskFilter::PendingOnly).unwrap();
        let reopened = TaskStore::open(store.path());
        cleanup(&store);

        assert_eq!(titles(&completed), vec!["A"]);
        assert_eq!(titles(&pending), vec!["B", "C"]);
        assert!(reopened.store.find_by_title_substring("A").unwrap().is_completed);
    }

    #[test]
    fn filter_with_no_matches_fails() {
        let store = seeded_store("filter-none.json");
        let err = store.filter(TaskFilter::CompletedOnly).unwrap_err();
        cleanup(&store);

        assert_eq!(err.code(), "empty_store");
    }

    #[test]
    fn set_status_toggles_back_to_pending() {
        let mut store = seeded_store("toggle.json");

        store.set_status("b", true).unwrap();
        let updated = store.set_status("b", false).unwrap();
        cleanup(&store);

        assert!(!updated.is_completed);
        assert_eq!(updated.title, "B");
    }

    #[test]
    fn find_matches_substring_ignoring_case_in_store_order() {
        let store = TaskStore {
            path: temp_path("find.json"),
            tasks: vec![
                task("Buy oat milk", future()),
                task("Buy MILK", future()),
            ],
            unsaved: false,
        };

        let found = store.find_by_title_substring("milk").unwrap();

        assert_eq!(found.title, "Buy oat milk");
    }

    #[test]
    fn find_reports_missing_query_and_empty_store() {
        let empty = TaskStore::new(temp_path("find-empty.json"));
        assert_eq!(
            empty.find_by_title_substring("x").unwrap_err().code(),
            "empty_store"
        );

        let store = seeded_store("find-missing.json");
        let missing = store.find_by_title_substring("zzz").unwrap_err();
        let blank = store.find_by_title_substring("   ").unwrap_err();
        cleanup(&store);

        assert_eq!(missing.code(), "not_found");
        assert!(missing.message().contains("zzz"));
        assert_eq!(blank, crate::error::AppError::not_found_blank());
    }

    #[test]
    fn delete_removes_task() {
        let mut store = seeded_store("delete.json");

        let removed = store.delete("c").unwrap();
        let err = store.find_by_title_substring("C").unwrap_err();
        let reopened = TaskStore::open(store.path());
        cleanup(&store);

        assert_eq!(removed.title, "C");
        assert_eq!(err.code(), "not_found");
        assert_eq!(reopened.store.len(), 2);
    }

    #[test]
    fn delete_propagates_lookup_failures() {
        let mut store = seeded_store("delete-missing.json");
        let err = store.delete("nothing").unwrap_err();
        cleanup(&store);

        assert_eq!(err.code(), "not_found");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn edit_with_no_changes_leaves_task_and_file_untouched() {
        let mut store = seeded_store("edit-noop.json");
        let before = store.find_by_title_substring("A").unwrap().clone();
        let file_before = std::fs::read_to_string(store.path()).unwrap();

        let blank = TaskEdit {
            title: Some("  ".to_string()),
            description: Some(String::new()),
            due_date: None,
        };
        let outcome = store.edit("A", blank).unwrap();
        let file_after = std::fs::read_to_string(store.path()).unwrap();
        cleanup(&store);

        assert!(!outcome.changed);
        assert!(outcome.rejected_due_date.is_none());
        assert_eq!(outcome.task, before);
        assert_eq!(file_before, file_after);
    }

    #[test]
    fn edit_keeps_due_date_on_bad_text_but_commits_other_fields() {
        let mut store = seeded_store("edit-bad-date.json");
        let before = store.find_by_title_substring("A").unwrap().clone();

        let outcome = store
            .edit(
                "A",
                TaskEdit {
                    title: Some("Renamed".to_string()),
                    description: Some("new words".to_string()),
                    due_date: Some("not a date".to_string()),
                },
            )
            .unwrap();
        let reopened = TaskStore::open(store.path());
        cleanup(&store);

        assert!(outcome.changed);
        assert_eq!(
            outcome.rejected_due_date.map(|err| err.code()),
            Some("validation_error")
        );
        assert_eq!(outcome.task.id, before.id);
        assert_eq!(outcome.task.title, "Renamed");
        assert_eq!(outcome.task.description, "new words");
        assert_eq!(outcome.task.due_date, before.due_date);
        let persisted = reopened.store.find_by_title_substring("Renamed").unwrap();
        assert_eq!(persisted, &outcome.task);
    }

    #[test]
    fn edit_updates_due_date_from_text() {
        let mut store = seeded_store("edit-date.json");

        let outcome = store
            .edit(
                "B",
                TaskEdit {
                    due_date: Some("2031-06-15T08:00:00Z".to_string()),
                    ..TaskEdit::default()
                },
            )
            .unwrap();
        let listed = store.list().unwrap();
        cleanup(&store);

        assert_eq!(outcome.task.due_date, datetime!(2031-06-15 08:00:00 UTC));
        assert_eq!(titles(&listed), vec!["C", "A", "B"]);
    }

    #[test]
    fn edit_rejects_title_of_another_task() {
        let mut store = seeded_store("edit-duplicate.json");

        let err = store
            .edit(
                "A",
                TaskEdit {
                    title: Some("b".to_string()),
                    description: Some("should not apply".to_string()),
                    due_date: None,
                },
            )
            .unwrap_err();
        let unchanged = store.find_by_title_substring("A").unwrap().clone();
        cleanup(&store);

        assert_eq!(err.code(), "duplicate_title");
        assert_eq!(unchanged.description, "A details");
    }

    #[test]
    fn edit_allows_recasing_own_title() {
        let path = temp_path("edit-recase.json");
        let mut store = TaskStore::new(&path);
        store.add("buy milk", "desc", future()).unwrap();

        let outcome = store
            .edit(
                "milk",
                TaskEdit {
                    title: Some("Buy Milk".to_string()),
                    ..TaskEdit::default()
                },
            )
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(outcome.task.title, "Buy Milk");
    }

    #[test]
    fn save_then_load_round_trips_every_field() {
        let path = temp_path("round-trip.json");
        let mut done = task("done", datetime!(2029-11-02 17:45:10.123 -05:00));
        done.is_completed = true;
        let mut store = TaskStore {
            path: path.clone(),
            tasks: vec![task("open", datetime!(2030-01-01 00:00:00 UTC)), done],
            unsaved: true,
        };

        store.save().unwrap();
        let mut reloaded = TaskStore::new(&path);
        reloaded.load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(reloaded.tasks(), store.tasks());
    }

    #[test]
    fn save_then_load_of_empty_store_is_empty() {
        let path = temp_path("round-trip-empty.json");
        TaskStore::new(&path).save().unwrap();

        let reopened = TaskStore::open(&path);
        std::fs::remove_file(&path).ok();

        assert!(reopened.error.is_none());
        assert!(reopened.store.is_empty());
    }

    #[test]
    fn open_with_invalid_content_reports_error_and_starts_empty() {
        let path = temp_path("corrupt.json");
        std::fs::write(&path, "[{\"title\": \"half written\"").unwrap();

        let opened = TaskStore::open(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(
            opened.error.map(|err| err.code()),
            Some("persistence_error")
        );
        assert!(opened.store.is_empty());
    }

    #[test]
    fn failed_load_clears_previous_tasks() {
        let mut store = seeded_store("reload-corrupt.json");
        std::fs::write(store.path(), "not json").unwrap();

        let err = store.load().unwrap_err();
        cleanup(&store);

        assert_eq!(err.code(), "persistence_error");
        assert!(store.is_empty());
    }

    #[test]
    fn open_reads_numeric_ids_and_keeps_them_on_save() {
        let path = temp_path("numeric-open.json");
        std::fs::write(
            &path,
            r#"[{"id": 4821, "title": "A", "description": "first", "dueDate": "2030-01-01T00:00:00Z", "isCompleted": false}]"#,
        )
        .unwrap();

        let mut opened = TaskStore::open(&path);
        assert!(opened.error.is_none());
        let updated = opened.store.set_status("A", true).unwrap();
        let reopened = TaskStore::open(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(updated.id, Uuid::from_u128(4821));
        assert_eq!(reopened.store.tasks(), &[updated]);
    }

    #[test]
    fn legacy_file_without_ids_opens_with_same_ids() {
        let path = temp_path("legacy-ids.json");
        std::fs::write(
            &path,
            r#"[{"Title": "Old", "Description": "kept", "DueDate": "2030-01-05T00:00:00Z", "IsCompleted": true}]"#,
        )
        .unwrap();

        let first = TaskStore::open(&path).store.tasks()[0].id;
        let second = TaskStore::open(&path).store.tasks()[0].id;
        std::fs::remove_file(&path).ok();

        assert_eq!(first, second);
    }

    #[test]
    fn unsaved_flag_tracks_mutations_and_saves() {
        let path = temp_path("unsaved.json");
        let mut store = TaskStore::new(&path);
        assert!(!store.has_unsaved_changes());

        store.add("Buy milk", "two litres", future()).unwrap();
        let after_add = store.has_unsaved_changes();
        let opened = TaskStore::open(&path);
        std::fs::remove_file(&path).ok();

        assert!(!after_add);
        assert!(!opened.store.has_unsaved_changes());
    }

    #[test]
    fn failed_save_leaves_store_unsaved() {
        let dir = temp_path("unwritable-flag");
        std::fs::create_dir_all(&dir).unwrap();
        let mut store = TaskStore::new(&dir);

        store.add("kept", "in memory", future()).unwrap_err();
        let unsaved = store.has_unsaved_changes();
        std::fs::remove_dir_all(&dir).ok();

        assert!(unsaved);
    }

    #[test]
    fn failed_save_keeps_in_memory_change() {
        let dir = temp_path("unwritable");
        std::fs::create_dir_all(&dir).unwrap();
        let mut store = TaskStore::new(&dir);

        let err = store.add("kept", "in memory", future()).unwrap_err();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "persistence_error");
        assert_eq!(store.len(), 1);
        assert_eq!(store.tasks()[0].title, "kept");
    }
}

use crate::dates::serde_due_date;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredTask")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "serde_due_date")]
    pub due_date: OffsetDateTime,
    pub is_completed: bool,
}

/// On-disk shape of a task. Older files use PascalCase keys, numeric ids or
/// no id at all; all of them map onto a [`Task`] with a stable UUID.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    #[serde(alias = "Id", default)]
    id: Option<StoredId>,
    #[serde(alias = "Title")]
    title: String,
    #[serde(alias = "Description")]
    description: String,
    #[serde(alias = "DueDate", with = "serde_due_date")]
    due_date: OffsetDateTime,
    #[serde(alias = "IsCompleted", default)]
    is_completed: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredId {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

impl StoredId {
    fn into_uuid(self) -> Uuid {
        match self {
            Self::Unsigned(number) => Uuid::from_u128(u128::from(number)),
            Self::Signed(number) => Uuid::from_u128(number as u128),
            Self::Text(text) => Uuid::parse_str(text.trim())
                .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, text.as_bytes())),
        }
    }
}

/// Id for an entry stored without one, derived from its title so every load
/// of the same file agrees.
fn legacy_id(title: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, title.trim().to_lowercase().as_bytes())
}

impl From<StoredTask> for Task {
    fn from(stored: StoredTask) -> Self {
        let id = match stored.id {
            Some(id) => id.into_uuid(),
            None => legacy_id(&stored.title),
        };
        Self {
            id,
            title: stored.title,
            description: stored.description,
            due_date: stored.due_date,
            is_completed: stored.is_completed,
        }
    }
}

impl Task {
    pub(crate) fn new(title: String, description: String, due_date: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            due_date,
            is_completed: false,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_completed { "Done" } else { "Pending" }
    }

    /// Two-line human readable form; the due date is shown as a short date.
    pub fn render(&self) -> String {
        format!(
            "ID: {} | Title: {} | Due Date: {} | Completed: {}\nDescription: {}",
            self.id,
            self.title,
            self.due_date.date(),
            if self.is_completed { "Yes" } else { "No" },
            self.description
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    CompletedOnly,
    PendingOnly,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::CompletedOnly => task.is_completed,
            Self::PendingOnly => !task.is_completed,
        }
    }

    pub(crate) fn empty_message(self) -> &'static str {
        match self {
            Self::All => "no tasks available to display",
            Self::CompletedOnly => "no completed tasks found",
            Self::PendingOnly => "no pending tasks found",
        }
    }
}

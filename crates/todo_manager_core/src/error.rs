use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("validation_error - {0}")]
    Validation(String),
    #[error("duplicate_title - {0}")]
    DuplicateTitle(String),
    #[error("not_found - {0}")]
    NotFound(String),
    #[error("empty_store - {0}")]
    EmptyStore(String),
    #[error("persistence_error - {0}")]
    Persistence(String),
}

impl AppError {
    pub fn validation<M: Into<String>>(message: M) -> Self {
        Self::Validation(message.into())
    }

    pub fn duplicate_title(title: &str) -> Self {
        Self::DuplicateTitle(format!("a task titled '{title}' already exists"))
    }

    /// Lookup failure carrying the query that matched nothing.
    pub fn not_found(query: &str) -> Self {
        Self::NotFound(format!("task with title '{query}' not found"))
    }

    pub fn not_found_blank() -> Self {
        Self::NotFound("title query cannot be empty".to_string())
    }

    pub fn empty_store<M: Into<String>>(message: M) -> Self {
        Self::EmptyStore(message.into())
    }

    pub fn persistence<M: Into<String>>(message: M) -> Self {
        Self::Persistence(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::DuplicateTitle(_) => "duplicate_title",
            Self::NotFound(_) => "not_found",
            Self::EmptyStore(_) => "empty_store",
            Self::Persistence(_) => "persistence_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::DuplicateTitle(message)
            | Self::NotFound(message)
            | Self::EmptyStore(message)
            | Self::Persistence(message) => message,
        }
    }
}

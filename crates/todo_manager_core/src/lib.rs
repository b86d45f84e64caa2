pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod storage;
pub mod task_store;

pub use dates::parse_due_date;
pub use error::AppError;
pub use model::{Task, TaskFilter};
pub use task_store::{EditOutcome, StoreOpen, TaskEdit, TaskStore};

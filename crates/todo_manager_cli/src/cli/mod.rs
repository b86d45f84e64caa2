use clap::{Parser, Subcommand, ValueEnum};
use todo_manager_core::TaskFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: todo_manager add "Buy milk" "Two litres, semi-skimmed" 2030-04-22
    Add {
        title: String,
        description: String,
        /// Due date (YYYY-MM-DD, YYYY-MM-DD HH:MM or RFC 3339)
        due: String,
    },
    /// List all tasks ordered by due date
    ///
    /// Example: todo_manager list
    List,
    /// List tasks by completion state
    ///
    /// Example: todo_manager filter pending
    Filter {
        #[arg(value_enum)]
        which: FilterArg,
    },
    /// Show the first task whose title contains the query
    ///
    /// Example: todo_manager find milk
    Find { query: String },
    /// Mark a task as done or pending
    ///
    /// Example: todo_manager status milk done
    Status {
        query: String,
        #[arg(value_enum)]
        state: StatusArg,
    },
    /// Edit a task's title, description or due date
    ///
    /// Example: todo_manager edit milk --title "Buy oat milk" --due 2030-05-01
    Edit {
        query: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: todo_manager delete milk
    Delete { query: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterArg {
    All,
    Completed,
    Pending,
}

impl From<FilterArg> for TaskFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => TaskFilter::All,
            FilterArg::Completed => TaskFilter::CompletedOnly,
            FilterArg::Pending => TaskFilter::PendingOnly,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    Done,
    Pending,
}

impl StatusArg {
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Done)
    }
}

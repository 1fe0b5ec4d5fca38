// TodoStore - Single-user task list with key-value persistence, queries and CSV export

pub mod config;
pub mod error;
pub mod export;
pub mod kv;
pub mod models;
pub mod query;
pub mod repository;
pub mod store;
pub mod summary;

// Re-export main types for convenience
pub use config::Config;
pub use error::{DecodeError, ParseValueError, PersistenceError, Result, TodoError};
pub use kv::{KvBackend, MemoryKv, SqliteKv};
pub use models::{DueState, NewTask, Status, Task, TaskPatch, Timestamp, parse_tags};
pub use query::{Query, SortBy, StatusFilter};
pub use repository::{STORAGE_KEY, TaskRepository};
pub use store::{Detached, Outcome, PersistHook, SaveStatus, TaskStore};
pub use summary::{StatusCounts, count_by_status};

// Persists the whole task collection as one JSON blob

use crate::error::{DecodeError, PersistenceError, Result};
use crate::kv::KvBackend;
use crate::models::Task;
use std::collections::HashSet;
use tracing::{info, warn};

/// Fixed key the collection is stored under
pub const STORAGE_KEY: &str = "todo_tasks_v1";

/// Load/save adapter between the task collection and a key-value backend
pub struct TaskRepository<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> TaskRepository<B> {
    /// Create a repository over `backend`
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get the backend this repository reads and writes
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load the persisted collection, falling back to empty on any failure
    ///
    /// A missing key is an empty collection. Unreadable or undecodable blobs
    /// are logged and also yield an empty collection.
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(key = STORAGE_KEY, error = %e, "Failed to load tasks, starting with an empty list");
                Vec::new()
            }
        }
    }

    /// Load the persisted collection, surfacing read and decode errors
    pub fn try_load(&self) -> Result<Vec<Task>> {
        let Some(blob) = self.backend.get(STORAGE_KEY)? else {
            info!(key = STORAGE_KEY, "No stored tasks");
            return Ok(Vec::new());
        };

        let tasks = decode(&blob)?;
        info!(key = STORAGE_KEY, count = tasks.len(), "Loaded tasks");
        Ok(tasks)
    }

    /// Overwrite the stored collection with `tasks`
    pub fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let blob = serde_json::to_string(tasks).map_err(PersistenceError::from)?;
        self.backend.set(STORAGE_KEY, &blob)?;
        info!(key = STORAGE_KEY, count = tasks.len(), bytes = blob.len(), "Saved tasks");
        Ok(())
    }
}

/// Parse a stored blob and check the collection invariants
pub fn decode(blob: &str) -> std::result::Result<Vec<Task>, DecodeError> {
    let tasks: Vec<Task> = serde_json::from_str(blob)?;
    validate_collection(&tasks)?;
    Ok(tasks)
}

/// Check the invariants every stored or seeded collection must satisfy
pub fn validate_collection(tasks: &[Task]) -> std::result::Result<(), DecodeError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(DecodeError::DuplicateId(task.id.clone()));
        }
        if task.title.trim().is_empty() {
            return Err(DecodeError::EmptyTitle(task.id.clone()));
        }
        if task.updated_at < task.created_at {
            return Err(DecodeError::TimestampOrder(task.id.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TodoError;
    use crate::kv::{MemoryKv, SqliteKv};
    use crate::models::{Status, Timestamp};
    use chrono::{DateTime, NaiveDate};
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn task(id: &str, title: &str) -> Task {
        let created = Timestamp::parse("2024-05-01T08:00:00.000Z").unwrap();
        let updated = Timestamp::parse("2024-05-02T08:00:00.125Z").unwrap();
        Task {
            id: id.to_string(),
            title: title.to_string(),
            due: NaiveDate::from_ymd_opt(2024, 6, 1),
            tags: vec!["work".to_string()],
            status: Status::Doing,
            created_at: created,
            updated_at: updated,
        }
    }

    #[test]
    fn test_load_missing_key_is_empty() {
        let repo = TaskRepository::new(MemoryKv::new());
        assert!(repo.load().is_empty());
        assert!(repo.try_load().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_sqlite() {
        let temp = TempDir::new().unwrap();
        let mut first = task("a", "He said \"hi\"");
        first.due = None;
        first.tags.clear();
        let tasks = vec![first, task("b", "Second")];

        {
            let mut repo = TaskRepository::new(SqliteKv::open(temp.path()).unwrap());
            repo.save(&tasks).unwrap();
        }

        let repo = TaskRepository::new(SqliteKv::open(temp.path()).unwrap());
        assert_eq!(repo.load(), tasks);
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let mut repo = TaskRepository::new(MemoryKv::new());
        repo.save(&[task("a", "One"), task("b", "Two")]).unwrap();
        repo.save(&[task("c", "Three")]).unwrap();

        let loaded = repo.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "c");
    }

    #[test]
    fn test_persisted_layout() {
        let mut repo = TaskRepository::new(MemoryKv::new());
        repo.save(&[task("a", "One")]).unwrap();

        let blob = repo.backend().get(STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        let object = value[0].as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["created_at", "due", "id", "status", "tags", "title", "updated_at"]
        );
        assert_eq!(value[0]["due"], "2024-06-01");
        assert_eq!(value[0]["updated_at"], "2024-05-02T08:00:00.125Z");
    }

    #[test]
    fn test_load_malformed_blob_falls_back_to_empty() {
        let mut kv = MemoryKv::new();
        kv.set(STORAGE_KEY, "{not json").unwrap();
        let repo = TaskRepository::new(kv);

        assert!(repo.load().is_empty());
        assert!(matches!(repo.try_load(), Err(TodoError::Decode(DecodeError::Json(_)))));
    }

    #[test]
    fn test_load_wrong_shape_falls_back_to_empty() {
        let mut kv = MemoryKv::new();
        kv.set(STORAGE_KEY, r#"[{"id":"a","title":"x","status":"archived"}]"#).unwrap();
        let repo = TaskRepository::new(kv);
        assert!(repo.load().is_empty());
    }

    #[test]
    fn test_decode_rejects_invariant_violations() {
        let duplicate = serde_json::to_string(&[task("a", "One"), task("a", "Two")]).unwrap();
        assert!(matches!(decode(&duplicate), Err(DecodeError::DuplicateId(id)) if id == "a"));

        let blank = serde_json::to_string(&[task("a", "   ")]).unwrap();
        assert!(matches!(decode(&blank), Err(DecodeError::EmptyTitle(_))));

        let mut backwards = task("a", "One");
        std::mem::swap(&mut backwards.created_at, &mut backwards.updated_at);
        let backwards = serde_json::to_string(&[backwards]).unwrap();
        assert!(matches!(decode(&backwards), Err(DecodeError::TimestampOrder(_))));
    }

    #[test]
    fn test_failed_save_keeps_previous_blob() {
        let mut repo = TaskRepository::new(MemoryKv::new().with_quota(Some(400)));
        let original = vec![task("a", "One")];
        repo.save(&original).unwrap();

        let huge = vec![task("b", &"x".repeat(1_000))];
        let err = repo.save(&huge).unwrap_err();
        assert!(matches!(
            err,
            TodoError::Persistence(PersistenceError::QuotaExceeded { .. })
        ));
        assert_eq!(repo.load(), original);
    }

    fn arb_task() -> impl Strategy<Value = Task> {
        (
            "[a-z\",\n \u{e9}]{1,12}",
            proptest::option::of(0u32..365),
            proptest::collection::vec("[a-z\",]{1,4}", 0..3),
            prop_oneof![Just(Status::Todo), Just(Status::Doing), Just(Status::Done)],
            0i64..4_000_000_000_000,
            0i64..1_000_000,
        )
            .prop_map(|(title, due, tags, status, created_ms, age_ms)| {
                let at = |ms: i64| Timestamp::from_datetime(DateTime::from_timestamp_millis(ms).unwrap());
                Task {
                    id: String::new(),
                    title: format!("t{}", title),
                    due: due.and_then(|d| NaiveDate::from_ymd_opt(2024, 1, 1)?.checked_add_days(chrono::Days::new(d.into()))),
                    tags,
                    status,
                    created_at: at(created_ms),
                    updated_at: at(created_ms + age_ms),
                }
            })
    }

    fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
        proptest::collection::vec(arb_task(), 0..16).prop_map(|mut tasks| {
            for (i, task) in tasks.iter_mut().enumerate() {
                task.id = format!("id-{}", i);
            }
            tasks
        })
    }

    proptest! {
        #[test]
        fn prop_save_then_load_returns_same_collection(tasks in arb_tasks()) {
            let mut repo = TaskRepository::new(MemoryKv::new());
            repo.save(&tasks).unwrap();
            prop_assert_eq!(repo.try_load().unwrap(), tasks);
        }
    }
}

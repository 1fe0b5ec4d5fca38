// In-memory authoritative task collection with a post-mutation persistence hook

use crate::error::{Result, TodoError};
use crate::kv::KvBackend;
use crate::models::{NewTask, Status, Task, TaskPatch, Timestamp};
use crate::repository::{self, TaskRepository};
use tracing::{debug, warn};

/// Called with the full collection after every applied mutation
pub trait PersistHook {
    fn persist(&mut self, tasks: &[Task]) -> Result<()>;
}

impl<B: KvBackend> PersistHook for TaskRepository<B> {
    fn persist(&mut self, tasks: &[Task]) -> Result<()> {
        self.save(tasks)
    }
}

/// Hook that persists nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl PersistHook for Detached {
    fn persist(&mut self, _tasks: &[Task]) -> Result<()> {
        Ok(())
    }
}

/// What happened to persistence after a mutation call
#[derive(Debug)]
pub enum SaveStatus {
    Saved,
    /// Nothing changed, so the hook was not called
    Unchanged,
    /// The in-memory change stands but the persisted state is stale
    Failed(TodoError),
}

/// Result of a mutation that was accepted by the store
#[derive(Debug)]
#[must_use]
pub struct Outcome<T> {
    pub value: T,
    pub save: SaveStatus,
}

impl<T> Outcome<T> {
    fn unchanged(value: T) -> Self {
        Self {
            value,
            save: SaveStatus::Unchanged,
        }
    }

    /// Check whether the hook ran and succeeded
    pub fn is_saved(&self) -> bool {
        matches!(self.save, SaveStatus::Saved)
    }

    /// Treat a failed save as an error
    pub fn into_result(self) -> Result<T> {
        match self.save {
            SaveStatus::Failed(e) => Err(e),
            SaveStatus::Saved | SaveStatus::Unchanged => Ok(self.value),
        }
    }
}

/// Owns the task collection and persists it after each mutation
pub struct TaskStore<H: PersistHook> {
    tasks: Vec<Task>,
    hook: H,
}

impl<B: KvBackend> TaskStore<TaskRepository<B>> {
    /// Load the collection from `repository` and persist back through it
    pub fn open(repository: TaskRepository<B>) -> Self {
        // load only returns collections that passed validation
        let tasks = repository.load();
        Self {
            tasks,
            hook: repository,
        }
    }
}

impl<H: PersistHook> TaskStore<H> {
    /// Seed a store with an existing collection, rejecting invalid ones
    pub fn new(tasks: Vec<Task>, hook: H) -> Result<Self> {
        repository::validate_collection(&tasks)?;
        Ok(Self { tasks, hook })
    }

    /// Get the tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Get the number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check whether the store holds no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get the persistence hook
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Find a task by its full id
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Find the task whose id equals `prefix` or uniquely starts with it
    pub fn resolve(&self, prefix: &str) -> Result<&Task> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(TodoError::NotFound(prefix.to_string()));
        }
        if let Some(task) = self.get(prefix) {
            return Ok(task);
        }

        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(prefix));
        match (matches.next(), matches.count()) {
            (None, _) => Err(TodoError::NotFound(prefix.to_string())),
            (Some(task), 0) => Ok(task),
            (Some(_), rest) => Err(TodoError::AmbiguousId {
                prefix: prefix.to_string(),
                count: rest + 1,
            }),
        }
    }

    /// Create a task and append it to the collection
    pub fn add(&mut self, new: NewTask) -> Result<Outcome<Task>> {
        let title = validate_title(&new.title)?;

        let now = Timestamp::now();
        let task = Task {
            id: uuid::Uuid::now_v7().to_string(),
            title,
            due: new.due,
            tags: normalize_tags(new.tags),
            status: new.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %task.id, title = %task.title, "add: appending task");
        self.tasks.push(task.clone());
        Ok(self.commit(task))
    }

    /// Remove a task; unknown ids are a no-op
    pub fn remove(&mut self, id: &str) -> Outcome<bool> {
        let Some(index) = self.position(id) else {
            debug!(id, "remove: no such task");
            return Outcome::unchanged(false);
        };

        self.tasks.remove(index);
        debug!(id, "remove: task removed");
        self.commit(true)
    }

    /// Set the status of a task; unknown ids are a no-op
    pub fn set_status(&mut self, id: &str, status: Status) -> Outcome<bool> {
        let Some(task) = self.task_mut(id) else {
            debug!(id, "set_status: no such task");
            return Outcome::unchanged(false);
        };

        task.status = status;
        task.updated_at = Timestamp::refreshed_after(task.updated_at);
        debug!(id, %status, "set_status: status changed");
        self.commit(true)
    }

    /// Flip a task between done and todo, returning the new status
    pub fn toggle(&mut self, id: &str) -> Outcome<Option<Status>> {
        let Some(task) = self.task_mut(id) else {
            debug!(id, "toggle: no such task");
            return Outcome::unchanged(None);
        };

        task.status = task.status.toggled();
        task.updated_at = Timestamp::refreshed_after(task.updated_at);
        let status = task.status;
        debug!(id, %status, "toggle: status changed");
        self.commit(Some(status))
    }

    /// Replace a subset of a task's mutable fields
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Outcome<Task>> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;

        let task = self.task_mut(id).ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(due) = patch.due {
            task.due = due;
        }
        if let Some(tags) = patch.tags {
            task.tags = normalize_tags(tags);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.updated_at = Timestamp::refreshed_after(task.updated_at);

        let updated = task.clone();
        debug!(id, "update: task updated");
        Ok(self.commit(updated))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn commit<T>(&mut self, value: T) -> Outcome<T> {
        let save = match self.hook.persist(&self.tasks) {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                warn!(error = %e, "Failed to persist tasks, in-memory state kept");
                SaveStatus::Failed(e)
            }
        };
        Outcome { value, save }
    }
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TodoError::validation("task title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().filter(|tag| !tag.trim().is_empty()).collect()
}

// Data models for the task list

use crate::error::ParseValueError;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub due: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub status: Status,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// Classify the due date relative to `today`
    pub fn due_state(&self, today: NaiveDate) -> DueState {
        match self.due {
            None => DueState::Unscheduled,
            Some(due) if due < today => DueState::Overdue,
            Some(due) if due == today => DueState::Today,
            Some(_) => DueState::Upcoming,
        }
    }

    /// Check for an exact tag match
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Todo,
    Doing,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::Doing, Status::Done];

    /// Get the lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::Doing => "doing",
            Status::Done => "done",
        }
    }

    /// Checkbox semantics: done flips back to todo, anything else becomes done
    pub fn toggled(self) -> Status {
        match self {
            Status::Done => Status::Todo,
            Status::Todo | Status::Doing => Status::Done,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "todo" => Ok(Status::Todo),
            "doing" => Ok(Status::Doing),
            "done" => Ok(Status::Done),
            other => Err(ParseValueError {
                kind: "status",
                value: other.to_string(),
                expected: "todo, doing, done",
            }),
        }
    }
}

/// Where a due date falls relative to a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    Unscheduled,
    Overdue,
    Today,
    Upcoming,
}

/// UTC instant with millisecond precision, serialized as `2024-01-01T09:30:00.000Z`
///
/// Ordering by instant matches lexical ordering of the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current time truncated to milliseconds
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Truncate to millisecond precision
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(3))
    }

    /// Parse an RFC 3339 timestamp, converting to UTC
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
    }

    /// Current time, or `previous` plus one millisecond if the clock has not moved past it
    pub fn refreshed_after(previous: Timestamp) -> Self {
        let now = Self::now();
        if now > previous {
            now
        } else {
            Self(previous.0 + chrono::Duration::milliseconds(1))
        }
    }

    /// Get the underlying UTC datetime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_string()
    }
}

impl TryFrom<String> for Timestamp {
    type Error = chrono::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Timestamp::parse(&s)
    }
}

/// Caller-supplied fields for a new task; id and timestamps are generated by the store
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub due: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub status: Option<Status>,
}

impl NewTask {
    /// Start a task with a title and default fields
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn due(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }
}

/// Subset of mutable fields to replace on an existing task
///
/// `due: Some(None)` clears the due date.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due: Option<Option<NaiveDate>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<Status>,
}

impl TaskPatch {
    /// Check whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.due.is_none() && self.tags.is_none() && self.status.is_none()
    }
}

/// Split a comma-separated tag string, trimming elements and dropping empty ones
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_task() -> Task {
        let ts = Timestamp::parse("2024-03-01T10:00:00.000Z").unwrap();
        Task {
            id: "0192f0c1-0000-7000-8000-000000000001".to_string(),
            title: "Buy milk".to_string(),
            due: Some(date("2024-03-05")),
            tags: vec!["home".to_string(), "errand".to_string()],
            status: Status::Todo,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Status::Todo).unwrap(), "\"todo\"");
        assert_eq!(serde_json::to_string(&Status::Doing).unwrap(), "\"doing\"");
        let parsed: Status = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(parsed, Status::Done);
        assert!(serde_json::from_str::<Status>("\"archived\"").is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("doing".parse::<Status>().unwrap(), Status::Doing);
        let err = "later".parse::<Status>().unwrap_err();
        assert_eq!(err.value, "later");
        assert_eq!(Status::default(), Status::Todo);
    }

    #[test]
    fn test_status_toggled() {
        assert_eq!(Status::Todo.toggled(), Status::Done);
        assert_eq!(Status::Doing.toggled(), Status::Done);
        assert_eq!(Status::Done.toggled(), Status::Todo);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = Timestamp::parse("2024-01-02T03:04:05.678Z").unwrap();
        assert_eq!(ts.to_string(), "2024-01-02T03:04:05.678Z");

        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-01-02T03:04:05.678Z\"");

        // Offsets are normalized to UTC
        let offset = Timestamp::parse("2024-01-02T12:04:05.678+09:00").unwrap();
        assert_eq!(offset, ts);
    }

    #[test]
    fn test_timestamp_refreshed_after_is_strictly_greater() {
        let future = Timestamp::parse("2999-01-01T00:00:00.000Z").unwrap();
        let refreshed = Timestamp::refreshed_after(future);
        assert!(refreshed > future);
        assert_eq!(refreshed.to_string(), "2999-01-01T00:00:00.001Z");

        let past = Timestamp::parse("2000-01-01T00:00:00.000Z").unwrap();
        assert!(Timestamp::refreshed_after(past) > past);
    }

    #[test]
    fn test_task_serialization_field_names() {
        let task = sample_task();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["title"], "Buy milk");
        assert_eq!(value["due"], "2024-03-05");
        assert_eq!(value["tags"], serde_json::json!(["home", "errand"]));
        assert_eq!(value["status"], "todo");
        assert_eq!(value["created_at"], "2024-03-01T10:00:00.000Z");

        let mut undated = task.clone();
        undated.due = None;
        let value = serde_json::to_value(&undated).unwrap();
        assert!(value["due"].is_null());

        let back: Task = serde_json::from_value(value).unwrap();
        assert_eq!(back, undated);
    }

    #[test]
    fn test_due_state() {
        let today = date("2024-03-05");
        let mut task = sample_task();
        assert_eq!(task.due_state(today), DueState::Today);
        assert_eq!(task.due_state(date("2024-03-06")), DueState::Overdue);
        assert_eq!(task.due_state(date("2024-03-01")), DueState::Upcoming);
        task.due = None;
        assert_eq!(task.due_state(today), DueState::Unscheduled);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("work, urgent,,  home "), vec!["work", "urgent", "home"]);
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn test_task_patch_is_empty() {
        assert!(TaskPatch::default().is_empty());
        let patch = TaskPatch {
            due: Some(None),
            ..TaskPatch::default()
        };
        assert!(!patch.is_empty());
    }
}

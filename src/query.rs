// Filtering and sorting over the task collection

use crate::error::ParseValueError;
use crate::models::{Status, Task};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Criteria for deriving a display view from the collection
///
/// Blank text criteria (empty or whitespace only) match every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Case-sensitive substring of the title or of any tag
    pub keyword: String,
    pub status: StatusFilter,
    /// Exact tag value
    pub tag: String,
    pub sort_by: SortBy,
}

impl Query {
    /// True when the task satisfies every criterion
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_keyword(task) && self.status.matches(task.status) && self.matches_tag(task)
    }

    /// Filter then sort
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        sort(filter(tasks, self), self.sort_by)
    }

    fn matches_keyword(&self, task: &Task) -> bool {
        if is_blank(&self.keyword) {
            return true;
        }
        let keyword = self.keyword.as_str();
        task.title.contains(keyword) || task.tags.iter().any(|tag| tag.contains(keyword))
    }

    fn matches_tag(&self, task: &Task) -> bool {
        is_blank(&self.tag) || task.has_tag(&self.tag)
    }
}

fn is_blank(criterion: &str) -> bool {
    criterion.trim().is_empty()
}

/// Tasks matching `query`, in collection order
pub fn filter<'a>(tasks: &'a [Task], query: &Query) -> Vec<&'a Task> {
    tasks.iter().filter(|task| query.matches(task)).collect()
}

/// Stable sort of a view; equal keys keep their relative order
pub fn sort(mut view: Vec<&Task>, sort_by: SortBy) -> Vec<&Task> {
    view.sort_by(|a, b| sort_by.compare(a, b));
    view
}

/// Status criterion: everything, or one status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    /// Check whether a task with `status` passes this filter
    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl From<Status> for StatusFilter {
    fn from(status: Status) -> Self {
        StatusFilter::Only(status)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = ParseValueError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for StatusFilter {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "all" {
            return Ok(StatusFilter::All);
        }
        s.parse::<Status>()
            .map(StatusFilter::Only)
            .map_err(|e| ParseValueError {
                kind: "status filter",
                value: e.value,
                expected: "all, todo, doing, done",
            })
    }
}

/// Sort mode for the derived view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    CreatedAtDesc,
    CreatedAtAsc,
    /// Tasks without a due date go last
    DueAsc,
    TitleAsc,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [
        SortBy::CreatedAtDesc,
        SortBy::CreatedAtAsc,
        SortBy::DueAsc,
        SortBy::TitleAsc,
    ];

    /// Get the snake_case name used in config and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::CreatedAtDesc => "created_at_desc",
            SortBy::CreatedAtAsc => "created_at_asc",
            SortBy::DueAsc => "due_asc",
            SortBy::TitleAsc => "title_asc",
        }
    }

    /// Order two tasks by this key
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortBy::CreatedAtDesc => b.created_at.cmp(&a.created_at),
            SortBy::CreatedAtAsc => a.created_at.cmp(&b.created_at),
            SortBy::DueAsc => match (a.due, b.due) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortBy::TitleAsc => a.title.cmp(&b.title),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SortBy::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ParseValueError {
                kind: "sort mode",
                value: s.to_string(),
                expected: "created_at_desc, created_at_asc, due_asc, title_asc",
            })
    }
}

use crate::error::SprintError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Short opaque identifier: the first eight hex digits of a v4 UUID.
pub fn new_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Lowercase and drop separators so "In Progress", "in-progress" and
/// "in_progress" all compare equal.
pub(crate) fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = SprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(SprintError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// StoryStatus
// ---------------------------------------------------------------------------

/// Story workflow column. Any status may move to any other; only entering
/// and leaving `Done` has bookkeeping consequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoryStatus {
    #[default]
    Backlog,
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "In Review")]
    InReview,
    Done,
}

impl StoryStatus {
    pub fn all() -> &'static [StoryStatus] {
        &[
            StoryStatus::Backlog,
            StoryStatus::ToDo,
            StoryStatus::InProgress,
            StoryStatus::InReview,
            StoryStatus::Done,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoryStatus::Backlog => "Backlog",
            StoryStatus::ToDo => "To Do",
            StoryStatus::InProgress => "In Progress",
            StoryStatus::InReview => "In Review",
            StoryStatus::Done => "Done",
        }
    }

    pub fn is_done(self) -> bool {
        self == StoryStatus::Done
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoryStatus {
    type Err = SprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "backlog" => Ok(StoryStatus::Backlog),
            "todo" => Ok(StoryStatus::ToDo),
            "inprogress" => Ok(StoryStatus::InProgress),
            "inreview" => Ok(StoryStatus::InReview),
            "done" => Ok(StoryStatus::Done),
            _ => Err(SprintError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// SprintStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SprintStatus {
    #[default]
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl SprintStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SprintStatus::Planning => "Planning",
            SprintStatus::Active => "Active",
            SprintStatus::Completed => "Completed",
            SprintStatus::Cancelled => "Cancelled",
        }
    }

    /// Planning → Active → Completed, with Cancelled reachable from
    /// Planning or Active.
    pub fn can_transition_to(self, next: SprintStatus) -> bool {
        matches!(
            (self, next),
            (SprintStatus::Planning, SprintStatus::Active)
                | (SprintStatus::Active, SprintStatus::Completed)
                | (SprintStatus::Planning, SprintStatus::Cancelled)
                | (SprintStatus::Active, SprintStatus::Cancelled)
        )
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SprintStatus {
    type Err = SprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "planning" => Ok(SprintStatus::Planning),
            "active" => Ok(SprintStatus::Active),
            "completed" => Ok(SprintStatus::Completed),
            "cancelled" => Ok(SprintStatus::Cancelled),
            _ => Err(SprintError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

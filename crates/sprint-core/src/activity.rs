//! Bounded audit trail of create/update/delete actions.
//!
//! Entries are stored newest first and the collection is capped at
//! [`ACTIVITY_LIMIT`]; appending past the cap evicts the oldest entries.

use crate::store::{Kind, Record};
use crate::types::new_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ACTIVITY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Story,
    Sprint,
    Standup,
    Retrospective,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityKind::Story => "Story",
            ActivityKind::Sprint => "Sprint",
            ActivityKind::Standup => "Standup",
            ActivityKind::Retrospective => "Retrospective",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    pub fn new(kind: ActivityKind, description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind,
            description: description.into(),
            timestamp: Utc::now(),
        }
    }
}

impl Record for Activity {
    const KIND: Kind = Kind::Activities;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Insert `entry` at the head of `log` and drop anything past the cap.
pub fn push_front(log: &mut Vec<Activity>, entry: Activity) {
    log.insert(0, entry);
    log.truncate(ACTIVITY_LIMIT);
}

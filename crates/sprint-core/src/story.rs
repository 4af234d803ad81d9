use crate::store::{Kind, Record};
use crate::types::{new_id, Priority, StoryStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub description: String,
    pub acceptance_criteria: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: StoryStatus,
    #[serde(default)]
    pub story_points: Option<f64>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Story {
    /// A fresh backlog story: unestimated, unassigned, no comments.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        acceptance_criteria: impl Into<String>,
        priority: Priority,
        labels: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.into(),
            description: description.into(),
            acceptance_criteria: acceptance_criteria.into(),
            priority,
            status: StoryStatus::Backlog,
            story_points: None,
            assignee: None,
            labels: labels.into_iter().map(Into::into).collect(),
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
            subtasks: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Point value used for sprint totals; unestimated counts as zero.
    pub fn points(&self) -> f64 {
        self.story_points.unwrap_or(0.0)
    }

    pub fn is_blocked(&self) -> bool {
        self.labels.contains("blocked")
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append a comment and return its id (`C1`, `C2`, …).
    ///
    /// Ids continue from the highest existing suffix so removing a comment
    /// never causes a later one to reuse its id.
    pub fn add_comment(&mut self, author: Option<String>, body: impl Into<String>) -> String {
        let max = self
            .comments
            .iter()
            .filter_map(|c| c.id.strip_prefix('C')?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        let id = format!("C{}", max + 1);
        self.comments.push(Comment {
            id: id.clone(),
            author,
            body: body.into(),
            created_at: Utc::now(),
        });
        self.touch();
        id
    }

    /// Remove a comment by id. Returns `false` if not found.
    pub fn remove_comment(&mut self, id: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != id);
        if self.comments.len() < before {
            self.touch();
            true
        } else {
            false
        }
    }
}

impl Record for Story {
    const KIND: Kind = Kind::Stories;

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.title.clone()
    }
}

/// Split comma-separated label input, trimming and dropping empties.
pub fn parse_labels(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// "Not estimated", or the points without a trailing `.0`.
pub fn format_points(points: Option<f64>) -> String {
    match points {
        None => "Not estimated".to_string(),
        Some(p) if p.fract() == 0.0 => format!("{}", p as i64),
        Some(p) => format!("{p:.1}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::error::{Result, SprintError};
use crate::store::{Kind, Record};
use crate::types::{new_id, SprintStatus};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION_WEEKS: u32 = 2;
pub const DEFAULT_CAPACITY: u32 = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_weeks: u32,
    pub capacity: u32,
    #[serde(default)]
    pub status: SprintStatus,
    /// Member story ids in the order they were added.
    #[serde(default)]
    pub stories: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub total_points: f64,
    #[serde(default)]
    pub completed_points: f64,
    pub created_at: DateTime<Utc>,
}

impl Sprint {
    pub fn new(
        name: impl Into<String>,
        duration_weeks: u32,
        start_date: NaiveDate,
        capacity: u32,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            start_date,
            end_date: start_date + Duration::weeks(i64::from(duration_weeks)),
            duration_weeks,
            capacity,
            status: SprintStatus::Planning,
            stories: Vec::new(),
            goals: Vec::new(),
            total_points: 0.0,
            completed_points: 0.0,
            created_at: Utc::now(),
        }
    }

    pub fn contains(&self, story_id: &str) -> bool {
        self.stories.iter().any(|s| s == story_id)
    }

    pub fn is_active(&self) -> bool {
        self.status == SprintStatus::Active
    }

    pub fn remaining_points(&self) -> f64 {
        self.total_points - self.completed_points
    }

    /// Calendar days from start to end.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Days until the end date, never negative.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days().max(0)
    }

    pub fn add_goal(&mut self, goal: impl Into<String>) {
        self.goals.push(goal.into());
    }

    /// Move to `next`, rejecting anything outside
    /// Planning → Active → Completed / Planning|Active → Cancelled.
    pub fn transition(&mut self, next: SprintStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(SprintError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
                reason: format!("sprint '{}' cannot move from {} to {}", self.name, self.status, next),
            });
        }
        self.status = next;
        Ok(())
    }
}

impl Record for Sprint {
    const KIND: Kind = Kind::Sprints;

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

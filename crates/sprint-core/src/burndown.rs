//! Daily point snapshots for the Active sprint, read back as the "actual"
//! line of a burndown chart.
//!
//! One snapshot per sprint per day: the id is `<sprint_id>:<YYYY-MM-DD>`, so
//! a later change on the same day overwrites the earlier one.

use crate::error::Result;
use crate::sprint::Sprint;
use crate::store::{Backend, Kind, Record, Store};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurndownSnapshot {
    pub id: String,
    pub sprint_id: String,
    pub date: NaiveDate,
    pub total_points: f64,
    pub completed_points: f64,
}

impl BurndownSnapshot {
    pub fn of(sprint: &Sprint, date: NaiveDate) -> Self {
        Self {
            id: format!("{}:{}", sprint.id, date.format("%Y-%m-%d")),
            sprint_id: sprint.id.clone(),
            date,
            total_points: sprint.total_points,
            completed_points: sprint.completed_points,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.total_points - self.completed_points
    }
}

impl Record for BurndownSnapshot {
    const KIND: Kind = Kind::Burndown;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurndownPoint {
    pub day: i64,
    pub date: NaiveDate,
    pub remaining: f64,
}

pub fn record_snapshot<B: Backend>(store: &Store<B>, sprint: &Sprint, date: NaiveDate) -> Result<()> {
    store.save(&BurndownSnapshot::of(sprint, date))?;
    Ok(())
}

/// Remaining points at the end of each day from the sprint start through
/// `min(today, end_date)`. Days before the first snapshot report the
/// sprint's current total.
pub fn history<B: Backend>(
    store: &Store<B>,
    sprint: &Sprint,
    today: NaiveDate,
) -> Result<Vec<BurndownPoint>> {
    let mut snapshots: Vec<BurndownSnapshot> = store
        .list::<BurndownSnapshot>()?
        .into_iter()
        .filter(|s| s.sprint_id == sprint.id)
        .collect();
    snapshots.sort_by_key(|s| s.date);

    let last_day = today.min(sprint.end_date);
    if last_day < sprint.start_date {
        return Ok(Vec::new());
    }

    let days = (last_day - sprint.start_date).num_days();
    let points = (0..=days)
        .map(|day| {
            let date = sprint.start_date + Duration::days(day);
            let remaining = snapshots
                .iter()
                .rev()
                .find(|s| s.date <= date)
                .map(BurndownSnapshot::remaining)
                .unwrap_or(sprint.total_points);
            BurndownPoint {
                day,
                date,
                remaining: round1(remaining.max(0.0)),
            }
        })
        .collect();
    Ok(points)
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

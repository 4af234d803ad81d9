//! Daily standups: one record per calendar date holding each member's
//! update.

use crate::error::{Result, SprintError};
use crate::store::{Backend, Kind, Record, Store};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub member: String,
    #[serde(default)]
    pub yesterday: String,
    #[serde(default)]
    pub today: String,
    #[serde(default)]
    pub blockers: String,
    pub timestamp: DateTime<Utc>,
}

impl MemberUpdate {
    pub fn new(
        member: impl Into<String>,
        yesterday: impl Into<String>,
        today: impl Into<String>,
        blockers: impl Into<String>,
    ) -> Self {
        Self {
            member: member.into(),
            yesterday: yesterday.into(),
            today: today.into(),
            blockers: blockers.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn has_blockers(&self) -> bool {
        !self.blockers.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standup {
    /// The date as `YYYY-MM-DD`.
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub updates: Vec<MemberUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Standup {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: standup_id(date),
            date,
            updates: Vec::new(),
            summary: None,
            created_at: Utc::now(),
        }
    }

    /// Non-empty blockers, each prefixed with the member name.
    pub fn blockers(&self) -> Vec<String> {
        self.updates
            .iter()
            .filter(|u| u.has_blockers())
            .map(|u| format!("{}: {}", u.member, u.blockers.trim()))
            .collect()
    }

    /// Non-empty "today" plans, each prefixed with the member name.
    pub fn focus(&self) -> Vec<String> {
        self.updates
            .iter()
            .filter(|u| !u.today.trim().is_empty())
            .map(|u| format!("{}: {}", u.member, u.today.trim()))
            .collect()
    }
}

impl Record for Standup {
    const KIND: Kind = Kind::Standups;

    fn id(&self) -> &str {
        &self.id
    }
}

pub fn standup_id(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Append `update` to the standup for `date`, creating the day's record on
/// the first update.
pub fn record_update<B: Backend>(
    store: &Store<B>,
    date: NaiveDate,
    update: MemberUpdate,
) -> Result<Standup> {
    if update.member.trim().is_empty() {
        return Err(SprintError::Validation(vec![
            "member name is required".to_string(),
        ]));
    }
    let mut standup = store
        .get::<Standup>(&standup_id(date))?
        .unwrap_or_else(|| Standup::new(date));
    standup.updates.push(update);
    store.save(&standup)?;
    Ok(standup)
}

/// Remove the update at `index`. `false` when the day or the index is
/// missing.
pub fn remove_update<B: Backend>(store: &Store<B>, date: NaiveDate, index: usize) -> Result<bool> {
    let Some(mut standup) = store.get::<Standup>(&standup_id(date))? else {
        return Ok(false);
    };
    if index >= standup.updates.len() {
        return Ok(false);
    }
    standup.updates.remove(index);
    store.save(&standup)?;
    Ok(true)
}

pub fn get<B: Backend>(store: &Store<B>, date: NaiveDate) -> Result<Option<Standup>> {
    store.get(&standup_id(date))
}

/// Every standup, newest date first.
pub fn list<B: Backend>(store: &Store<B>) -> Result<Vec<Standup>> {
    let mut standups: Vec<Standup> = store.list()?;
    standups.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(standups)
}

pub fn set_summary<B: Backend>(store: &Store<B>, date: NaiveDate, summary: &str) -> Result<bool> {
    let Some(mut standup) = store.get::<Standup>(&standup_id(date))? else {
        return Ok(false);
    };
    standup.summary = Some(summary.to_string());
    store.save(&standup)?;
    Ok(true)
}

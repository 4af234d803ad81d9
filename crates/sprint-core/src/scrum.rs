//! Compound operations that read and write more than one record.
//!
//! Lookups of missing stories or sprints are not errors here: the
//! operations report `false` and leave every collection untouched. Errors
//! are reserved for storage failures and illegal sprint transitions.

use crate::burndown;
use crate::error::{Result, SprintError};
use crate::sprint::Sprint;
use crate::store::{Backend, Store};
use crate::story::Story;
use crate::types::{Priority, SprintStatus, StoryStatus};
use chrono::{NaiveDate, Utc};

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

pub fn create_story(
    title: &str,
    description: &str,
    acceptance_criteria: &str,
    priority: Priority,
    labels: &[String],
) -> Story {
    Story::new(title, description, acceptance_criteria, priority, labels.iter().cloned())
}

/// New Planning sprint; `start_date` defaults to today.
pub fn create_sprint(
    name: &str,
    duration_weeks: u32,
    start_date: Option<NaiveDate>,
    capacity: u32,
) -> Sprint {
    Sprint::new(name, duration_weeks, start_date.unwrap_or_else(today), capacity)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// The sprint currently in progress. If the data was edited by hand and
/// holds several Active sprints, the first one wins.
pub fn current_sprint<B: Backend>(store: &Store<B>) -> Result<Option<Sprint>> {
    Ok(store
        .list::<Sprint>()?
        .into_iter()
        .find(Sprint::is_active))
}

/// Member stories of `sprint` that still exist, in membership order.
pub fn sprint_stories<B: Backend>(store: &Store<B>, sprint: &Sprint) -> Result<Vec<Story>> {
    let all: Vec<Story> = store.list()?;
    Ok(sprint
        .stories
        .iter()
        .filter_map(|id| all.iter().find(|s| &s.id == id).cloned())
        .collect())
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// Append `story_id` to the sprint and add its estimate to `total_points`.
///
/// Returns `false` when either record is missing or the story is already a
/// member. The story itself is not modified.
pub fn add_story_to_sprint<B: Backend>(
    store: &Store<B>,
    sprint_id: &str,
    story_id: &str,
) -> Result<bool> {
    let (Some(mut sprint), Some(story)) = (
        store.get::<Sprint>(sprint_id)?,
        store.get::<Story>(story_id)?,
    ) else {
        return Ok(false);
    };
    if sprint.contains(story_id) {
        return Ok(false);
    }

    sprint.stories.push(story_id.to_string());
    sprint.total_points += story.points();
    if sprint.is_active() && story.status.is_done() {
        sprint.completed_points += story.points();
    }
    store.save(&sprint)?;
    if sprint.is_active() {
        burndown::record_snapshot(store, &sprint, today())?;
    }
    tracing::debug!(sprint = %sprint.name, story = %story.title, "added story to sprint");
    Ok(true)
}

/// Inverse of [`add_story_to_sprint`]. Returns `false` when the sprint is
/// missing or the story is not a member.
pub fn remove_story_from_sprint<B: Backend>(
    store: &Store<B>,
    sprint_id: &str,
    story_id: &str,
) -> Result<bool> {
    let Some(mut sprint) = store.get::<Sprint>(sprint_id)? else {
        return Ok(false);
    };
    if !sprint.contains(story_id) {
        return Ok(false);
    }
    sprint.stories.retain(|s| s != story_id);

    if let Some(story) = store.get::<Story>(story_id)? {
        sprint.total_points = (sprint.total_points - story.points()).max(0.0);
        if sprint.is_active() && story.status.is_done() {
            sprint.completed_points = (sprint.completed_points - story.points()).max(0.0);
        }
    }
    store.save(&sprint)?;
    if sprint.is_active() {
        burndown::record_snapshot(store, &sprint, today())?;
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Set a story's status and keep the Active sprint's `completed_points` in
/// step: leaving Done subtracts the story's points, entering Done adds them.
///
/// Sprints that are no longer Active keep their totals frozen. Returns
/// `false` if the story does not exist.
pub fn update_story_status<B: Backend>(
    store: &Store<B>,
    story_id: &str,
    new_status: StoryStatus,
) -> Result<bool> {
    let Some(mut story) = store.get::<Story>(story_id)? else {
        return Ok(false);
    };
    let old_status = story.status;
    story.status = new_status;
    story.touch();

    if old_status.is_done() != new_status.is_done() {
        if let Some(mut sprint) = current_sprint(store)? {
            if sprint.contains(story_id) {
                if old_status.is_done() {
                    sprint.completed_points = (sprint.completed_points - story.points()).max(0.0);
                } else {
                    sprint.completed_points += story.points();
                }
                store.save(&sprint)?;
                burndown::record_snapshot(store, &sprint, today())?;
            }
        }
    }

    store.save(&story)?;
    tracing::debug!(story = %story.title, from = %old_status, to = %new_status, "story status updated");
    Ok(true)
}

/// Change a story's estimate. When the story is Done and a member of the
/// Active sprint, `completed_points` moves by the difference so a later
/// status change subtracts what was actually counted.
///
/// `total_points` is left alone. Returns `false` if the story does not exist.
pub fn reestimate_story<B: Backend>(
    store: &Store<B>,
    story_id: &str,
    points: Option<f64>,
) -> Result<bool> {
    let Some(mut story) = store.get::<Story>(story_id)? else {
        return Ok(false);
    };
    let old_points = story.points();
    story.story_points = points;
    story.touch();

    if story.status.is_done() && story.points() != old_points {
        if let Some(mut sprint) = current_sprint(store)? {
            if sprint.contains(story_id) {
                sprint.completed_points =
                    (sprint.completed_points + story.points() - old_points).max(0.0);
                store.save(&sprint)?;
                burndown::record_snapshot(store, &sprint, today())?;
            }
        }
    }

    store.save(&story)?;
    tracing::debug!(story = %story.title, from = old_points, to = story.points(), "story re-estimated");
    Ok(true)
}

// ---------------------------------------------------------------------------
// Sprint lifecycle
// ---------------------------------------------------------------------------

fn load_sprint<B: Backend>(store: &Store<B>, sprint_id: &str) -> Result<Sprint> {
    store
        .get::<Sprint>(sprint_id)?
        .ok_or_else(|| SprintError::SprintNotFound(sprint_id.to_string()))
}

/// Make `sprint_id` the Active sprint. Any other Active sprint is moved to
/// Completed first, so at most one sprint is ever Active. The activated
/// sprint's `completed_points` is reset to the points of its members that
/// are already Done. Returns the sprint that was displaced, if any.
pub fn activate_sprint<B: Backend>(store: &Store<B>, sprint_id: &str) -> Result<Option<Sprint>> {
    let mut sprint = load_sprint(store, sprint_id)?;
    if !sprint.status.can_transition_to(SprintStatus::Active) {
        return Err(SprintError::InvalidTransition {
            from: sprint.status.to_string(),
            to: SprintStatus::Active.to_string(),
            reason: "only a Planning sprint can be activated".to_string(),
        });
    }

    let mut displaced = None;
    for mut other in store.list::<Sprint>()? {
        if other.id != sprint.id && other.is_active() {
            other.transition(SprintStatus::Completed)?;
            store.save(&other)?;
            tracing::info!(sprint = %other.name, "completed previously active sprint");
            if displaced.is_none() {
                displaced = Some(other);
            }
        }
    }

    // Stories finished while the sprint was still Planning were never
    // counted incrementally; start the Active period from the real total.
    sprint.completed_points = sprint_stories(store, &sprint)?
        .iter()
        .filter(|s| s.status.is_done())
        .map(Story::points)
        .sum();
    sprint.transition(SprintStatus::Active)?;
    store.save(&sprint)?;
    burndown::record_snapshot(store, &sprint, today())?;
    Ok(displaced)
}

pub fn complete_sprint<B: Backend>(store: &Store<B>, sprint_id: &str) -> Result<Sprint> {
    let mut sprint = load_sprint(store, sprint_id)?;
    sprint.transition(SprintStatus::Completed)?;
    store.save(&sprint)?;
    Ok(sprint)
}

pub fn cancel_sprint<B: Backend>(store: &Store<B>, sprint_id: &str) -> Result<Sprint> {
    let mut sprint = load_sprint(store, sprint_id)?;
    sprint.transition(SprintStatus::Cancelled)?;
    store.save(&sprint)?;
    Ok(sprint)
}

pub fn add_goal<B: Backend>(store: &Store<B>, sprint_id: &str, goal: &str) -> Result<bool> {
    let Some(mut sprint) = store.get::<Sprint>(sprint_id)? else {
        return Ok(false);
    };
    sprint.add_goal(goal);
    store.save(&sprint)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Derived numbers for dashboards and for the assistant's prompts.
//!
//! Every function here degrades instead of failing on empty input: zero
//! totals give 0%, no completed sprints give the `No data` trend.

use crate::burndown::{self, round1, BurndownPoint};
use crate::error::Result;
use crate::scrum::{current_sprint, sprint_stories};
use crate::sprint::Sprint;
use crate::store::{Backend, Store};
use crate::story::Story;
use crate::types::{SprintStatus, StoryStatus};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Velocity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    #[serde(rename = "Insufficient data")]
    InsufficientData,
    #[serde(rename = "No data")]
    NoData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Improving => "Improving",
            Trend::Declining => "Declining",
            Trend::Stable => "Stable",
            Trend::InsufficientData => "Insufficient data",
            Trend::NoData => "No data",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub average: f64,
    pub trend: Trend,
    pub sprints_analyzed: usize,
    pub velocities: Vec<f64>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Velocity summary of a completed-points series, oldest first.
///
/// The trend compares the mean of the last two sprints with the mean of
/// every sprint before them. With exactly two sprints the earlier mean is
/// zero, so any positive pair reads as Improving.
pub fn velocity_from_series(velocities: Vec<f64>) -> Velocity {
    if velocities.is_empty() {
        return Velocity {
            average: 0.0,
            trend: Trend::NoData,
            sprints_analyzed: 0,
            velocities,
        };
    }

    let trend = if velocities.len() < 2 {
        Trend::InsufficientData
    } else {
        let (older, recent) = velocities.split_at(velocities.len() - 2);
        let recent = mean(recent);
        let older = if older.is_empty() { 0.0 } else { mean(older) };
        if recent > older {
            Trend::Improving
        } else if recent < older {
            Trend::Declining
        } else {
            Trend::Stable
        }
    };

    Velocity {
        average: round1(mean(&velocities)),
        trend,
        sprints_analyzed: velocities.len(),
        velocities,
    }
}

/// Velocity over the given sprints, in the order given. Sprints that are
/// missing or not Completed are skipped.
pub fn calculate_velocity<B: Backend>(store: &Store<B>, sprint_ids: &[String]) -> Result<Velocity> {
    let sprints: Vec<Sprint> = store.list()?;
    let series = sprint_ids
        .iter()
        .filter_map(|id| sprints.iter().find(|s| &s.id == id))
        .filter(|s| s.status == SprintStatus::Completed)
        .map(|s| s.completed_points)
        .collect();
    Ok(velocity_from_series(series))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityRecord {
    pub sprint_name: String,
    pub completed_points: f64,
    pub planned_points: f64,
    pub end_date: NaiveDate,
}

/// Completed sprints in stored order.
pub fn velocity_history<B: Backend>(store: &Store<B>) -> Result<Vec<VelocityRecord>> {
    Ok(store
        .list::<Sprint>()?
        .into_iter()
        .filter(|s| s.status == SprintStatus::Completed)
        .map(|s| VelocityRecord {
            sprint_name: s.name,
            completed_points: s.completed_points,
            planned_points: s.total_points,
            end_date: s.end_date,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Burndown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Burndown {
    pub ideal_line: Vec<BurndownPoint>,
    pub actual_line: Vec<BurndownPoint>,
    pub total_points: f64,
    pub days_in_sprint: i64,
}

/// Straight line from `total_points` on day 0 to zero on the last day.
pub fn ideal_line(sprint: &Sprint) -> Vec<BurndownPoint> {
    let days = sprint.day_count().max(0);
    (0..=days)
        .map(|day| {
            let remaining = if days == 0 {
                sprint.total_points
            } else {
                sprint.total_points - sprint.total_points * day as f64 / days as f64
            };
            BurndownPoint {
                day,
                date: sprint.start_date + Duration::days(day),
                remaining: round1(remaining),
            }
        })
        .collect()
}

/// `None` when the sprint does not exist.
pub fn generate_burndown<B: Backend>(
    store: &Store<B>,
    sprint_id: &str,
    today: NaiveDate,
) -> Result<Option<Burndown>> {
    let Some(sprint) = store.get::<Sprint>(sprint_id)? else {
        return Ok(None);
    };
    Ok(Some(Burndown {
        ideal_line: ideal_line(&sprint),
        actual_line: burndown::history(store, &sprint, today)?,
        total_points: sprint.total_points,
        days_in_sprint: sprint.day_count(),
    }))
}

// ---------------------------------------------------------------------------
// Sprint progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintProgress {
    pub progress_percentage: f64,
    pub completed_points: f64,
    pub total_points: f64,
    pub remaining_points: f64,
    pub story_statuses: BTreeMap<StoryStatus, usize>,
    pub days_remaining: i64,
    pub stories_count: usize,
}

pub fn completion_percentage(completed: f64, total: f64) -> f64 {
    if total > 0.0 {
        completed / total * 100.0
    } else {
        0.0
    }
}

/// `None` when the sprint does not exist.
pub fn sprint_progress<B: Backend>(
    store: &Store<B>,
    sprint_id: &str,
    today: NaiveDate,
) -> Result<Option<SprintProgress>> {
    let Some(sprint) = store.get::<Sprint>(sprint_id)? else {
        return Ok(None);
    };

    let mut story_statuses = BTreeMap::new();
    for story in sprint_stories(store, &sprint)? {
        *story_statuses.entry(story.status).or_insert(0) += 1;
    }

    Ok(Some(SprintProgress {
        progress_percentage: round1(completion_percentage(
            sprint.completed_points,
            sprint.total_points,
        )),
        completed_points: sprint.completed_points,
        total_points: sprint.total_points,
        remaining_points: sprint.remaining_points(),
        story_statuses,
        days_remaining: sprint.days_remaining(today),
        stories_count: sprint.stories.len(),
    }))
}

// ---------------------------------------------------------------------------
// Dashboard aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickStats {
    pub active_stories: usize,
    pub completed_stories: usize,
    pub sprint_days_left: i64,
    pub velocity: f64,
}

/// Headline counts. Unreadable collections count as empty.
pub fn quick_stats<B: Backend>(store: &Store<B>, today: NaiveDate) -> QuickStats {
    let stories: Vec<Story> = store.list_or_empty();
    let current = store
        .list_or_empty::<Sprint>()
        .into_iter()
        .find(Sprint::is_active);

    let completed_stories = stories.iter().filter(|s| s.status.is_done()).count();
    QuickStats {
        active_stories: stories.len() - completed_stories,
        completed_stories,
        sprint_days_left: current.as_ref().map_or(0, |s| s.days_remaining(today)),
        velocity: current.as_ref().map_or(0.0, |s| s.completed_points),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowData {
    pub status_distribution: BTreeMap<StoryStatus, usize>,
    pub total_stories: usize,
    /// Mean days from creation to last update across Done stories.
    pub avg_cycle_time_days: Option<f64>,
    pub blocked_stories: usize,
}

pub fn workflow_data<B: Backend>(store: &Store<B>) -> Result<WorkflowData> {
    let stories: Vec<Story> = store.list()?;

    let mut status_distribution = BTreeMap::new();
    for story in &stories {
        *status_distribution.entry(story.status).or_insert(0) += 1;
    }

    let cycle_days: Vec<f64> = stories
        .iter()
        .filter(|s| s.status.is_done())
        .map(|s| (s.updated_at - s.created_at).num_seconds() as f64 / 86_400.0)
        .collect();
    let avg_cycle_time_days = (!cycle_days.is_empty()).then(|| round1(mean(&cycle_days)));

    Ok(WorkflowData {
        status_distribution,
        total_stories: stories.len(),
        avg_cycle_time_days,
        blocked_stories: stories.iter().filter(|s| s.is_blocked()).count(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSprintData {
    pub sprint: Sprint,
    pub stories: Vec<Story>,
    pub total_stories: usize,
    pub progress: f64,
}

/// The Active sprint with its member stories, or `None` without one.
pub fn current_sprint_data<B: Backend>(store: &Store<B>) -> Result<Option<CurrentSprintData>> {
    let Some(sprint) = current_sprint(store)? else {
        return Ok(None);
    };
    let stories = sprint_stories(store, &sprint)?;
    Ok(Some(CurrentSprintData {
        progress: round1(completion_percentage(
            sprint.completed_points,
            sprint.total_points,
        )),
        total_stories: stories.len(),
        stories,
        sprint,
    }))
}

/// Up to five stories currently In Progress.
pub fn today_tasks<B: Backend>(store: &Store<B>) -> Result<Vec<Story>> {
    Ok(store
        .list::<Story>()?
        .into_iter()
        .filter(|s| s.status == StoryStatus::InProgress)
        .take(5)
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrum::{activate_sprint, add_story_to_sprint, create_sprint, create_story, update_story_status};
    use crate::store::InMemory;
    use crate::types::Priority;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn completed_sprint(store: &Store<InMemory>, name: &str, points: f64) -> String {
        let mut sprint = create_sprint(name, 2, Some(date(2024, 1, 1)), 40);
        sprint.status = SprintStatus::Completed;
        sprint.completed_points = points;
        sprint.total_points = points + 2.0;
        store.save(&sprint).unwrap();
        sprint.id
    }

    #[test]
    fn velocity_improving_scenario() {
        let store = Store::in_memory();
        let ids: Vec<String> = [10.0, 15.0, 20.0]
            .iter()
            .enumerate()
            .map(|(i, p)| completed_sprint(&store, &format!("S{i}"), *p))
            .collect();

        let v = calculate_velocity(&store, &ids).unwrap();
        assert_eq!(v.average, 15.0);
        assert_eq!(v.trend, Trend::Improving);
        assert_eq!(v.sprints_analyzed, 3);
        assert_eq!(v.velocities, vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn velocity_without_completed_sprints_is_no_data() {
        let store = Store::in_memory();
        assert_eq!(calculate_velocity(&store, &[]).unwrap().trend, Trend::NoData);

        let planning = create_sprint("P", 2, None, 40);
        store.save(&planning).unwrap();
        let v = calculate_velocity(&store, &[planning.id, "ghost".to_string()]).unwrap();
        assert_eq!(v.trend, Trend::NoData);
        assert_eq!(v.average, 0.0);
        assert_eq!(v.sprints_analyzed, 0);
    }

    #[test]
    fn velocity_trend_variants() {
        assert_eq!(velocity_from_series(vec![8.0]).trend, Trend::InsufficientData);
        assert_eq!(velocity_from_series(vec![8.0, 9.0]).trend, Trend::Improving);
        assert_eq!(velocity_from_series(vec![20.0, 10.0, 12.0]).trend, Trend::Declining);
        assert_eq!(velocity_from_series(vec![10.0, 10.0, 10.0]).trend, Trend::Stable);
        assert_eq!(velocity_from_series(vec![1.0, 2.0, 2.0]).average, 1.7);
        assert_eq!(Trend::NoData.to_string(), "No data");
    }

    #[test]
    fn two_completed_sprints_already_have_a_trend() {
        let v = velocity_from_series(vec![10.0, 15.0]);
        assert_eq!(v.trend, Trend::Improving);
        assert_eq!(v.average, 12.5);
        assert_eq!(velocity_from_series(vec![0.0, 0.0]).trend, Trend::Stable);
    }

    #[test]
    fn velocity_history_lists_completed_only() {
        let store = Store::in_memory();
        completed_sprint(&store, "Done", 12.0);
        store.save(&create_sprint("Planning", 2, None, 40)).unwrap();
        let history = velocity_history(&store).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sprint_name, "Done");
        assert_eq!(history[0].planned_points, 14.0);
    }

    #[test]
    fn ideal_line_runs_from_total_to_zero() {
        let mut sprint = create_sprint("S", 2, Some(date(2024, 1, 1)), 40);
        sprint.total_points = 14.0;
        let line = ideal_line(&sprint);
        assert_eq!(line.len(), 15);
        assert_eq!(line[0].remaining, 14.0);
        assert_eq!(line[7].remaining, 7.0);
        assert_eq!(line[14].remaining, 0.0);
        assert_eq!(line[14].date, date(2024, 1, 15));
    }

    #[test]
    fn burndown_missing_sprint_is_none() {
        let store = Store::in_memory();
        assert!(generate_burndown(&store, "ghost", date(2024, 1, 1)).unwrap().is_none());
    }

    #[test]
    fn burndown_includes_actual_line() {
        let store = Store::in_memory();
        let sprint = create_sprint("S", 1, Some(date(2024, 1, 1)), 40);
        store.save(&sprint).unwrap();
        let b = generate_burndown(&store, &sprint.id, date(2024, 1, 3)).unwrap().unwrap();
        assert_eq!(b.days_in_sprint, 7);
        assert_eq!(b.ideal_line.len(), 8);
        assert_eq!(b.actual_line.len(), 3);
    }

    #[test]
    fn progress_with_zero_total_is_zero_percent() {
        let store = Store::in_memory();
        let sprint = create_sprint("S", 2, Some(date(2024, 1, 1)), 40);
        store.save(&sprint).unwrap();
        let p = sprint_progress(&store, &sprint.id, date(2024, 1, 10)).unwrap().unwrap();
        assert_eq!(p.progress_percentage, 0.0);
        assert_eq!(p.remaining_points, 0.0);
        assert_eq!(p.days_remaining, 5);
        assert!(sprint_progress(&store, "ghost", date(2024, 1, 10)).unwrap().is_none());
    }

    #[test]
    fn progress_counts_member_statuses() {
        let store = Store::in_memory();
        let sprint = create_sprint("S", 2, Some(date(2024, 1, 1)), 40);
        store.save(&sprint).unwrap();
        let mut ids = Vec::new();
        for (title, pts) in [("A", 3.0), ("B", 5.0), ("C", 2.0)] {
            let mut story = create_story(title, "d", "a", Priority::Low, &[]);
            story.story_points = Some(pts);
            store.save(&story).unwrap();
            add_story_to_sprint(&store, &sprint.id, &story.id).unwrap();
            ids.push(story.id);
        }
        activate_sprint(&store, &sprint.id).unwrap();
        update_story_status(&store, &ids[1], StoryStatus::Done).unwrap();
        update_story_status(&store, &ids[2], StoryStatus::InProgress).unwrap();

        let p = sprint_progress(&store, &sprint.id, date(2030, 1, 1)).unwrap().unwrap();
        assert_eq!(p.total_points, 10.0);
        assert_eq!(p.completed_points, 5.0);
        assert_eq!(p.progress_percentage, 50.0);
        assert_eq!(p.remaining_points, 5.0);
        assert_eq!(p.days_remaining, 0);
        assert_eq!(p.stories_count, 3);
        assert_eq!(p.story_statuses[&StoryStatus::Backlog], 1);
        assert_eq!(p.story_statuses[&StoryStatus::Done], 1);
        assert_eq!(p.story_statuses[&StoryStatus::InProgress], 1);
    }

    #[test]
    fn quick_stats_and_workflow() {
        let store = Store::in_memory();
        let mut done = create_story("Done one", "d", "a", Priority::Low, &[]);
        done.status = StoryStatus::Done;
        store.save(&done).unwrap();
        let blocked = create_story("Stuck", "d", "a", Priority::Low, &["blocked".to_string()]);
        store.save(&blocked).unwrap();

        let stats = quick_stats(&store, date(2024, 1, 1));
        assert_eq!(stats.active_stories, 1);
        assert_eq!(stats.completed_stories, 1);
        assert_eq!(stats.sprint_days_left, 0);

        let wf = workflow_data(&store).unwrap();
        assert_eq!(wf.total_stories, 2);
        assert_eq!(wf.blocked_stories, 1);
        assert_eq!(wf.status_distribution[&StoryStatus::Done], 1);
        assert!(wf.avg_cycle_time_days.is_some());
    }

    #[test]
    fn current_sprint_data_requires_active_sprint() {
        let store = Store::in_memory();
        assert!(current_sprint_data(&store).unwrap().is_none());
        let sprint = create_sprint("S", 2, None, 40);
        store.save(&sprint).unwrap();
        activate_sprint(&store, &sprint.id).unwrap();
        let data = current_sprint_data(&store).unwrap().unwrap();
        assert_eq!(data.sprint.id, sprint.id);
        assert_eq!(data.total_stories, 0);
        assert_eq!(data.progress, 0.0);
    }

    #[test]
    fn today_tasks_caps_at_five() {
        let store = Store::in_memory();
        for i in 0..7 {
            let mut s = create_story(&format!("T{i}"), "d", "a", Priority::Low, &[]);
            s.status = StoryStatus::InProgress;
            store.save(&s).unwrap();
        }
        assert_eq!(today_tasks(&store).unwrap().len(), 5);
    }
}

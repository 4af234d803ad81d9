use super::{ensure_valid, open_store};
use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use sprint_core::{
    config::Config,
    metrics,
    scrum::{self, today},
    sprint::Sprint,
    story::format_points,
    validate::validate_sprint,
    SprintError, Store,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum SprintSubcommand {
    /// Plan a new sprint
    Create {
        name: String,
        /// Duration in weeks (default from config)
        #[arg(long)]
        weeks: Option<u32>,
        /// Start date, YYYY-MM-DD (default today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Capacity in story points (default from config)
        #[arg(long)]
        capacity: Option<u32>,
    },
    /// List all sprints
    List,
    /// Show a sprint and its stories
    Show { id: String },
    /// Add a story to a sprint
    AddStory { sprint_id: String, story_id: String },
    /// Remove a story from a sprint
    RemoveStory { sprint_id: String, story_id: String },
    /// Add a sprint goal
    Goal {
        id: String,
        #[arg(required = true)]
        goal: Vec<String>,
    },
    /// Start a sprint; any other active sprint is completed
    Activate { id: String },
    /// Complete the active sprint
    Complete { id: String },
    /// Cancel a planned or active sprint
    Cancel { id: String },
    /// Completion, points and days remaining
    Progress { id: String },
    /// Ideal and actual burndown lines
    Burndown { id: String },
    /// Velocity over completed sprints (default: all of them)
    Velocity { ids: Vec<String> },
}

pub fn run(root: &Path, subcmd: SprintSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        SprintSubcommand::Create {
            name,
            weeks,
            start,
            capacity,
        } => {
            let config = Config::load_or_default(root).context("failed to read config")?;
            let sprint = scrum::create_sprint(
                &name,
                weeks.unwrap_or(config.sprint.default_duration_weeks),
                start,
                capacity.unwrap_or(config.sprint.default_capacity),
            );
            create(&store, sprint, json)
        }
        SprintSubcommand::List => list(&store, json),
        SprintSubcommand::Show { id } => show(&store, &id, json),
        SprintSubcommand::AddStory {
            sprint_id,
            story_id,
        } => add_story(&store, &sprint_id, &story_id, json),
        SprintSubcommand::RemoveStory {
            sprint_id,
            story_id,
        } => remove_story(&store, &sprint_id, &story_id, json),
        SprintSubcommand::Goal { id, goal } => add_goal(&store, &id, &goal.join(" "), json),
        SprintSubcommand::Activate { id } => activate(&store, &id, json),
        SprintSubcommand::Complete { id } => {
            let sprint = scrum::complete_sprint(&store, &id)?;
            report_status(&sprint, json)
        }
        SprintSubcommand::Cancel { id } => {
            let sprint = scrum::cancel_sprint(&store, &id)?;
            report_status(&sprint, json)
        }
        SprintSubcommand::Progress { id } => progress(&store, &id, json),
        SprintSubcommand::Burndown { id } => burndown(&store, &id, json),
        SprintSubcommand::Velocity { ids } => velocity(&store, ids, json),
    }
}

pub(crate) fn load(store: &Store, id: &str) -> anyhow::Result<Sprint> {
    store
        .get::<Sprint>(id)
        .context("failed to read sprints")?
        .ok_or_else(|| SprintError::SprintNotFound(id.to_string()).into())
}

fn create(store: &Store, sprint: Sprint, json: bool) -> anyhow::Result<()> {
    ensure_valid(validate_sprint(&sprint))?;
    store.save(&sprint).context("failed to save sprint")?;

    if json {
        print_json(&sprint)?;
    } else {
        println!(
            "Created sprint [{}]: {} ({} to {}, capacity {})",
            sprint.id, sprint.name, sprint.start_date, sprint.end_date, sprint.capacity
        );
    }
    Ok(())
}

fn list(store: &Store, json: bool) -> anyhow::Result<()> {
    let sprints: Vec<Sprint> = store.list().context("failed to read sprints")?;
    if json {
        return print_json(&sprints);
    }
    if sprints.is_empty() {
        println!("No sprints.");
        return Ok(());
    }

    let rows = sprints
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                truncate(&s.name, 30),
                s.status.to_string(),
                s.start_date.to_string(),
                s.end_date.to_string(),
                s.stories.len().to_string(),
                format!("{}/{}", s.completed_points, s.total_points),
                s.capacity.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "STATUS", "START", "END", "STORIES", "DONE/TOTAL", "CAPACITY"],
        rows,
    );
    Ok(())
}

fn show(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let sprint = load(store, id)?;
    let stories = scrum::sprint_stories(store, &sprint).context("failed to read stories")?;

    if json {
        return print_json(&serde_json::json!({ "sprint": sprint, "stories": stories }));
    }

    println!("[{}] {} ({})", sprint.id, sprint.name, sprint.status);
    println!("Dates:     {} to {}", sprint.start_date, sprint.end_date);
    println!("Capacity:  {} points", sprint.capacity);
    println!(
        "Points:    {} of {} completed",
        sprint.completed_points, sprint.total_points
    );
    if !sprint.goals.is_empty() {
        println!("\nGoals:");
        for goal in &sprint.goals {
            println!("  - {goal}");
        }
    }
    if !stories.is_empty() {
        println!();
        let rows = stories
            .iter()
            .map(|s| {
                vec![
                    s.id.clone(),
                    truncate(&s.title, 40),
                    s.status.to_string(),
                    format_points(s.story_points),
                ]
            })
            .collect();
        print_table(&["ID", "TITLE", "STATUS", "POINTS"], rows);
    }
    Ok(())
}

fn add_story(store: &Store, sprint_id: &str, story_id: &str, json: bool) -> anyhow::Result<()> {
    let added = scrum::add_story_to_sprint(store, sprint_id, story_id)
        .context("failed to add story to sprint")?;

    if json {
        print_json(&serde_json::json!({
            "sprint_id": sprint_id,
            "story_id": story_id,
            "added": added,
        }))?;
    } else if added {
        println!("Added story [{story_id}] to sprint [{sprint_id}]");
    } else {
        println!("Nothing to do: sprint or story not found, or story already in the sprint");
    }
    Ok(())
}

fn remove_story(store: &Store, sprint_id: &str, story_id: &str, json: bool) -> anyhow::Result<()> {
    let removed = scrum::remove_story_from_sprint(store, sprint_id, story_id)
        .context("failed to remove story from sprint")?;

    if json {
        print_json(&serde_json::json!({
            "sprint_id": sprint_id,
            "story_id": story_id,
            "removed": removed,
        }))?;
    } else if removed {
        println!("Removed story [{story_id}] from sprint [{sprint_id}]");
    } else {
        println!("Nothing to do: story [{story_id}] is not in sprint [{sprint_id}]");
    }
    Ok(())
}

fn add_goal(store: &Store, id: &str, goal: &str, json: bool) -> anyhow::Result<()> {
    if !scrum::add_goal(store, id, goal).context("failed to save sprint")? {
        return Err(SprintError::SprintNotFound(id.to_string()).into());
    }
    if json {
        print_json(&serde_json::json!({ "id": id, "goal": goal }))?;
    } else {
        println!("Added goal to sprint [{id}]: {goal}");
    }
    Ok(())
}

fn activate(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let previous = scrum::activate_sprint(store, id)?;
    let sprint = load(store, id)?;

    if json {
        return print_json(&serde_json::json!({
            "sprint": sprint,
            "completed_previous": previous.as_ref().map(|p| &p.id),
        }));
    }
    if let Some(prev) = previous {
        println!("Completed previously active sprint [{}]: {}", prev.id, prev.name);
    }
    println!("Sprint [{}] is now Active", sprint.id);
    Ok(())
}

fn report_status(sprint: &Sprint, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(sprint)?;
    } else {
        println!("Sprint [{}] is now {}", sprint.id, sprint.status);
    }
    Ok(())
}

fn progress(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let progress = metrics::sprint_progress(store, id, today())
        .context("failed to compute progress")?
        .ok_or_else(|| SprintError::SprintNotFound(id.to_string()))?;

    if json {
        return print_json(&progress);
    }
    println!("Completion:      {:.1}%", progress.progress_percentage);
    println!(
        "Points:          {} done, {} remaining, {} total",
        progress.completed_points, progress.remaining_points, progress.total_points
    );
    println!("Days remaining:  {}", progress.days_remaining);
    println!("Stories:         {}", progress.stories_count);
    for (status, count) in &progress.story_statuses {
        println!("  {:<12} {count}", status.as_str());
    }
    Ok(())
}

fn burndown(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let chart = metrics::generate_burndown(store, id, today())
        .context("failed to compute burndown")?
        .ok_or_else(|| SprintError::SprintNotFound(id.to_string()))?;

    if json {
        return print_json(&chart);
    }
    let rows = chart
        .ideal_line
        .iter()
        .map(|ideal| {
            let actual = chart
                .actual_line
                .iter()
                .find(|a| a.day == ideal.day)
                .map_or_else(|| "-".to_string(), |a| a.remaining.to_string());
            vec![
                ideal.day.to_string(),
                ideal.date.to_string(),
                ideal.remaining.to_string(),
                actual,
            ]
        })
        .collect();
    print_table(&["DAY", "DATE", "IDEAL", "ACTUAL"], rows);
    Ok(())
}

fn velocity(store: &Store, ids: Vec<String>, json: bool) -> anyhow::Result<()> {
    let ids = if ids.is_empty() {
        store
            .list::<Sprint>()
            .context("failed to read sprints")?
            .into_iter()
            .map(|s| s.id)
            .collect()
    } else {
        ids
    };
    let velocity = metrics::calculate_velocity(store, &ids).context("failed to compute velocity")?;

    if json {
        return print_json(&velocity);
    }
    println!("Average velocity:  {}", velocity.average);
    println!("Trend:             {}", velocity.trend);
    println!("Sprints analyzed:  {}", velocity.sprints_analyzed);
    if !velocity.velocities.is_empty() {
        let series: Vec<String> = velocity.velocities.iter().map(f64::to_string).collect();
        println!("Series:            {}", series.join(", "));
    }
    Ok(())
}

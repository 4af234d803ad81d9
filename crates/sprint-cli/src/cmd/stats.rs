use super::open_store;
use crate::output::print_json;
use anyhow::Context;
use sprint_core::{metrics, scrum::today, story::format_points};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let quick = metrics::quick_stats(&store, today());
    let workflow = metrics::workflow_data(&store).context("failed to read stories")?;
    let current = metrics::current_sprint_data(&store).context("failed to read sprints")?;
    let tasks = metrics::today_tasks(&store).context("failed to read stories")?;

    if json {
        return print_json(&serde_json::json!({
            "quick_stats": quick,
            "workflow": workflow,
            "current_sprint": current,
            "today_tasks": tasks,
        }));
    }

    println!("Active stories:     {}", quick.active_stories);
    println!("Completed stories:  {}", quick.completed_stories);
    println!("Blocked stories:    {}", workflow.blocked_stories);
    match workflow.avg_cycle_time_days {
        Some(days) => println!("Avg cycle time:     {days} days"),
        None => println!("Avg cycle time:     -"),
    }

    match &current {
        Some(data) => {
            println!("\nCurrent sprint: {} ({})", data.sprint.name, data.sprint.id);
            println!("  Progress:       {:.1}%", data.progress);
            println!("  Days left:      {}", quick.sprint_days_left);
            println!("  Completed:      {} points", quick.velocity);
            println!("  Stories:        {}", data.total_stories);
        }
        None => println!("\nNo active sprint."),
    }

    if !workflow.status_distribution.is_empty() {
        println!("\nStatus distribution:");
        for (status, count) in &workflow.status_distribution {
            println!("  {:<12} {count}", status.as_str());
        }
    }

    if !tasks.is_empty() {
        println!("\nIn progress:");
        for t in &tasks {
            println!("  [{}] {} ({})", t.id, t.title, format_points(t.story_points));
        }
    }
    Ok(())
}

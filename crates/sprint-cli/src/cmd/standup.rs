use super::open_store;
use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use sprint_core::{
    scrum::today,
    standup::{self, MemberUpdate, Standup},
    SprintError, Store,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum StandupSubcommand {
    /// Record a team member's update
    Add {
        #[arg(long)]
        member: String,
        #[arg(long, default_value = "")]
        yesterday: String,
        #[arg(long, default_value = "")]
        today: String,
        #[arg(long, default_value = "")]
        blockers: String,
        /// Standup date, YYYY-MM-DD (default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show one day's standup
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List standups, newest first
    List,
    /// Remove an update by its position (starting at 1)
    Remove {
        position: usize,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(root: &Path, subcmd: StandupSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        StandupSubcommand::Add {
            member,
            yesterday,
            today: plan,
            blockers,
            date,
        } => {
            let date = date.unwrap_or_else(today);
            let update = MemberUpdate::new(member, yesterday, plan, blockers);
            let day = standup::record_update(&store, date, update)?;
            if json {
                print_json(&day)?;
            } else {
                println!("Recorded update {} for {}", day.updates.len(), day.id);
            }
            Ok(())
        }
        StandupSubcommand::Show { date } => show(&store, date.unwrap_or_else(today), json),
        StandupSubcommand::List => list(&store, json),
        StandupSubcommand::Remove { position, date } => {
            let date = date.unwrap_or_else(today);
            let removed = position
                .checked_sub(1)
                .map(|index| standup::remove_update(&store, date, index))
                .transpose()
                .context("failed to save standup")?
                .unwrap_or(false);
            if json {
                print_json(&serde_json::json!({ "date": date, "removed": removed }))?;
            } else if removed {
                println!("Removed update {position} from {date}");
            } else {
                println!("No update {position} on {date}");
            }
            Ok(())
        }
    }
}

pub(crate) fn load(store: &Store, date: NaiveDate) -> anyhow::Result<Standup> {
    standup::get(store, date)
        .context("failed to read standups")?
        .ok_or_else(|| SprintError::StandupNotFound(date.to_string()).into())
}

fn show(store: &Store, date: NaiveDate, json: bool) -> anyhow::Result<()> {
    let day = load(store, date)?;
    if json {
        return print_json(&day);
    }

    println!("Standup {}", day.id);
    for (i, u) in day.updates.iter().enumerate() {
        println!("\n{}. {}", i + 1, u.member);
        println!("   Yesterday: {}", u.yesterday);
        println!("   Today:     {}", u.today);
        if u.has_blockers() {
            println!("   Blockers:  {}", u.blockers);
        }
    }
    let focus = day.focus();
    if !focus.is_empty() {
        println!("\nFocus today:");
        for f in focus {
            println!("  - {f}");
        }
    }
    let blockers = day.blockers();
    if !blockers.is_empty() {
        println!("\nBlockers:");
        for b in blockers {
            println!("  - {b}");
        }
    }
    if let Some(summary) = &day.summary {
        println!("\nSummary:\n{summary}");
    }
    Ok(())
}

fn list(store: &Store, json: bool) -> anyhow::Result<()> {
    let days = standup::list(store).context("failed to read standups")?;
    if json {
        return print_json(&days);
    }
    if days.is_empty() {
        println!("No standups.");
        return Ok(());
    }
    let rows = days
        .iter()
        .map(|d| {
            vec![
                d.id.clone(),
                d.updates.len().to_string(),
                d.blockers().len().to_string(),
                d.summary
                    .as_deref()
                    .map_or_else(|| "-".to_string(), |s| truncate(s.lines().next().unwrap_or(""), 50)),
            ]
        })
        .collect();
    print_table(&["DATE", "UPDATES", "BLOCKERS", "SUMMARY"], rows);
    Ok(())
}

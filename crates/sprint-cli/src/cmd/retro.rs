use super::open_store;
use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use sprint_core::{
    retro::{self, ActionStatus, Retrospective, Section},
    SprintError, Store,
};
use std::path::Path;

#[derive(Clone, Copy, ValueEnum)]
pub enum ItemKind {
    WentWell,
    ToImprove,
    Action,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SectionArg {
    WentWell,
    ToImprove,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::WentWell => Section::WentWell,
            SectionArg::ToImprove => Section::ToImprove,
        }
    }
}

#[derive(Subcommand)]
pub enum RetroSubcommand {
    /// Add a feedback item or action item to a sprint's retrospective
    Add {
        sprint_id: String,
        #[arg(value_enum)]
        kind: ItemKind,
        #[arg(required = true)]
        text: Vec<String>,
        /// Owner of an action item
        #[arg(long)]
        owner: Option<String>,
    },
    /// Upvote a feedback item (positions start at 1)
    Vote {
        sprint_id: String,
        #[arg(value_enum)]
        section: SectionArg,
        position: usize,
    },
    /// Set an action item's status (Open, In Progress, Done)
    ActionStatus {
        sprint_id: String,
        position: usize,
        status: ActionStatus,
    },
    /// Set team mood from 1 to 5
    Mood { sprint_id: String, mood: u8 },
    /// Remove an item (positions start at 1)
    Remove {
        sprint_id: String,
        #[arg(value_enum)]
        kind: ItemKind,
        position: usize,
    },
    /// Show a sprint's retrospective
    Show { sprint_id: String },
    /// List open action items across all retrospectives
    Actions,
}

fn index(position: usize) -> anyhow::Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| SprintError::InvalidValue("positions start at 1".to_string()).into())
}

fn out_of_range(what: &str, position: usize) -> anyhow::Error {
    SprintError::InvalidValue(format!("no {what} at position {position}")).into()
}

pub fn run(root: &Path, subcmd: RetroSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        RetroSubcommand::Add {
            sprint_id,
            kind,
            text,
            owner,
        } => {
            let text = text.join(" ");
            let saved = retro::update(&store, &sprint_id, |r| {
                match kind {
                    ItemKind::WentWell => r.add_item(Section::WentWell, &text),
                    ItemKind::ToImprove => r.add_item(Section::ToImprove, &text),
                    ItemKind::Action => r.add_action(&text, owner.as_deref()),
                }
                Ok(r.clone())
            })?;
            report(&saved, json, "Added to retrospective")
        }
        RetroSubcommand::Vote {
            sprint_id,
            section,
            position,
        } => {
            let i = index(position)?;
            let votes = retro::update(&store, &sprint_id, |r| {
                r.vote(section.into(), i)
                    .ok_or_else(|| SprintError::InvalidValue(format!("no item at position {position}")))
            })?;
            if json {
                print_json(&serde_json::json!({ "sprint_id": sprint_id, "votes": votes }))?;
            } else {
                println!("Item {position} now has {votes} vote(s)");
            }
            Ok(())
        }
        RetroSubcommand::ActionStatus {
            sprint_id,
            position,
            status,
        } => {
            let i = index(position)?;
            let saved = retro::update(&store, &sprint_id, |r| {
                if r.set_action_status(i, status) {
                    Ok(r.clone())
                } else {
                    Err(SprintError::InvalidValue(format!(
                        "no action item at position {position}"
                    )))
                }
            })?;
            report(&saved, json, &format!("Action {position} is now {status}"))
        }
        RetroSubcommand::Mood { sprint_id, mood } => {
            let saved = retro::update(&store, &sprint_id, |r| {
                r.set_mood(mood)?;
                Ok(r.clone())
            })?;
            report(&saved, json, &format!("Team mood set to {mood}"))
        }
        RetroSubcommand::Remove {
            sprint_id,
            kind,
            position,
        } => {
            let i = index(position)?;
            let mut retro = load(&store, &sprint_id)?;
            let removed = match kind {
                ItemKind::WentWell => retro.remove_item(Section::WentWell, i),
                ItemKind::ToImprove => retro.remove_item(Section::ToImprove, i),
                ItemKind::Action => retro.remove_action(i),
            };
            if !removed {
                return Err(out_of_range("item", position));
            }
            store.save(&retro).context("failed to save retrospective")?;
            report(&retro, json, &format!("Removed item {position}"))
        }
        RetroSubcommand::Show { sprint_id } => show(&store, &sprint_id, json),
        RetroSubcommand::Actions => actions(&store, json),
    }
}

pub(crate) fn load(store: &Store, sprint_id: &str) -> anyhow::Result<Retrospective> {
    store
        .get::<Retrospective>(sprint_id)
        .context("failed to read retrospectives")?
        .ok_or_else(|| SprintError::RetrospectiveNotFound(sprint_id.to_string()).into())
}

fn report(retro: &Retrospective, json: bool, message: &str) -> anyhow::Result<()> {
    if json {
        print_json(retro)
    } else {
        println!("{message} ({})", retro.sprint_name);
        Ok(())
    }
}

fn print_items(title: &str, retro: &Retrospective, section: Section) {
    let items = retro.items(section);
    if items.is_empty() {
        return;
    }
    println!("\n{title}:");
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {} (+{})", i + 1, item.text, item.votes);
    }
}

fn show(store: &Store, sprint_id: &str, json: bool) -> anyhow::Result<()> {
    let retro = load(store, sprint_id)?;
    if json {
        return print_json(&retro);
    }

    println!("Retrospective: {}", retro.sprint_name);
    println!("Team mood:     {}/5", retro.team_mood);
    print_items("Went well", &retro, Section::WentWell);
    print_items("To improve", &retro, Section::ToImprove);
    if !retro.action_items.is_empty() {
        println!("\nAction items:");
        for (i, a) in retro.action_items.iter().enumerate() {
            println!("  {}. [{}] {} ({})", i + 1, a.status, a.text, a.owner);
        }
    }
    if let Some(insights) = &retro.insights {
        println!("\nInsights:\n{insights}");
    }
    Ok(())
}

fn actions(store: &Store, json: bool) -> anyhow::Result<()> {
    let open = retro::open_actions(store).context("failed to read retrospectives")?;
    if json {
        return print_json(&open);
    }
    if open.is_empty() {
        println!("No open action items.");
        return Ok(());
    }
    let rows = open
        .iter()
        .map(|o| {
            vec![
                truncate(&o.sprint_name, 20),
                (o.index + 1).to_string(),
                truncate(&o.action.text, 50),
                o.action.owner.clone(),
                o.action.status.to_string(),
            ]
        })
        .collect();
    print_table(&["SPRINT", "#", "ACTION", "OWNER", "STATUS"], rows);
    Ok(())
}

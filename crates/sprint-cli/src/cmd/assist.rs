use super::{ensure_valid, open_store};
use crate::output::print_json;
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use sprint_assist::{Assistant, GenerationClient};
use sprint_core::{
    config::Config,
    metrics,
    scrum::today,
    standup,
    story::Story,
    types::StoryStatus,
    validate::validate_story,
    Store,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum AssistSubcommand {
    /// Check whether the generation endpoint is reachable
    Status,
    /// Estimate story points for a story
    Estimate {
        story_id: String,
        /// Store the estimate on the story
        #[arg(long)]
        apply: bool,
    },
    /// Summarize a day's standup
    Standup {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Store the summary on the standup
        #[arg(long)]
        save: bool,
    },
    /// Assess the health of the active sprint
    Health,
    /// Draw insights from a sprint's retrospective
    Retro {
        sprint_id: String,
        /// Store the insights on the retrospective
        #[arg(long)]
        save: bool,
    },
    /// Predict next sprint's velocity from completed sprints
    Velocity,
    /// Look for workflow bottlenecks
    Bottlenecks,
    /// Propose a sprint plan from the backlog
    Plan {
        /// Team capacity in points (default from config)
        #[arg(long)]
        capacity: Option<u32>,
    },
}

pub fn run(root: &Path, subcmd: AssistSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to read config")?;
    let client = GenerationClient::new(&config.generation)
        .context("failed to build generation client")?;

    // Status only talks to the endpoint and works before `sprint init`.
    if let AssistSubcommand::Status = subcmd {
        return status(&client, json);
    }

    let store = open_store(root)?;
    let assistant = Assistant::new(client);
    match subcmd {
        AssistSubcommand::Status => status(assistant.client(), json),
        AssistSubcommand::Estimate { story_id, apply } => {
            estimate(&store, &assistant, &story_id, apply, json)
        }
        AssistSubcommand::Standup { date, save } => {
            let date = date.unwrap_or_else(today);
            let day = super::standup::load(&store, date)?;
            let summary = assistant
                .standup_summary(&day.updates)
                .context("standup summary failed")?;
            if save {
                standup::set_summary(&store, date, &summary).context("failed to save standup")?;
            }
            print_text(&summary, json)
        }
        AssistSubcommand::Health => {
            let data = metrics::current_sprint_data(&store)
                .context("failed to read sprints")?
                .ok_or_else(|| anyhow::anyhow!("no active sprint"))?;
            let text = assistant.sprint_health(&data).context("sprint analysis failed")?;
            print_text(&text, json)
        }
        AssistSubcommand::Retro { sprint_id, save } => {
            let mut retro = super::retro::load(&store, &sprint_id)?;
            let text = assistant
                .retrospective_insights(&retro)
                .context("retrospective analysis failed")?;
            if save {
                retro.insights = Some(text.clone());
                store.save(&retro).context("failed to save retrospective")?;
            }
            print_text(&text, json)
        }
        AssistSubcommand::Velocity => {
            let history = metrics::velocity_history(&store).context("failed to read sprints")?;
            let text = assistant
                .predict_velocity(&history)
                .context("velocity prediction failed")?;
            print_text(&text, json)
        }
        AssistSubcommand::Bottlenecks => {
            let workflow = metrics::workflow_data(&store).context("failed to read stories")?;
            let text = assistant
                .detect_bottlenecks(&workflow)
                .context("bottleneck analysis failed")?;
            print_text(&text, json)
        }
        AssistSubcommand::Plan { capacity } => {
            let backlog: Vec<Story> = store
                .list::<Story>()
                .context("failed to read stories")?
                .into_iter()
                .filter(|s| s.status == StoryStatus::Backlog)
                .collect();
            let capacity = capacity.unwrap_or(config.sprint.default_capacity);
            let text = assistant
                .sprint_plan(&backlog, capacity)
                .context("sprint planning failed")?;
            print_text(&text, json)
        }
    }
}

fn print_text(text: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({ "text": text }))
    } else {
        println!("{text}");
        Ok(())
    }
}

fn status(client: &GenerationClient, json: bool) -> anyhow::Result<()> {
    let available = client.check_connection();
    if json {
        return print_json(&serde_json::json!({
            "base_url": client.base_url(),
            "model": client.model(),
            "available": available,
        }));
    }
    let state = if available { "available" } else { "unreachable" };
    println!("{} ({}): {state}", client.base_url(), client.model());
    Ok(())
}

fn estimate(
    store: &Store,
    assistant: &Assistant,
    story_id: &str,
    apply: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut story = super::story::load(store, story_id)?;
    let estimate = assistant
        .estimate_story_points(&story.title, &story.description, &story.acceptance_criteria)
        .context("estimation failed")?;

    if apply {
        story.story_points = Some(estimate.estimated_points);
        ensure_valid(validate_story(&story))?;
        story.touch();
        store.save(&story).context("failed to save story")?;
    }

    if json {
        return print_json(&estimate);
    }
    println!("Estimated points: {}", estimate.estimated_points);
    println!("Complexity:       {}", estimate.complexity_factors.join(", "));
    println!("\n{}", estimate.reasoning);
    if apply {
        println!("\nSaved estimate on story [{}]", story.id);
    }
    Ok(())
}

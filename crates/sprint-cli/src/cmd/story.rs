use super::{ensure_valid, open_store};
use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use clap::Subcommand;
use sprint_core::{
    scrum,
    sprint::Sprint,
    story::{format_points, parse_labels, Story},
    types::{Priority, StoryStatus},
    validate::validate_story,
    SprintError, Store,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum StorySubcommand {
    /// Create a backlog story
    Create {
        title: String,
        #[arg(long, short = 'd', default_value = "")]
        description: String,
        /// Acceptance criteria
        #[arg(long, default_value = "")]
        criteria: String,
        #[arg(long, default_value = "Medium")]
        priority: Priority,
        /// Comma-separated labels
        #[arg(long)]
        labels: Option<String>,
        #[arg(long)]
        points: Option<f64>,
        #[arg(long)]
        assignee: Option<String>,
    },
    /// List stories, optionally filtered
    List {
        #[arg(long)]
        status: Option<StoryStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        label: Option<String>,
    },
    /// Show one story with its comments
    Show { id: String },
    /// Edit story fields
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short = 'd')]
        description: Option<String>,
        #[arg(long)]
        criteria: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Replace the labels (comma-separated)
        #[arg(long)]
        labels: Option<String>,
        #[arg(long)]
        points: Option<f64>,
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Move a story to another status (Backlog, To Do, In Progress, In Review, Done)
    Status { id: String, status: StoryStatus },
    /// Comment on a story
    Comment {
        id: String,
        #[arg(required = true)]
        body: Vec<String>,
        #[arg(long)]
        author: Option<String>,
    },
    /// Remove a comment from a story
    Uncomment { id: String, comment_id: String },
    /// Delete a story and drop it from every sprint
    Delete { id: String },
}

pub fn run(root: &Path, subcmd: StorySubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        StorySubcommand::Create {
            title,
            description,
            criteria,
            priority,
            labels,
            points,
            assignee,
        } => {
            let labels = labels.as_deref().map(parse_labels).unwrap_or_default();
            let mut story = scrum::create_story(&title, &description, &criteria, priority, &labels);
            story.story_points = points;
            story.assignee = assignee;
            create(&store, story, json)
        }
        StorySubcommand::List {
            status,
            priority,
            label,
        } => list(&store, status, priority, label.as_deref(), json),
        StorySubcommand::Show { id } => show(&store, &id, json),
        StorySubcommand::Update {
            id,
            title,
            description,
            criteria,
            priority,
            labels,
            points,
            assignee,
        } => {
            let mut story = load(&store, &id)?;
            if let Some(t) = title {
                story.title = t;
            }
            if let Some(d) = description {
                story.description = d;
            }
            if let Some(c) = criteria {
                story.acceptance_criteria = c;
            }
            if let Some(p) = priority {
                story.priority = p;
            }
            if let Some(l) = labels {
                story.labels = parse_labels(&l).into_iter().collect();
            }
            if let Some(a) = assignee {
                story.assignee = Some(a).filter(|a| !a.trim().is_empty());
            }
            update(&store, story, points, json)
        }
        StorySubcommand::Status { id, status } => set_status(&store, &id, status, json),
        StorySubcommand::Comment { id, body, author } => {
            comment(&store, &id, &body.join(" "), author, json)
        }
        StorySubcommand::Uncomment { id, comment_id } => uncomment(&store, &id, &comment_id, json),
        StorySubcommand::Delete { id } => delete(&store, &id, json),
    }
}

pub(crate) fn load(store: &Store, id: &str) -> anyhow::Result<Story> {
    store
        .get::<Story>(id)
        .context("failed to read stories")?
        .ok_or_else(|| SprintError::StoryNotFound(id.to_string()).into())
}

fn create(store: &Store, story: Story, json: bool) -> anyhow::Result<()> {
    ensure_valid(validate_story(&story))?;
    store.save(&story).context("failed to save story")?;

    if json {
        print_json(&story)?;
    } else {
        println!("Created story [{}]: {}", story.id, story.title);
    }
    Ok(())
}

fn list(
    store: &Store,
    status: Option<StoryStatus>,
    priority: Option<Priority>,
    label: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let stories: Vec<Story> = store
        .list::<Story>()
        .context("failed to read stories")?
        .into_iter()
        .filter(|s| status.map_or(true, |st| s.status == st))
        .filter(|s| priority.map_or(true, |p| s.priority == p))
        .filter(|s| label.map_or(true, |l| s.labels.contains(l)))
        .collect();

    if json {
        return print_json(&stories);
    }
    if stories.is_empty() {
        println!("No stories.");
        return Ok(());
    }

    let rows = stories
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                truncate(&s.title, 40),
                s.status.to_string(),
                s.priority.to_string(),
                format_points(s.story_points),
                s.assignee.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "STATUS", "PRIORITY", "POINTS", "ASSIGNEE"], rows);
    Ok(())
}

fn show(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let story = load(store, id)?;
    if json {
        return print_json(&story);
    }

    println!("[{}] {}", story.id, story.title);
    println!("Status:    {}", story.status);
    println!("Priority:  {}", story.priority);
    println!("Points:    {}", format_points(story.story_points));
    println!("Assignee:  {}", story.assignee.as_deref().unwrap_or("-"));
    if !story.labels.is_empty() {
        let labels: Vec<&str> = story.labels.iter().map(String::as_str).collect();
        println!("Labels:    {}", labels.join(", "));
    }
    println!("Updated:   {}", story.updated_at.format("%Y-%m-%d %H:%M"));
    println!("\n{}", story.description);
    if !story.acceptance_criteria.is_empty() {
        println!("\nAcceptance criteria:\n{}", story.acceptance_criteria);
    }
    if !story.comments.is_empty() {
        println!("\nComments:");
        for c in &story.comments {
            let author = c.author.as_deref().unwrap_or("anonymous");
            println!("  [{}] {} ({}): {}", c.id, author, c.created_at.format("%Y-%m-%d"), c.body);
        }
    }
    Ok(())
}

/// Points go through `scrum::reestimate_story` so the Active sprint's
/// completed points follow a re-estimated Done story.
fn update(store: &Store, mut story: Story, points: Option<f64>, json: bool) -> anyhow::Result<()> {
    let mut candidate = story.clone();
    if points.is_some() {
        candidate.story_points = points;
    }
    ensure_valid(validate_story(&candidate))?;
    story.touch();
    store.save(&story).context("failed to save story")?;

    if points.is_some() && points != story.story_points {
        scrum::reestimate_story(store, &story.id, points).context("failed to re-estimate story")?;
        story = load(store, &story.id)?;
    }

    if json {
        print_json(&story)?;
    } else {
        println!("Updated story [{}]", story.id);
    }
    Ok(())
}

fn set_status(store: &Store, id: &str, status: StoryStatus, json: bool) -> anyhow::Result<()> {
    if !scrum::update_story_status(store, id, status).context("failed to update status")? {
        return Err(SprintError::StoryNotFound(id.to_string()).into());
    }

    if json {
        print_json(&serde_json::json!({ "id": id, "status": status }))?;
    } else {
        println!("Story [{id}] is now {status}");
    }
    Ok(())
}

fn comment(
    store: &Store,
    id: &str,
    body: &str,
    author: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut story = load(store, id)?;
    let comment_id = story.add_comment(author, body);
    store.save(&story).context("failed to save story")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "comment_id": comment_id }))?;
    } else {
        println!("Added comment [{comment_id}] to story [{id}]");
    }
    Ok(())
}

fn uncomment(store: &Store, id: &str, comment_id: &str, json: bool) -> anyhow::Result<()> {
    let mut story = load(store, id)?;
    if !story.remove_comment(comment_id) {
        anyhow::bail!("comment '{comment_id}' not found on story [{id}]");
    }
    store.save(&story).context("failed to save story")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "comment_id": comment_id, "removed": true }))?;
    } else {
        println!("Removed comment [{comment_id}] from story [{id}]");
    }
    Ok(())
}

fn delete(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let sprints: Vec<Sprint> = store.list().context("failed to read sprints")?;
    for sprint in sprints.iter().filter(|s| s.contains(id)) {
        scrum::remove_story_from_sprint(store, &sprint.id, id)
            .with_context(|| format!("failed to remove story from sprint '{}'", sprint.id))?;
    }
    if !store.delete::<Story>(id).context("failed to delete story")? {
        return Err(SprintError::StoryNotFound(id.to_string()).into());
    }

    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))?;
    } else {
        println!("Deleted story [{id}]");
    }
    Ok(())
}

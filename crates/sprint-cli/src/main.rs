mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    assist::AssistSubcommand, config::ConfigSubcommand, retro::RetroSubcommand,
    sprint::SprintSubcommand, standup::StandupSubcommand, story::StorySubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sprint",
    about = "Scrum bookkeeping in plain JSON files, with a local text-generation assistant",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .sprint/ or .git/)
    #[arg(long, global = true, env = "SPRINT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize .sprint/ in the current project
    Init,

    /// Manage user stories
    Story {
        #[command(subcommand)]
        subcommand: StorySubcommand,
    },

    /// Manage sprints
    Sprint {
        #[command(subcommand)]
        subcommand: SprintSubcommand,
    },

    /// Record and review daily standups
    Standup {
        #[command(subcommand)]
        subcommand: StandupSubcommand,
    },

    /// Run sprint retrospectives
    Retro {
        #[command(subcommand)]
        subcommand: RetroSubcommand,
    },

    /// Show the most recent activity
    Activity {
        /// Number of entries to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Dashboard numbers: stories, current sprint, workflow
    Stats,

    /// Show or validate .sprint/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Ask the local model for estimates, summaries and analysis
    Assist {
        #[command(subcommand)]
        subcommand: AssistSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Story { subcommand } => cmd::story::run(&root, subcommand, cli.json),
        Commands::Sprint { subcommand } => cmd::sprint::run(&root, subcommand, cli.json),
        Commands::Standup { subcommand } => cmd::standup::run(&root, subcommand, cli.json),
        Commands::Retro { subcommand } => cmd::retro::run(&root, subcommand, cli.json),
        Commands::Activity { limit } => cmd::activity::run(&root, limit, cli.json),
        Commands::Stats => cmd::stats::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Assist { subcommand } => cmd::assist::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

//! Maestro console
//!
//! Terminal front end for a multi-agent orchestration server: watch agents
//! work, steer them with guidance, and manage saved projects.

mod cmd_console;
mod cmd_files;
mod cmd_models;
mod cmd_projects;
mod cmd_run;
mod config;
mod logging;
mod paths;
mod render;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use maestro_protocol::{ModelPreset, Provider};
use maestro_session::ApiClient;

use crate::paths::DataDir;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(about = "Console for multi-agent orchestration runs")]
#[command(version)]
struct Cli {
    /// Orchestration server base URL
    #[arg(long, global = true, env = "MAESTRO_SERVER_URL")]
    server: Option<String>,

    /// Data directory for config and logs
    #[arg(long, global = true, env = "MAESTRO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive console (default)
    Console,

    /// Start a run and stream its events until the final output
    Run {
        objective: String,
        /// Project name for the new run
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage saved projects
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },

    /// Browse the run workspace
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Show an agent's log
    Logs { agent: String },

    /// Select the model preset (basic, standard, advanced, nocost)
    Preset { preset: ModelPreset },

    /// Model provider status, listing and downloads
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Print shell completions
    Completions { shell: Shell },
}

#[derive(Subcommand, Debug)]
enum ProjectsAction {
    List,
    Open {
        path: String,
    },
    Delete {
        path: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Detect the framework and language of a folder
    Analyze {
        path: String,
    },
    Import {
        path: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum FilesAction {
    List,
    Read { path: String },
}

#[derive(Subcommand, Debug)]
enum ModelsAction {
    Status {
        #[arg(long, default_value = "ollama")]
        provider: Provider,
    },
    List {
        #[arg(long, default_value = "ollama")]
        provider: Provider,
    },
    /// Download an Ollama model
    Pull {
        model: String,
        /// Return right after the download starts
        #[arg(long)]
        no_wait: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "maestro", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    data_dir.ensure_dirs()?;
    let logging = logging::init_logging(&data_dir)?;
    let config = config::load(&data_dir, cli.server.as_deref())?;

    tracing::info!(
        component = "cli",
        event = "cli.started",
        run_id = %logging.run_id,
        version = VERSION,
        data_dir = %data_dir.root().display(),
        server_url = %config.server_url,
    );

    let api = ApiClient::new(&config.server_url)?;

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Console => cmd_console::run(config, api).await,
        Commands::Run { objective, name } => cmd_run::run(config, api, objective, name).await,
        Commands::Projects { action } => match action {
            ProjectsAction::List => cmd_projects::list(&api).await,
            ProjectsAction::Open { path } => cmd_projects::open(&api, &path).await,
            ProjectsAction::Delete { path, yes } => cmd_projects::delete(&api, &path, yes).await,
            ProjectsAction::Analyze { path } => cmd_projects::analyze(&api, &path).await,
            ProjectsAction::Import { path, name } => {
                cmd_projects::import(&api, &path, name.as_deref()).await
            }
        },
        Commands::Files { action } => match action {
            FilesAction::List => cmd_files::list(&api).await,
            FilesAction::Read { path } => cmd_files::read(&api, &path).await,
        },
        Commands::Logs { agent } => cmd_files::logs(&api, &agent).await,
        Commands::Preset { preset } => cmd_models::preset(&api, preset).await,
        Commands::Models { action } => match action {
            ModelsAction::Status { provider } => cmd_models::status(&api, provider).await,
            ModelsAction::List { provider } => cmd_models::list(&api, provider).await,
            ModelsAction::Pull { model, no_wait } => {
                cmd_models::pull(&api, &config, &model, !no_wait).await
            }
        },
        Commands::Completions { .. } => Ok(()),
    }
}

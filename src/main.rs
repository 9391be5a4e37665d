use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use calmdown::engine::agents::{JudgeAgent, ScriptAgent};
use calmdown::engine::engine::Engine;
use calmdown::engine::llm_client::{test_connection, LlmClient};
use calmdown::model::scenario::Scenario;
use calmdown::model::session_config::SessionConfig;
use calmdown::settings::AppSettings;
use calmdown::settings_io::{load_settings, save_settings, settings_path};
use calmdown::ui::terminal::TerminalApp;
use calmdown::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "calmdown", version, about = "Talk your way through a scripted scene while a judge keeps score")]
struct Cli {
    /// Settings file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario
    Play(PlayArgs),
    /// Write default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check that the generation and judge services answer
    Check,
}

#[derive(Args)]
struct PlayArgs {
    /// Scenario directory (profile.txt, prescript.txt, optional roles.json and goal.txt)
    scenario: PathBuf,

    /// Your character's name (upper-cased)
    #[arg(long)]
    player: Option<String>,

    /// Number of rounds
    #[arg(long)]
    rounds: Option<u32>,

    /// Attempts per agent call before giving up
    #[arg(long)]
    attempts: Option<u32>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "calmdown=debug"
    } else {
        "calmdown=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(io::stderr),
        )
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(settings_path);

    match cli.command {
        Commands::Play(args) => cmd_play(load_settings(&path)?, args),
        Commands::InitConfig { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            save_settings(&path, &AppSettings::default())?;
            println!("Wrote default settings to {}", path.display());
            Ok(())
        }
        Commands::Check => {
            let settings = load_settings(&path)?;
            println!("generation: {}", test_connection(&settings.generation)?);
            println!("judge: {}", test_connection(&settings.judge)?);
            Ok(())
        }
    }
}

fn cmd_play(settings: AppSettings, args: PlayArgs) -> Result<()> {
    let mut scenario = Scenario::load(&args.scenario)?;
    if let Some(player) = &args.player {
        scenario = scenario.with_player(player);
    }

    let config = SessionConfig::new(
        scenario.roles.player.clone(),
        scenario.roles.ai.clone(),
        scenario.goal(),
        args.rounds.unwrap_or(settings.session.max_rounds),
        args.attempts.unwrap_or(settings.session.max_attempts),
    )?;

    let writer = ScriptAgent::new(LlmClient::new(settings.generation)?);
    let judge = JudgeAgent::new(LlmClient::new(settings.judge)?);
    let theme = Theme::new(settings.ui, io::stdout().is_terminal());

    let app = TerminalApp::new(
        move |tx| {
            Engine::new(
                config,
                scenario.profile,
                &scenario.prescript,
                writer,
                judge,
                tx,
            )
        },
        io::stdin().lock(),
        io::stdout(),
        theme,
    );
    app.run()?;

    Ok(())
}

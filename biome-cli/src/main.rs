//! Biome CLI - store many GitHub repositories in a single local git repository
//!
//! A biome is a bare git repository with one remote per repository of the
//! GitHub users and organizations it tracks.

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use biome_core::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    AddArgs, ConfigEditHelperArgs, Context, FetchArgs, HeadsArgs, InitArgs, RemotesArgs,
    RemoveArgs,
};

/// Biome: many GitHub repositories, one git repository
#[derive(Parser, Debug)]
#[command(name = "biome")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    directory: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Give up on a git config edit session after this long, ex. `30s`
    #[arg(long, global = true, value_parser = parse_timeout)]
    edit_timeout: Option<Duration>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new biome
    Init(InitArgs),

    /// Add GitHub users or organizations and all their repositories
    Add(AddArgs),

    /// Remove GitHub users or organizations
    #[command(visible_alias = "rm")]
    Remove(RemoveArgs),

    /// List the owners in the biome
    #[command(visible_alias = "ls")]
    List,

    /// Fetch the latest references of the biome's remotes
    Fetch(FetchArgs),

    /// List remotes discovered by the biome
    Remotes(RemotesArgs),

    /// Print the HEAD reference of each remote
    Heads(HeadsArgs),

    /// Show current configuration
    Config,

    /// Show version information
    Version,

    #[command(hide = true)]
    ConfigEditHelper(ConfigEditHelperArgs),
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    biome_core::config::parse_duration(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries command output, logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Runs inside git's editor slot, so it must not depend on user config
    if let Some(Commands::ConfigEditHelper(args)) = &cli.command {
        return args.execute().await;
    }

    let config = Config::load_with_overrides(cli.edit_timeout)?;

    if cli.verbose {
        tracing::info!(
            helper = ?config.editor.helper_command,
            timeout = ?config.editor.timeout,
            start_maintenance = config.init.start_maintenance,
            "Configuration loaded"
        );
    }

    let ctx = Context {
        path: cli.directory,
        config,
        verbose: cli.verbose,
    };

    tokio::select! {
        result = run(cli.command, &ctx) => result,
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("Interrupted")
        }
    }
}

async fn run(command: Option<Commands>, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Some(Commands::Init(args)) => args.execute(ctx).await?,
        Some(Commands::Add(args)) => args.execute(ctx).await?,
        Some(Commands::Remove(args)) => args.execute(ctx).await?,
        Some(Commands::List) => commands::owners::list(ctx).await?,
        Some(Commands::Fetch(args)) => args.execute(ctx).await?,
        Some(Commands::Remotes(args)) => args.execute(ctx).await?,
        Some(Commands::Heads(args)) => args.execute(ctx).await?,
        Some(Commands::Version) => {
            println!("biome {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Config) => print_config(&ctx.config),
        Some(Commands::ConfigEditHelper(args)) => args.execute().await?,
        None => {
            println!("Biome - many GitHub repositories in one local git repository");
            println!();
            println!("Use --help for usage information");
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("Biome Configuration");
    println!("===================");
    println!();
    println!("Editor Settings:");
    match &config.editor.helper_command {
        Some(command) => println!("  helper_command: {}", command.join(" ")),
        None => println!("  helper_command: (this executable)"),
    }
    match config.editor.timeout {
        Some(timeout) => println!("  timeout: {:?}", timeout),
        None => println!("  timeout: (none)"),
    }
    println!();
    println!("Init Settings:");
    println!("  start_maintenance: {}", config.init.start_maintenance);
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}

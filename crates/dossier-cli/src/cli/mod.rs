//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use dossier_core::config;
use dossier_core::logging::{self, LogTarget};
use dossier_core::projection::MAX_MINIONS;

mod commands;

#[derive(Parser)]
#[command(name = "dossier")]
#[command(version)]
#[command(about = "Browse adversaries, their skills and dice pools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Data directory or base URL (overrides data_dir / data_url from config)
    #[arg(long, global = true, value_name = "DIR|URL", env = "DOSSIER_DATA")]
    data: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Open the interactive browser (default)
    Browse,
    /// Print the adversary list
    List {
        /// Only list adversaries whose name or tags contain TEXT
        #[arg(short, long, value_name = "TEXT")]
        filter: Option<String>,
    },
    /// Print an adversary's skills and dice pools
    Show {
        /// Adversary id
        #[arg(value_name = "ID")]
        id: String,

        /// Include skills the adversary has no ranks in
        #[arg(short, long)]
        all: bool,

        /// Minion group size
        #[arg(
            short,
            long,
            value_name = "N",
            default_value_t = 1,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_MINIONS)),
        )]
        minions: u32,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Config commands must work even when the existing file is broken.
    if let Some(Commands::Config { command }) = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        };
    }

    let config = config::Config::load().context("load config")?;

    let target = match cli.command {
        None | Some(Commands::Browse) => LogTarget::file_in(&config::paths::logs_dir()),
        Some(_) => LogTarget::Stderr,
    };
    let _log_guard = logging::init(&target, &config.log_level)?;

    let source = config
        .data_source(cli.data.as_deref())
        .context("resolve data source")?;

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move {
        match cli.command {
            None | Some(Commands::Browse) => commands::browse::run(&config, source),
            Some(Commands::List { filter }) => commands::list::run(&source, filter.as_deref()).await,
            Some(Commands::Show { id, all, minions }) => {
                commands::show::run(&source, &id, all, minions).await
            }
            Some(Commands::Config { .. }) => Ok(()),
        }
    })
}

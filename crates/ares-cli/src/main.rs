//! Console frontend for the Ares encounter aid.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ares",
    about = "Ares: combat tracker, hacking terminals and duels for tabletop tables",
    version,
    propagate_version = true
)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, default_value = "settings.ares", global = true)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive table session
    Play {
        /// Directory the combat snapshot is kept in
        #[arg(short = 'd', long, default_value = ".")]
        state_dir: PathBuf,

        /// RNG seed for a reproducible session (overrides the settings file)
        #[arg(long)]
        seed: Option<u64>,

        /// Render panels as plain text instead of ANSI blocks
        #[arg(long)]
        plain: bool,

        /// User id of the person at the keyboard
        #[arg(short, long, default_value = "1")]
        user: u64,

        /// Display name of the person at the keyboard
        #[arg(short, long, default_value = "GM")]
        name: String,
    },

    /// Print the effective settings
    Settings,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            state_dir,
            seed,
            plain,
            user,
            name,
        } => commands::play::run(
            &cli.settings,
            &state_dir,
            seed,
            !plain,
            ares_engine::Actor::new(user, name),
        ),
        Commands::Settings => commands::settings::run(&cli.settings),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

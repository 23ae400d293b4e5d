use anyhow::Result;
use clap::{Parser, Subcommand};

use liverisk::cli;

#[derive(Debug, Parser)]
#[command(name = "liverisk")]
#[command(about = "Liver cancer risk prediction client")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send one prediction request and print the rendered result
    Predict(cli::PredictArgs),
    /// Serve the input form page in the browser
    Serve {
        /// Address to listen on (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_open: bool,
    },
    /// Show logged predictions
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Number of recent predictions to list
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Check config sources, prediction service reachability, and the log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default ~/.liverisk/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `client.timeout_ms 5000`
    Set { key: String, value: String },
    /// Restore the default configuration
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Predict(args) => cli::run_predict(&args),
        Commands::Serve { addr, no_open } => cli::run_serve(addr.as_deref(), no_open),
        Commands::History {
            format,
            days,
            limit,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, days, limit)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

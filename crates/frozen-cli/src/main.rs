use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{parse_date, App};

#[derive(Parser)]
#[command(name = "frozen")]
#[command(version, about = "Keep track of what's in the freezer and what to eat first", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "FROZEN_DB", global = true)]
    db: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// Override a category's shelf-life for this run, e.g. --duration Beef=400
    #[arg(long = "duration", value_name = "CATEGORY=DAYS", global = true, value_parser = parse_duration_override)]
    durations: Vec<(String, i64)>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Record a new item
    Add(commands::AddArgs),
    /// List items, soonest expiration first by default
    List(commands::ListArgs),
    /// Show one item in detail
    Show {
        id: i64,
    },
    /// Change fields of an existing item
    Update(commands::UpdateArgs),
    /// Replace an item's notes (omit text to clear)
    Notes {
        id: i64,
        text: Option<String>,
    },
    /// Delete one or more items
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Show categories with their shelf-life and item counts
    Categories,
    /// Count items per expiration status
    Status,
    /// Save a category's shelf-life to the config file
    Duration {
        category: String,
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },
    /// Export the inventory (.json, .csv or .md)
    Export {
        path: PathBuf,
        #[arg(long, value_enum)]
        format: Option<commands::FormatArg>,
    },
    /// Import items from a CSV or JSON export
    Import {
        path: PathBuf,
        #[arg(long, value_enum)]
        format: Option<commands::FormatArg>,
        /// Actually insert the items instead of just previewing
        #[arg(long)]
        yes: bool,
    },
}

fn parse_duration_override(raw: &str) -> Result<(String, i64), String> {
    let (category, days) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected CATEGORY=DAYS, got '{}'", raw))?;
    let days = days
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid day count in '{}': {}", raw, e))?;
    Ok((category.trim().to_string(), days))
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so exported data on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frozen_cli=info,frozen_core=info,frozen_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    let mut app = App::new(cli.config.as_deref(), cli.db, cli.today, &cli.durations)?;

    match command {
        Commands::Add(args) => app.add(args),
        Commands::List(args) => app.list(args),
        Commands::Show { id } => app.show(id),
        Commands::Update(args) => app.update(args),
        Commands::Notes { id, text } => app.notes(id, text),
        Commands::Delete { ids } => app.delete(&ids),
        Commands::Categories => app.categories(),
        Commands::Status => app.status(),
        Commands::Duration { category, days } => app.save_duration(&category, days),
        Commands::Export { path, format } => app.export(&path, format),
        Commands::Import { path, format, yes } => app.import(&path, format, yes),
    }
}

//! CLI commands for trackside-api.
//!
//! Supports API server mode and a standalone seeding mode.

use clap::{Parser, Subcommand};
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::storage::{open_database, Events, Races, Repository};

#[derive(Parser)]
#[command(name = "trackside-api")]
#[command(version, about = "Trackside: racing and sports listing API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Seed the database with dummy data and exit
    Seed {
        /// Database path override
        #[arg(short, long)]
        database: Option<String>,
    },
}

/// Seed both entity families and report the resulting row counts.
pub fn run_seed(database: Option<String>) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(path) = database {
        config.database.path = path;
    }

    let conn = Arc::new(Mutex::new(open_database(&config.database.path)?));
    let races = Repository::<Races>::new(Arc::clone(&conn));
    let events = Repository::<Events>::new(conn);

    races.init()?;
    events.init()?;

    println!(
        "Seeded {}: {} races, {} events",
        config.database.path,
        races.list(None)?.len(),
        events.list(None)?.len(),
    );

    Ok(())
}

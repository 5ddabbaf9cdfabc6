//! ChemINF-EDU CLI - serve the lab records site and manage its database

use anyhow::Context;
use cheminf::config::{self, Config};
use cheminf::molecule::MoleculeImage;
use cheminf::storage::SqliteStore;
use cheminf::ui::{self, Icons};
use cheminf::{chem, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cheminf")]
#[command(version)]
#[command(about = "ChemINF-EDU - educational chemistry lab records")]
#[command(long_about = r#"
ChemINF-EDU keeps a chemistry lab's records in one SQLite file:
  • Molecules (SMILES, formula, weight, 2-D depiction)
  • Chemical inventory, projects and tasks
  • Reactions and their participants
  • LIMS experiments, samples and measurements
  • Time-series instrument data with charts and exports

Example usage:
  cheminf init-db
  cheminf serve --port 8050
  cheminf render --smiles "CC(=O)Oc1ccccc1C(=O)O" --output aspirin.svg
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to ./cheminf.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server (pages and JSON API)
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Create the tables and load the sample data set into an empty database
    InitDb {
        /// Delete an existing database file first
        #[arg(long)]
        force: bool,

        /// Create the tables only
        #[arg(long)]
        no_seed: bool,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show row counts of every table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Parse a SMILES string and draw it as SVG
    Render {
        #[arg(short, long)]
        smiles: String,

        /// Write the SVG to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a settings file with the default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if let Err(e) = run(cli).await {
        ui::error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { host, port, database } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(database) = database {
                config.database = database;
            }

            // Make sure the schema exists before the first request
            config::ensure_db_dir(&config.database)?;
            let store = SqliteStore::from_config(&config)?;
            if store.is_empty()? {
                ui::warn("Database is empty; run `cheminf init-db` to load the sample data");
            }
            drop(store);

            ui::status(Icons::DATABASE, "Database", &config.database.display().to_string());
            server::start_server(config).await?;
        }

        Commands::InitDb { force, no_seed, database } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(database) = database {
                config.database = database;
            }

            if force && config.database.exists() {
                std::fs::remove_file(&config.database)
                    .with_context(|| format!("removing {}", config.database.display()))?;
                ui::warn(&format!("Removed existing database {}", config.database.display()));
            }

            config::ensure_db_dir(&config.database)?;
            let store = SqliteStore::from_config(&config)?;
            ui::header(&format!("Database ready: {}", config.database.display()));

            if no_seed {
                ui::success("Tables created");
            } else if store.is_empty()? {
                let summary = store.load_sample_data()?;
                ui::status(Icons::SEED, "Sample data", &summary.to_string());
            } else {
                ui::status(Icons::INFO, "Sample data", "skipped, database already has records");
            }
        }

        Commands::Stats { database } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(database) = database {
                config.database = database;
            }
            let store = SqliteStore::from_config(&config)?;
            let stats = store.stats()?;

            ui::status(Icons::STATS, "ChemINF-EDU Statistics", &config.database.display().to_string());
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Render { smiles, output } => {
            let graph = chem::smiles::parse(&smiles)?;
            let image = MoleculeImage::from_graph(None, smiles.clone(), &graph);

            ui::status(Icons::MOLECULE, "SMILES", &smiles);
            println!(
                "{}",
                ui::key_value_table(&[
                    ("Formula", image.formula.clone()),
                    ("Molecular weight", format!("{:.2} g/mol", image.molecular_weight)),
                    ("Atoms", graph.atom_count().to_string()),
                    ("Fragments", graph.fragments().len().to_string()),
                ])
            );

            if let Some(path) = output {
                let svg = chem::Depiction::new(&graph).to_svg();
                std::fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
                ui::status(Icons::FILE, "SVG written", &path.display().to_string());
            }
        }

        Commands::Config { command: ConfigCommands::Init { force } } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &Config::default(), force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use surface_sync::codec::{self, Location};
use surface_sync::controls::INITIALIZED_CONTROL_COLUMNS;
use surface_sync::params::INITIALIZED_COLUMNS;
use surface_sync::{MemoryGraph, Result, Scenario, Session, SyncConfig, Table, diagnostics};

use anyhow::Context;
use std::path::{Path, PathBuf};

const PARAMETER_TABLE_FILE: &str = "parameters.json";
const CONTROL_TABLE_FILE: &str = "controls.json";

#[derive(Parser)]
#[command(name = "surface-sync")]
#[command(about = "Address codec and reconciliation replay for control surfaces", long_about = None)]
struct Cli {
    /// JSON config file (graph root, query marker, value-out suffix).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Numeric address to export name.
    ExportName { address: String },

    /// Export name to numeric address.
    Address { export_name: String },

    /// Numeric address to graph location.
    Expand {
        address: String,

        /// Overrides the configured graph root.
        #[arg(long)]
        root: Option<String>,
    },

    /// Graph path back to numeric address.
    Collapse { path: String },

    /// Print every structural id found in an address.
    Locate { address: String },

    /// Replay a scenario of host notifications and print the resulting report.
    Replay {
        #[arg(long)]
        scenario: PathBuf,

        /// Directory holding the initialized tables; read before and written after.
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    diagnostics::init_logging(cli.verbose);
    let config = SyncConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Commands::ExportName { address } => {
            println!("{}", codec::address_to_export_name(&address)?);
        }
        Commands::Address { export_name } => {
            println!("{}", codec::export_name_to_address(&export_name)?);
        }
        Commands::Expand { address, root } => {
            let root = root.unwrap_or(config.graph_root);
            let location = codec::expand_address(&address, &root)?;
            println!("{}", serde_json::to_string_pretty(&location)?);
        }
        Commands::Collapse { path } => {
            println!("{}", codec::collapse_address(&path)?);
        }
        Commands::Locate { address } => {
            println!("{}", serde_json::to_string_pretty(&Location::of(&address))?);
        }
        Commands::Replay { scenario, state } => {
            let scenario = Scenario::from_file(&scenario)?;
            let config = scenario.config.clone().unwrap_or(config);
            let graph: MemoryGraph = scenario.graph.into_iter().collect();

            let mut session = match &state {
                Some(dir) => {
                    let (parameters, controls) = load_tables(dir)?;
                    Session::with_tables(&config, graph, parameters, controls)
                }
                None => Session::new(&config, graph),
            };

            session
                .run(scenario.steps)
                .context("scenario replay stopped")?;

            if let Some(dir) = &state {
                save_tables(dir, &session)?;
            }
            println!("{}", serde_json::to_string_pretty(&session.report())?);
        }
    }

    Ok(())
}

fn load_tables(dir: &Path) -> Result<(Table, Table)> {
    let parameters = Table::load_or_new(dir.join(PARAMETER_TABLE_FILE), INITIALIZED_COLUMNS)?;
    let controls = Table::load_or_new(dir.join(CONTROL_TABLE_FILE), INITIALIZED_CONTROL_COLUMNS)?;
    Ok((parameters, controls))
}

fn save_tables(dir: &Path, session: &Session) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create state directory {}", dir.display()))?;
    let (parameters, controls) = session.tables();
    parameters.save(dir.join(PARAMETER_TABLE_FILE))?;
    controls.save(dir.join(CONTROL_TABLE_FILE))?;
    Ok(())
}

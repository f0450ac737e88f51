//! mechlab command line.

use clap::{Parser, Subcommand};
use mechlab::catalog::Catalog;
use mechlab::config::{AnalysisConfig, MAX_INPUT_FILE_BYTES};
use mechlab::loadout::{Loadout, LoadoutRecord};
use mechlab::report::{write_json_report, LoadoutReport};
use mechlab::store::Store;
use mechlab::util::{check_file_size, init_logging};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mechlab")]
#[command(about = "Mech loadout engine: equip rules, slot distribution, undo/redo and combat statistics")]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a loadout file and print its statistics.
    Stats {
        #[arg(long, value_name = "TOML")]
        catalog: PathBuf,
        #[arg(long, value_name = "TOML")]
        loadout: PathBuf,
        #[arg(long, value_name = "TOML", help = "Optional analysis settings")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "DIR", help = "Also write report.json into this directory")]
        out: Option<PathBuf>,
    },
    /// Validate a loadout file and store it in the garage database.
    Save {
        #[arg(long, value_name = "TOML")]
        catalog: PathBuf,
        #[arg(long, value_name = "TOML")]
        loadout: PathBuf,
        #[arg(long, value_name = "DB")]
        db: PathBuf,
    },
    /// List stored loadouts.
    List {
        #[arg(long, value_name = "DB")]
        db: PathBuf,
    },
    /// Rebuild a stored loadout and print its statistics.
    Show {
        #[arg(long, value_name = "TOML")]
        catalog: PathBuf,
        #[arg(long, value_name = "DB")]
        db: PathBuf,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
        name: String,
    },
    /// Remove a stored loadout.
    Delete {
        #[arg(long, value_name = "DB")]
        db: PathBuf,
        name: String,
    },
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Stats {
            catalog,
            loadout,
            config,
            out,
        } => run_stats(&catalog, &loadout, config.as_deref(), out.as_deref()),
        Commands::Save {
            catalog,
            loadout,
            db,
        } => run_save(&catalog, &loadout, &db),
        Commands::List { db } => run_list(&db),
        Commands::Show {
            catalog,
            db,
            config,
            name,
        } => run_show(&catalog, &db, config.as_deref(), &name),
        Commands::Delete { db, name } => run_delete(&db, &name),
    }
}

fn load_catalog(path: &Path) -> Result<Catalog, String> {
    check_file_size(path, MAX_INPUT_FILE_BYTES)?;
    let catalog = Catalog::load(path).map_err(|e| e.to_string())?;
    tracing::info!("loaded catalog {}", path.display());
    Ok(catalog)
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, String> {
    match path {
        Some(p) => AnalysisConfig::load(p),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_record(path: &Path) -> Result<LoadoutRecord, String> {
    check_file_size(path, MAX_INPUT_FILE_BYTES)?;
    LoadoutRecord::load(path).map_err(|e| e.to_string())
}

fn assemble(catalog: &Catalog, record: &LoadoutRecord, config: &AnalysisConfig) -> Result<Loadout, String> {
    let stack = record
        .assemble(catalog, config.undo_depth)
        .map_err(|e| format!("{}: {}", record.name, e))?;
    if let Some(step) = stack.next_undo() {
        tracing::debug!("history: {}", step);
    }
    Ok(stack.into_target())
}

fn print_report(loadout: &Loadout, config: &AnalysisConfig, out: Option<&Path>) -> Result<(), String> {
    let report = LoadoutReport::build(loadout, config);
    print!("{}", report.render_text());
    if let Some(dir) = out {
        let path = dir.join("report.json");
        write_json_report(&report, &path)?;
        tracing::info!("wrote {}", path.display());
    }
    Ok(())
}

fn run_stats(
    catalog: &Path,
    loadout: &Path,
    config: Option<&Path>,
    out: Option<&Path>,
) -> Result<(), String> {
    let config = load_config(config)?;
    let catalog = load_catalog(catalog)?;
    let record = load_record(loadout)?;
    let loadout = assemble(&catalog, &record, &config)?;
    print_report(&loadout, &config, out)
}

fn run_save(catalog: &Path, loadout: &Path, db: &Path) -> Result<(), String> {
    let catalog = load_catalog(catalog)?;
    let record = load_record(loadout)?;
    let built = assemble(&catalog, &record, &AnalysisConfig::default())?;
    let store = Store::open(db)?;
    let id = store.save_loadout(&LoadoutRecord::from_loadout(&built))?;
    tracing::info!("saved {} (id {})", built.name(), id);
    println!("saved {}", built.name());
    Ok(())
}

fn run_list(db: &Path) -> Result<(), String> {
    let store = Store::open(db)?;
    let rows = store.list_loadouts()?;
    if rows.is_empty() {
        println!("no stored loadouts");
    }
    for row in rows {
        println!("{}\t{}\t{}", row.name, row.chassis, row.saved_at);
    }
    Ok(())
}

fn run_show(catalog: &Path, db: &Path, config: Option<&Path>, name: &str) -> Result<(), String> {
    let config = load_config(config)?;
    let catalog = load_catalog(catalog)?;
    let store = Store::open(db)?;
    let record = store
        .load_record(name)?
        .ok_or_else(|| format!("no stored loadout named {}", name))?;
    let loadout = assemble(&catalog, &record, &config)?;
    print_report(&loadout, &config, None)
}

fn run_delete(db: &Path, name: &str) -> Result<(), String> {
    let store = Store::open(db)?;
    if !store.delete_loadout(name)? {
        return Err(format!("no stored loadout named {}", name));
    }
    tracing::info!("deleted {}", name);
    Ok(())
}

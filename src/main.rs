//! Offline analysis of Mode-S/ADS-B receiver logs.
//!
//! Each line of the log is `<timestamp> [DF|UF] <hex bytes...>`. The records
//! are routed one by one, in file order, into a per-aircraft store holding the
//! altitude, speed, position, course and autopilot series plus the arrival
//! times of every message category. Once the file is exhausted a summary table
//! is printed, optionally followed by the message interval distributions and
//! a JSON export of the whole store.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod constants;
mod cpr;
mod crc;
mod decode;
mod dispatch;
mod entity;
mod episode;
mod error;
mod interval;
mod line;
mod pairing;
mod series;
mod summary;

use config::Config;
use decode::{Address, ModeS};
use dispatch::Router;
use entity::{AircraftEntry, EntityStore};
use error::{LogError, Result};
use line::parse_line;
use summary::{render_intervals, render_summary, summary_rows};

/// The command line arguments for the program using the crate Clap.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log file to read. A missing file is reported and the exit status is
    /// non-zero.
    #[arg(short, long)]
    file: PathBuf,

    /// Only keep the extended squitters of this address (6 hex digits).
    #[arg(short, long)]
    aircraft: Option<String>,

    /// TOML file with the tunables.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the message interval distributions of each aircraft.
    #[arg(short, long)]
    #[clap(default_value_t = false)]
    intervals: bool,

    /// Write the whole store as JSON to this file.
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Accept extended squitters with a bad parity.
    #[arg(long)]
    #[clap(default_value_t = false)]
    no_crc: bool,

    /// More logging, repeat for more. `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Load filters from environment, fall back to the verbosity
    //
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    trace!("Logging initialised.");
}

/// Route every record of the file at `path` into a new store.
#[tracing::instrument(skip(config))]
fn ingest(path: &Path, config: Config, target: Option<Address>) -> Result<(EntityStore, Router<ModeS>)> {
    if !path.exists() {
        return Err(LogError::MissingFile(path.to_path_buf()));
    }
    let data = std::fs::read(path)?;

    let decoder = ModeS::new(config.verify_crc);
    let mut router = Router::new(decoder, config, target);
    let mut store = EntityStore::new();

    for raw in data.split(|b| *b == b'\n') {
        let line = String::from_utf8_lossy(raw);
        if let Some(rec) = parse_line(&line) {
            router.route(&mut store, rec.timestamp, &rec.message);
        }
    }

    router.stats().log();
    if store.is_empty() {
        warn!("no usable record in {}", path.display());
    } else {
        info!("{} addresses in store", store.len());
    }
    let unpaired = store.iter().filter(|e| !e.cpr.is_empty()).count();
    debug!("{} addresses left with an unpaired CPR half", unpaired);
    Ok((store, router))
}

#[tracing::instrument(skip(store))]
fn export(store: &EntityStore, path: &Path) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, store)?;
    info!("store exported to {}", path.display());
    Ok(())
}

fn main() -> eyre::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if args.no_crc {
        config.verify_crc = false;
    }

    let target = match &args.aircraft {
        Some(a) => Some(Address::parse(a).ok_or_else(|| LogError::BadAddress(a.clone()))?),
        None => None,
    };

    let profiles = config.intervals.clone();
    let (store, router) = ingest(&args.file, config, target.clone())?;

    if let Some(target) = &target {
        if !router.target_seen() {
            warn!("no extended squitter from {}", target);
            println!("aircraft {} not found", target);
            return Ok(());
        }
    }

    print!("{}", render_summary(&summary_rows(&store)));

    if args.intervals {
        let entries: Vec<&AircraftEntry> = match &target {
            Some(target) => store.get(target).into_iter().collect(),
            None => store.iter().collect(),
        };
        for entry in entries.into_iter().filter(|e| e.first_seen.is_some()) {
            println!();
            print!("{}", render_intervals(entry, &profiles));
        }
    }

    if let Some(path) = &args.export {
        export(&store, path)?;
    }

    Ok(())
}

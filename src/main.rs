//! CLI entry point for ionify.
//!
//! Provides the command-line interface for:
//! - Converting a calibration folder into the validated report PDF and the
//!   beam-map contact sheet (`run`)
//! - Opening the reference-defaults document for a configuration
//!   (`defaults`)
//! - Printing the resolved application version (`version`)
//!
//! # Usage
//!
//! Process a folder:
//! ```bash
//! ionify run /data/RampLogs/IonGun --system nexsa
//! ```
//!
//! Open the defaults document:
//! ```bash
//! ionify defaults --system escalab --ion-gun
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ionify::config::Settings;
use ionify::signals::{self, Family, SignalState};
use ionify::{assets::AssetStore, logging, run, update, version};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SystemArg {
    Escalab,
    Nexsa,
}

impl From<SystemArg> for Family {
    fn from(value: SystemArg) -> Self {
        match value {
            SystemArg::Escalab => Family::Escalab,
            SystemArg::Nexsa => Family::Nexsa,
        }
    }
}

#[derive(Parser)]
#[command(name = "ionify")]
#[command(about = "Ion-gun calibration log validation and PDF reports", long_about = None)]
struct Cli {
    /// Optional settings file (defaults to `ionify.toml` when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one calibration folder into PDF documents
    Run {
        /// Folder holding the `.txt` logs and `.bmp` beam maps
        folder: Option<PathBuf>,

        /// Hardware platform the logs came from
        #[arg(long, value_enum, default_value_t = SystemArg::Escalab)]
        system: SystemArg,

        /// Skip the background update check for this run
        #[arg(long)]
        no_update_check: bool,
    },

    /// Open the reference-defaults document for a configuration
    Defaults {
        #[arg(long, value_enum, default_value_t = SystemArg::Escalab)]
        system: SystemArg,

        /// Configuration has an ion gun fitted
        #[arg(long)]
        ion_gun: bool,

        /// Configuration exercises ISS modes
        #[arg(long)]
        iss: bool,

        /// Print the resolved path instead of opening it
        #[arg(long)]
        print_only: bool,
    },

    /// Print the application version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new(cli.config.as_deref())?;
    logging::init(&settings);

    match cli.command {
        Commands::Run {
            folder,
            system,
            no_update_check,
        } => run_command(folder, system.into(), no_update_check, &settings),
        Commands::Defaults {
            system,
            ion_gun,
            iss,
            print_only,
        } => defaults_command(system.into(), ion_gun, iss, print_only, &settings),
        Commands::Version => {
            println!("{}", version::get_version());
            Ok(())
        }
    }
}

fn run_command(
    folder: Option<PathBuf>,
    family: Family,
    no_update_check: bool,
    settings: &Settings,
) -> Result<()> {
    if settings.check_updates && !no_update_check {
        let _ = update::spawn_check(settings.update_url.clone(), version::get_version());
    }

    let folder = match folder.or_else(|| settings.default_input_dir.clone().map(PathBuf::from)) {
        Some(folder) => folder,
        None => bail!("no folder given and no default_input_dir configured"),
    };
    if !folder.is_dir() {
        bail!("'{}' is not a folder", folder.display());
    }

    let summary = run::run_folder(&folder, family, settings)
        .with_context(|| format!("processing '{}'", folder.display()))?;

    if let Some(sheet) = &summary.contact_sheet {
        println!("Contact sheet: {}", sheet.display());
    }
    for outcome in &summary.reports {
        match &outcome.result {
            Ok(findings) if findings.is_empty() => {
                println!("{}: all values in range", outcome.source.display());
            }
            Ok(findings) => {
                println!("{}:", outcome.source.display());
                println!("Please check values:");
                for finding in findings {
                    println!("{}", finding.summary_line());
                }
            }
            Err(err) => {
                eprintln!("{}: {err}", outcome.source.display());
            }
        }
    }

    if summary.reports.is_empty() {
        println!("No log files found in '{}'", folder.display());
    }
    Ok(())
}

fn defaults_command(
    family: Family,
    ion_gun: bool,
    iss: bool,
    print_only: bool,
    settings: &Settings,
) -> Result<()> {
    let config = signals::resolve(&SignalState {
        family,
        ion_gun,
        iss_modes: iss,
    })?;
    let store = AssetStore::discover(settings.assets_dir.as_deref().map(Path::new));
    let path = store.defaults_document(config.system_type)?;

    println!("{}", path.display());
    if !print_only {
        opener::open(&path).with_context(|| format!("opening '{}'", path.display()))?;
    }
    Ok(())
}

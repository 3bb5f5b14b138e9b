use clap::{Parser, Subcommand};
use roi_cli::RoiJob;
use color_eyre::eyre::Result;
use roi::{RegionGeometry, RegionKind, RoiCollection, RoiCommand};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job file (.toml or .json)
    Run {
        /// Path to the job file
        #[arg(short, long)]
        job: PathBuf,
    },
    /// Summarize a region archive
    Info {
        /// Path to the GeoJSON archive
        archive: PathBuf,
    },
    /// Print the JSON schema of the job file and the available commands
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { job } => run_job(job)?,
        Commands::Info { archive } => print_info(archive)?,
        Commands::Schema => print_schema()?,
    }

    Ok(())
}

fn run_job(path: &Path) -> Result<()> {
    let job = RoiJob::from_file(path)?;
    info!("Job: {:?}", job);
    let outputs = job.run()?;
    info!("Archive written to {}", outputs.archive.display());
    for mask in &outputs.masks {
        info!("Mask written to {}", mask.display());
    }
    if let Some(rgb) = &outputs.rgb {
        info!("Composite written to {}", rgb.display());
    }
    if let Some(csv) = &outputs.measurements {
        info!("Measurements written to {}", csv.display());
    }
    Ok(())
}

fn print_info(path: &Path) -> Result<()> {
    let collection = RoiCollection::load(path)?;
    let bounds = collection.bounds();
    let extents = collection.slice_extents();

    println!("{}: {} regions", path.display(), collection.len());
    println!(
        "bounds: x={} y={} width={} height={}",
        bounds.min().x,
        bounds.min().y,
        bounds.width(),
        bounds.height()
    );
    println!("slices: z={} c={} t={}", extents.z, extents.c, extents.t);
    for kind in RegionKind::iter() {
        let count = collection.count_of_kind(kind);
        if count > 0 {
            println!("  {kind}: {count}");
        }
    }
    let total_area: f64 = collection.iter().map(|region| region.area()).sum();
    println!("total area: {total_area}");
    Ok(())
}

fn print_schema() -> Result<()> {
    let schema = schemars::schema_for!(RoiJob);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    println!();
    for name in RoiCommand::command_names() {
        println!("{name}");
    }
    Ok(())
}

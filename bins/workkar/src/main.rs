//! WorkKar CLI - find nearby workers
//!
//! Resolves a reference location, fetches active workers, and prints them
//! ranked by distance or rating.

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use workkar_geo::Coordinate;

mod commands;
mod context;

use commands::{geo, location, workers};
use context::{AppContext, OutputFormat};

/// Find nearby WorkKar workers
#[derive(Parser)]
#[command(name = "workkar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to workkar.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List active workers, ranked
    Workers(workers::WorkersArgs),

    /// List service categories with worker counts
    Categories,

    /// Distance between two points
    Distance {
        /// First point as LAT,LNG
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        from: Coordinate,

        /// Second point as LAT,LNG
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        to: Coordinate,
    },

    /// Parse a stored location (GeoJSON, WKT or "lat,lng")
    ParseLocation {
        /// JSON value or plain text
        input: String,
    },

    /// Describe a point as an address
    Locate {
        /// Point as LAT,LNG
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        point: Coordinate,

        /// The point was picked on a map rather than read from the device
        #[arg(long)]
        picked: bool,
    },

    /// Remember a location for the next `workers` run
    SetLocation {
        /// Point as LAT,LNG
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        point: Coordinate,
    },

    /// Forget the remembered location
    ClearLocation,
}

/// Parse a `LAT,LNG` argument
fn parse_point(text: &str) -> Result<Coordinate, String> {
    match workkar_geo::parse_location(&serde_json::Value::String(text.to_string())) {
        Ok(Some(point)) => Ok(point),
        Ok(None) => Err("empty location".to_string()),
        Err(e) => Err(format!("expected LAT,LNG ({e})")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let ctx = match AppContext::load(cli.config.as_deref(), cli.verbose, cli.format) {
        Ok(ctx) => ctx,
        Err(e) => {
            report_error(&e, cli.format == OutputFormat::Json);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Workers(args) => workers::run(&ctx, args).await,
        Commands::Categories => workers::categories(&ctx).await,
        Commands::Distance { from, to } => geo::distance(&ctx, from, to),
        Commands::ParseLocation { input } => geo::parse_location(&ctx, &input),
        Commands::Locate { point, picked } => location::locate(&ctx, point, picked).await,
        Commands::SetLocation { point } => location::set(&ctx, point),
        Commands::ClearLocation => location::clear(&ctx),
    };

    ctx.log_metrics();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, ctx.is_json());
            ExitCode::FAILURE
        }
    }
}

/// Print `err` to stderr; in JSON mode structured errors also go to stdout
fn report_error(err: &anyhow::Error, json: bool) {
    if json {
        if let Some(structured) = err.downcast_ref::<workkar_core::Error>() {
            let _ = commands::print_json(&serde_json::json!({ "error": structured.to_report() }));
        }
    }
    eprintln!("{} {:#}", "Error:".red().bold(), err);
}

//! reparto - command line front end for zones, routes and the cart
//!
//! Usage:
//!   reparto zones close <points.json>           Close a zone ring
//!   reparto zones extract <zone.geojson>        Outer rings of a GeoJSON geometry
//!   reparto zones overlap <a> <b>               Do two zones overlap?
//!   reparto route plan <stops.json> --start-lat --start-lng
//!   reparto cart show|add|update|remove|clear|refresh
//!
//! Logs go to stderr (`RUST_LOG`, or `-v` for debug) so stdout stays pipeable.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reparto::ApiError;

use cli::cart::CartCommand;
use cli::common::Output;
use cli::route::RouteCommand;
use cli::zones::ZonesCommand;

#[derive(Parser)]
#[command(name = "reparto", author, version, about, long_about = None)]
struct Cli {
    /// YAML config file (service URLs, cart settings)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Structured output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delivery zone polygons
    #[command(subcommand)]
    Zones(ZonesCommand),
    /// Visit ordering for drivers and vendors
    #[command(subcommand)]
    Route(RouteCommand),
    /// The local cart and its remote sync
    #[command(subcommand)]
    Cart(CartCommand),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output { json: cli.json };
    let result = match cli.command {
        Commands::Zones(command) => cli::zones::run(command, output),
        Commands::Route(command) => cli::route::run(command, output),
        Commands::Cart(command) => cli::cart::run(command, cli.config.as_deref(), output).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(api) = err.downcast_ref::<ApiError>() {
                eprintln!("{}", api.user_message());
            }
            ExitCode::FAILURE
        }
    }
}

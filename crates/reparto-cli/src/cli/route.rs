//! Route planning commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use reparto_geo::{GeoPoint, RouteStrategy, Stop, haversine_km, plan_route};

use super::common::{Output, print_json, read_json};

#[derive(Subcommand)]
pub enum RouteCommand {
    /// Order a list of stops starting from a position
    Plan {
        /// JSON list of `{"id", "location": {"latitude", "longitude"}}`
        file: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        start_lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        start_lng: f64,
        #[arg(long, default_value = "nearest", value_parser = parse_strategy)]
        strategy: RouteStrategy,
    },
    /// List ordering strategies
    Strategies,
}

fn parse_strategy(name: &str) -> Result<RouteStrategy, String> {
    RouteStrategy::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = RouteStrategy::all().iter().map(|s| s.name()).collect();
        format!("unknown strategy '{}' (expected one of: {})", name, known.join(", "))
    })
}

#[derive(Serialize)]
struct JsonLeg<'a> {
    id: &'a str,
    location: GeoPoint,
    leg_km: f64,
}

#[derive(Serialize)]
struct JsonPlan<'a> {
    strategy: &'static str,
    stops: Vec<JsonLeg<'a>>,
    distance_km: f64,
}

pub fn run(command: RouteCommand, output: Output) -> Result<()> {
    match command {
        RouteCommand::Plan {
            file,
            start_lat,
            start_lng,
            strategy,
        } => {
            let stops: Vec<Stop> = serde_json::from_value(read_json(&file)?)
                .with_context(|| format!("{}: expected a list of stops", file.display()))?;
            plan(&stops, GeoPoint::new(start_lat, start_lng), strategy, output)
        }
        RouteCommand::Strategies => {
            for strategy in RouteStrategy::all() {
                let marker = if *strategy == RouteStrategy::default() { " (default)" } else { "" };
                println!("{}{}", strategy.name(), marker);
            }
            Ok(())
        }
    }
}

fn plan(stops: &[Stop], start: GeoPoint, strategy: RouteStrategy, output: Output) -> Result<()> {
    let order = plan_route(start, stops, strategy);

    let mut here = start;
    let mut legs = Vec::with_capacity(order.len());
    for &i in &order {
        let stop = &stops[i];
        legs.push(JsonLeg {
            id: &stop.id,
            location: stop.location,
            leg_km: haversine_km(here, stop.location),
        });
        here = stop.location;
    }
    let distance_km: f64 = legs.iter().map(|leg| leg.leg_km).sum();
    tracing::debug!(strategy = strategy.name(), stops = stops.len(), distance_km, "route planned");

    if output.json {
        return print_json(&JsonPlan {
            strategy: strategy.name(),
            stops: legs,
            distance_km,
        });
    }
    for (n, leg) in legs.iter().enumerate() {
        println!("{:>3}. {} ({:.2} km)", n + 1, leg.id, leg.leg_km);
    }
    println!("total: {:.2} km ({})", distance_km, strategy.name());
    Ok(())
}

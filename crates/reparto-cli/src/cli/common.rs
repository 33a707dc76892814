//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;

use reparto_geo::{GeoPoint, Ring, extract_polygons};

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

/// Read a JSON document from a file, or stdin when the path is `-`.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Read a `[{"latitude", "longitude"}, ...]` point list.
pub fn read_points(path: &Path) -> Result<Ring> {
    let value = read_json(path)?;
    serde_json::from_value(value)
        .with_context(|| format!("{}: expected a list of {{latitude, longitude}} points", path.display()))
}

/// Read zone rings from either a point list or any GeoJSON geometry/feature.
pub fn read_rings(path: &Path) -> Result<Vec<Ring>> {
    let value = read_json(path)?;
    if value.is_array() {
        let ring: Vec<GeoPoint> = serde_json::from_value(value)
            .with_context(|| format!("{}: expected a list of {{latitude, longitude}} points", path.display()))?;
        return Ok(vec![ring]);
    }

    let rings = extract_polygons(&value);
    if rings.is_empty() {
        bail!("no polygon found in {}", path.display());
    }
    Ok(rings)
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

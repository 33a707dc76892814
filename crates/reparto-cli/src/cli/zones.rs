//! Zone commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use reparto_geo::{
    GeoPoint, Ring, bounding_box, ensure_closed_ring, find_overlaps, polygons_overlap, ring_area,
    ring_centroid, to_multi_polygon, zone_containing,
};

use super::common::{Output, print_json, read_points, read_rings};

#[derive(Subcommand)]
pub enum ZonesCommand {
    /// Close a ring by repeating its first point
    Close { file: PathBuf },
    /// Outer rings of a GeoJSON Polygon, MultiPolygon or Feature
    Extract { file: PathBuf },
    /// Point list to a MultiPolygon geometry
    Multipolygon { file: PathBuf },
    /// Area, centroid and bounds of each zone polygon
    Describe { file: PathBuf },
    /// Whether two zones overlap
    Overlap { a: PathBuf, b: PathBuf },
    /// Every overlapping pair among the given zones
    Conflicts {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Which zone contains a point
    Locate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
}

/// A polygon read from one of several files, labelled for output.
struct LabelledRing {
    label: String,
    ring: Ring,
}

impl AsRef<[GeoPoint]> for LabelledRing {
    fn as_ref(&self) -> &[GeoPoint] {
        &self.ring
    }
}

/// Read every polygon of every file. Files with several polygons get
/// `file#index` labels.
fn load_labelled(files: &[PathBuf]) -> Result<Vec<LabelledRing>> {
    let mut zones = Vec::new();
    for file in files {
        let rings = read_rings(file)?;
        let many = rings.len() > 1;
        for (i, ring) in rings.into_iter().enumerate() {
            let label = if many {
                format!("{}#{}", file.display(), i)
            } else {
                file.display().to_string()
            };
            zones.push(LabelledRing { label, ring });
        }
    }
    Ok(zones)
}

#[derive(Serialize)]
struct JsonDescription {
    index: usize,
    points: usize,
    area: f64,
    centroid: Option<GeoPoint>,
    bounds: Option<[f64; 4]>,
}

#[derive(Serialize)]
struct JsonConflict<'a> {
    a: &'a str,
    b: &'a str,
}

pub fn run(command: ZonesCommand, output: Output) -> Result<()> {
    match command {
        ZonesCommand::Close { file } => print_json(&ensure_closed_ring(&read_points(&file)?)),
        ZonesCommand::Extract { file } => print_json(&read_rings(&file)?),
        ZonesCommand::Multipolygon { file } => multipolygon(&file),
        ZonesCommand::Describe { file } => describe(&file, output),
        ZonesCommand::Overlap { a, b } => overlap(&a, &b, output),
        ZonesCommand::Conflicts { files } => conflicts(&files, output),
        ZonesCommand::Locate { files, lat, lng } => locate(&files, GeoPoint::new(lat, lng), output),
    }
}

fn multipolygon(file: &Path) -> Result<()> {
    let points = read_points(file)?;
    let geometry = to_multi_polygon(&points)
        .with_context(|| format!("{}: a zone needs at least 3 points, got {}", file.display(), points.len()))?;
    print_json(&geometry)
}

fn describe(file: &Path, output: Output) -> Result<()> {
    let descriptions: Vec<JsonDescription> = read_rings(file)?
        .iter()
        .enumerate()
        .map(|(index, ring)| JsonDescription {
            index,
            points: ring.len(),
            area: ring_area(ring),
            centroid: ring_centroid(ring),
            bounds: bounding_box(ring).map(|(a, b, c, d)| [a, b, c, d]),
        })
        .collect();

    if output.json {
        return print_json(&descriptions);
    }
    for d in &descriptions {
        print!("polygon {}: {} points, area {:.6} deg²", d.index, d.points, d.area);
        if let Some(c) = d.centroid {
            print!(", centroid ({:.6}, {:.6})", c.latitude, c.longitude);
        }
        println!();
    }
    Ok(())
}

fn overlap(a: &Path, b: &Path, output: Output) -> Result<()> {
    let a_rings = read_rings(a)?;
    let b_rings = read_rings(b)?;
    let overlapping = a_rings
        .iter()
        .any(|ra| b_rings.iter().any(|rb| polygons_overlap(ra, rb)));

    if output.json {
        return print_json(&serde_json::json!({ "overlap": overlapping }));
    }
    println!("{}", if overlapping { "overlap" } else { "no overlap" });
    Ok(())
}

fn conflicts(files: &[PathBuf], output: Output) -> Result<()> {
    let zones = load_labelled(files)?;
    let pairs = find_overlaps(&zones);
    tracing::debug!(zones = zones.len(), conflicts = pairs.len(), "checked zone overlaps");

    if output.json {
        let json: Vec<JsonConflict> = pairs
            .iter()
            .map(|&(i, j)| JsonConflict {
                a: &zones[i].label,
                b: &zones[j].label,
            })
            .collect();
        return print_json(&json);
    }
    if pairs.is_empty() {
        println!("no conflicts");
    }
    for (i, j) in pairs {
        println!("{} <-> {}", zones[i].label, zones[j].label);
    }
    Ok(())
}

fn locate(files: &[PathBuf], point: GeoPoint, output: Output) -> Result<()> {
    let zones = load_labelled(files)?;
    let found = zone_containing(point, &zones).map(|i| zones[i].label.as_str());

    if output.json {
        return print_json(&serde_json::json!({ "zone": found }));
    }
    println!("{}", found.unwrap_or("no zone"));
    Ok(())
}

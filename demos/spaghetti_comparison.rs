//! Compare every de-overlap strategy on a looping trace.
//!
//! Run with: cargo run --example spaghetti_comparison
//!
//! Prints a summary per strategy to stderr and a GeoJSON FeatureCollection of
//! all output lines to stdout, ready to drop into a map viewer:
//!
//!     cargo run --example spaghetti_comparison > comparison.geojson

use serde_json::{json, Value};
use trace_deoverlap::{compare_strategies, detect_runs, DeoverlapConfig, Position};

fn main() {
    // A block in central London driven three times, then out along a side street
    let block = [
        (-0.1278, 51.5074),
        (-0.1290, 51.5080),
        (-0.1300, 51.5074),
        (-0.1288, 51.5068),
    ];
    let mut trace: Vec<Position> = Vec::new();
    for _ in 0..3 {
        trace.extend(block.iter().map(|&(lon, lat)| Position::new(lon, lat)));
    }
    trace.push(Position::new(-0.1278, 51.5074));
    trace.push(Position::new(-0.1265, 51.5081));

    let config = DeoverlapConfig::default();

    eprintln!("Trace De-overlap Comparison\n");
    eprintln!(
        "Config: offset_step={}, force iterations={}, separation_radius={}px\n",
        config.offset.offset_step, config.force.iterations, config.force.separation_radius
    );

    let runs = detect_runs(&trace);
    eprintln!("Input: {} points, {} run(s) of repeated edges", trace.len(), runs.len());
    for run in &runs {
        eprintln!("  points {}..={} ({} points)", run.start, run.end, run.len());
    }
    eprintln!();

    let lines = match compare_strategies(&trace, &config) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Comparison failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut features = Vec::with_capacity(lines.len());
    let mut last_label = "";
    for line in &lines {
        if line.label != last_label {
            eprintln!("  {:<28} {}", line.label, line.stroke);
            last_label = line.label.as_str();
        }
        let coordinates: Vec<Value> = line.coordinates.iter().map(|p| json!(p.to_vec())).collect();
        features.push(json!({
            "type": "Feature",
            "properties": {
                "name": line.label,
                "stroke": line.stroke.as_str(),
                "length_m": line.length_meters().round(),
            },
            "geometry": {
                "type": "LineString",
                "coordinates": coordinates,
            },
        }));
    }

    eprintln!("\n{} output lines", lines.len());

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    match serde_json::to_string_pretty(&collection) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to encode GeoJSON: {}", e),
    }
}

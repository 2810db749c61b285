//! Offline geometry commands: `distance` and `parse-location`

use super::print_json;
use crate::context::AppContext;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use workkar_cli::output::format_distance;
use workkar_geo::{distance_km, Coordinate};

/// Print the great-circle distance between two points
pub fn distance(ctx: &AppContext, from: Coordinate, to: Coordinate) -> Result<()> {
    let km = distance_km(&from, &to);

    if ctx.is_json() {
        return print_json(&json!({ "from": from, "to": to, "distanceKm": km }));
    }

    match km {
        Some(km) => println!("{km:.3} km ({})", format_distance(Some(km))),
        None => println!("unknown"),
    }
    Ok(())
}

/// Run the location normalizer over `input`
///
/// Input that is valid JSON is used as-is; anything else is treated as text.
pub fn parse_location(ctx: &AppContext, input: &str) -> Result<()> {
    let value = serde_json::from_str::<Value>(input)
        .unwrap_or_else(|_| Value::String(input.to_string()));

    let point = workkar_geo::parse_location(&value)
        .with_context(|| format!("Could not parse location: {input}"))?;

    if ctx.is_json() {
        return print_json(&json!({ "point": point }));
    }

    match point {
        Some(point) => println!("{point}"),
        None => println!("no location"),
    }
    Ok(())
}

//! `locate`, `set-location` and `clear-location`

use super::print_json;
use crate::context::AppContext;
use anyhow::Result;
use serde_json::json;
use workkar_cli::output::Status;
use workkar_cli::progress;
use workkar_discovery::{describe_location, LocationCache, LocationOrigin, ReverseGeocoder};
use workkar_geo::Coordinate;

/// Print a human-readable label for `point`
pub async fn locate(ctx: &AppContext, point: Coordinate, picked: bool) -> Result<()> {
    let origin = if picked {
        LocationOrigin::Picked
    } else {
        LocationOrigin::Current
    };

    let geocoder = ctx.geocoder()?;
    let spinner = progress::spinner("Looking up address...");
    let label = describe_location(
        geocoder.as_ref().map(|g| g as &dyn ReverseGeocoder),
        point,
        origin,
    )
    .await;
    progress::finish_clear(&spinner);

    if ctx.is_json() {
        return print_json(&label);
    }

    println!("{}", label.address);
    if let Some(city) = &label.city {
        println!("{city}");
    }
    Ok(())
}

/// Store `point` as the pending location
pub fn set(ctx: &AppContext, point: Coordinate) -> Result<()> {
    let pending = ctx.pending_location(ctx.cache()?);
    pending.set(point)?;

    if ctx.is_json() {
        return print_json(&json!({ "pending": point }));
    }
    Status::success(&format!("Saved location {point}"));
    Ok(())
}

/// Forget the pending location
pub fn clear(ctx: &AppContext) -> Result<()> {
    let pending = ctx.pending_location(ctx.cache()?);
    let had_location = pending.get().is_some();
    pending.clear()?;

    if ctx.is_json() {
        return print_json(&json!({ "cleared": had_location }));
    }
    if had_location {
        Status::success("Cleared saved location");
    } else {
        Status::info("No saved location");
    }
    Ok(())
}

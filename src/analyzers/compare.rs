//! Fuel cost of on-route trips compared with out-of-route trips.

use serde::Serialize;
use tracing::debug;

use crate::analyzers::fuel::FuelRates;
use crate::analyzers::utility::pct;
use crate::error::AnalysisError;
use crate::trip::{RouteStatus, Trip};

/// Trips split by geofence coverage. Every input trip lands in exactly one bucket.
#[derive(Debug, Default)]
pub struct RoutePartition<'a> {
    pub on_route: Vec<&'a Trip>,
    pub off_route: Vec<&'a Trip>,
    /// Exactly one geofence missing; counted in neither cost bucket.
    pub excluded: Vec<&'a Trip>,
}

pub fn partition_by_route<'a>(trips: &[&'a Trip]) -> RoutePartition<'a> {
    let mut partition = RoutePartition::default();
    for &trip in trips {
        match trip.route_status() {
            RouteStatus::OnRoute => partition.on_route.push(trip),
            RouteStatus::OutOfRoute => partition.off_route.push(trip),
            RouteStatus::Partial => partition.excluded.push(trip),
        }
    }
    partition
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostComparison {
    pub on_route_cost: f64,
    pub off_route_cost: f64,
    pub pct_on: f64,
    pub pct_off: f64,
    pub excluded_trips: usize,
}

/// Compares fuel spent on trips inside geofences against trips outside them.
///
/// # Errors
///
/// [`AnalysisError::EmptySelection`] when no trip is fully on or off route,
/// [`AnalysisError::NoFuelCost`] when the combined cost is zero.
pub fn compare_costs(trips: &[&Trip], rates: &FuelRates) -> Result<CostComparison, AnalysisError> {
    let partition = partition_by_route(trips);
    debug!(
        on_route = partition.on_route.len(),
        off_route = partition.off_route.len(),
        excluded = partition.excluded.len(),
        "Partitioned trips by route"
    );

    if partition.on_route.is_empty() && partition.off_route.is_empty() {
        return Err(AnalysisError::EmptySelection(
            "no trips fully on or off route".to_string(),
        ));
    }

    let on_route_cost = bucket_cost(&partition.on_route, rates);
    let off_route_cost = bucket_cost(&partition.off_route, rates);
    let total = on_route_cost + off_route_cost;

    let pct_on = pct(on_route_cost, total).ok_or(AnalysisError::NoFuelCost)?;
    let pct_off = pct(off_route_cost, total).ok_or(AnalysisError::NoFuelCost)?;

    Ok(CostComparison {
        on_route_cost,
        off_route_cost,
        pct_on,
        pct_off,
        excluded_trips: partition.excluded.len(),
    })
}

fn bucket_cost(bucket: &[&Trip], rates: &FuelRates) -> f64 {
    bucket.iter().map(|t| rates.cost(t.distance)).sum()
}

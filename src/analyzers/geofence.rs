//! Counts of trips missing a start or end geofence.

use serde::Serialize;

use crate::analyzers::utility::count_pct;
use crate::trip::Trip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceColumn {
    Start,
    End,
}

/// How many trips lack a geofence at one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NullCounts {
    pub column: GeofenceColumn,
    pub missing: usize,
    pub present: usize,
    pub pct_missing: f64,
    pub pct_present: f64,
}

pub fn null_counts(trips: &[&Trip], column: GeofenceColumn) -> NullCounts {
    let missing = trips
        .iter()
        .filter(|t| match column {
            GeofenceColumn::Start => t.start_geofence.is_none(),
            GeofenceColumn::End => t.end_geofence.is_none(),
        })
        .count();
    let present = trips.len() - missing;

    NullCounts {
        column,
        missing,
        present,
        pct_missing: count_pct(missing, trips.len()),
        pct_present: count_pct(present, trips.len()),
    }
}

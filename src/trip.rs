//! Core trip record shared by the loader and every analyzer.

use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A single vehicle trip as recorded by the fleet tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub registration: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub start_location: String,
    pub end_location: String,
    /// Kilometres. Negative values are carried through untouched.
    pub distance: f64,
    pub start_geofence: Option<String>,
    pub end_geofence: Option<String>,
}

/// Where a trip sits relative to the known geofences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    /// Both endpoints inside a geofence.
    OnRoute,
    /// Neither endpoint inside a geofence.
    OutOfRoute,
    /// Exactly one endpoint missing a geofence.
    Partial,
}

impl Trip {
    pub fn route_status(&self) -> RouteStatus {
        match (&self.start_geofence, &self.end_geofence) {
            (Some(_), Some(_)) => RouteStatus::OnRoute,
            (None, None) => RouteStatus::OutOfRoute,
            _ => RouteStatus::Partial,
        }
    }

    pub fn is_out_of_route(&self) -> bool {
        self.route_status() == RouteStatus::OutOfRoute
    }

    /// Calendar month the trip started in.
    pub fn start_month(&self) -> Month {
        // month() is always within 1..=12
        Month::try_from(self.start_time.month() as u8).unwrap_or(Month::January)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date()
    }
}

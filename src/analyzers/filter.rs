//! Selection of trips by registration, start location and geofence state.

use std::collections::HashSet;

use tracing::debug;

use crate::error::AnalysisError;
use crate::trip::Trip;

/// Conjunctive equality/null predicates over raw trip fields.
#[derive(Debug, Clone, Default)]
pub struct TripFilter {
    pub registration: Option<String>,
    pub start_location: Option<String>,
    /// Keep only trips with neither a start nor an end geofence.
    pub out_of_route_only: bool,
}

impl TripFilter {
    pub fn registration(mut self, registration: impl Into<String>) -> Self {
        self.registration = Some(registration.into());
        self
    }

    pub fn start_location(mut self, location: impl Into<String>) -> Self {
        self.start_location = Some(location.into());
        self
    }

    pub fn out_of_route(mut self) -> Self {
        self.out_of_route_only = true;
        self
    }

    pub fn matches(&self, trip: &Trip) -> bool {
        self.registration
            .as_deref()
            .is_none_or(|r| trip.registration == r)
            && self
                .start_location
                .as_deref()
                .is_none_or(|l| trip.start_location == l)
            && (!self.out_of_route_only || trip.is_out_of_route())
    }

    /// Human-readable description, used in "no data" messages.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(r) = &self.registration {
            parts.push(format!("registration {r}"));
        }
        if let Some(l) = &self.start_location {
            parts.push(format!("start location {l}"));
        }
        if self.out_of_route_only {
            parts.push("out of route".to_string());
        }
        if parts.is_empty() {
            "all trips".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Non-empty, source-ordered subset of a trip table.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    trips: Vec<&'a Trip>,
}

impl<'a> Selection<'a> {
    pub fn trips(&self) -> &[&'a Trip] {
        &self.trips
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Trip at `index` within the selection.
    pub fn nth(&self, index: usize) -> Result<&'a Trip, AnalysisError> {
        self.trips
            .get(index)
            .copied()
            .ok_or(AnalysisError::RowOutOfRange {
                index,
                len: self.trips.len(),
            })
    }

    pub fn total_distance(&self) -> f64 {
        self.trips.iter().map(|t| t.distance).sum()
    }
}

/// Applies `predicates` to `trips`, preserving source order.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptySelection`] when nothing matches.
pub fn filter<'a>(trips: &'a [Trip], predicates: &TripFilter) -> Result<Selection<'a>, AnalysisError> {
    let selected: Vec<&Trip> = trips.iter().filter(|t| predicates.matches(t)).collect();
    debug!(
        selection = %predicates.describe(),
        matched = selected.len(),
        total = trips.len(),
        "Filtered trips"
    );

    if selected.is_empty() {
        return Err(AnalysisError::EmptySelection(predicates.describe()));
    }
    Ok(Selection { trips: selected })
}

/// Distinct registrations in first-seen order.
pub fn unique_registrations(trips: &[Trip]) -> Vec<&str> {
    first_seen(trips.iter().map(|t| t.registration.as_str()))
}

/// Distinct start locations in first-seen order, optionally for one vehicle.
pub fn unique_start_locations<'a>(trips: &'a [Trip], registration: Option<&str>) -> Vec<&'a str> {
    first_seen(
        trips
            .iter()
            .filter(|t| registration.is_none_or(|r| t.registration == r))
            .map(|t| t.start_location.as_str()),
    )
}

fn first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::fixtures::trip;

    fn sample() -> Vec<Trip> {
        vec![
            trip("T1", "2024-01-01 08:00", "Depot", "Market", 5.0, (Some("G"), Some("G"))),
            trip("T2", "2024-01-01 09:00", "Depot", "Port", 8.0, (None, None)),
            trip("T1", "2024-01-02 08:00", "Market", "Depot", 5.0, (None, None)),
            trip("T1", "2024-01-03 08:00", "Depot", "Port", 12.0, (None, None)),
        ]
    }

    #[test]
    fn test_filter_by_registration_and_location() {
        let trips = sample();
        let predicates = TripFilter::default().registration("T1").start_location("Depot");
        let selection = filter(&trips, &predicates).unwrap();

        assert_eq!(selection.len(), 2);
        assert_eq!(selection.trips()[0].end_location, "Market");
        assert_eq!(selection.trips()[1].end_location, "Port");
        assert_eq!(selection.total_distance(), 17.0);
    }

    #[test]
    fn test_filter_out_of_route() {
        let trips = sample();
        let predicates = TripFilter::default().registration("T1").out_of_route();
        let selection = filter(&trips, &predicates).unwrap();

        assert_eq!(selection.len(), 2);
        assert!(selection.trips().iter().all(|t| t.is_out_of_route()));
    }

    #[test]
    fn test_empty_selection_is_signalled() {
        let trips = sample();
        let predicates = TripFilter::default().registration("T9");
        let err = filter(&trips, &predicates).unwrap_err();

        assert_eq!(err, AnalysisError::EmptySelection("registration T9".to_string()));
    }

    #[test]
    fn test_no_predicates_keeps_everything() {
        let trips = sample();
        let selection = filter(&trips, &TripFilter::default()).unwrap();
        assert_eq!(selection.len(), trips.len());
    }

    #[test]
    fn test_nth() {
        let trips = sample();
        let selection = filter(&trips, &TripFilter::default().registration("T2")).unwrap();

        assert_eq!(selection.nth(0).unwrap().end_location, "Port");
        assert_eq!(
            selection.nth(1).unwrap_err(),
            AnalysisError::RowOutOfRange { index: 1, len: 1 }
        );
    }

    #[test]
    fn test_unique_values_keep_first_seen_order() {
        let trips = sample();
        assert_eq!(unique_registrations(&trips), vec!["T1", "T2"]);
        assert_eq!(unique_start_locations(&trips, None), vec!["Depot", "Market"]);
        assert_eq!(unique_start_locations(&trips, Some("T2")), vec!["Depot"]);
    }
}

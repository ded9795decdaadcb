//! Monthly and daily trip summaries.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Month, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::analyzers::fuel::FuelRates;
use crate::trip::Trip;

/// Grouping key of a summary row. `Totals` only ever appears once, last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthKey {
    Month(Month),
    Totals,
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKey::Month(m) => f.write_str(m.name()),
            MonthKey::Totals => f.write_str("Totals"),
        }
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    pub month: MonthKey,
    pub trip_count: usize,
    pub total_distance: f64,
    /// Sum of per-trip fuel costs, TZS.
    pub fuel_cost: f64,
    /// `trip_count` × flat per-trip rate, TZS.
    pub flat_cost_estimate: f64,
}

impl MonthRow {
    fn empty(month: MonthKey) -> Self {
        Self {
            month,
            trip_count: 0,
            total_distance: 0.0,
            fuel_cost: 0.0,
            flat_cost_estimate: 0.0,
        }
    }
}

/// Calendar-ordered monthly rows followed by a single Totals row.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    rows: Vec<MonthRow>,
}

impl MonthlySummary {
    /// Every row, Totals included.
    pub fn rows(&self) -> &[MonthRow] {
        &self.rows
    }

    /// Rows for real months only.
    pub fn months(&self) -> &[MonthRow] {
        &self.rows[..self.rows.len() - 1]
    }

    pub fn totals(&self) -> &MonthRow {
        // always present, pushed last by aggregate_by_month
        &self.rows[self.rows.len() - 1]
    }
}

/// Groups trips by the calendar month they started in, January first.
///
/// Years are not distinguished: March 2023 and March 2024 share a row.
pub fn aggregate_by_month(trips: &[&Trip], rates: &FuelRates) -> MonthlySummary {
    let mut groups: BTreeMap<u32, MonthRow> = BTreeMap::new();

    for trip in trips {
        let month = trip.start_month();
        let row = groups
            .entry(month.number_from_month())
            .or_insert_with(|| MonthRow::empty(MonthKey::Month(month)));
        row.trip_count += 1;
        row.total_distance += trip.distance;
        row.fuel_cost += rates.cost(trip.distance);
    }

    let mut rows: Vec<MonthRow> = groups.into_values().collect();
    for row in &mut rows {
        row.flat_cost_estimate = rates.flat_estimate(row.trip_count);
    }

    let mut totals = MonthRow::empty(MonthKey::Totals);
    for row in &rows {
        totals.trip_count += row.trip_count;
        totals.total_distance += row.total_distance;
        totals.fuel_cost += row.fuel_cost;
        totals.flat_cost_estimate += row.flat_cost_estimate;
    }
    rows.push(totals);

    MonthlySummary { rows }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub trips: usize,
}

/// Trips per start date, in date order.
pub fn trips_per_day(trips: &[&Trip]) -> Vec<DailyCount> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for trip in trips {
        *days.entry(trip.start_date()).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, trips)| DailyCount { date, trips })
        .collect()
}

/// Per-trip line shown under a diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripDetail {
    pub start_month: String,
    pub end_time: NaiveDateTime,
    pub start_location: String,
    pub end_location: String,
    pub distance: f64,
    pub fuel_cost: f64,
}

pub fn trip_details(trips: &[&Trip], rates: &FuelRates) -> Vec<TripDetail> {
    trips
        .iter()
        .map(|t| TripDetail {
            start_month: t.start_month().name().to_string(),
            end_time: t.end_time,
            start_location: t.start_location.clone(),
            end_location: t.end_location.clone(),
            distance: t.distance,
            fuel_cost: rates.cost(t.distance),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::fuel::fuel_cost;
    use crate::trip::fixtures::trip;

    fn sample() -> Vec<Trip> {
        vec![
            trip("T1", "2024-03-02 08:00", "A", "B", 9.0, (None, None)),
            trip("T1", "2024-01-15 08:00", "A", "C", 10.0, (None, None)),
            trip("T1", "2024-12-01 08:00", "C", "A", 4.5, (Some("G"), Some("G"))),
            trip("T1", "2024-01-20 08:00", "B", "A", 18.0, (None, None)),
            trip("T1", "2024-03-02 17:00", "B", "A", 1.0, (None, None)),
        ]
    }

    #[test]
    fn test_months_are_calendar_ordered() {
        let owned = sample();
        let refs: Vec<&Trip> = owned.iter().collect();
        let summary = aggregate_by_month(&refs, &FuelRates::default());

        let keys: Vec<MonthKey> = summary.rows().iter().map(|r| r.month).collect();
        assert_eq!(
            keys,
            vec![
                MonthKey::Month(Month::January),
                MonthKey::Month(Month::March),
                MonthKey::Month(Month::December),
                MonthKey::Totals,
            ]
        );
    }

    #[test]
    fn test_group_values() {
        let owned = sample();
        let refs: Vec<&Trip> = owned.iter().collect();
        let summary = aggregate_by_month(&refs, &FuelRates::default());

        let january = &summary.months()[0];
        assert_eq!(january.trip_count, 2);
        assert_eq!(january.total_distance, 28.0);
        assert_eq!(january.fuel_cost, fuel_cost(10.0) + fuel_cost(18.0));
        assert_eq!(january.flat_cost_estimate, 20_000.0);
    }

    #[test]
    fn test_totals_row_matches_input() {
        let owned = sample();
        let refs: Vec<&Trip> = owned.iter().collect();
        let summary = aggregate_by_month(&refs, &FuelRates::default());
        let totals = summary.totals();

        assert_eq!(totals.month, MonthKey::Totals);
        assert_eq!(totals.trip_count, owned.len());
        let per_trip: f64 = owned.iter().map(|t| fuel_cost(t.distance)).sum();
        assert!((totals.fuel_cost - per_trip).abs() < 1e-6);
        assert_eq!(totals.flat_cost_estimate, 50_000.0);
    }

    #[test]
    fn test_empty_input_has_only_totals() {
        let summary = aggregate_by_month(&[], &FuelRates::default());

        assert_eq!(summary.rows().len(), 1);
        assert!(summary.months().is_empty());
        assert_eq!(summary.totals().trip_count, 0);
        assert_eq!(summary.totals().fuel_cost, 0.0);
    }

    #[test]
    fn test_month_key_serializes_as_name() {
        let json = serde_json::to_string(&MonthKey::Month(Month::February)).unwrap();
        assert_eq!(json, "\"February\"");
        assert_eq!(MonthKey::Totals.to_string(), "Totals");
    }

    #[test]
    fn test_trips_per_day() {
        let owned = sample();
        let refs: Vec<&Trip> = owned.iter().collect();
        let days = trips_per_day(&refs);

        assert_eq!(days.len(), 4);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(days[2].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(days[2].trips, 2);
    }

    #[test]
    fn test_trip_details() {
        let owned = sample();
        let refs: Vec<&Trip> = owned.iter().take(1).collect();
        let details = trip_details(&refs, &FuelRates::default());

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].start_month, "March");
        assert_eq!(details[0].fuel_cost, 3100.0);
    }
}

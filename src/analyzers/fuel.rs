//! Fuel cost model.
//!
//! One litre covers `km_per_litre` kilometres and costs `price_per_litre`
//! TZS. Costs are rounded to two decimals per trip.

use serde::Serialize;

use crate::analyzers::utility::round2;

pub const KM_PER_LITRE: f64 = 9.0;
pub const PRICE_PER_LITRE: f64 = 3100.0;
pub const FLAT_RATE_PER_TRIP: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelRates {
    pub km_per_litre: f64,
    /// TZS per litre.
    pub price_per_litre: f64,
    /// TZS charged per trip for the flat estimate.
    pub flat_rate_per_trip: f64,
}

impl Default for FuelRates {
    fn default() -> Self {
        Self {
            km_per_litre: KM_PER_LITRE,
            price_per_litre: PRICE_PER_LITRE,
            flat_rate_per_trip: FLAT_RATE_PER_TRIP,
        }
    }
}

impl FuelRates {
    /// Fuel cost in TZS for a trip of `distance_km`, rounded to 2 decimals.
    pub fn cost(&self, distance_km: f64) -> f64 {
        round2(distance_km / self.km_per_litre * self.price_per_litre)
    }

    /// Flat per-trip estimate, independent of distance.
    pub fn flat_estimate(&self, trip_count: usize) -> f64 {
        trip_count as f64 * self.flat_rate_per_trip
    }
}

/// Fuel cost in TZS using the standard rates.
pub fn fuel_cost(distance_km: f64) -> f64 {
    FuelRates::default().cost(distance_km)
}

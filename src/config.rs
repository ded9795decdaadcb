//! Runtime settings read from the environment (and `.env` via dotenvy).

use std::{env, path::PathBuf};

use crate::analyzers::fuel::FuelRates;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    pub rates: FuelRates,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_path = env::var("FLEET_TRIPS_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("trips.csv"));

        let defaults = FuelRates::default();
        let rates = FuelRates {
            km_per_litre: positive_var("FUEL_KM_PER_LITRE", defaults.km_per_litre)?,
            price_per_litre: positive_var("FUEL_PRICE_PER_LITRE", defaults.price_per_litre)?,
            flat_rate_per_trip: positive_var("FLAT_RATE_PER_TRIP", defaults.flat_rate_per_trip)?,
        };

        Ok(Self { data_path, rates })
    }
}

fn positive_var(name: &str, default: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_positive(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|err| ConfigError(format!("invalid {name}: {err}")))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError(format!("{name} must be positive, got {raw}")));
    }
    Ok(value)
}

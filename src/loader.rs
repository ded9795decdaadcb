//! CSV loader for fleet trip exports.
//!
//! Header names vary a little between exports, so a few aliases are accepted.
//! Rows with an unparsable distance or timestamp are skipped with a warning
//! rather than aborting the whole load.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::trip::Trip;

/// Required columns and the alternative header names accepted for each.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("Registration", &[]),
    ("Start Time", &[]),
    ("End Time", &[]),
    ("Start Location", &["Position Description"]),
    ("End Location", &[]),
    ("Distance", &["Trip Distance"]),
    ("Start Geofence", &[]),
    ("End Geofence", &[]),
];

const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Outcome of a load: the accepted trips and how many rows were rejected.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub trips: Vec<Trip>,
    pub rejected: usize,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "Registration")]
    registration: String,
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "End Time")]
    end_time: String,
    #[serde(rename = "Start Location", alias = "Position Description")]
    start_location: String,
    #[serde(rename = "End Location")]
    end_location: String,
    #[serde(rename = "Distance", alias = "Trip Distance")]
    distance: String,
    #[serde(rename = "Start Geofence")]
    start_geofence: Option<String>,
    #[serde(rename = "End Geofence")]
    end_geofence: Option<String>,
}

/// Loads trips from a CSV file, transparently gunzipping `.gz` files.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_path(path: &Path) -> Result<LoadReport, LoadError> {
    let file = BufReader::new(File::open(path)?);

    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(gzipped, "Opening trip table");

    if gzipped {
        load_reader(GzDecoder::new(file))
    } else {
        load_reader(file)
    }
}

/// Loads trips from any CSV source.
///
/// # Errors
///
/// Fails only when the header row lacks a required column or the underlying
/// reader fails. Bad rows are counted in [`LoadReport::rejected`].
pub fn load_reader<R: Read>(reader: R) -> Result<LoadReport, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    for (column, aliases) in REQUIRED_COLUMNS {
        let present = headers
            .iter()
            .any(|h| h == *column || aliases.contains(&h));
        if !present {
            return Err(LoadError::MissingColumn(*column));
        }
    }
    let headers = resolve_aliases(&headers);

    let mut report = LoadReport::default();

    for result in rdr.records() {
        let parsed = result
            .map_err(|err| {
                // a failing source is not a bad row
                if matches!(err.kind(), csv::ErrorKind::Io(_)) {
                    return LoadError::Csv(err);
                }
                LoadError::MalformedRow {
                    line: err.position().map(|p| p.line()).unwrap_or(0),
                    reason: err.to_string(),
                }
            })
            .and_then(|record| {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                record
                    .deserialize::<Record>(Some(&headers))
                    .map_err(|err| LoadError::MalformedRow {
                        line,
                        reason: err.to_string(),
                    })
                    .and_then(|raw| to_trip(raw, line))
            });

        match parsed {
            Ok(trip) => report.trips.push(trip),
            Err(LoadError::MalformedRow { line, reason }) => {
                warn!(line, reason = %reason, "Rejecting malformed trip row");
                report.rejected += 1;
            }
            Err(other) => return Err(other),
        }
    }

    info!(
        accepted = report.trips.len(),
        rejected = report.rejected,
        "Trip table loaded"
    );
    Ok(report)
}

/// Blanks out alias headers whose canonical column is also present, so the
/// canonical column wins instead of both mapping to the same field.
fn resolve_aliases(headers: &csv::StringRecord) -> csv::StringRecord {
    let shadowed: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|(column, _)| headers.iter().any(|h| h == *column))
        .flat_map(|(_, aliases)| aliases.iter().copied())
        .collect();

    headers
        .iter()
        .map(|h| if shadowed.contains(&h) { "" } else { h })
        .collect()
}

fn to_trip(raw: Record, line: u64) -> Result<Trip, LoadError> {
    let malformed = |reason: String| LoadError::MalformedRow { line, reason };

    let distance: f64 = raw
        .distance
        .parse()
        .map_err(|_| malformed(format!("non-numeric distance '{}'", raw.distance)))?;
    if !distance.is_finite() {
        return Err(malformed(format!("non-finite distance '{}'", raw.distance)));
    }

    let start_time = parse_time(&raw.start_time)
        .ok_or_else(|| malformed(format!("unparsable start time '{}'", raw.start_time)))?;
    let end_time = parse_time(&raw.end_time)
        .ok_or_else(|| malformed(format!("unparsable end time '{}'", raw.end_time)))?;

    Ok(Trip {
        registration: raw.registration,
        start_time,
        end_time,
        start_location: raw.start_location,
        end_location: raw.end_location,
        distance,
        start_geofence: non_blank(raw.start_geofence),
        end_geofence: non_blank(raw.end_geofence),
    })
}

fn parse_time(value: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    const HEADER: &str = "Registration,Start Time,End Time,Start Location,End Location,Distance,Start Geofence,End Geofence\n";

    #[test]
    fn test_load_valid_rows() {
        let csv = format!(
            "{HEADER}T100,2024-01-05 08:00:00,2024-01-05 09:00:00,Depot,Market,12.5,Yard,Town\n\
             T100,2024-01-06 08:00:00,2024-01-06 08:30:00,Market,Depot,7,,\n"
        );
        let report = load_reader(csv.as_bytes()).unwrap();

        assert_eq!(report.rejected, 0);
        assert_eq!(report.trips.len(), 2);
        assert_eq!(report.trips[0].distance, 12.5);
        assert_eq!(report.trips[0].start_geofence.as_deref(), Some("Yard"));
        assert_eq!(report.trips[1].start_geofence, None);
        assert_eq!(report.trips[1].end_geofence, None);
        assert!(report.trips[1].is_out_of_route());
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let csv = format!(
            "{HEADER}T100,2024-01-05 08:00:00,2024-01-05 09:00:00,Depot,Market,abc,Yard,Town\n\
             T100,yesterday,2024-01-05 09:00:00,Depot,Market,3,Yard,Town\n\
             T100,2024-01-05 10:00:00,2024-01-05 11:00:00,Depot,Market,3,Yard,Town\n"
        );
        let report = load_reader(csv.as_bytes()).unwrap();

        assert_eq!(report.rejected, 2);
        assert_eq!(report.trips.len(), 1);
        assert_eq!(report.trips[0].distance, 3.0);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "Registration,Start Time,End Time,Start Location,End Location,Start Geofence,End Geofence\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("Distance")));
    }

    #[test]
    fn test_header_aliases() {
        let csv = "Registration,Start Time,End Time,Position Description,End Location,Trip Distance,Start Geofence,End Geofence,Start Month\n\
                   T7,05/01/2024 08:00,05/01/2024 09:00,Depot,Market,4.5,Yard,,1\n";
        let report = load_reader(csv.as_bytes()).unwrap();

        assert_eq!(report.trips.len(), 1);
        assert_eq!(report.trips[0].start_location, "Depot");
        assert_eq!(report.trips[0].distance, 4.5);
        assert_eq!(
            report.trips[0].start_time.format("%Y-%m-%d").to_string(),
            "2024-01-05"
        );
    }

    #[test]
    fn test_canonical_header_wins_over_alias() {
        let csv = "Registration,Start Time,End Time,Start Location,Position Description,End Location,Distance,Trip Distance,Start Geofence,End Geofence\n\
                   T7,2024-01-05 08:00:00,2024-01-05 09:00:00,Depot,Old Depot,Market,4.5,99,Yard,\n";
        let report = load_reader(csv.as_bytes()).unwrap();

        assert_eq!(report.rejected, 0);
        assert_eq!(report.trips.len(), 1);
        assert_eq!(report.trips[0].start_location, "Depot");
        assert_eq!(report.trips[0].distance, 4.5);
    }

    #[test]
    fn test_day_first_wins_for_ambiguous_dates() {
        let csv = format!(
            "{HEADER}T1,05/01/2024 08:00:00,05/01/2024 09:00:00,A,B,1,,\n\
             T1,12/25/2024 08:00:00,12/25/2024 09:00:00,A,B,1,,\n"
        );
        let report = load_reader(csv.as_bytes()).unwrap();

        assert_eq!(report.rejected, 0);
        assert_eq!(
            report.trips[0].start_time.format("%Y-%m-%d").to_string(),
            "2024-01-05"
        );
        // not a valid day-first date, so month-first applies
        assert_eq!(
            report.trips[1].start_time.format("%Y-%m-%d").to_string(),
            "2024-12-25"
        );
    }

    #[test]
    fn test_truncated_gzip_is_an_error() {
        let mut csv = HEADER.to_string();
        for i in 0..2000 {
            csv.push_str(&format!(
                "T{i},2024-02-01 08:00:00,2024-02-01 09:00:00,Depot {i},Market {i},{i}.5,Yard,Town\n"
            ));
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(csv.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();
        let truncated = &compressed[..compressed.len() / 2];

        let err = load_reader(GzDecoder::new(truncated)).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)), "unexpected error: {err}");
    }

    #[test]
    fn test_load_gzipped_file() {
        let path = env::temp_dir().join("fleet_trips_test_load.csv.gz");
        let _ = fs::remove_file(&path);

        let csv = format!(
            "{HEADER}T1,2024-02-01 08:00:00,2024-02-01 09:00:00,A,B,9,,\n"
        );
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(csv.as_bytes()).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let report = load_path(&path).unwrap();
        assert_eq!(report.trips.len(), 1);

        fs::remove_file(&path).unwrap();
    }
}

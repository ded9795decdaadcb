//! Output formatting and persistence for trip reports.
//!
//! Supports aligned text tables, JSON, Graphviz DOT and CSV export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::aggregate::{DailyCount, MonthlySummary, TripDetail};
use crate::analyzers::compare::CostComparison;
use crate::analyzers::geofence::{GeofenceColumn, NullCounts};
use crate::analyzers::graph::TripGraph;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Table,
    Json,
}

/// Display switches handed to the renderer for a single report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub format: Format,
    pub show_trips_per_day: bool,
    /// Emit the diagram as Graphviz DOT instead of an edge list.
    pub dot: bool,
}

/// Everything shown for one registration/start-location selection.
#[derive(Debug, Serialize)]
pub struct NetworkReport {
    pub selection: String,
    pub graph: TripGraph,
    pub plotted_trips: Vec<TripDetail>,
    pub total_distance: f64,
    pub monthly: MonthlySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trips_per_day: Option<Vec<DailyCount>>,
}

/// Logs any report using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Writes any report as pretty-printed JSON.
pub fn print_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes a plain list, one value per line.
pub fn render_list(out: &mut impl Write, values: &[&str], format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(out, &values),
        Format::Table => {
            for value in values {
                writeln!(out, "{value}")?;
            }
            Ok(())
        }
    }
}

pub fn render_network(out: &mut impl Write, report: &NetworkReport, options: ReportOptions) -> Result<()> {
    print_pretty(report);

    if options.dot {
        write!(out, "{}", report.graph.to_dot())?;
        return Ok(());
    }
    if options.format == Format::Json {
        return print_json(out, report);
    }

    writeln!(out, "Selection: {}", report.selection)?;
    writeln!(out)?;

    writeln!(out, "Network diagram ({} trips):", report.graph.edge_count())?;
    let edges: Vec<Vec<String>> = report
        .graph
        .edges()
        .into_iter()
        .map(|e| vec![e.from, e.to, e.weight.to_string()])
        .collect();
    write_table(out, &["From", "To", "Distance (km)"], &edges)?;
    writeln!(out)?;

    writeln!(out, "Trips plotted on network diagram:")?;
    let details: Vec<Vec<String>> = report
        .plotted_trips
        .iter()
        .map(|d| {
            vec![
                d.start_month.clone(),
                d.end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                d.start_location.clone(),
                d.end_location.clone(),
                d.distance.to_string(),
                format!("{:.2}", d.fuel_cost),
            ]
        })
        .collect();
    write_table(
        out,
        &[
            "Start Month",
            "End Time",
            "Start Location",
            "End Location",
            "Distance",
            "Total Cost on Fuel (TZS)",
        ],
        &details,
    )?;
    writeln!(out)?;

    writeln!(out, "Total distance covered (km): {:.2}", report.total_distance)?;
    writeln!(out)?;

    writeln!(out, "Trips and fuel cost per month:")?;
    render_monthly_table(out, &report.monthly)?;

    if options.show_trips_per_day {
        if let Some(days) = &report.trips_per_day {
            writeln!(out)?;
            writeln!(out, "Trips made per day:")?;
            let rows: Vec<Vec<String>> = days
                .iter()
                .map(|d| vec![d.date.to_string(), d.trips.to_string()])
                .collect();
            write_table(out, &["Date", "Trips"], &rows)?;
        }
    }

    Ok(())
}

pub fn render_monthly_table(out: &mut impl Write, summary: &MonthlySummary) -> Result<()> {
    let rows: Vec<Vec<String>> = summary
        .rows()
        .iter()
        .map(|r| {
            vec![
                r.month.to_string(),
                r.trip_count.to_string(),
                format!("{:.2}", r.total_distance),
                format!("{:.2}", r.fuel_cost),
                format!("{:.2}", r.flat_cost_estimate),
            ]
        })
        .collect();
    write_table(
        out,
        &[
            "Month",
            "Total Trips",
            "Distance (km)",
            "Fuel Cost (TZS)",
            "Flat Estimate (TZS)",
        ],
        &rows,
    )
}

/// Writes a single-trip diagram: one edge and its endpoints.
///
/// `endpoint` names what the nodes are, e.g. "Location" or "Geofence".
pub fn render_single_trip(
    out: &mut impl Write,
    graph: &TripGraph,
    endpoint: &str,
    options: ReportOptions,
) -> Result<()> {
    if options.dot {
        write!(out, "{}", graph.to_dot())?;
        return Ok(());
    }
    match options.format {
        Format::Json => print_json(out, graph),
        Format::Table => {
            for edge in graph.edges() {
                writeln!(out, "Start {endpoint}: {}", edge.from)?;
                writeln!(out, "End {endpoint}: {}", edge.to)?;
                writeln!(out, "Trip Distance: {}", edge.weight)?;
            }
            Ok(())
        }
    }
}

pub fn render_comparison(out: &mut impl Write, comparison: &CostComparison, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(out, comparison),
        Format::Table => {
            let rows = vec![
                vec![
                    "On Route".to_string(),
                    format!("{:.2}", comparison.on_route_cost),
                    format!("{:.2}%", comparison.pct_on),
                ],
                vec![
                    "Out of Route".to_string(),
                    format!("{:.2}", comparison.off_route_cost),
                    format!("{:.2}%", comparison.pct_off),
                ],
            ];
            write_table(out, &["Route", "Fuel Cost (TZS)", "Share"], &rows)?;
            if comparison.excluded_trips > 0 {
                writeln!(
                    out,
                    "{} trips with only one geofence were left out",
                    comparison.excluded_trips
                )?;
            }
            Ok(())
        }
    }
}

pub fn render_null_counts(out: &mut impl Write, counts: &NullCounts, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(out, counts),
        Format::Table => {
            let title = match counts.column {
                GeofenceColumn::Start => "Trips that started out of geofence",
                GeofenceColumn::End => "Trips that ended out of geofence",
            };
            writeln!(out, "{title}:")?;
            let rows = vec![
                vec![
                    "true".to_string(),
                    counts.missing.to_string(),
                    format!("{:.2}%", counts.pct_missing),
                ],
                vec![
                    "false".to_string(),
                    counts.present.to_string(),
                    format!("{:.2}%", counts.pct_present),
                ],
            ];
            write_table(out, &["Out of Route", "No. of Trips", "Share"], &rows)
        }
    }
}

/// Writes a left-aligned text table sized to its widest cell per column.
pub fn write_table(out: &mut impl Write, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(headers.to_vec()))?;
    writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    )?;
    for row in rows {
        writeln!(out, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

/// Writes the monthly summary, Totals row included, to a CSV file.
///
/// With `gzip` the file is gzip-compressed.
pub fn write_summary_csv(path: &Path, summary: &MonthlySummary, gzip: bool) -> Result<()> {
    debug!(path = %path.display(), gzip, "Writing monthly summary CSV");
    let file = File::create(path)?;

    if gzip {
        let encoder = GzEncoder::new(file, Compression::default());
        let encoder = write_rows(encoder, summary)?;
        encoder.finish()?;
    } else {
        write_rows(file, summary)?;
    }

    info!(path = %path.display(), rows = summary.rows().len(), "Summary exported");
    Ok(())
}

fn write_rows<W: Write>(sink: W, summary: &MonthlySummary) -> Result<W> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(sink);
    for row in summary.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

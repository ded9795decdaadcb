//! CLI entry point for the fleet trip explorer.
//!
//! Loads a trip CSV once and answers one question per invocation: which
//! vehicles and places exist, how many trips left their geofence, what a
//! vehicle's trips from a place look like, and what fuel was spent on and
//! off route.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fleet_trips::analyzers::aggregate::{aggregate_by_month, trip_details, trips_per_day};
use fleet_trips::analyzers::compare::compare_costs;
use fleet_trips::analyzers::filter::{TripFilter, filter, unique_registrations, unique_start_locations};
use fleet_trips::analyzers::fuel::FuelRates;
use fleet_trips::analyzers::geofence::{GeofenceColumn, null_counts};
use fleet_trips::analyzers::graph::{DEFAULT_GRAPH_LIMIT, build_geofence_graph, build_graph};
use fleet_trips::config::Settings;
use fleet_trips::error::AnalysisError;
use fleet_trips::loader::load_path;
use fleet_trips::output::{
    Format, NetworkReport, ReportOptions, render_comparison, render_list, render_network,
    render_null_counts, render_single_trip, write_summary_csv,
};
use fleet_trips::trip::Trip;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fleet_trips")]
#[command(about = "Explore fleet trip logs: out-of-route events, trip diagrams and fuel costs", long_about = None)]
struct Cli {
    /// Trip CSV (or .csv.gz). Defaults to $FLEET_TRIPS_DATA, then trips.csv
    #[arg(short, long, global = true, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List vehicle registrations
    Registrations,
    /// List start locations
    Locations {
        /// Only locations used by this vehicle
        #[arg(short, long)]
        registration: Option<String>,
    },
    /// Count trips that started or ended outside any geofence
    NullGeofence {
        #[arg(short, long, value_enum, default_value_t = GeofenceColumn::Start)]
        column: GeofenceColumn,
    },
    /// Diagram and monthly summary for one vehicle's trips from one place
    Network {
        #[arg(short, long)]
        registration: String,

        #[arg(short = 'l', long)]
        start_location: String,

        /// Only trips with neither a start nor an end geofence
        #[arg(long, default_value_t = false)]
        out_of_route: bool,

        /// Number of trips drawn on the diagram
        #[arg(short = 'n', long, default_value_t = DEFAULT_GRAPH_LIMIT)]
        limit: usize,

        /// Also show trips made per day
        #[arg(long, default_value_t = false)]
        trips_per_day: bool,

        /// Print the diagram as Graphviz DOT
        #[arg(long, default_value_t = false)]
        dot: bool,
    },
    /// Diagram for a single trip of one vehicle
    Trip {
        #[arg(short, long)]
        registration: String,

        /// Position of the trip among the vehicle's trips, starting at 0
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        /// Draw the trip between its start and end geofences
        #[arg(long, default_value_t = false)]
        geofence: bool,

        #[arg(long, default_value_t = false)]
        dot: bool,
    },
    /// Fuel spent on route versus out of route
    CompareCosts {
        #[arg(short, long)]
        registration: Option<String>,

        #[arg(short = 'l', long)]
        start_location: Option<String>,
    },
    /// Write the monthly summary to a CSV file
    Export {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long)]
        registration: Option<String>,

        #[arg(short = 'l', long)]
        start_location: Option<String>,

        #[arg(long, default_value_t = false)]
        out_of_route: bool,

        /// Gzip-compress the CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fleet_trips.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fleet_trips.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let data_path = cli.data.clone().unwrap_or(settings.data_path);

    let report = load_path(&data_path)?;
    if report.rejected > 0 {
        warn!(rejected = report.rejected, "Some trip rows were skipped");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // An empty selection is an answer, not a failure.
    if let Err(err) = run(cli, &report.trips, &settings.rates, &mut out) {
        match err.downcast_ref::<AnalysisError>() {
            Some(reason) => {
                warn!(reason = %reason, "Nothing to report");
                writeln!(out, "{reason}")?;
            }
            None => return Err(err),
        }
    }

    Ok(())
}

#[tracing::instrument(skip_all, fields(trips = trips.len()))]
fn run(cli: Cli, trips: &[Trip], rates: &FuelRates, out: &mut impl Write) -> Result<()> {
    let format = cli.format;

    match cli.command {
        Commands::Registrations => {
            let registrations = unique_registrations(trips);
            info!(count = registrations.len(), "Registrations listed");
            render_list(out, &registrations, format)?;
        }
        Commands::Locations { registration } => {
            let locations = unique_start_locations(trips, registration.as_deref());
            info!(count = locations.len(), "Start locations listed");
            render_list(out, &locations, format)?;
        }
        Commands::NullGeofence { column } => {
            let all: Vec<&Trip> = trips.iter().collect();
            render_null_counts(out, &null_counts(&all, column), format)?;
        }
        Commands::Network {
            registration,
            start_location,
            out_of_route,
            limit,
            trips_per_day: show_trips_per_day,
            dot,
        } => {
            let predicates = TripFilter {
                registration: Some(registration),
                start_location: Some(start_location),
                out_of_route_only: out_of_route,
            };
            let selection = filter(trips, &predicates)?;
            let plotted: Vec<&Trip> = selection.trips().iter().take(limit).copied().collect();

            let report = NetworkReport {
                selection: predicates.describe(),
                graph: build_graph(selection.trips(), limit),
                plotted_trips: trip_details(&plotted, rates),
                total_distance: selection.total_distance(),
                monthly: aggregate_by_month(selection.trips(), rates),
                trips_per_day: show_trips_per_day.then(|| trips_per_day(selection.trips())),
            };
            let options = ReportOptions {
                format,
                show_trips_per_day,
                dot,
            };
            render_network(out, &report, options)?;
        }
        Commands::Trip {
            registration,
            index,
            geofence,
            dot,
        } => {
            let selection = filter(trips, &TripFilter::default().registration(registration))?;
            let trip = selection.nth(index)?;
            let options = ReportOptions {
                format,
                dot,
                ..Default::default()
            };
            if geofence {
                render_single_trip(out, &build_geofence_graph(&[trip], 1), "Geofence", options)?;
            } else {
                render_single_trip(out, &build_graph(&[trip], 1), "Location", options)?;
            }
        }
        Commands::CompareCosts {
            registration,
            start_location,
        } => {
            let predicates = TripFilter {
                registration,
                start_location,
                out_of_route_only: false,
            };
            let selection = filter(trips, &predicates)?;
            let comparison = compare_costs(selection.trips(), rates)?;
            info!(
                on_route = comparison.on_route_cost,
                off_route = comparison.off_route_cost,
                "Fuel costs compared"
            );
            render_comparison(out, &comparison, format)?;
        }
        Commands::Export {
            output,
            registration,
            start_location,
            out_of_route,
            gzip,
        } => {
            let predicates = TripFilter {
                registration,
                start_location,
                out_of_route_only: out_of_route,
            };
            let selection = filter(trips, &predicates)?;
            let summary = aggregate_by_month(selection.trips(), rates);
            write_summary_csv(&output, &summary, gzip)?;
        }
    }

    Ok(())
}

mod config;
mod ingest;
mod models;
mod months;
mod pipeline;
mod report;
mod synthetic;
mod utils;
mod view;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::ingest::Ingestor;
use crate::models::{Provenance, Row, Snapshot};
use crate::pipeline::Dashboard;
use crate::view::{HotelFilter, RowFilter, available_months};

#[derive(Parser)]
#[command(name = "hotel-dash", about = "Hotel group dashboard data feed", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the sheet export URL
    #[arg(long, env = "HOTELDASH_SOURCE_URL", global = true)]
    url: Option<String>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Hotel name, or "All" / "Grupo Total" for every hotel
    #[arg(long, default_value = "All")]
    hotel: String,

    /// First month of the range (any recognised month token)
    #[arg(long)]
    from: Option<String>,

    /// Last month of the range
    #[arg(long)]
    to: Option<String>,
}

impl FilterArgs {
    /// Missing bounds fall back to the first/last available month.
    fn to_filter(&self, rows: &[Row]) -> RowFilter {
        let full = RowFilter::full_range(rows);
        RowFilter {
            hotel: HotelFilter::parse(&self.hotel),
            start: self.from.clone().or(full.start),
            end: self.to.clone().or(full.end),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Command {
    /// Run one ingestion and summarise what came back
    Fetch,

    /// Write the (filtered) rows as JSON or CSV
    Export {
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List available months in chronological order
    Months,

    /// Per-hotel revenue / result / occupancy leaderboard
    Report {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Keep refreshing on a timer (Enter refreshes now) until Ctrl-C
    Watch {
        /// Seconds between refreshes (default: from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "hotel_dash=info,warn",
        1 => "hotel_dash=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;
    if let Some(url) = cli.url {
        config.source.url = url;
    }

    match cli.command {
        Command::Fetch => {
            let _t = utils::Timer::start("Sheet ingestion");
            let snap = Ingestor::from_config(&config.source)?.ingest(1).await;
            print_summary(&snap);
        }

        Command::Export { format, output, filter } => {
            let snap = Ingestor::from_config(&config.source)?.ingest(1).await;
            let filter = filter.to_filter(&snap.rows);
            let rows = filter.apply(&snap.rows);

            let out: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    std::fs::File::create(path)
                        .with_context(|| format!("Could not create {:?}", path))?,
                ),
                None => Box::new(std::io::stdout().lock()),
            };

            match format {
                Format::Json => write_json(out, &snap, &rows)?,
                Format::Csv => write_csv(out, &rows)?,
            }
            info!("Exported {} of {} rows", rows.len(), snap.len());
        }

        Command::Months => {
            let snap = Ingestor::from_config(&config.source)?.ingest(1).await;
            for m in available_months(&snap.rows) {
                println!("  {:<20} {}", m, months::month_value(&m));
            }
        }

        Command::Report { filter } => {
            let snap = Ingestor::from_config(&config.source)?.ingest(1).await;
            let filter = filter.to_filter(&snap.rows);
            let rows = filter.apply(&snap.rows);
            let board = report::leaderboard(&rows);

            println!(
                "  {} → {}  ({})",
                filter.start.as_deref().unwrap_or("—"),
                filter.end.as_deref().unwrap_or("—"),
                provenance_label(&snap.source),
            );
            println!("  {:<16} {:>16} {:>16} {:>8} {:>7} {:>9}", "Hotel", "Ingresos", "Resultado", "Margen", "Ocup.", "ADR");
            for h in board.hotels.iter().chain(std::iter::once(&board.group)) {
                println!(
                    "  {:<16} {:>16} {:>16} {:>7.1}% {:>6.1}% {:>9}",
                    h.hotel,
                    utils::fmt_amount(h.revenue),
                    utils::fmt_amount(h.result),
                    h.margin_pct,
                    h.avg_occupancy,
                    utils::fmt_amount(h.avg_adr),
                );
            }
        }

        Command::Watch { interval } => {
            let interval = Duration::from_secs(interval.unwrap_or(config.refresh.interval_secs).max(1));
            let mut dash = Dashboard::init(Ingestor::from_config(&config.source)?).await;
            print_summary(&dash.current());

            let mut updates = dash.subscribe();
            dash.start_auto_refresh(interval);

            // Enter forces an immediate cycle; stdin may be closed when detached.
            let mut stdin = BufReader::new(tokio::io::stdin()).lines();
            let mut stdin_open = true;

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    line = stdin.next_line(), if stdin_open => match line {
                        Ok(Some(_)) => {
                            info!("Manual refresh requested");
                            dash.refresh().await;
                        }
                        _ => stdin_open = false,
                    },
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snap = updates.borrow_and_update().clone();
                        print_summary(&snap);
                    }
                }
            }

            dash.teardown().await;
        }
    }

    Ok(())
}

fn provenance_label(source: &Provenance) -> String {
    match source {
        Provenance::Live => "live".to_string(),
        Provenance::Fallback { reason } => format!("SYNTHETIC — {}", reason),
    }
}

fn print_summary(snap: &Snapshot) {
    let hotels: BTreeSet<&str> = snap.rows.iter().map(|r| r.hotel.as_str()).collect();
    let concepts: BTreeSet<&str> = snap.rows.iter().map(|r| r.concept.as_str()).collect();
    let months = available_months(&snap.rows);

    println!("─────────────────────────────────");
    println!("  Hotel dashboard feed (cycle {})", snap.sequence);
    println!("─────────────────────────────────");
    println!("  Source   : {}", provenance_label(&snap.source));
    println!("  Fetched  : {}", snap.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Rows     : {}", snap.len());
    println!("  Hotels   : {}", hotels.into_iter().collect::<Vec<_>>().join(", "));
    println!(
        "  Months   : {} ({} → {})",
        months.len(),
        months.first().map(String::as_str).unwrap_or("—"),
        months.last().map(String::as_str).unwrap_or("—"),
    );
    println!("  Concepts : {}", concepts.len());
    println!("─────────────────────────────────");
}

#[derive(Serialize)]
struct Export<'a> {
    sequence: u64,
    source: &'a Provenance,
    fetched_at: chrono::DateTime<chrono::Utc>,
    rows: &'a [&'a Row],
}

fn write_json(mut out: impl Write, snap: &Snapshot, rows: &[&Row]) -> Result<()> {
    let export = Export {
        sequence: snap.sequence,
        source: &snap.source,
        fetched_at: snap.fetched_at,
        rows,
    };
    serde_json::to_writer_pretty(&mut out, &export).context("JSON export failed")?;
    writeln!(out)?;
    Ok(())
}

/// Same column layout the sheet uses, so an export can be fed back in.
fn write_csv(out: impl Write, rows: &[&Row]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["Hotel", "Concepto", "Grupo", "Mes", "Valor", "Unidad", "Canal"])?;
    for r in rows {
        let value = r.value.to_string();
        wtr.write_record([
            r.hotel.as_str(),
            r.concept.as_str(),
            r.group.as_str(),
            r.month.as_str(),
            value.as_str(),
            r.unit.as_str(),
            r.channel().unwrap_or(""),
        ])?;
    }
    wtr.flush().context("CSV export failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_payload;

    fn sample() -> Vec<Row> {
        parse_payload(
            "Hotel;Concepto;Grupo;Mes;Valor;Unidad;Canal\n\
             Nubes;\"Servicios; Varios\";Egresos;2023-01;1.500,5;$\n\
             IRUYA;Booking;Ingresos Alojamiento;Febrero 2023;200;$;Booking\n",
        )
        .unwrap()
        .rows
    }

    #[test]
    fn csv_export_reingests() {
        let rows = sample();
        let refs: Vec<&Row> = rows.iter().collect();
        let mut buf = Vec::new();
        write_csv(&mut buf, &refs).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let again = parse_payload(&text).unwrap();
        assert_eq!(again.separator, ',');
        assert_eq!(again.rows, rows);
    }

    #[test]
    fn json_export_carries_provenance() {
        let snap = Snapshot::new(4, Provenance::Live, sample());
        let refs: Vec<&Row> = snap.rows.iter().collect();
        let mut buf = Vec::new();
        write_json(&mut buf, &snap, &refs).unwrap();

        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["sequence"], 4);
        assert_eq!(v["source"]["kind"], "live");
        assert_eq!(v["rows"][0]["hotel"], "Nubes");
        assert!(v["rows"][0].get("channel").is_none());
        assert_eq!(v["rows"][1]["channel"], "Booking");
    }

    #[test]
    fn filter_args_default_to_full_range() {
        let rows = sample();
        let args = FilterArgs { hotel: "All".into(), from: None, to: Some("2023-01".into()) };
        let f = args.to_filter(&rows);
        assert_eq!(f.start.as_deref(), Some("2023-01"));
        assert_eq!(f.apply(&rows).len(), 1);
    }
}

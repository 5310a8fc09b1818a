//! Per-hotel leaderboard over a filtered row set.

use crate::models::{GROUP_TOTAL, HOTELS, Row, concepts};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HotelSummary {
    pub hotel: String,
    pub revenue: f64,
    pub result: f64,
    pub margin_pct: f64,
    pub avg_occupancy: f64,
    pub avg_adr: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub hotels: Vec<HotelSummary>,
    pub group: HotelSummary,
}

fn sum(rows: &[&Row], concept: &str) -> f64 {
    rows.iter().filter(|r| r.concept == concept).map(|r| r.value).sum()
}

fn avg(rows: &[&Row], concept: &str) -> f64 {
    let (total, n) = rows
        .iter()
        .filter(|r| r.concept == concept)
        .fold((0.0, 0usize), |(t, n), r| (t + r.value, n + 1));
    if n == 0 { 0.0 } else { total / n as f64 }
}

fn summarise(hotel: &str, rows: &[&Row]) -> HotelSummary {
    let revenue = sum(rows, concepts::TOTAL_REVENUE);
    let result = sum(rows, concepts::RESULT);
    HotelSummary {
        hotel: hotel.to_string(),
        revenue,
        result,
        margin_pct: if revenue != 0.0 { result / revenue * 100.0 } else { 0.0 },
        avg_occupancy: avg(rows, concepts::OCCUPANCY),
        avg_adr: avg(rows, concepts::ADR),
    }
}

/// Roster hotels first, then any other hotel found in the rows; sorted by
/// revenue, highest first.
pub fn leaderboard(rows: &[&Row]) -> Leaderboard {
    let mut names: Vec<&str> = HOTELS.to_vec();
    for r in rows {
        if !names.contains(&r.hotel.as_str()) {
            names.push(&r.hotel);
        }
    }

    let mut hotels: Vec<HotelSummary> = names
        .iter()
        .map(|name| {
            let own: Vec<&Row> = rows.iter().copied().filter(|r| r.hotel == *name).collect();
            summarise(name, &own)
        })
        .collect();
    hotels.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));

    Leaderboard {
        hotels,
        group: summarise(GROUP_TOTAL, rows),
    }
}

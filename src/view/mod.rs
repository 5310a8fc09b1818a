//! Filtered views over a published row set: hotel selection plus an inclusive
//! month range.

use crate::models::{GROUP_TOTAL, Row};
use crate::months::{compare_months, in_range, month_value};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HotelFilter {
    #[default]
    All,
    Named(String),
}

impl HotelFilter {
    /// "All", the group-total label, or an empty string select every hotel.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") || s == GROUP_TOTAL {
            HotelFilter::All
        } else {
            HotelFilter::Named(s.to_string())
        }
    }

    pub fn matches(&self, hotel: &str) -> bool {
        match self {
            HotelFilter::All => true,
            HotelFilter::Named(name) => name == hotel,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub hotel: HotelFilter,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RowFilter {
    /// Every hotel, first to last available month.
    pub fn full_range(rows: &[Row]) -> Self {
        let months = available_months(rows);
        Self {
            hotel: HotelFilter::All,
            start: months.first().cloned(),
            end: months.last().cloned(),
        }
    }

    /// `(start, end)` normalised, when both bounds are recognisable months.
    pub fn month_bounds(&self) -> Option<(u32, u32)> {
        let start = self.start.as_deref().map(month_value).unwrap_or(0);
        let end = self.end.as_deref().map(month_value).unwrap_or(0);
        (start > 0 && end > 0).then_some((start, end))
    }

    fn matches_with(&self, row: &Row, bounds: Option<(u32, u32)>) -> bool {
        if !self.hotel.matches(&row.hotel) {
            return false;
        }
        match bounds {
            Some((start, end)) => in_range(row.month_value(), start, end),
            None => true,
        }
    }

    /// Rows passing the filter, in their original order.
    pub fn apply<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        let bounds = self.month_bounds();
        rows.iter().filter(|r| self.matches_with(r, bounds)).collect()
    }
}

/// Distinct month tokens in chronological order; ties keep first-seen order.
pub fn available_months(rows: &[Row]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut months: Vec<String> = rows
        .iter()
        .filter(|r| seen.insert(r.month.as_str()))
        .map(|r| r.month.clone())
        .collect();
    months.sort_by(|a, b| compare_months(a, b));
    months
}

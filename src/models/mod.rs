use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ── Hotels & concepts ─────────────────────────────────────────────────────────

/// Fixed roster of the group's hotels.
pub const HOTELS: [&str; 3] = ["Amalinas", "IRUYA", "Nubes"];

/// Aggregate label shown for the whole group; never a `Row::hotel` value.
pub const GROUP_TOTAL: &str = "Grupo Total";

pub mod concepts {
    pub const TOTAL_REVENUE: &str = "TOTAL INGRESOS DEL MES";
    pub const TOTAL_EXPENSES: &str = "TOTAL EGRESOS";
    pub const RESULT: &str = "RESULTADO";
    pub const OCCUPANCY: &str = "Ocupación";
    pub const ADR: &str = "ADR";
    pub const REVPAR: &str = "RevPAR";
}

// ── Row ───────────────────────────────────────────────────────────────────────

/// One fact about one hotel, one concept, one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub hotel: String,
    pub concept: String,
    pub group: String,
    pub month: String,     // raw token: "2023-07", "Enero 2024", "jan-23"
    pub value: f64,
    pub unit: String,      // "$", "%", "Noches"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,   // empty when the source has none
}

impl Row {
    pub fn channel(&self) -> Option<&str> {
        if self.channel.is_empty() { None } else { Some(&self.channel) }
    }

    pub fn month_value(&self) -> u32 {
        crate::months::month_value(&self.month)
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Where a published row set came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Fallback { reason: String },
}

impl Provenance {
    pub fn is_live(&self) -> bool {
        matches!(self, Provenance::Live)
    }
}

/// The row set produced by one ingestion cycle. Rows are shared, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub sequence: u64,
    pub source: Provenance,
    pub fetched_at: DateTime<Utc>,
    pub rows: Arc<[Row]>,
}

impl Snapshot {
    pub fn new(sequence: u64, source: Provenance, rows: Vec<Row>) -> Self {
        Self {
            sequence,
            source,
            fetched_at: Utc::now(),
            rows: rows.into(),
        }
    }

    /// Placeholder published before the first cycle completes.
    pub fn empty() -> Self {
        Self::new(
            0,
            Provenance::Fallback { reason: "not loaded yet".into() },
            Vec::new(),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

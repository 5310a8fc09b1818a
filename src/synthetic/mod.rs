//! Placeholder dataset used when the sheet can't be loaded.
//!
//! Shape is fixed (every roster hotel × twelve months × the full concept
//! vocabulary); magnitudes are random. Totals are consistent: the revenue
//! lines sum to `TOTAL INGRESOS DEL MES`, and revenue minus `TOTAL EGRESOS`
//! is `RESULTADO`.

use crate::models::{HOTELS, Row, concepts};
use rand::Rng;

const YEAR: u32 = 2023;

/// January and July run hot.
const SEASONAL_MONTHS: [u32; 2] = [1, 7];
const SEASONAL_FACTOR: f64 = 1.5;

pub fn months() -> Vec<String> {
    (1..=12).map(|m| format!("{YEAR}-{m:02}")).collect()
}

/// Generate with the thread-local RNG.
pub fn generate_random() -> Vec<Row> {
    generate(&mut rand::rng())
}

pub fn generate<R: Rng>(rng: &mut R) -> Vec<Row> {
    let mut rows = Vec::with_capacity(HOTELS.len() * 12 * 14);

    for hotel in HOTELS {
        for (i, month) in months().into_iter().enumerate() {
            let season = if SEASONAL_MONTHS.contains(&(i as u32 + 1)) { SEASONAL_FACTOR } else { 1.0 };
            let mut push = |concept: &str, group: &str, value: f64, unit: &str, channel: &str| {
                rows.push(Row {
                    hotel: hotel.to_string(),
                    concept: concept.to_string(),
                    group: group.to_string(),
                    month: month.clone(),
                    value,
                    unit: unit.to_string(),
                    channel: channel.to_string(),
                });
            };

            // Ingresos
            let direct = rng.random_range(20_000.0..70_000.0) * season;
            let ota = rng.random_range(15_000.0..55_000.0) * season;
            let restaurant = rng.random_range(5_000.0..20_000.0) * season;
            let events = rng.random_range(0.0..10_000.0);
            let booking = ota * 0.6;
            let despegar = ota - booking;

            push("Directos", "Ingresos Alojamiento", direct, "$", "Directos");
            push("Booking", "Ingresos Alojamiento", booking, "$", "Booking");
            push("Despegar", "Ingresos Alojamiento", despegar, "$", "Despegar");
            push("Restaurante", "Ingresos Otros", restaurant, "$", "Restaurante");
            push("Eventos", "Ingresos Otros", events, "$", "Eventos");

            let revenue = direct + booking + despegar + restaurant + events;
            push(concepts::TOTAL_REVENUE, "Resumen", revenue, "$", "");

            // Egresos; "otros" only shows up inside the total
            let staff = revenue * 0.35;
            let services = revenue * 0.15;
            let taxes = revenue * 0.10;
            let other = revenue * 0.10;
            let expenses = staff + services + taxes + other;

            push("Personal hotel", "Egresos", staff, "$", "");
            push("Servicios hotel", "Egresos", services, "$", "");
            push("Impuestos", "Egresos", taxes, "$", "");
            push(concepts::TOTAL_EXPENSES, "Resumen", expenses, "$", "");

            push(concepts::RESULT, "Resumen", revenue - expenses, "$", "");

            // KPIs
            let occupancy = (rng.random_range(0.0..40.0) + 50.0 * season).min(100.0);
            push(concepts::OCCUPANCY, "KPIs", occupancy, "%", "");
            push(concepts::ADR, "KPIs", rng.random_range(100.0..150.0), "$", "");
            push(concepts::REVPAR, "KPIs", rng.random_range(80.0..130.0), "$", "");
        }
    }

    rows
}

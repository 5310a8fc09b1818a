use std::time::Instant;
use tracing::info;

/// Logs how long a labelled step took when dropped.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.start.elapsed()
        );
    }
}

/// Format an amount with thousands separators and two decimals.
/// 1234567.891 → "1,234,567.89"
pub fn fmt_amount(n: f64) -> String {
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let int_grouped: String = grouped.chars().rev().collect();

    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{int_grouped}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_amount() {
        assert_eq!(fmt_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(fmt_amount(0.0), "0.00");
        assert_eq!(fmt_amount(-42_000.5), "-42,000.50");
        assert_eq!(fmt_amount(999.0), "999.00");
        assert_eq!(fmt_amount(-0.001), "0.00");
    }
}

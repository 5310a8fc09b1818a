//! Month tokens → comparable `YYYYMM` integers.
//!
//! The sheet labels months however the person typing felt that day:
//! "2023-07", "Julio 2023", "jul-23", "Enero". Everything downstream that
//! sorts or range-filters by month goes through [`month_value`].

use chrono::Datelike;
use std::cmp::Ordering;

/// Month-name variants, checked in order as substrings of the token.
const MONTH_NAMES: &[(&str, u32)] = &[
    ("enero", 1), ("january", 1), ("jan", 1),
    ("febrero", 2), ("february", 2), ("feb", 2),
    ("marzo", 3), ("march", 3), ("mar", 3),
    ("abril", 4), ("april", 4), ("apr", 4),
    ("mayo", 5), ("may", 5),
    ("junio", 6), ("june", 6), ("jun", 6),
    ("julio", 7), ("july", 7), ("jul", 7),
    ("agosto", 8), ("august", 8), ("aug", 8),
    ("septiembre", 9), ("september", 9), ("sep", 9),
    ("octubre", 10), ("october", 10), ("oct", 10),
    ("noviembre", 11), ("november", 11), ("nov", 11),
    ("diciembre", 12), ("december", 12), ("dec", 12),
];

/// Normalise a month token to `YYYYMM`, or `0` when no month is recognised.
/// Tokens without a year get the current calendar year.
pub fn month_value(token: &str) -> u32 {
    month_value_at(token, chrono::Local::now().year())
}

/// [`month_value`] with an explicit fallback year.
pub fn month_value_at(token: &str, current_year: i32) -> u32 {
    let lower = token.trim().to_lowercase();
    if lower.is_empty() {
        return 0;
    }

    if let Some(v) = parse_iso_month(&lower) {
        return v;
    }

    let Some(&(_, month)) = MONTH_NAMES.iter().find(|(name, _)| lower.contains(name)) else {
        return 0;
    };

    let year = four_digit_year(&lower)
        .or_else(|| two_digit_year(&lower))
        .unwrap_or_else(|| current_year.max(0) as u32);

    year * 100 + month
}

/// `YYYY-MM` exactly.
fn parse_iso_month(s: &str) -> Option<u32> {
    let b = s.as_bytes();
    if b.len() != 7 || b[4] != b'-' {
        return None;
    }
    if !b[..4].iter().chain(&b[5..]).all(u8::is_ascii_digit) {
        return None;
    }
    let year: u32 = s[..4].parse().ok()?;
    let month: u32 = s[5..].parse().ok()?;
    Some(year * 100 + month)
}

/// First run of exactly four digits.
fn four_digit_year(s: &str) -> Option<u32> {
    s.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}

/// Trailing "-YY" or " YY", read as 20YY.
fn two_digit_year(s: &str) -> Option<u32> {
    let b = s.as_bytes();
    if b.len() < 3 || !b[b.len() - 2..].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let (head, tail) = s.split_at(s.len() - 2);
    let before = head.chars().next_back()?;
    if before != '-' && !before.is_whitespace() {
        return None;
    }
    tail.parse::<u32>().ok().map(|yy| 2000 + yy)
}

/// Chronological ordering of two raw tokens; unrecognised tokens sort first.
pub fn compare_months(a: &str, b: &str) -> Ordering {
    month_value(a).cmp(&month_value(b))
}

/// Inclusive range membership. A `0` (unrecognised) value is never in range.
pub fn in_range(value: u32, start: u32, end: u32) -> bool {
    value != 0 && start <= value && value <= end
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_tokens() {
        assert_eq!(month_value("2023-07"), 202307);
        assert_eq!(month_value("  2024-12 "), 202412);
        assert_eq!(month_value("2023-7"), 0);
    }

    #[test]
    fn test_named_months() {
        assert_eq!(month_value("Enero 2024"), 202401);
        assert_eq!(month_value("jan-23"), 202301);
        assert_eq!(month_value("Septiembre 23"), 202309);
        assert_eq!(month_value("DIC"), 0);
        assert_eq!(month_value("December 2022"), 202212);
        assert_eq!(month_value("Mes: Marzo, año 2021"), 202103);
    }

    #[test]
    fn test_missing_year_uses_current_year() {
        assert_eq!(month_value_at("Octubre", 2026), 202610);
        assert_eq!(month_value_at("may", 2025), 202505);
    }

    #[test]
    fn test_unknown_tokens() {
        assert_eq!(month_value("foo"), 0);
        assert_eq!(month_value(""), 0);
        assert_eq!(month_value("   "), 0);
        assert_eq!(month_value("mar 2€"), month_value_at("mar", chrono::Local::now().year()));
    }

    #[test]
    fn test_zero_never_in_range() {
        assert!(!in_range(0, 0, 0));
        assert!(!in_range(0, 0, 202312));
        assert!(in_range(202306, 202301, 202312));
        assert!(in_range(202301, 202301, 202301));
        assert!(!in_range(202401, 202301, 202312));
    }

    #[test]
    fn test_range_monotonic_in_month_order() {
        let tokens = ["2023-01", "Febrero 2023", "mar-23", "2023-04", "Diciembre 2023", "jan-24"];
        let bounds = [202212, 202301, 202302, 202303, 202306, 202312, 202401, 202402];
        for a in tokens {
            for b in tokens {
                let (va, vb) = (month_value(a), month_value(b));
                if va > vb {
                    continue;
                }
                for bound in bounds {
                    if in_range(vb, 1, bound) {
                        assert!(in_range(va, 1, bound), "{a} <= {b}, end {bound}");
                    }
                    if !in_range(vb, bound, u32::MAX) {
                        assert!(!in_range(va, bound, u32::MAX), "{a} <= {b}, start {bound}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_compare_months_sorts_chronologically() {
        let mut tokens = vec!["2023-03", "Enero 2023", "foo", "feb-23"];
        tokens.sort_by(|a, b| compare_months(a, b));
        assert_eq!(tokens, vec!["foo", "Enero 2023", "feb-23", "2023-03"]);
    }
}

use crate::models::Row;

/// Minimum positional fields for a usable row: hotel, concept, group, month, value.
pub const MIN_FIELDS: usize = 5;

const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];

// ── Numbers ───────────────────────────────────────────────────────────────────

/// How a raw cell became a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Parsed as-is once currency symbols and whitespace were removed.
    Plain,
    /// Needed the `,`/`.` separator heuristic.
    Regrouped,
    /// Only a leading numeric prefix was usable; the rest was ignored.
    Truncated,
    /// Nothing left to parse; defaulted to 0.
    Empty,
    /// No numeric content; defaulted to 0.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced {
    pub value: f64,
    pub outcome: Coercion,
}

impl Coerced {
    fn new(value: f64, outcome: Coercion) -> Self {
        Self { value, outcome }
    }
}

/// Parse a money/number cell written in either US or Latin convention.
/// "1.234,56" → 1234.56 | "1,234.56" → 1234.56 | "1,5" → 1.5 | "$ 2500" → 2500
///
/// When both separators appear, whichever comes last is the decimal point. A
/// lone `,` is a decimal point. "1.234" is a plain float (1.234), not 1234:
/// positional precedence is a heuristic, not locale knowledge.
pub fn coerce_number(raw: &str) -> Coerced {
    let clean: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    if clean.is_empty() {
        return Coerced::new(0.0, Coercion::Empty);
    }

    if let Some(v) = clean.parse::<f64>().ok().filter(|v| v.is_finite()) {
        return Coerced::new(v, Coercion::Plain);
    }

    let last_dot = clean.rfind('.');
    let last_comma = clean.rfind(',');
    let regrouped = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => clean.replace('.', "").replacen(',', ".", 1),
        (Some(_), Some(_)) => clean.replace(',', ""),
        (None, Some(_)) => clean.replacen(',', ".", 1),
        _ => clean,
    };
    let heuristic = last_comma.is_some();

    match parse_float_prefix(&regrouped) {
        Some((v, used)) if used == regrouped.len() => Coerced::new(
            v,
            if heuristic { Coercion::Regrouped } else { Coercion::Plain },
        ),
        Some((v, _)) => Coerced::new(v, Coercion::Truncated),
        None => Coerced::new(0.0, Coercion::Invalid),
    }
}

/// Longest leading `[+-]digits[.digits][e[+-]digits]`, with the bytes consumed.
fn parse_float_prefix(s: &str) -> Option<(f64, usize)> {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_end = digits_from(i);
    let mut end = int_end;
    let mut seen_digit = int_end > i;

    if b.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 || seen_digit {
            seen_digit |= frac_end > end + 1;
            end = frac_end;
        }
    }
    if !seen_digit {
        return None;
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut j = end + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            end = exp_end;
        }
    }

    let v: f64 = s[..end].parse().ok()?;
    v.is_finite().then_some((v, end))
}

// ── Fields → Row ──────────────────────────────────────────────────────────────

/// Assemble a row from positional fields: hotel, concept, group, month, value,
/// then optional unit and channel. `None` when fewer than five fields.
pub fn fields_to_row(fields: &[String]) -> Option<(Row, Coercion)> {
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let text = |i: usize| fields.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
    let coerced = coerce_number(&fields[4]);

    let row = Row {
        hotel: text(0),
        concept: text(1),
        group: text(2),
        month: text(3),
        value: coerced.value,
        unit: text(5),
        channel: text(6),
    };
    Some((row, coerced.outcome))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

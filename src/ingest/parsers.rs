//! Delimited-text tokenising for the sheet export.
//!
//! Only the conventions the export actually produces are handled: one record
//! per line, `,` or `;` separators, `"` quoting with `""` escapes.

// ── Payload shape ─────────────────────────────────────────────────────────────

/// True when the body is an HTML page (login wall, sharing error) rather than a table.
pub fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(1024).collect();
    let head = head.to_lowercase();
    head.starts_with("<!doctype html") || head.contains("<html")
}

/// Split on `\r\n`, `\n` or a lone `\r`.
pub fn split_lines(body: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = body.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&body[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&body[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    lines.push(&body[start..]);
    lines
}

// ── Separator ─────────────────────────────────────────────────────────────────

/// `;` when the header has strictly more semicolons than commas, else `,`.
pub fn detect_separator(header: &str) -> char {
    let commas = header.matches(',').count();
    let semicolons = header.matches(';').count();
    if semicolons > commas { ';' } else { ',' }
}

// ── Line → fields ─────────────────────────────────────────────────────────────

/// Split one line into trimmed, unquoted fields.
///
/// Every `"` toggles the quoted state, so a separator inside quotes never ends
/// a field. `""` escapes are resolved afterwards by [`unquote`]. The field count
/// is always the number of separators seen outside quotes plus one.
pub fn parse_line(line: &str, separator: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in line.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == separator && !in_quotes {
            fields.push(unquote(&line[start..i]));
            start = i + c.len_utf8();
        }
    }
    fields.push(unquote(&line[start..]));
    fields
}

/// Trim, then strip one wrapping pair of quotes and collapse `""` to `"`.
fn unquote(raw: &str) -> String {
    let s = raw.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].replace("\"\"", "\"")
    } else {
        s.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_separator() {
        assert_eq!(detect_separator("Hotel,Concepto,Grupo,Mes,Valor"), ',');
        assert_eq!(detect_separator("Hotel;Concepto;Grupo;Mes;Valor"), ';');
        assert_eq!(detect_separator("Hotel;Concepto,Grupo;Mes"), ';');
        assert_eq!(detect_separator("Hotel;Concepto,Grupo"), ',');
        assert_eq!(detect_separator("Hotel"), ',');
        assert_eq!(detect_separator(""), ',');
    }

    #[test]
    fn test_quoted_separator_stays_in_field() {
        let f = parse_line("Amalinas,\"Servicios, Varios\",Egresos,2023-01,100", ',');
        assert_eq!(f, vec!["Amalinas", "Servicios, Varios", "Egresos", "2023-01", "100"]);
    }

    #[test]
    fn test_doubled_quotes_unescape() {
        let f = parse_line("\"say \"\"hi\"\"\";x", ';');
        assert_eq!(f, vec!["say \"hi\"", "x"]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let f = parse_line("  Nubes ;  \" ADR \" ; 1,5 ", ';');
        assert_eq!(f, vec!["Nubes", " ADR ", "1,5"]);
    }

    #[test]
    fn test_field_count_is_separators_plus_one() {
        assert_eq!(parse_line("", ',').len(), 1);
        assert_eq!(parse_line(",,", ',').len(), 3);
        assert_eq!(parse_line("a,b,", ','), vec!["a", "b", ""]);
        assert_eq!(parse_line("\"a,b\",\"c;d\"", ',').len(), 2);
        // other separator is plain text
        assert_eq!(parse_line("a;b,c", ','), vec!["a;b", "c"]);
    }

    #[test]
    fn test_lone_quote_is_kept() {
        assert_eq!(parse_line("\"", ','), vec!["\""]);
    }

    #[test]
    fn test_split_lines_all_conventions() {
        assert_eq!(split_lines("a\r\nb\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("  <!DOCTYPE html><html><body>Sign in</body></html>"));
        assert!(looks_like_html("<HTML lang=\"es\">"));
        assert!(!looks_like_html("Hotel,Concepto,Grupo,Mes,Valor\n"));
    }
}

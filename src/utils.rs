/// Parses a statement cell into an amount.
///
/// Accepts French-style formatting (`"1 234 567,50"`, `"1.234.567,50"`, narrow
/// no-break spaces) as well as English-style `"1,234,567.25"`. When both
/// separators appear the last one is the decimal point; a repeated separator
/// is a thousands separator. A single comma is a decimal comma, so `"1,234"`
/// reads as 1.234. Returns `None` for blank or unparsable cells; callers
/// decide the default.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}' && *c != '\'')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => cleaned,
        (_, 0) if commas > 1 => cleaned.replace(',', ""),
        (1, 0) => cleaned.replace(',', "."),
        (0, _) if dots > 1 => cleaned.replace('.', ""),
        (0, _) => cleaned,
        _ => match (cleaned.rfind(','), cleaned.rfind('.')) {
            (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
            _ => cleaned.replace(',', ""),
        },
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a column header as a fiscal year: an integer of at least four digits.
/// Spreadsheet exports sometimes write years as floats (`"2023.0"`).
pub fn parse_year_header(header: &str) -> Option<i32> {
    let trimmed = header.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);

    if digits.len() < 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    digits.parse::<i32>().ok()
}

/// Cleans an account code cell: trims it and drops a spreadsheet float suffix (`"601.0"`).
pub fn clean_account_code(cell: &str) -> String {
    let trimmed = cell.trim();
    match trimmed.strip_suffix(".0") {
        Some(head) if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) => head.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Year-over-year change in percent, `0.0` when the base is not strictly positive.
pub fn growth_percent(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

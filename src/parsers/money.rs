use once_cell::sync::Lazy;
use regex::Regex;

use super::clean_text;

const AMOUNT: &str = r"\$?\s*(\d[\d,]*(?:\.\d+)?)";

static DASH_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{AMOUNT}\s*-\s*{AMOUNT}")).expect("Invalid dash range regex")
});

static TO_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)(?:\bfrom\s+)?{AMOUNT}\s+to\s+{AMOUNT}"))
        .expect("Invalid to range regex")
});

static PLUS_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{AMOUNT}\s*\+")).expect("Invalid open range regex")
});

static UP_TO_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\bup\s+to\s+{AMOUNT}")).expect("Invalid up-to regex")
});

static SLASH_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{AMOUNT}\s*/\s*{AMOUNT}")).expect("Invalid slash range regex")
});

static RANGE_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bto\b|\s-\s|\d-\s*\$?\d|\+\s*$").expect("Invalid range cue regex")
});

/// A parsed salary cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Amount(f64),
    Range(f64, f64),
    Raw(String),
}

/// Strip everything but digits and dots, then parse the longest numeric
/// prefix of what remains (`"1.2.3"` reads as `1.2`).
pub fn parse_money(text: &str) -> Option<f64> {
    let residue: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let number = match residue.char_indices().filter(|(_, c)| *c == '.').nth(1) {
        Some((second_dot, _)) => &residue[..second_dot],
        None => residue.as_str(),
    };

    if !number.contains(|c: char| c.is_ascii_digit()) {
        return None;
    }

    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a `[min, max]` pair. Forms are tried in priority order: `A - B`,
/// `from A to B`, `A+`, `up to B`, `A/B`. Open-ended forms collapse to a
/// degenerate `[x, x]` pair.
pub fn parse_range(text: &str) -> Option<(f64, f64)> {
    let text = clean_text(text);

    pair(&DASH_RANGE, &text)
        .or_else(|| pair(&TO_RANGE, &text))
        .or_else(|| single(&PLUS_RANGE, &text))
        .or_else(|| single(&UP_TO_RANGE, &text))
        .or_else(|| pair(&SLASH_RANGE, &text))
}

fn pair(pattern: &Regex, text: &str) -> Option<(f64, f64)> {
    let caps = pattern.captures(text)?;
    let min = parse_money(caps.get(1)?.as_str())?;
    let max = parse_money(caps.get(2)?.as_str())?;
    Some((min, max))
}

fn single(pattern: &Regex, text: &str) -> Option<(f64, f64)> {
    let caps = pattern.captures(text)?;
    let value = parse_money(caps.get(1)?.as_str())?;
    Some((value, value))
}

/// Textual hints that a cell holds a range rather than a single amount.
pub fn looks_like_range(text: &str) -> bool {
    text.contains(['\u{2013}', '\u{2014}']) || RANGE_CUE.is_match(text)
}

/// Row-mode cell interpretation. Range-looking cells that fail to parse are
/// kept verbatim; plain cells that fail money parsing yield nothing.
pub fn parse_cell(text: &str, range_column: bool) -> Option<CellValue> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if range_column || looks_like_range(text) {
        return Some(match parse_range(text) {
            Some((min, max)) => CellValue::Range(min, max),
            None => CellValue::Raw(text.to_string()),
        });
    }

    parse_money(text).map(CellValue::Amount)
}

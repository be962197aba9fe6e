use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, info};

use crate::models::{ClassificationCode, PageKind, PageRates, RateRecord, StepValue};
use crate::parsers::dom::{element_text, preceding_heading, TABLE_SELECTOR};
use crate::parsers::{
    extract_grid, first_classification_in, is_date_header, leveled_classification_in,
    parse_money, rcmp_rank_code, table_caption,
};
use crate::scrapers::RatesParser;

static STEP_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:step\s*)?(\d+)$").expect("Invalid step number regex")
});

static TO_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\$?\s*(\d[\d,]*(?:\.\d+)?)\s+to\s+\$?\s*(\d[\d,]*(?:\.\d+)?)$")
        .expect("Invalid to-pair regex")
});

/// Unrepresented and senior excluded employee pages: one table per
/// classification with an "Effective Date" column.
pub struct UnrepresentedParser;

impl RatesParser for UnrepresentedParser {
    fn kind(&self) -> PageKind {
        PageKind::Unrepresented
    }

    fn parse(&self, document: &Html, source_url: &str) -> PageRates {
        let mut rates = PageRates::new();

        for table in document.select(&TABLE_SELECTOR) {
            let Some(code) = table_classification(&table) else {
                debug!("Skipping unclassified table in {}", source_url);
                continue;
            };

            let records = parse_table(&table, source_url);
            if !records.is_empty() {
                rates.entry(code.to_string()).or_default().extend(records);
            }
        }

        info!("Parsed {} classifications from {}", rates.len(), source_url);
        rates
    }
}

/// Leveled code, then RCMP rank name, then bare group. A caption naming
/// "RCMP" and a rank resolves to the rank.
fn classification_in(text: &str) -> Option<ClassificationCode> {
    leveled_classification_in(text)
        .or_else(|| rcmp_rank_code(text))
        .or_else(|| first_classification_in(text))
}

fn table_classification(table: &ElementRef<'_>) -> Option<ClassificationCode> {
    table_caption(table)
        .and_then(|caption| classification_in(&caption))
        .or_else(|| preceding_heading(table).and_then(|h| classification_in(&element_text(&h))))
}

/// Step number for a header cell: `Step N`, a bare `N`, or minimum/maximum.
fn step_number(header: &str) -> Option<u32> {
    let lower = header.trim().to_lowercase();
    if let Some(caps) = STEP_NUMBER.captures(&lower) {
        return caps[1].parse().ok().filter(|n| *n >= 1);
    }
    if lower.contains("minimum") {
        Some(1)
    } else if lower.contains("maximum") {
        Some(2)
    } else {
        None
    }
}

/// `(column, step)` pairs. Without named step headers every column after the
/// date column is a step, in order.
fn step_columns(headers: &[String], date_column: Option<usize>) -> Vec<(usize, u32)> {
    let named: Vec<(usize, u32)> = headers
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != date_column)
        .filter_map(|(index, header)| step_number(header).map(|step| (index, step)))
        .collect();

    if !named.is_empty() {
        return named;
    }

    let first = date_column.map_or(1, |index| index + 1);
    (first..headers.len()).zip(1u32..).collect()
}

/// Unparseable cells are dropped here, unlike the agreement parser which
/// keeps them as text.
fn parse_table(table: &ElementRef<'_>, source_url: &str) -> Vec<RateRecord> {
    let grid = extract_grid(table);
    let date_column = grid.headers.iter().position(|h| is_date_header(h));
    let columns = step_columns(&grid.headers, date_column);
    let mut records = Vec::new();

    for row in &grid.rows {
        let date = date_column
            .and_then(|index| row.get(index))
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty());
        let mut record = RateRecord::new(date, source_url);

        for &(column, step) in &columns {
            let Some(cell) = row.get(column) else {
                continue;
            };

            if let Some(caps) = TO_PAIR.captures(cell.trim()) {
                // Two-step shape only: overwrite steps 1 and 2.
                if let (Some(min), Some(max)) = (parse_money(&caps[1]), parse_money(&caps[2])) {
                    record.steps.insert(1, StepValue::Amount(min));
                    record.steps.insert(2, StepValue::Amount(max));
                    record.raw_steps.insert(1, cell.clone());
                    record.raw_steps.insert(2, cell.clone());
                }
            } else if let Some(amount) = parse_money(cell) {
                record.steps.insert(step, StepValue::Amount(amount));
            }
        }

        if record.has_steps() {
            records.push(record);
        }
    }

    records
}

//! Table -> rate records.
//!
//! Two strategies share the column classification step:
//!
//! * legend mode, when header cells are legend symbols: each symbol column is
//!   one effective-date snapshot whose steps run down the rows;
//! * row mode otherwise: each body row is one snapshot, dated from its first
//!   cell, the caption or the text just before the table.
//!
//! Tables that interleave several classifications are first split into
//! per-code row groups by [`group_rows_by_classification`].

use once_cell::sync::Lazy;
use regex::Regex;

use super::classification::row_classification_in;
use super::grid::TableGrid;
use super::legend::Legend;
use super::money::{looks_like_range, parse_cell, parse_money, parse_range, CellValue};
use crate::models::{ClassificationCode, RateRecord, StepValue};

static STEP_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bsteps?\b|^\d+$|\brate\s*\d+\b|\bsalary\b|\bpay\b|\brange\b")
        .expect("Invalid step header regex")
});

static EFFECTIVE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:[A-Z$]\)\s*)?(?:Effective\s+)?((?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)\.?\s+\d{1,2},\s*\d{4})|\b(\d{4}-\d{2}-\d{2})\b",
    )
    .expect("Invalid effective date regex")
});

/// Rows inspected for an embedded classification code.
const ROW_CODE_CELLS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepColumn {
    pub index: usize,
    pub is_range: bool,
}

/// Where the table sits: everything besides the grid that row dating and
/// legend lookup may need.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a> {
    pub legend: &'a Legend,
    pub caption: Option<&'a str>,
    pub preceding_text: Option<&'a str>,
    pub source: &'a str,
}

/// Rows sharing one detected classification. `code` is `None` for rows that
/// fall back to the table's ambient classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    pub code: Option<ClassificationCode>,
    pub grid: TableGrid,
}

pub fn is_date_header(header: &str) -> bool {
    let lower = header.to_lowercase();
    lower.contains("date") || lower.contains("effective")
}

/// Step A: which columns hold step values. With no recognisable step header,
/// every column but the first is taken.
pub fn classify_columns(headers: &[String]) -> Vec<StepColumn> {
    let columns: Vec<StepColumn> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !is_date_header(header))
        .filter(|(_, header)| STEP_HEADER.is_match(header.trim()))
        .map(|(index, header)| StepColumn {
            index,
            is_range: header.to_lowercase().contains("range"),
        })
        .collect();

    if !columns.is_empty() {
        return columns;
    }

    (1..headers.len())
        .map(|index| StepColumn {
            index,
            is_range: false,
        })
        .collect()
}

/// A "Month Day, Year" (optionally behind a `A)` / `Effective` label) or ISO
/// date, as written.
pub fn effective_date_in(text: &str) -> Option<String> {
    let caps = EFFECTIVE_DATE.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

fn legend_date<'a>(legend: &'a Legend, label: &str) -> Option<&'a String> {
    legend.get(label.trim().trim_end_matches(')'))
}

pub fn build_rate_block(grid: &TableGrid, ctx: &BlockContext<'_>) -> Vec<RateRecord> {
    if grid.rows.is_empty() {
        return Vec::new();
    }

    if !ctx.legend.is_empty()
        && grid
            .headers
            .iter()
            .any(|header| legend_date(ctx.legend, header).is_some())
    {
        return legend_mode(grid, ctx);
    }

    row_mode(grid, ctx)
}

/// Step B. Body rows wider than the header row mean the header dropped a
/// leading label column, so values sit one column to the right.
fn legend_mode(grid: &TableGrid, ctx: &BlockContext<'_>) -> Vec<RateRecord> {
    let shift = usize::from(grid.rows.iter().any(|row| row.len() > grid.headers.len()));
    let mut records = Vec::new();

    for (index, header) in grid.headers.iter().enumerate() {
        let Some(date) = legend_date(ctx.legend, header) else {
            continue;
        };

        let mut record = RateRecord::new(Some(date.clone()), ctx.source);
        for row in &grid.rows {
            let Some(cell) = row.get(index + shift) else {
                continue;
            };
            if looks_like_range(cell) {
                if let Some((min, max)) = parse_range(cell) {
                    record.push_range(min, max, cell);
                }
            } else if let Some(amount) = parse_money(cell) {
                record.push_step(StepValue::Amount(amount));
            }
        }

        if record.has_steps() {
            records.push(record);
        }
    }

    records
}

fn date_columns(headers: &[String]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, header)| is_date_header(header))
        .map(|(index, _)| index)
        .collect()
}

/// First cell, then any explicit date column, then caption, then the text
/// before the table. Cells may also hold a bare legend symbol.
fn row_effective_date(row: &[String], date_columns: &[usize], ctx: &BlockContext<'_>) -> Option<String> {
    let cells = std::iter::once(0)
        .chain(date_columns.iter().copied().filter(|&index| index != 0))
        .filter_map(|index| row.get(index));

    for cell in cells {
        if let Some(date) = effective_date_in(cell).or_else(|| legend_date(ctx.legend, cell).cloned()) {
            return Some(date);
        }
    }

    ctx.caption
        .and_then(effective_date_in)
        .or_else(|| ctx.preceding_text.and_then(effective_date_in))
}

/// Step C. Rows without any step value are dropped; a missing date is kept
/// as `None`.
fn row_mode(grid: &TableGrid, ctx: &BlockContext<'_>) -> Vec<RateRecord> {
    let columns = classify_columns(&grid.headers);
    let dates = date_columns(&grid.headers);
    let mut records = Vec::new();

    for row in &grid.rows {
        let mut record = RateRecord::new(row_effective_date(row, &dates, ctx), ctx.source);

        for column in &columns {
            let Some(cell) = row.get(column.index) else {
                continue;
            };
            match parse_cell(cell, column.is_range) {
                Some(CellValue::Amount(amount)) => {
                    record.push_step(StepValue::Amount(amount));
                }
                Some(CellValue::Range(min, max)) => record.push_range(min, max, cell),
                Some(CellValue::Raw(text)) => {
                    record.push_step(StepValue::Text(text));
                }
                None => {}
            }
        }

        if record.has_steps() {
            records.push(record);
        }
    }

    records
}

/// Step D. Splits rows by a classification code found in one of their first
/// cells. Returns `None` when no row carries a code. The code cell itself is
/// blanked so it is not read back as a step value.
pub fn group_rows_by_classification(
    grid: &TableGrid,
    ambient_group: Option<&str>,
) -> Option<Vec<RowGroup>> {
    let mut groups: Vec<(Option<ClassificationCode>, Vec<Vec<String>>)> = Vec::new();
    let mut found = false;

    for row in &grid.rows {
        let detected = row
            .iter()
            .take(ROW_CODE_CELLS)
            .enumerate()
            .find_map(|(i, cell)| row_classification_in(cell, ambient_group).map(|code| (i, code)));

        let (code, row) = match detected {
            Some((i, code)) => {
                found = true;
                let mut row = row.clone();
                row[i].clear();
                (Some(code), row)
            }
            None => (None, row.clone()),
        };

        match groups.iter().position(|(existing, _)| *existing == code) {
            Some(pos) => groups[pos].1.push(row),
            None => groups.push((code, vec![row])),
        }
    }

    if !found {
        return None;
    }

    Some(
        groups
            .into_iter()
            .map(|(code, rows)| RowGroup {
                code,
                grid: grid.with_rows(rows),
            })
            .collect(),
    )
}

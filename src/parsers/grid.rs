use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::dom::{element_text, owned_by_table, tag_name};

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Invalid row selector"));

static CAPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("caption").expect("Invalid caption selector"));

/// Header row plus body rows of cleaned cell text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Same headers, a subset of rows.
    pub fn with_rows(&self, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: self.headers.clone(),
            rows,
        }
    }
}

fn in_section(row: &ElementRef<'_>, section: &str) -> bool {
    row.parent()
        .and_then(ElementRef::wrap)
        .map_or(false, |parent| tag_name(&parent) == section)
}

fn cells<'a>(row: &ElementRef<'a>, header_only: bool) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| match tag_name(cell) {
            "th" => true,
            "td" => !header_only,
            _ => false,
        })
        .collect()
}

fn texts(cells: &[ElementRef<'_>]) -> Vec<String> {
    cells.iter().map(element_text).collect()
}

/// Structural extraction only; works the same with or without
/// `thead`/`tbody` sectioning.
pub fn extract_grid(table: &ElementRef<'_>) -> TableGrid {
    let rows: Vec<ElementRef<'_>> = table
        .select(&ROW_SELECTOR)
        .filter(|row| owned_by_table(row, table))
        .collect();

    let Some(first) = rows.first() else {
        return TableGrid::default();
    };

    let head_row = rows.iter().find(|row| in_section(row, "thead"));

    let (headers, header_id) = if let Some(head) = head_row {
        (texts(&cells(head, false)), head.id())
    } else {
        let header_cells = cells(first, true);
        if header_cells.is_empty() {
            let count = cells(first, false).len();
            let labels: Vec<String> = (1..=count).map(|n| format!("Column {}", n)).collect();
            (labels, first.id())
        } else {
            (texts(&header_cells), first.id())
        }
    };

    let body = rows
        .iter()
        .filter(|row| row.id() != header_id)
        .filter(|row| !in_section(row, "thead") && !in_section(row, "tfoot"))
        .map(|row| texts(&cells(row, false)))
        .collect();

    TableGrid { headers, rows: body }
}

pub fn table_caption(table: &ElementRef<'_>) -> Option<String> {
    table
        .select(&CAPTION_SELECTOR)
        .find(|caption| owned_by_table(caption, table))
        .map(|caption| element_text(&caption))
        .filter(|text| !text.is_empty())
}

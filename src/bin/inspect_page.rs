use anyhow::{bail, Context, Result};
use scraper::Html;
use std::fs;

use pay_rates::models::PageKind;
use pay_rates::parsers::dom::{element_text, TABLE_SELECTOR};
use pay_rates::parsers::{
    classify_columns, collect_section_content, extract_grid, find_section_starts, parse_legend,
    table_caption,
};
use pay_rates::scrapers::parser_for;

const DEFAULT_URL: &str = "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx";

/// Usage: inspect_page <saved.html> [source-url]
///
/// The URL only selects the page family; nothing is fetched.
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: inspect_page <saved.html> [source-url]");
    };
    let url = args.next().unwrap_or_else(|| DEFAULT_URL.to_string());

    let html = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
    let document = Html::parse_document(&html);
    let kind = PageKind::from_url(&url);
    println!("Page family: {}", kind.key());

    let sections = find_section_starts(&document);
    println!("\nFound {} section headings", sections.len());
    for heading in &sections {
        let nodes = collect_section_content(heading);
        let legend = parse_legend(&nodes);
        println!("  '{}': {} nodes", element_text(heading), nodes.len());
        for (symbol, date) in &legend {
            println!("    legend {} -> {}", symbol, date);
        }
    }

    let tables: Vec<_> = document.select(&TABLE_SELECTOR).collect();
    println!("\nFound {} tables", tables.len());
    for (index, table) in tables.iter().enumerate() {
        let grid = extract_grid(table);
        let steps = classify_columns(&grid.headers);
        println!(
            "  #{} caption={:?} headers={:?} rows={} step columns={:?}",
            index + 1,
            table_caption(table),
            grid.headers,
            grid.rows.len(),
            steps.iter().map(|c| c.index).collect::<Vec<_>>()
        );
    }

    let rates = parser_for(kind).parse(&document, &url);
    println!("\nExtracted {} classifications", rates.len());
    println!("{}", serde_json::to_string_pretty(&rates)?);

    Ok(())
}

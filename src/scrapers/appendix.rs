use scraper::{ElementRef, Html};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::merge::normalize_records;
use crate::models::{ClassificationCode, PageKind, PageRates, RateRecord, GROUP_KEY, LEVEL_KEY};
use crate::parsers::dom::{element_text, preceding_heading, preceding_text, tag_name, TABLE_SELECTOR};
use crate::parsers::{
    build_rate_block, collect_section_content, extract_grid, find_section_starts,
    first_classification_in, group_rows_by_classification, parse_legend, table_caption,
    BlockContext, Legend,
};
use crate::scrapers::RatesParser;

/// Collective-agreement pages: "Appendix A" / rates-of-pay sections holding
/// one or more salary tables each.
pub struct AppendixParser;

impl RatesParser for AppendixParser {
    fn kind(&self) -> PageKind {
        PageKind::CollectiveAgreement
    }

    fn parse(&self, document: &Html, source_url: &str) -> PageRates {
        let mut rates = PageRates::new();
        let mut handled = HashSet::new();

        for heading in find_section_starts(document) {
            let section_code = first_classification_in(&element_text(&heading));
            let nodes = collect_section_content(&heading);
            let legend = parse_legend(&nodes);
            // A nested qualifying heading sees the same tables again; the
            // enclosing section (with its legend) handles them.
            let tables: Vec<ElementRef<'_>> = section_tables(&nodes)
                .into_iter()
                .filter(|table| handled.insert(table.id()))
                .collect();

            debug!(
                "Section '{}': {} tables, {} legend entries",
                element_text(&heading),
                tables.len(),
                legend.len()
            );

            for table in tables {
                parse_table(&table, section_code.as_ref(), &legend, source_url, &mut rates);
            }
        }

        for records in rates.values_mut() {
            *records = normalize_records(std::mem::take(records));
        }

        info!("Parsed {} classifications from {}", rates.len(), source_url);
        rates
    }
}

/// Tables among the section nodes and inside them, each once.
fn section_tables<'a>(nodes: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    let mut seen = HashSet::new();
    let mut tables = Vec::new();

    for node in nodes {
        let own = (tag_name(node) == "table").then_some(*node);
        for table in own.into_iter().chain(node.select(&TABLE_SELECTOR)) {
            if seen.insert(table.id()) {
                tables.push(table);
            }
        }
    }

    tables
}

/// Caption, then nearest preceding heading, then the section heading.
fn table_classification(
    table: &ElementRef<'_>,
    caption: Option<&str>,
    section_code: Option<&ClassificationCode>,
) -> Option<ClassificationCode> {
    caption
        .and_then(first_classification_in)
        .or_else(|| {
            preceding_heading(table).and_then(|heading| first_classification_in(&element_text(&heading)))
        })
        .or_else(|| section_code.cloned())
}

fn parse_table(
    table: &ElementRef<'_>,
    section_code: Option<&ClassificationCode>,
    legend: &Legend,
    source_url: &str,
    rates: &mut PageRates,
) {
    let grid = extract_grid(table);
    if grid.is_empty() {
        return;
    }

    let caption = table_caption(table);
    let preceding = preceding_text(table);
    let ctx = BlockContext {
        legend,
        caption: caption.as_deref(),
        preceding_text: preceding.as_deref(),
        source: source_url,
    };

    let ambient = table_classification(table, caption.as_deref(), section_code);
    // Lone digits only name a level when the table itself has none.
    let bare_group = ambient
        .as_ref()
        .filter(|code| code.is_bare_group())
        .map(|code| code.group());

    match group_rows_by_classification(&grid, bare_group) {
        Some(groups) => {
            for group in groups {
                let Some(code) = group.code.or_else(|| ambient.clone()) else {
                    debug!("Skipping rows without classification in {}", source_url);
                    continue;
                };
                attach(rates, &code, build_rate_block(&group.grid, &ctx));
            }
        }
        None => {
            let Some(code) = ambient else {
                debug!(
                    "Skipping table without classification (caption: {:?}) in {}",
                    caption, source_url
                );
                return;
            };
            attach(rates, &code, build_rate_block(&grid, &ctx));
        }
    }
}

fn attach(rates: &mut PageRates, code: &ClassificationCode, records: Vec<RateRecord>) {
    if records.is_empty() {
        return;
    }

    let group = Value::String(code.group().to_string());
    let level = code
        .level()
        .map_or(Value::Null, |level| Value::String(level.to_string()));

    let entry = rates.entry(code.to_string()).or_default();
    for mut record in records {
        record.metadata.insert(GROUP_KEY.to_string(), group.clone());
        record.metadata.insert(LEVEL_KEY.to_string(), level.clone());
        entry.push(record);
    }
}

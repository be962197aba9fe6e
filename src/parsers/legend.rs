use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use std::collections::BTreeMap;

use super::dom::{element_text, next_element_siblings};

/// Legend symbol -> effective date as written (e.g. `"$" -> "June 21, 2020"`).
pub type Legend = BTreeMap<String, String>;

/// Sibling nodes after the marker node that are searched for entries.
const LEGEND_WINDOW: usize = 10;

static LEGEND_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z$])\)\s*Effective\s+([A-Z][a-z]+\.?\s+\d{1,2},\s*\d{4})")
        .expect("Invalid legend entry regex")
});

pub fn parse_legend_text(text: &str) -> Legend {
    LEGEND_ENTRY
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// First "table legend" block in a section. An empty map means no legend;
/// callers fall back to row-wise dates.
pub fn parse_legend(nodes: &[ElementRef<'_>]) -> Legend {
    for node in nodes {
        if !element_text(node).to_lowercase().contains("legend") {
            continue;
        }

        let window = std::iter::once(*node)
            .chain(next_element_siblings(node).take(LEGEND_WINDOW))
            .map(|n| element_text(&n))
            .collect::<Vec<_>>()
            .join(" ");

        let legend = parse_legend_text(&window);
        if !legend.is_empty() {
            return legend;
        }
    }

    Legend::new()
}

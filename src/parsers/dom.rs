//! Minimal document-tree helpers over `scraper::ElementRef`.
//!
//! Everything the extraction code needs from the DOM goes through here: tag
//! names, heading depth, cleaned text, sibling walking and nearest-heading
//! lookup. Any HTML parser with CSS-selector support could back these.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::clean_text;

pub static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("Invalid heading selector"));

pub static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Invalid table selector"));

pub fn tag_name<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().name()
}

/// Cleaned text content. Text nodes are joined with a space so `<br>`
/// separated values stay apart.
pub fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Heading depth 1-6, or `None` for non-heading elements.
pub fn heading_level(element: &ElementRef<'_>) -> Option<u8> {
    match tag_name(element) {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

pub fn next_element_siblings<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.next_siblings().filter_map(ElementRef::wrap)
}

pub fn prev_element_sibling<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

pub fn parent_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Nearest heading before `element` in document order: previous siblings
/// (or their last nested heading), then the same walk from each ancestor.
pub fn preceding_heading<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut current = *element;
    loop {
        for sibling in current.prev_siblings().filter_map(ElementRef::wrap) {
            if heading_level(&sibling).is_some() {
                return Some(sibling);
            }
            if let Some(nested) = sibling.select(&HEADING_SELECTOR).last() {
                return Some(nested);
            }
        }
        current = parent_element(&current)?;
    }
}

/// Text immediately before `element`: its previous element sibling, or the
/// parent's previous element sibling when `element` comes first.
pub fn preceding_text(element: &ElementRef<'_>) -> Option<String> {
    let previous = prev_element_sibling(element)
        .or_else(|| parent_element(element).and_then(|p| prev_element_sibling(&p)))?;
    let text = element_text(&previous);
    (!text.is_empty()).then_some(text)
}

/// Whether `element` belongs to `table` directly rather than to a nested table.
pub fn owned_by_table(element: &ElementRef<'_>, table: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| tag_name(ancestor) == "table")
        .map_or(false, |owner| owner.id() == table.id())
}

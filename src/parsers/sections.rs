use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::dom::{element_text, heading_level, next_element_siblings, HEADING_SELECTOR};

static SECTION_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"appendix a\b|(?:annual )?rates of pay|\brates\b|salary rates")
        .expect("Invalid section heading regex")
});

pub fn is_section_heading(text: &str) -> bool {
    SECTION_HEADING.is_match(&text.to_lowercase())
}

/// Headings that open an "Appendix A" / rates-of-pay section. Several may
/// qualify on one page; each is processed on its own.
pub fn find_section_starts(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .select(&HEADING_SELECTOR)
        .filter(|heading| is_section_heading(&element_text(heading)))
        .collect()
}

/// Sibling nodes after `heading` up to (not including) the next heading of
/// the same or higher level. Deeper headings stay inside the section.
pub fn collect_section_content<'a>(heading: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let level = heading_level(heading).unwrap_or(6);
    next_element_siblings(heading)
        .take_while(|node| heading_level(node).map_or(true, |l| l > level))
        .collect()
}

pub mod classification;
pub mod dom;
pub mod grid;
pub mod legend;
pub mod money;
pub mod rate_block;
pub mod sections;

pub use classification::*;
pub use grid::*;
pub use legend::*;
pub use money::*;
pub use rate_block::*;
pub use sections::*;

use html_escape::decode_html_entities;

const DASH_VARIANTS: &[char] = &[
    '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}',
];

/// Clean and normalize text: decode leftover HTML entities, unify every dash
/// variant to an ASCII hyphen and collapse whitespace runs.
pub fn clean_text(text: &str) -> String {
    let decoded = decode_html_entities(text);
    decoded
        .replace(DASH_VARIANTS, "-")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

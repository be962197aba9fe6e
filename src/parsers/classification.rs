use once_cell::sync::Lazy;
use regex::Regex;

use super::clean_text;
use crate::models::ClassificationCode;

static AS_DEVELOPMENTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bAS\s*-\s*Development(?:al)?\b").expect("Invalid AS-DEV regex")
});

static MULTI_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z]{2,4}(?:\s?-\s?[A-Z]{2,5})+)\s?-\s?(\d{1,2})\b")
        .expect("Invalid multi-segment code regex")
});

static TWO_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z]{2,4})\s?-\s?(\d{1,2})\b").expect("Invalid two-segment code regex")
});

static BARE_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z]{2,4})\b").expect("Invalid bare group regex")
});

static SINGLE_DIGIT_LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[1-8]$").expect("Invalid single digit regex")
});

/// RCMP officer ranks as they appear in captions. Longer names first so
/// "Chief Superintendent" is not read as "Superintendent".
const RCMP_RANKS: &[(&str, &str)] = &[
    ("deputy commissioner", "CO-RCMP-05"),
    ("assistant commissioner", "CO-RCMP-04"),
    ("chief superintendent", "CO-RCMP-03"),
    ("superintendent", "CO-RCMP-02"),
    ("inspector", "CO-RCMP-01"),
];

fn is_rejected(candidate: &str) -> bool {
    candidate.chars().count() < 2 || candidate.eq_ignore_ascii_case("appendix")
}

fn pad_level(level: &str) -> String {
    if level.len() == 1 {
        format!("0{}", level)
    } else {
        level.to_string()
    }
}

fn compact(segments: &str) -> String {
    segments.chars().filter(|c| !c.is_whitespace()).collect()
}

fn leveled(pattern: &Regex, text: &str) -> Option<ClassificationCode> {
    pattern
        .captures_iter(text)
        .map(|caps| format!("{}-{}", compact(&caps[1]), pad_level(&caps[2])))
        .find(|code| !is_rejected(code))
        .map(ClassificationCode)
}

/// Classification codes carrying a level: `AS-DEV`, `ABC-DEF-12`, `ABC-12`.
/// Each pattern scans the whole text before the next one is tried.
pub fn leveled_classification_in(text: &str) -> Option<ClassificationCode> {
    let text = clean_text(text);

    if AS_DEVELOPMENTAL.is_match(&text) {
        return Some(ClassificationCode::new("AS-DEV"));
    }

    leveled(&MULTI_SEGMENT, &text).or_else(|| leveled(&TWO_SEGMENT, &text))
}

/// First plausible classification code in free text, or `None`.
pub fn first_classification_in(text: &str) -> Option<ClassificationCode> {
    if let Some(code) = leveled_classification_in(text) {
        return Some(code);
    }

    let text = clean_text(text);
    BARE_GROUP
        .captures_iter(&text)
        .map(|caps| caps[1].to_string())
        .find(|code| !is_rejected(code))
        .map(ClassificationCode)
}

/// Code for an RCMP officer rank named in the text.
pub fn rcmp_rank_code(text: &str) -> Option<ClassificationCode> {
    let lower = clean_text(text).to_lowercase();
    RCMP_RANKS
        .iter()
        .find(|(rank, _)| lower.contains(rank))
        .map(|(_, code)| ClassificationCode::new(*code))
}

/// Row-level code embedded in a cell. Bare groups are not accepted here; a
/// lone digit 1-8 becomes an implicit level only when the table's own
/// classification is the bare `AS` group.
pub fn row_classification_in(cell: &str, ambient_group: Option<&str>) -> Option<ClassificationCode> {
    if let Some(code) = leveled_classification_in(cell) {
        return Some(code);
    }

    let cell = clean_text(cell);
    if ambient_group == Some("AS") && SINGLE_DIGIT_LEVEL.is_match(&cell) {
        return Some(ClassificationCode(format!("AS-0{}", cell)));
    }

    None
}

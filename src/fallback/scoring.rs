use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::PageRates;

/// Plausible annual salary bounds used when scoring a DOM parse.
pub const MIN_PLAUSIBLE_SALARY: f64 = 10_000.0;
pub const MAX_PLAUSIBLE_SALARY: f64 = 500_000.0;

const BASE_SCORE: f64 = 0.2;
const CODE_WEIGHT: f64 = 0.4;
const SALARY_WEIGHT: f64 = 0.4;

static WELL_FORMED_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{2,4}(?:-[A-Z]{2,5})*(?:-(?:\d{2}|DEV))?(?:-EXCLUDED)?$")
        .expect("Invalid code shape regex")
});

/// Which parse to trust for a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    UseDom(PageRates),
    /// The DOM parse is kept so it can still be used if the fallback fails.
    UseFallback { reason: String, dom: PageRates },
}

pub fn is_well_formed_code(code: &str) -> bool {
    WELL_FORMED_CODE.is_match(code)
}

/// `BASE + CODE_WEIGHT * valid-code ratio + SALARY_WEIGHT * in-range ratio`,
/// or 0 for an empty parse.
pub fn score_dom_result(rates: &PageRates) -> f64 {
    if rates.is_empty() {
        return 0.0;
    }

    let valid_codes = rates.keys().filter(|code| is_well_formed_code(code)).count();
    let code_ratio = valid_codes as f64 / rates.len() as f64;

    let (in_range, total) = rates
        .values()
        .flatten()
        .flat_map(|record| record.amounts())
        .fold((0usize, 0usize), |(in_range, total), amount| {
            let plausible = (MIN_PLAUSIBLE_SALARY..=MAX_PLAUSIBLE_SALARY).contains(&amount);
            (in_range + usize::from(plausible), total + 1)
        });
    let salary_ratio = if total == 0 {
        0.0
    } else {
        in_range as f64 / total as f64
    };

    BASE_SCORE + CODE_WEIGHT * code_ratio + SALARY_WEIGHT * salary_ratio
}

pub fn select_strategy(dom: PageRates, threshold: f64) -> Strategy {
    if dom.is_empty() {
        return Strategy::UseFallback {
            reason: "no classifications extracted".to_string(),
            dom,
        };
    }

    let score = score_dom_result(&dom);
    if score >= threshold {
        Strategy::UseDom(dom)
    } else {
        Strategy::UseFallback {
            reason: format!("confidence {:.2} below {:.2}", score, threshold),
            dom,
        }
    }
}

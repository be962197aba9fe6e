use chrono::Local;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::fallback::{records_from_fallback, select_strategy, FallbackParser, FallbackUsage, Strategy};
use crate::merge::merge_page;
use crate::models::{Dataset, PageKind, PageRates};
use crate::parsers::dom::TABLE_SELECTOR;
use crate::scrapers::parser_for;
use crate::utils::http::fetch_page;

/// Outcome of one pass over the configured pages.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub dataset: Dataset,
    pub failed_urls: Vec<String>,
}

/// DOM parse plus the outer HTML of every table, for a possible fallback.
/// Kept synchronous so the document never lives across an await.
fn parse_document(html: &str, source_url: &str) -> (PageRates, Vec<String>) {
    let document = Html::parse_document(html);
    let rates = parser_for(PageKind::from_url(source_url)).parse(&document, source_url);
    let tables = document.select(&TABLE_SELECTOR).map(|table| table.html()).collect();
    (rates, tables)
}

async fn run_fallback(
    fallback: &dyn FallbackParser,
    tables: &[String],
    source_url: &str,
    usage: &mut FallbackUsage,
) -> Result<PageRates, ScrapeError> {
    let mut rates = PageRates::new();
    let mut last_error = None;

    for table in tables {
        match fallback.parse_table(table, source_url).await {
            Ok(result) => {
                usage.record_call(result.cost);
                for (code, records) in records_from_fallback(&result, source_url) {
                    rates.entry(code).or_default().extend(records);
                }
            }
            Err(e) => {
                usage.record_failure();
                warn!("Fallback parser failed on a table in {}: {:#}", source_url, e);
                last_error = Some(format!("{:#}", e));
            }
        }
    }

    match last_error {
        Some(message) if rates.is_empty() => Err(ScrapeError::Fallback(message)),
        _ => Ok(rates),
    }
}

/// Parses one fetched page. The DOM parse is scored; below `threshold` the
/// fallback (when configured) is asked to parse each table, and its result
/// replaces the DOM one only if it produced anything.
pub async fn process_page(
    html: &str,
    source_url: &str,
    fallback: Option<&dyn FallbackParser>,
    usage: &mut FallbackUsage,
    threshold: f64,
) -> Result<PageRates, ScrapeError> {
    let (dom, tables) = parse_document(html, source_url);

    let rates = match (select_strategy(dom, threshold), fallback) {
        (Strategy::UseDom(dom), _) => dom,
        (Strategy::UseFallback { dom, .. }, None) => dom,
        (Strategy::UseFallback { reason, dom }, Some(fallback)) => {
            info!("Escalating {} to fallback parser: {}", source_url, reason);
            match run_fallback(fallback, &tables, source_url, usage).await {
                Ok(rates) if !rates.is_empty() => rates,
                Ok(_) => dom,
                Err(e) if dom.is_empty() => return Err(e),
                Err(e) => {
                    warn!("Keeping DOM result for {}: {}", source_url, e);
                    dom
                }
            }
        }
    };

    if rates.is_empty() {
        return Err(ScrapeError::NoClassifications {
            url: source_url.to_string(),
        });
    }

    Ok(rates)
}

async fn scrape_one(
    client: &Client,
    config: &Config,
    url: &str,
    fallback: Option<&dyn FallbackParser>,
    usage: &mut FallbackUsage,
) -> Result<PageRates, ScrapeError> {
    let html = fetch_page(client, url, config.max_retries)
        .await
        .map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            message: format!("{:#}", e),
        })?;

    process_page(&html, url, fallback, usage, config.fallback_confidence_threshold).await
}

/// Fetches and parses every configured page in order, one at a time, merging
/// each result into the running dataset. A failing page is logged and
/// recorded; it never stops the run.
pub async fn run_scrape(
    client: &Client,
    config: &Config,
    fallback: Option<&dyn FallbackParser>,
    usage: &mut FallbackUsage,
) -> ScrapeReport {
    let mut report = ScrapeReport::default();
    let delay = Duration::from_millis(config.request_delay_ms);

    info!(
        "--- Starting scrape of {} pages at {} ---",
        config.pages.len(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    for (index, url) in config.pages.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        info!("Processing page {}/{}: {}", index + 1, config.pages.len(), url);

        match scrape_one(client, config, url, fallback, usage).await {
            Ok(rates) => {
                info!("{} classifications from {}", rates.len(), url);
                merge_page(&mut report.dataset, rates, url);
            }
            Err(e) => {
                error!("{}", e);
                report.failed_urls.push(url.clone());
            }
        }
    }

    info!(
        "Scrape finished: {} classifications, {} failed pages",
        report.dataset.len(),
        report.failed_urls.len()
    );

    report
}

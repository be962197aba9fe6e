use anyhow::{anyhow, Result};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU32, Ordering};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pay_rates::config::Config;
use pay_rates::error::ScrapeError;
use pay_rates::fallback::{FallbackEntry, FallbackParser, FallbackResult, FallbackUsage};
use pay_rates::scrapers::{process_page, run_scrape};
use pay_rates::utils::http::{create_client, fetch_with_retry};

const AGREEMENT_HTML: &str = include_str!("fixtures/agreement.html");
const UNREPRESENTED_HTML: &str = include_str!("fixtures/unrepresented.html");

/// Tables outside any rates section: the DOM parse finds nothing.
const UNSECTIONED: &str = r#"<h2>Schedule</h2>
    <table><tr><th>Level</th><th>Rate</th></tr><tr><td>EC-05</td><td>90,000</td></tr></table>
    <table><tr><th>Level</th><th>Rate</th></tr><tr><td>EC-06</td><td>99,000</td></tr></table>"#;

struct StaticFallback {
    calls: AtomicU32,
}

#[async_trait]
impl FallbackParser for StaticFallback {
    async fn parse_table(&self, _table_html: &str, _source_url: &str) -> Result<FallbackResult> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FallbackResult {
            success: true,
            data: vec![FallbackEntry {
                classification: format!("EC-0{}", 5 + n),
                steps: vec![90000.0, 92000.0],
                effective_date: Some("June 22, 2023".to_string()),
                source: String::new(),
            }],
            confidence: 0.9,
            method: "static".to_string(),
            cost: 0.01,
        })
    }
}

struct BrokenFallback;

#[async_trait]
impl FallbackParser for BrokenFallback {
    async fn parse_table(&self, _table_html: &str, _source_url: &str) -> Result<FallbackResult> {
        Err(anyhow!("upstream unavailable"))
    }
}

fn test_config(pages: Vec<String>) -> Config {
    Config {
        pages,
        user_agent: "pay-rates-test".to_string(),
        request_delay_ms: 0,
        max_retries: 1,
        request_timeout_secs: 5,
        output_path: "unused.json".to_string(),
        fallback_confidence_threshold: 0.6,
    }
}

#[test]
fn fallback_replaces_an_empty_dom_parse() {
    let fallback = StaticFallback {
        calls: AtomicU32::new(0),
    };
    let mut usage = FallbackUsage::default();

    let rates = tokio_test::block_on(process_page(
        UNSECTIONED,
        "https://example.test/agreement.html",
        Some(&fallback),
        &mut usage,
        0.6,
    ))
    .unwrap();

    assert_eq!(rates.keys().collect::<Vec<_>>(), vec!["EC-05", "EC-06"]);
    assert_eq!(rates["EC-05"][0].amounts().collect::<Vec<_>>(), vec![90000.0, 92000.0]);
    assert_eq!(usage.calls, 2);
    assert_eq!(usage.failures, 0);
    assert!((usage.total_cost - 0.02).abs() < 1e-9);
}

#[test]
fn failing_fallback_keeps_the_dom_result() {
    let mut usage = FallbackUsage::default();

    // An unreachable threshold forces escalation of a good parse.
    let rates = tokio_test::block_on(process_page(
        AGREEMENT_HTML,
        "https://example.test/agreement.html",
        Some(&BrokenFallback),
        &mut usage,
        1.1,
    ))
    .unwrap();

    assert!(rates.contains_key("AS-01"));
    assert_eq!(usage.failures, usage.calls);
    assert!(usage.calls > 0);
}

#[test]
fn failing_fallback_on_empty_page_is_reported() {
    let mut usage = FallbackUsage::default();
    let err = tokio_test::block_on(process_page(
        UNSECTIONED,
        "https://example.test/agreement.html",
        Some(&BrokenFallback),
        &mut usage,
        0.6,
    ))
    .unwrap_err();

    assert!(matches!(err, ScrapeError::Fallback(_)));
    assert_eq!(usage.failures, 2);
}

#[tokio::test]
async fn fetch_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
        .mount(&server)
        .await;

    let client = create_client(&test_config(Vec::new())).unwrap();
    let response = fetch_with_retry(&client, &format!("{}/page", server.uri()), 2)
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "<p>ok</p>");
}

#[tokio::test]
async fn fetch_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&test_config(Vec::new())).unwrap();
    let result = fetch_with_retry(&client, &format!("{}/gone", server.uri()), 1).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn run_scrape_merges_pages_in_order_and_records_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agreement.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AGREEMENT_HTML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rates-pay-unrepresented-senior-excluded-employees/excluded.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(UNREPRESENTED_HTML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Nothing here</p>"))
        .mount(&server)
        .await;

    let pages = vec![
        format!("{}/agreement.html", server.uri()),
        format!("{}/missing.html", server.uri()),
        format!("{}/rates-pay-unrepresented-senior-excluded-employees/excluded.html", server.uri()),
        format!("{}/empty.html", server.uri()),
    ];
    let config = test_config(pages.clone());
    let client = create_client(&config).unwrap();
    let mut usage = FallbackUsage::default();

    let report = run_scrape(&client, &config, None, &mut usage).await;

    assert_eq!(report.failed_urls, vec![pages[1].clone(), pages[3].clone()]);
    assert!(report.dataset.contains("AS-01"));
    assert!(report.dataset.contains("AS-01-EXCLUDED"));
    assert!(report.dataset.contains("CO-RCMP-05"));
    assert_eq!(
        report.dataset.get("AS-01").unwrap().records[0].source(),
        Some(pages[0].as_str())
    );
    assert_eq!(usage, FallbackUsage::default());
}

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use pay_rates::config::Config;
use pay_rates::fallback::FallbackUsage;
use pay_rates::merge::{finalize_dataset, merge_with_previous};
use pay_rates::scrapers::run_scrape;
use pay_rates::storage::{DatasetStore, JsonFileStore};
use pay_rates::utils::http::create_client;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pay_rates=info".parse()?),
        )
        .init();

    info!("Starting pay rates scrape at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let config = Config::load()?;
    let client = create_client(&config)?;
    let store = JsonFileStore::new(&config.output_path);

    info!("Dataset file: {}", store.path().display());
    let previous = store.load().await?;

    // No fallback parser is wired into the binary; low-confidence pages keep
    // their DOM result.
    let mut usage = FallbackUsage::default();
    let report = run_scrape(&client, &config, None, &mut usage).await;

    for url in &report.failed_urls {
        warn!("Failed page: {}", url);
    }
    if usage.calls > 0 {
        info!(
            "Fallback usage: {} calls, {} failures, cost {:.4}",
            usage.calls, usage.failures, usage.total_cost
        );
    }

    let dataset = finalize_dataset(merge_with_previous(previous, report.dataset));
    store.save(&dataset).await?;

    info!(
        "Finished at {}: {} classifications, {} records, {} failed pages",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        dataset.len(),
        dataset.record_count(),
        report.failed_urls.len()
    );

    Ok(())
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "pay-rates";
const ENV_PREFIX: &str = "PAYRATES";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub pages: Vec<String>,
    pub user_agent: String,
    pub request_delay_ms: u64,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
    pub output_path: String,
    pub fallback_confidence_threshold: f64,
}

fn default_pages() -> Vec<String> {
    [
        "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx?id=1",
        "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx?id=2",
        "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx?id=3",
        "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx?id=10",
        "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx?id=15",
        "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx?id=17",
        "https://www.canada.ca/en/treasury-board-secretariat/topics/pay/rates-pay/rates-pay-unrepresented-senior-excluded-employees/executive-group.html",
        "https://www.canada.ca/en/treasury-board-secretariat/topics/pay/rates-pay/rates-pay-unrepresented-senior-excluded-employees/royal-canadian-mounted-police.html",
    ]
    .iter()
    .map(|url| url.to_string())
    .collect()
}

impl Config {
    /// Built-in defaults, overridden by an optional `pay-rates.toml` and then
    /// by `PAYRATES_*` environment variables.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("pages", default_pages())?
            .set_default(
                "user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
            )?
            .set_default("request_delay_ms", 1500)?
            .set_default("max_retries", 3)?
            .set_default("request_timeout_secs", 25)?
            .set_default("output_path", "data/pay-rates.json")?
            .set_default("fallback_confidence_threshold", 0.6)?
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("pages"),
            )
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}

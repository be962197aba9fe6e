//! Interface to an optional alternate table parser (e.g. a model-backed one)
//! and the bookkeeping needed to decide when to call it.
//!
//! The core never depends on how a fallback produces its result; it only
//! converts [`FallbackResult`] data into the same [`RateRecord`] shape.

pub mod scoring;

pub use scoring::*;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{PageRates, RateRecord, StepValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackEntry {
    pub classification: String,
    #[serde(default)]
    pub steps: Vec<f64>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackResult {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<FallbackEntry>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub cost: f64,
}

#[async_trait]
pub trait FallbackParser: Send + Sync {
    async fn parse_table(&self, table_html: &str, source_url: &str) -> Result<FallbackResult>;
}

/// Call accounting for one run. Passed explicitly through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackUsage {
    pub calls: u32,
    pub failures: u32,
    pub total_cost: f64,
}

impl FallbackUsage {
    pub fn record_call(&mut self, cost: f64) {
        self.calls += 1;
        self.total_cost += cost;
    }

    pub fn record_failure(&mut self) {
        self.calls += 1;
        self.failures += 1;
    }
}

/// One record per classification + effective-date entry, steps numbered in
/// the order returned. Entries without a classification or steps are dropped.
pub fn records_from_fallback(result: &FallbackResult, source_url: &str) -> PageRates {
    let mut rates = PageRates::new();
    if !result.success {
        return rates;
    }

    for entry in &result.data {
        let code = entry.classification.trim();
        if code.is_empty() || entry.steps.is_empty() {
            continue;
        }

        let source = if entry.source.is_empty() {
            source_url
        } else {
            entry.source.as_str()
        };

        let mut record = RateRecord::new(entry.effective_date.clone(), source);
        for step in &entry.steps {
            record.push_step(StepValue::Amount(*step));
        }
        rates.entry(code.to_string()).or_default().push(record);
    }

    rates
}

//! Extraction of public-service pay-rate schedules from HTML pages into a
//! per-classification dataset of effective-dated step records.

pub mod config;
pub mod error;
pub mod fallback;
pub mod merge;
pub mod models;
pub mod parsers;
pub mod scrapers;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::ScrapeError;
pub use models::{ClassificationCode, Dataset, PageKind, PageRates, RateRecord, StepValue};

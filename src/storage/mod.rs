use anyhow::Result;
use async_trait::async_trait;

use crate::models::Dataset;

mod json;
pub use json::JsonFileStore;

/// Where the previous run's dataset comes from and the new one goes.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// The stored dataset, or an empty one when nothing has been saved yet.
    async fn load(&self) -> Result<Dataset>;
    async fn save(&self, dataset: &Dataset) -> Result<()>;
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::Dataset;
use crate::storage::DatasetStore;

/// Pretty-printed JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetStore for JsonFileStore {
    async fn load(&self) -> Result<Dataset> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No previous dataset at {}", self.path.display());
                return Ok(Dataset::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        let dataset: Dataset = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid dataset JSON in {}", self.path.display()))?;
        info!(
            "Loaded previous dataset: {} classifications from {}",
            dataset.len(),
            self.path.display()
        );
        Ok(dataset)
    }

    async fn save(&self, dataset: &Dataset) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(dataset).context("Failed to serialize dataset")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!(
            "Saved {} classifications ({} records) to {}",
            dataset.len(),
            dataset.record_count(),
            self.path.display()
        );
        Ok(())
    }
}

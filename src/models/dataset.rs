use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::RateRecord;

/// Per-page parse result: classification code -> records in append order.
pub type PageRates = BTreeMap<String, Vec<RateRecord>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    #[serde(rename = "annual-rates-of-pay", default)]
    pub records: Vec<RateRecord>,
}

impl ClassificationEntry {
    pub fn new(records: Vec<RateRecord>) -> Self {
        Self { records }
    }
}

/// The persisted artifact. Serialized with keys in case-insensitive order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub entries: BTreeMap<String, ClassificationEntry>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&ClassificationEntry> {
        self.entries.get(code)
    }

    pub fn entry_mut(&mut self, code: &str) -> &mut ClassificationEntry {
        self.entries.entry(code.to_string()).or_default()
    }

    pub fn record_count(&self) -> usize {
        self.entries.values().map(|e| e.records.len()).sum()
    }
}

pub fn compare_codes(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Entries ordered by case-insensitive code; the canonical persisted order.
pub fn sort_dataset(dataset: &Dataset) -> Vec<(&str, &ClassificationEntry)> {
    let mut entries: Vec<_> = dataset
        .entries
        .iter()
        .map(|(code, entry)| (code.as_str(), entry))
        .collect();
    entries.sort_by(|(a, _), (b, _)| compare_codes(a, b));
    entries
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, entry) in sort_dataset(self) {
            map.serialize_entry(code, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, ClassificationEntry>::deserialize(deserializer)?;
        Ok(Self { entries })
    }
}

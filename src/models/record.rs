use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const EFFECTIVE_DATE_KEY: &str = "effective-date";
pub const STEP_PREFIX: &str = "step-";
pub const RAW_STEP_PREFIX: &str = "_raw-step-";
pub const SOURCE_KEY: &str = "_source";
pub const GROUP_KEY: &str = "_group";
pub const LEVEL_KEY: &str = "_level";

/// A single step value. Numeric in the common case; a cell that could not be
/// parsed in row mode is preserved verbatim as `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    Amount(f64),
    Text(String),
}

impl StepValue {
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            StepValue::Amount(v) => Some(*v),
            StepValue::Text(_) => None,
        }
    }
}

impl Serialize for StepValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Whole amounts are written without a trailing `.0`
            StepValue::Amount(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                serializer.serialize_i64(*v as i64)
            }
            StepValue::Amount(v) => serializer.serialize_f64(*v),
            StepValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for StepValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_f64()
                .map(StepValue::Amount)
                .ok_or_else(|| de::Error::custom("step value out of range")),
            Value::String(s) => Ok(StepValue::Text(s)),
            other => Err(de::Error::custom(format!("unexpected step value: {}", other))),
        }
    }
}

/// One effective-date snapshot for one classification.
///
/// Serialized as a flat JSON object: `effective-date`, then `step-1..N`, then
/// `_raw-step-N` audit entries, then the remaining metadata keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateRecord {
    pub effective_date: Option<String>,
    pub steps: BTreeMap<u32, StepValue>,
    pub raw_steps: BTreeMap<u32, String>,
    pub metadata: BTreeMap<String, Value>,
}

impl RateRecord {
    pub fn new(effective_date: Option<String>, source: &str) -> Self {
        let mut record = Self {
            effective_date,
            ..Default::default()
        };
        record.set_source(source);
        record
    }

    pub fn set_source(&mut self, source: &str) {
        self.metadata
            .insert(SOURCE_KEY.to_string(), Value::String(source.to_string()));
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }

    /// Index the next appended step would receive.
    pub fn next_step(&self) -> u32 {
        self.steps.keys().next_back().map_or(1, |last| last + 1)
    }

    pub fn push_step(&mut self, value: StepValue) -> u32 {
        let index = self.next_step();
        self.steps.insert(index, value);
        index
    }

    /// Appends a split range as two sequential steps, keeping the source cell
    /// text for both.
    pub fn push_range(&mut self, min: f64, max: f64, raw: &str) {
        let first = self.push_step(StepValue::Amount(min));
        let second = self.push_step(StepValue::Amount(max));
        self.raw_steps.insert(first, raw.to_string());
        self.raw_steps.insert(second, raw.to_string());
    }

    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Empty or missing dates count as "no date".
    pub fn date_key(&self) -> Option<&str> {
        self.effective_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn amounts(&self) -> impl Iterator<Item = f64> + '_ {
        self.steps.values().filter_map(StepValue::as_amount)
    }
}

impl Serialize for RateRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + self.steps.len() + self.raw_steps.len() + self.metadata.len();
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(EFFECTIVE_DATE_KEY, &self.effective_date)?;
        for (index, value) in &self.steps {
            map.serialize_entry(&format!("{}{}", STEP_PREFIX, index), value)?;
        }
        for (index, raw) in &self.raw_steps {
            map.serialize_entry(&format!("{}{}", RAW_STEP_PREFIX, index), raw)?;
        }
        for (key, value) in &self.metadata {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RateRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        let mut record = RateRecord::default();

        for (key, value) in object {
            if key == EFFECTIVE_DATE_KEY {
                record.effective_date = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                };
            } else if let Some(index) = key.strip_prefix(RAW_STEP_PREFIX).and_then(parse_index) {
                let raw = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                record.raw_steps.insert(index, raw);
            } else if let Some(index) = key.strip_prefix(STEP_PREFIX).and_then(parse_index) {
                let step = StepValue::deserialize(value).map_err(de::Error::custom)?;
                record.steps.insert(index, step);
            } else {
                record.metadata.insert(key, value);
            }
        }

        Ok(record)
    }
}

fn parse_index(suffix: &str) -> Option<u32> {
    suffix.parse::<u32>().ok().filter(|n| *n >= 1)
}

//! Merge & normalize engine: folds per-page results into the running dataset,
//! renumbers step keys and deduplicates records.

use md5::Context;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::models::{ClassificationEntry, Dataset, PageKind, PageRates, RateRecord, EXCLUDED_SUFFIX};

/// Folds one page result into `aggregate`. Codes from the unrepresented
/// family that already exist are redirected to `<code>-EXCLUDED`; the same
/// bare code can denote a different pay system in that family.
pub fn merge_page(aggregate: &mut Dataset, page: PageRates, source_url: &str) {
    let unrepresented = PageKind::from_url(source_url) == PageKind::Unrepresented;

    for (code, records) in page {
        let target = if unrepresented && aggregate.contains(&code) {
            let excluded = format!("{}{}", code, EXCLUDED_SUFFIX);
            info!("{} already present, storing {} records under {}", code, records.len(), excluded);
            excluded
        } else {
            code
        };

        aggregate.entry_mut(&target).records.extend(records);
    }
}

/// Renumbers step keys to a contiguous `1..N` in original index order,
/// carrying `_raw-step-N` along. Other metadata is left untouched.
pub fn normalize_record(record: RateRecord) -> RateRecord {
    let RateRecord {
        effective_date,
        steps,
        mut raw_steps,
        metadata,
    } = record;

    let mut renumbered = BTreeMap::new();
    let mut renumbered_raw = BTreeMap::new();

    for (new_index, (old_index, value)) in (1u32..).zip(steps) {
        renumbered.insert(new_index, value);
        if let Some(raw) = raw_steps.remove(&old_index) {
            renumbered_raw.insert(new_index, raw);
        }
    }

    RateRecord {
        effective_date,
        steps: renumbered,
        raw_steps: renumbered_raw,
        metadata,
    }
}

fn fingerprint(record: &RateRecord) -> String {
    let canonical = serde_json::to_string(record).unwrap_or_else(|_| format!("{:?}", record));
    let mut hasher = Context::new();
    hasher.consume(canonical.as_bytes());
    format!("{:x}", hasher.compute())
}

/// Drops structurally identical records, keeping the first occurrence.
pub fn dedupe_identical(records: Vec<RateRecord>) -> Vec<RateRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(fingerprint(record)))
        .collect()
}

/// Keeps the last record per distinct effective date. Records without a
/// date are never deduplicated against each other.
pub fn dedupe_by_date(records: Vec<RateRecord>) -> Vec<RateRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: Vec<RateRecord> = records
        .into_iter()
        .rev()
        .filter(|record| match record.date_key() {
            Some(date) => seen.insert(date.to_string()),
            None => true,
        })
        .collect();
    kept.reverse();
    kept
}

/// Full per-classification pass: renumber, drop identical records, keep the
/// last record per date.
pub fn normalize_records(records: Vec<RateRecord>) -> Vec<RateRecord> {
    let renumbered = records.into_iter().map(normalize_record).collect();
    dedupe_by_date(dedupe_identical(renumbered))
}

pub fn normalize_entry(entry: ClassificationEntry) -> ClassificationEntry {
    ClassificationEntry::new(normalize_records(entry.records))
}

/// Union of a previously persisted dataset with this run's data. Shared codes
/// get this run's records appended after the previous ones; normalization
/// runs afterwards over the combined list.
pub fn merge_with_previous(previous: Dataset, current: Dataset) -> Dataset {
    let mut merged = previous;
    for (code, entry) in current.entries {
        match merged.entries.get_mut(&code) {
            Some(existing) => existing.records.extend(entry.records),
            None => {
                debug!("New classification {}", code);
                merged.entries.insert(code, entry);
            }
        }
    }
    merged
}

pub fn finalize_dataset(dataset: Dataset) -> Dataset {
    let entries = dataset
        .entries
        .into_iter()
        .map(|(code, entry)| (code, normalize_entry(entry)))
        .collect();
    Dataset { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepValue;
    use pretty_assertions::assert_eq;

    const AGREEMENT: &str = "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx?id=1";
    const UNREPRESENTED: &str = "https://www.canada.ca/en/treasury-board-secretariat/topics/pay/rates-pay/rates-pay-unrepresented-senior-excluded-employees/excluded.html";

    fn record(date: Option<&str>, steps: &[(u32, f64)]) -> RateRecord {
        let mut r = RateRecord::new(date.map(str::to_string), AGREEMENT);
        for (index, value) in steps {
            r.steps.insert(*index, StepValue::Amount(*value));
        }
        r
    }

    #[test]
    fn renumbers_non_contiguous_steps() {
        let mut r = record(Some("2024"), &[(7, 2.0), (3, 1.0)]);
        r.raw_steps.insert(7, "raw seven".to_string());

        let normalized = normalize_record(r);
        let keys: Vec<u32> = normalized.steps.keys().copied().collect();
        assert_eq!(keys, vec![1, 2]);
        assert_eq!(normalized.steps[&1], StepValue::Amount(1.0));
        assert_eq!(normalized.steps[&2], StepValue::Amount(2.0));
        assert_eq!(normalized.raw_steps.get(&2).map(String::as_str), Some("raw seven"));
        assert_eq!(normalized.source(), Some(AGREEMENT));
    }

    #[test]
    fn dedupe_by_date_keeps_last_and_all_undated() {
        let records = vec![
            record(Some("June 1, 2022"), &[(1, 1.0)]),
            record(Some("June 1, 2022"), &[(1, 2.0)]),
            record(None, &[(1, 3.0)]),
            record(Some("June 1, 2023"), &[(1, 4.0)]),
            record(Some(""), &[(1, 5.0)]),
            record(None, &[(1, 6.0)]),
        ];
        let kept = dedupe_by_date(records);
        let values: Vec<f64> = kept.iter().map(|r| r.amounts().next().unwrap()).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn dedupe_identical_keeps_first() {
        let a = record(Some("x"), &[(1, 1.0)]);
        let b = record(None, &[(1, 1.0)]);
        let kept = dedupe_identical(vec![b.clone(), a.clone(), b.clone()]);
        assert_eq!(kept, vec![b, a]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let records = vec![
            record(Some("A"), &[(2, 1.0), (5, 2.0)]),
            record(None, &[(1, 9.0)]),
            record(None, &[(1, 9.0)]),
            record(Some("A"), &[(4, 3.0)]),
            record(Some("B"), &[(1, 4.0)]),
        ];
        let once = normalize_records(records);
        let twice = normalize_records(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn unrepresented_collisions_get_suffixed_key() {
        let mut aggregate = Dataset::new();
        merge_page(
            &mut aggregate,
            PageRates::from([("AS-07".to_string(), vec![record(Some("2023"), &[(1, 1.0)])])]),
            AGREEMENT,
        );
        let original = aggregate.get("AS-07").cloned();

        merge_page(
            &mut aggregate,
            PageRates::from([
                ("AS-07".to_string(), vec![record(Some("2024"), &[(1, 2.0)])]),
                ("EX-01".to_string(), vec![record(Some("2024"), &[(1, 3.0)])]),
            ]),
            UNREPRESENTED,
        );

        assert_eq!(aggregate.get("AS-07").cloned(), original);
        let excluded = aggregate.get("AS-07-EXCLUDED").unwrap();
        assert_eq!(excluded.records.len(), 1);
        assert_eq!(excluded.records[0].effective_date.as_deref(), Some("2024"));
        assert!(aggregate.contains("EX-01"));
        assert!(!aggregate.contains("EX-01-EXCLUDED"));
    }

    #[test]
    fn agreement_pages_append_to_existing_codes() {
        let mut aggregate = Dataset::new();
        merge_page(
            &mut aggregate,
            PageRates::from([("EC-01".to_string(), vec![record(Some("2023"), &[(1, 1.0)])])]),
            AGREEMENT,
        );
        merge_page(
            &mut aggregate,
            PageRates::from([("EC-01".to_string(), vec![record(Some("2024"), &[(1, 2.0)])])]),
            AGREEMENT,
        );
        assert_eq!(aggregate.get("EC-01").unwrap().records.len(), 2);
        assert_eq!(aggregate.len(), 1);
    }

    #[test]
    fn previous_dataset_is_unioned_then_normalized() {
        let mut previous = Dataset::new();
        previous.entry_mut("AS-01").records.push(record(Some("2023"), &[(1, 1.0)]));
        previous.entry_mut("OLD-01").records.push(record(Some("2020"), &[(1, 5.0)]));

        let mut current = Dataset::new();
        current.entry_mut("AS-01").records.push(record(Some("2023"), &[(2, 1.5)]));
        current.entry_mut("AS-01").records.push(record(Some("2024"), &[(1, 2.0)]));
        current.entry_mut("NEW-01").records.push(record(None, &[(1, 7.0)]));

        let merged = finalize_dataset(merge_with_previous(previous, current));
        let as01 = &merged.get("AS-01").unwrap().records;
        assert_eq!(as01.len(), 2);
        assert_eq!(as01[0].steps[&1], StepValue::Amount(1.5));
        assert_eq!(as01[1].effective_date.as_deref(), Some("2024"));
        assert!(merged.contains("OLD-01"));
        assert!(merged.contains("NEW-01"));
    }
}

use std::collections::HashMap;

use serde::Serialize;

use crate::models::stop::StopRecord;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct KeyMetrics {
    pub total_stops: usize,
    pub total_arrests: usize,
    pub total_warnings: usize,
    pub drug_related_stops: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

fn outcome_contains(record: &StopRecord, needle: &str) -> bool {
    record
        .stop_outcome
        .as_deref()
        .is_some_and(|o| o.to_lowercase().contains(needle))
}

impl KeyMetrics {
    /// Outcome counts use a case-insensitive substring match, so "ARRESTED" is an arrest.
    pub fn compute(records: &[StopRecord]) -> Self {
        Self {
            total_stops: records.len(),
            total_arrests: records.iter().filter(|r| outcome_contains(r, "arrest")).count(),
            total_warnings: records.iter().filter(|r| outcome_contains(r, "warning")).count(),
            drug_related_stops: records.iter().filter(|r| r.was_drug_related()).count(),
        }
    }
}

/// 分组计数，按数量降序；数量相同时保持首次出现的顺序。空值不计入。
pub fn value_counts<'a, I>(values: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();
    for v in values.into_iter().flatten() {
        match index.get(v) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(v, counts.len());
                counts.push(CategoryCount { category: v.to_string(), count: 1 });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

pub fn violation_distribution(records: &[StopRecord]) -> Vec<CategoryCount> {
    value_counts(records.iter().map(|r| r.violation.as_deref()))
}

pub fn gender_distribution(records: &[StopRecord]) -> Vec<CategoryCount> {
    value_counts(records.iter().map(|r| r.driver_gender.as_deref()))
}

/// Stop-duration choices for the new-log form, in first-seen order.
pub fn stop_duration_options(records: &[StopRecord]) -> Vec<String> {
    const FALLBACK: [&str; 3] = ["0-15 Min", "16-30 Min", "30+ Min"];

    if records.is_empty() {
        return FALLBACK.iter().map(|s| s.to_string()).collect();
    }
    let mut seen: Vec<String> = Vec::new();
    for d in records.iter().filter_map(|r| r.stop_duration.as_deref()) {
        if !seen.iter().any(|s| s == d) {
            seen.push(d.to_string());
        }
    }
    seen
}

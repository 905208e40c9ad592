//! Frequency aggregation of subject records into percentage distributions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::color::{ColorStrategy, Rgb};
use crate::error::{ReportError, Result};
use crate::record::{CategorySelector, SubjectRecord};

/// One labelled share of a distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub label: String,
    pub percentage: f64,
    pub color: Rgb,
}

impl DistributionEntry {
    pub fn new(label: impl Into<String>, percentage: f64, color: Rgb) -> Self {
        Self {
            label: label.into(),
            percentage,
            color,
        }
    }
}

/// Ordered label/percentage/colour triples for one category.
///
/// Entries keep the order in which their grouping key was first seen in the
/// input records. Labels are unique.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution {
    entries: Vec<DistributionEntry>,
}

impl Distribution {
    /// Builds a distribution from prepared entries, rejecting duplicate labels.
    pub fn from_entries(entries: Vec<DistributionEntry>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.label.as_str()) {
                return Err(ReportError::InvalidArgument(format!(
                    "duplicate label '{}' in distribution",
                    entry.label
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[DistributionEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DistributionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the labels in entry order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.label.clone()).collect()
    }

    /// Returns a copy with every label replaced, keeping percentages and colours.
    ///
    /// Fails when `labels` does not line up one-to-one with the entries.
    pub fn relabeled(&self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.entries.len() {
            return Err(ReportError::InvalidArgument(format!(
                "expected {} labels, got {}",
                self.entries.len(),
                labels.len()
            )));
        }
        let entries = self
            .entries
            .iter()
            .zip(labels)
            .map(|(entry, label)| DistributionEntry::new(label, entry.percentage, entry.color))
            .collect();
        Self::from_entries(entries)
    }
}

impl<'a> IntoIterator for &'a Distribution {
    type Item = &'a DistributionEntry;
    type IntoIter = std::slice::Iter<'a, DistributionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Rounds to one decimal place.
pub fn round_percentage(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Groups `records` by the `selector` field and returns each group's share.
///
/// Dates group by calendar year. Output follows first-seen key order. No
/// records yields an empty distribution.
pub fn aggregate(
    records: &[SubjectRecord],
    selector: CategorySelector,
    colors: &dyn ColorStrategy,
) -> Distribution {
    let total = records.len();
    if total == 0 {
        return Distribution::default();
    }

    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let key = record.field(selector).grouping_key();
        match index.get(&key) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, 1));
            }
        }
    }

    let entries = order
        .into_iter()
        .enumerate()
        .map(|(position, (label, count))| {
            let percentage = round_percentage(count as f64 / total as f64 * 100.0);
            let color = colors.color_for(&label, position);
            DistributionEntry::new(label, percentage, color)
        })
        .collect();

    Distribution { entries }
}

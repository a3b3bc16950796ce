//! Categorical histograms: pixel counts per class code

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from integer class code to a human-readable label.
///
/// The label set is fixed before dispatch, so every zone reports the same
/// labels in the same order (ascending code).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMap(BTreeMap<i64, String>);

impl CategoryMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: i64, label: impl Into<String>) {
        self.0.insert(code, label.into());
    }

    #[must_use]
    pub fn label(&self, code: i64) -> Option<&str> {
        self.0.get(&code).map(String::as_str)
    }

    /// Distinct labels in ascending code order. Codes sharing a label
    /// collapse into the first one.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::with_capacity(self.0.len());
        for label in self.0.values() {
            if !labels.contains(&label.as_str()) {
                labels.push(label);
            }
        }
        labels
    }

    /// First label spelled as the decimal form of a code it does not belong
    /// to, e.g. `{1: "9"}`. Such a label shares its column name with code 9
    /// whenever that code shows up unmapped.
    #[must_use]
    pub fn numeric_alias(&self) -> Option<&str> {
        self.0
            .values()
            .find(|label| {
                label
                    .parse::<i64>()
                    .is_ok_and(|code| code.to_string() == **label && self.label(code) != Some(label.as_str()))
            })
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<L: Into<String>> FromIterator<(i64, L)> for CategoryMap {
    fn from_iter<T: IntoIterator<Item = (i64, L)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(code, label)| (code, label.into())).collect())
    }
}

/// Pixel counts of one zone, split into mapped labels and unmapped codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    mapped: Vec<(String, u64)>,
    unmapped: BTreeMap<i64, u64>,
}

impl CategoryCounts {
    /// Every mapped label with a zero count.
    #[must_use]
    pub fn zeroed(map: &CategoryMap) -> Self {
        Self {
            mapped: map.labels().into_iter().map(|l| (l.to_string(), 0)).collect(),
            unmapped: BTreeMap::new(),
        }
    }

    /// Count valid pixel values by class code.
    ///
    /// Values are cast to integer codes by truncation toward zero, as an
    /// integer-typed band would store them.
    #[must_use]
    pub fn tally(values: &[f64], map: &CategoryMap) -> Self {
        let mut counts = Self::zeroed(map);
        for &value in values {
            let code = value as i64;
            match map.label(code) {
                Some(label) => {
                    if let Some(slot) = counts.mapped.iter_mut().find(|(l, _)| l == label) {
                        slot.1 += 1;
                    }
                }
                None => *counts.unmapped.entry(code).or_insert(0) += 1,
            }
        }
        counts
    }

    /// Count for a label; unmapped codes are addressed by their decimal form.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<u64> {
        self.mapped
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, n)| *n)
            .or_else(|| label.parse::<i64>().ok().and_then(|code| self.unmapped.get(&code).copied()))
    }

    /// Count for a code outside the category map, 0 when absent.
    #[must_use]
    pub fn unmapped_count(&self, code: i64) -> u64 {
        self.unmapped.get(&code).copied().unwrap_or(0)
    }

    pub fn mapped(&self) -> impl Iterator<Item = (&str, u64)> {
        self.mapped.iter().map(|(l, n)| (l.as_str(), *n))
    }

    pub fn unmapped_codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.unmapped.keys().copied()
    }

    /// Sum over all labels and unmapped codes.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.mapped.iter().map(|(_, n)| n).sum::<u64>() + self.unmapped.values().sum::<u64>()
    }
}

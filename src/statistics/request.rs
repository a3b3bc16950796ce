//! What to compute for every zone of a run

use super::categorical::CategoryMap;
use super::operations::Statistic;
use crate::errors::InputError;
use crate::rasterize::{CoverageRule, DEFAULT_COVERAGE_RULE};
use crate::zones::GEOMETRY_COLUMN;
use std::collections::HashSet;

/// Statistics, mode and coverage policy shared by every zone of a run.
///
/// Built once before dispatch and passed by reference to every worker.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticRequest {
    stats: Vec<Statistic>,
    categorical: bool,
    category_map: CategoryMap,
    coverage: CoverageRule,
    prefix: Option<String>,
}

impl StatisticRequest {
    /// Continuous request. An empty list selects [`Statistic::DEFAULT`].
    ///
    /// # Errors
    ///
    /// Fails on an unknown statistic name.
    pub fn continuous<S: AsRef<str>>(names: &[S]) -> Result<Self, InputError> {
        let mut stats = Statistic::parse_list(names)?;
        if stats.is_empty() {
            stats = Statistic::DEFAULT.to_vec();
        }
        Ok(Self {
            stats,
            categorical: false,
            category_map: CategoryMap::new(),
            coverage: DEFAULT_COVERAGE_RULE,
            prefix: None,
        })
    }

    /// Categorical request producing one count per label of `map`.
    #[must_use]
    pub fn categorical(map: CategoryMap) -> Self {
        Self {
            stats: Vec::new(),
            categorical: true,
            category_map: map,
            coverage: DEFAULT_COVERAGE_RULE,
            prefix: None,
        }
    }

    /// Add continuous statistics alongside the category counts.
    ///
    /// # Errors
    ///
    /// Fails on an unknown statistic name.
    pub fn with_stats<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, InputError> {
        self.stats = Statistic::parse_list(names)?;
        if self.stats.is_empty() && !self.categorical {
            self.stats = Statistic::DEFAULT.to_vec();
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_coverage(mut self, rule: CoverageRule) -> Self {
        self.coverage = rule;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn stats(&self) -> &[Statistic] {
        &self.stats
    }

    #[must_use]
    pub const fn is_categorical(&self) -> bool {
        self.categorical
    }

    #[must_use]
    pub const fn category_map(&self) -> &CategoryMap {
        &self.category_map
    }

    #[must_use]
    pub const fn coverage(&self) -> CoverageRule {
        self.coverage
    }

    /// Output column name for a statistic or label, with the prefix applied.
    #[must_use]
    pub fn column_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }

    /// Check that every column this request adds has its own name and none
    /// of them replaces the geometry column.
    ///
    /// Unmapped codes are written under their decimal form, so a numeric
    /// label naming a different code is rejected too.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::ColumnCollision`] with the first clashing column.
    pub fn validate_columns(&self) -> Result<(), InputError> {
        let labels = if self.categorical {
            self.category_map.labels()
        } else {
            Vec::new()
        };
        let mut seen = HashSet::from([GEOMETRY_COLUMN.to_string()]);
        let names = self
            .stats
            .iter()
            .map(|stat| stat.name().into_owned())
            .chain(labels.iter().map(|label| (*label).to_string()));
        for name in names {
            let column = self.column_name(&name);
            if !seen.insert(column.clone()) {
                return Err(InputError::ColumnCollision(column));
            }
        }
        if self.categorical {
            if let Some(label) = self.category_map.numeric_alias() {
                return Err(InputError::ColumnCollision(self.column_name(label)));
            }
        }
        Ok(())
    }
}

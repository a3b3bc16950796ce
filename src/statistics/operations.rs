//! Statistic names and parsing
//!
//! This module defines the vocabulary of per-zone statistics and how they are
//! spelled in requests and output column names.

use crate::errors::InputError;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Supported per-zone statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    /// Number of valid covered pixels
    Count,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Arithmetic mean
    Mean,
    /// Sum of values
    Sum,
    /// Population standard deviation
    Std,
    /// Middle order statistic, averaging the two central values on even counts
    Median,
    /// Most frequent value
    Majority,
    /// Least frequent value
    Minority,
    /// Number of distinct values
    Unique,
    /// `max - min`
    Range,
    /// Number of covered pixels equal to the nodata sentinel
    Nodata,
    /// Number of covered NaN pixels
    Nan,
    /// Linearly interpolated percentile, `0..=100`
    Percentile(f64),
}

impl Statistic {
    /// Statistics computed when a continuous request names none.
    pub const DEFAULT: [Statistic; 4] = [Self::Count, Self::Min, Self::Max, Self::Mean];

    /// Column name for this statistic, e.g. `mean` or `percentile_95`.
    #[must_use]
    pub fn name(&self) -> Cow<'static, str> {
        let name = match self {
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Std => "std",
            Self::Median => "median",
            Self::Majority => "majority",
            Self::Minority => "minority",
            Self::Unique => "unique",
            Self::Range => "range",
            Self::Nodata => "nodata",
            Self::Nan => "nan",
            Self::Percentile(q) if q.fract() == 0.0 => return Cow::Owned(format!("percentile_{}", *q as i64)),
            Self::Percentile(q) => return Cow::Owned(format!("percentile_{q}")),
        };
        Cow::Borrowed(name)
    }

    /// Counting statistics stay defined (as 0) on zones with no valid pixels.
    #[must_use]
    pub const fn is_counting(&self) -> bool {
        matches!(self, Self::Count | Self::Unique | Self::Nodata | Self::Nan)
    }

    /// Parse a list of names, rejecting the first unknown one.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownStatistic`] or [`InputError::InvalidPercentile`].
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, InputError> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl FromStr for Statistic {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let stat = match name.as_str() {
            "count" => Self::Count,
            "min" => Self::Min,
            "max" => Self::Max,
            "mean" => Self::Mean,
            "sum" => Self::Sum,
            "std" => Self::Std,
            "median" => Self::Median,
            "majority" => Self::Majority,
            "minority" => Self::Minority,
            "unique" => Self::Unique,
            "range" => Self::Range,
            "nodata" => Self::Nodata,
            "nan" => Self::Nan,
            other => {
                let q = other
                    .strip_prefix("percentile_")
                    .and_then(|q| q.parse::<f64>().ok())
                    .ok_or_else(|| InputError::UnknownStatistic(s.to_string()))?;
                if !(0.0..=100.0).contains(&q) {
                    return Err(InputError::InvalidPercentile(q));
                }
                Self::Percentile(q)
            }
        };
        Ok(stat)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in ["count", "min", "max", "mean", "sum", "std", "median", "range", "percentile_90"] {
            let stat: Statistic = name.parse().unwrap();
            assert_eq!(stat.name(), name);
        }
        assert_eq!("percentile_99.5".parse::<Statistic>().unwrap(), Statistic::Percentile(99.5));
        assert_eq!("MEAN".parse::<Statistic>().unwrap(), Statistic::Mean);
    }

    #[test]
    fn rejects_unknown_and_out_of_range() {
        assert!(matches!("mode".parse::<Statistic>(), Err(InputError::UnknownStatistic(_))));
        assert!(matches!("percentile_".parse::<Statistic>(), Err(InputError::UnknownStatistic(_))));
        assert!(matches!(
            "percentile_101".parse::<Statistic>(),
            Err(InputError::InvalidPercentile(_))
        ));
    }
}

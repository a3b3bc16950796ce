//! Run configuration
//!
//! Everything a caller supplies for one end-to-end run. Loadable from JSON:
//!
//! ```json
//! {
//!   "raster_path": "lgrip30_agriculture.tif",
//!   "vector_path": "basins.shp",
//!   "output_path": "basins_lgrip30_counts.shp",
//!   "workers": 6,
//!   "stats": ["mean", "max", "min", "std"],
//!   "categorical": true,
//!   "category_map": { "0": "water", "1": "non-crop", "2": "irrigated", "3": "rainfed" }
//! }
//! ```

use crate::errors::{InputError, Result};
use crate::parallel::ParallelConfig;
use crate::rasterize::CoverageRule;
use crate::statistics::{CategoryMap, StatisticRequest};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZonalConfig {
    pub raster_path: PathBuf,
    pub vector_path: PathBuf,
    pub output_path: PathBuf,
    /// Defaults to one worker per CPU core.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub stats: Vec<String>,
    #[serde(default)]
    pub categorical: bool,
    #[serde(default)]
    pub category_map: CategoryMap,
    #[serde(default)]
    pub all_touched: bool,
    #[serde(default)]
    pub prefix: Option<String>,
}

impl ZonalConfig {
    /// # Errors
    ///
    /// Fails on malformed JSON or unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Fails if the file cannot be read or does not parse.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| InputError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// The statistic request described by this configuration.
    ///
    /// # Errors
    ///
    /// Fails on an unknown statistic name or on output columns that would
    /// share a name.
    pub fn request(&self) -> Result<StatisticRequest> {
        let request = if self.categorical {
            StatisticRequest::categorical(self.category_map.clone()).with_stats(self.stats.as_slice())?
        } else {
            StatisticRequest::continuous(self.stats.as_slice())?
        };
        let request = request.with_coverage(CoverageRule::from_all_touched(self.all_touched));
        let request = match &self.prefix {
            Some(prefix) => request.with_prefix(prefix.clone()),
            None => request,
        };
        request.validate_columns()?;
        Ok(request)
    }

    #[must_use]
    pub fn parallel(&self) -> ParallelConfig {
        ParallelConfig {
            num_workers: self.workers,
            chunk_size: self.chunk_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ZonalError;
    use crate::statistics::Statistic;

    #[test]
    fn minimal_config_takes_defaults() {
        let config = ZonalConfig::from_json_str(
            r#"{"raster_path": "a.tif", "vector_path": "b.shp", "output_path": "c.shp"}"#,
        )
        .unwrap();
        assert_eq!(config.workers, None);
        let request = config.request().unwrap();
        assert_eq!(request.stats(), &Statistic::DEFAULT);
        assert_eq!(request.coverage(), CoverageRule::CenterIn);
    }

    #[test]
    fn categorical_config() {
        let config = ZonalConfig::from_json_str(
            r#"{
                "raster_path": "a.tif", "vector_path": "b.shp", "output_path": "c.shp",
                "workers": 4, "categorical": true, "all_touched": true, "prefix": "lc_",
                "category_map": {"1": "forest", "17": "water"}
            }"#,
        )
        .unwrap();
        let request = config.request().unwrap();
        assert!(request.is_categorical());
        assert!(request.stats().is_empty());
        assert_eq!(request.category_map().label(17), Some("water"));
        assert_eq!(request.coverage(), CoverageRule::AllTouched);
        assert_eq!(request.column_name("forest"), "lc_forest");
        assert_eq!(config.parallel().workers().unwrap(), 4);
    }

    #[test]
    fn unknown_statistic_is_input_error() {
        let config = ZonalConfig::from_json_str(
            r#"{"raster_path": "a", "vector_path": "b", "output_path": "c", "stats": ["mode"]}"#,
        )
        .unwrap();
        assert!(matches!(
            config.request(),
            Err(ZonalError::Input(InputError::UnknownStatistic(_)))
        ));
    }

    #[test]
    fn label_named_like_a_statistic_is_rejected() {
        let config = ZonalConfig::from_json_str(
            r#"{"raster_path": "a", "vector_path": "b", "output_path": "c",
                "categorical": true, "stats": ["max"], "category_map": {"4": "max"}}"#,
        )
        .unwrap();
        assert!(matches!(
            config.request(),
            Err(ZonalError::Input(InputError::ColumnCollision(_)))
        ));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = ZonalConfig::from_json_str(
            r#"{"raster_path": "a", "vector_path": "b", "output_path": "c", "threads": 2}"#,
        );
        assert!(matches!(err, Err(ZonalError::Input(InputError::Config(_)))));
    }
}

//! Continuous reductions over the valid pixels of one zone

use super::operations::Statistic;

/// Pixel values of one zone after nodata and NaN masking.
///
/// Values are kept sorted so order statistics need no extra pass. Sums are
/// accumulated in that sorted order, which makes every reduction a pure
/// function of the multiset of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelSample {
    sorted: Vec<f64>,
    nodata: usize,
    nan: usize,
}

impl PixelSample {
    /// Split covered pixel values into valid values, nodata hits and NaNs.
    pub fn collect<I>(values: I, nodata: Option<f64>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sample = Self::default();
        for value in values {
            if value.is_nan() {
                sample.nan += 1;
            } else if nodata.is_some_and(|nd| value == nd) {
                sample.nodata += 1;
            } else {
                sample.sorted.push(value);
            }
        }
        sample.sorted.sort_by(f64::total_cmp);
        sample
    }

    /// Valid values in ascending order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.sorted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    #[must_use]
    pub const fn nodata_count(&self) -> usize {
        self.nodata
    }

    #[must_use]
    pub const fn nan_count(&self) -> usize {
        self.nan
    }

    /// Compute one statistic. Value statistics are `None` on an empty sample.
    #[must_use]
    pub fn compute(&self, stat: Statistic) -> Option<f64> {
        match stat {
            Statistic::Count => Some(self.len() as f64),
            Statistic::Nodata => Some(self.nodata as f64),
            Statistic::Nan => Some(self.nan as f64),
            Statistic::Unique => Some(self.runs().count() as f64),
            Statistic::Min => self.sorted.first().copied(),
            Statistic::Max => self.sorted.last().copied(),
            Statistic::Range => Some(self.sorted.last()? - self.sorted.first()?),
            Statistic::Sum => (!self.is_empty()).then(|| self.sum()),
            Statistic::Mean => self.mean(),
            Statistic::Std => self.std(),
            Statistic::Median => self.percentile(50.0),
            Statistic::Percentile(q) => self.percentile(q),
            Statistic::Majority => self.mode_by(|best, run| run > best),
            Statistic::Minority => self.mode_by(|best, run| run < best),
        }
    }

    fn sum(&self) -> f64 {
        self.sorted.iter().sum()
    }

    fn mean(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.sum() / self.len() as f64)
    }

    fn std(&self) -> Option<f64> {
        let mean = self.mean()?;
        let var = self.sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.len() as f64;
        Some(var.sqrt())
    }

    /// Linear interpolation between the closest ranks. `q` is clamped to 0..=100.
    fn percentile(&self, q: f64) -> Option<f64> {
        let last = self.len().checked_sub(1)?;
        let rank = q.clamp(0.0, 100.0) / 100.0 * last as f64;
        let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
        let (a, b) = (self.sorted[lo], self.sorted[hi.min(last)]);
        Some(a + (b - a) * (rank - lo as f64))
    }

    /// `(value, occurrences)` for each distinct value, ascending.
    fn runs(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.sorted
            .chunk_by(|a, b| a == b)
            .map(|run| (run[0], run.len()))
    }

    /// Pick the value whose run length wins under `better`; ties keep the
    /// smaller value.
    fn mode_by(&self, better: impl Fn(usize, usize) -> bool) -> Option<f64> {
        let mut best: Option<(f64, usize)> = None;
        for (value, len) in self.runs() {
            match best {
                Some((_, best_len)) if !better(best_len, len) => {}
                _ => best = Some((value, len)),
            }
        }
        best.map(|(value, _)| value)
    }
}

//! Median imputation of the encoded features.
use crate::data::NumericFrame;
use crate::errors::PipelineError;
use log::warn;

/// Median of the non-missing values, averaging the two middle values for even
/// counts. `None` when every value is missing.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

/// Column medians learned from a fitting frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MedianImputer {
    pub names: Vec<String>,
    pub medians: Vec<f64>,
}

impl MedianImputer {
    /// Learn the median of every column of `frame`.
    ///
    /// A column with no observed value is filled with zero.
    pub fn fit(frame: &NumericFrame) -> Result<Self, PipelineError> {
        if frame.rows == 0 {
            return Err(PipelineError::EmptyData("cannot fit an imputer without rows".to_string()));
        }
        let medians = (0..frame.cols())
            .map(|c| {
                median(frame.column(c)).unwrap_or_else(|| {
                    warn!("Column {} has no observed values, filling it with 0.", frame.names[c]);
                    0.0
                })
            })
            .collect();
        Ok(MedianImputer {
            names: frame.names.clone(),
            medians,
        })
    }

    /// Fill missing values of `frame` in place. Column names and order must
    /// match the fitting frame.
    pub fn transform_inplace(&self, frame: &mut NumericFrame) -> Result<(), PipelineError> {
        frame.check_names(&self.names)?;
        for (c, m) in self.medians.iter().enumerate() {
            frame
                .column_mut(c)
                .iter_mut()
                .filter(|v| v.is_nan())
                .for_each(|v| *v = *m);
        }
        Ok(())
    }

    pub fn transform(&self, frame: &NumericFrame) -> Result<NumericFrame, PipelineError> {
        let mut out = frame.clone();
        self.transform_inplace(&mut out)?;
        Ok(out)
    }
}

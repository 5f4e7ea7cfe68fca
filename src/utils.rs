use crate::errors::PipelineError;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    items.join(", ")
}

// Validation
pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), PipelineError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(PipelineError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// The `q` quantile of `values`: the first value, in sorted order, at which the
/// cumulative share of the values reaches `q`. Sorts `values` in place.
/// Returns `NaN` for an empty slice.
pub fn quantile_inplace(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let target = q * values.len() as f64;
    let mut cumulative = 0.0;
    for v in values.iter() {
        cumulative += 1.0;
        if cumulative >= target {
            return *v;
        }
    }
    values[values.len() - 1]
}

/// Values at each of `pcts` (sorted, in `[0, 1]`) of an already sorted slice.
pub fn percentiles_sorted(sorted: &[f64], pcts: &[f64]) -> Vec<f64> {
    if sorted.is_empty() {
        return Vec::new();
    }
    let last = sorted.len() - 1;
    pcts.iter()
        .map(|p| {
            let i = (p * last as f64).round() as usize;
            sorted[i.min(last)]
        })
        .collect()
}

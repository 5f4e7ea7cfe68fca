//! Seeded train/validation split.
use crate::errors::PipelineError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of the two sides of a split, in shuffled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holdout {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Shuffle `0..n_rows` with `seed` and hold out `ceil(test_size * n_rows)`
/// rows for validation.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<Holdout, PipelineError> {
    if test_size.is_nan() || test_size <= 0.0 || test_size >= 1.0 {
        return Err(PipelineError::InvalidParameter(
            "test_size".to_string(),
            "a value strictly between 0 and 1".to_string(),
            test_size.to_string(),
        ));
    }
    let n_validation = (test_size * n_rows as f64).ceil() as usize;
    if n_validation == 0 || n_validation >= n_rows {
        return Err(PipelineError::EmptyData(format!(
            "a test_size of {} leaves an empty side when splitting {} rows",
            test_size, n_rows
        )));
    }
    let mut index: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    index.shuffle(&mut rng);
    let train = index.split_off(n_validation);
    Ok(Holdout {
        train,
        validation: index,
    })
}

//! Pipeline driver
//!
//! Sequences a whole run:
//!
//! 1. Validation: split the training file, fit the preprocessing on the train
//!    side only, train every backend and score it on the held-out side.
//! 2. Full run: refit the preprocessing on the whole training file, train
//!    every backend again and write one submission per backend for the test
//!    file.
//!
//! Each training context gets a freshly fitted [`Preprocessor`], which is
//! dropped when the context ends.
use crate::backend::{Backend, QuantilePair};
use crate::config::{ConfigIO, EncoderConfig, PipelineConfig};
use crate::constants::{CONFIG_FILE, DATASET_FINAL_FILE, TEST_FINAL_FILE};
use crate::data::NumericFrame;
use crate::encoding::FittedCategoricalEncoder;
use crate::errors::PipelineError;
use crate::features::{DerivedFrame, FeatureTransform};
use crate::holdout::train_test_split;
use crate::imputer::MedianImputer;
use crate::metrics::IntervalMetrics;
use crate::record::{targets, SaleRecord, SaleTable};
use crate::report::ArtifactDir;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Categorical encoder and imputer fitted on one training subset.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    pub encoder: FittedCategoricalEncoder,
    pub imputer: MedianImputer,
}

impl Preprocessor {
    /// Fit on `frame` and `y`, returning the preprocessor and the transformed
    /// training frame.
    pub fn fit(frame: &DerivedFrame, y: &[f64], config: &EncoderConfig) -> Result<(Self, NumericFrame), PipelineError> {
        let encoder = FittedCategoricalEncoder::fit(frame, y, config)?;
        let mut encoded = encoder.transform(frame)?;
        let imputer = MedianImputer::fit(&encoded)?;
        imputer.transform_inplace(&mut encoded)?;
        Ok((Preprocessor { encoder, imputer }, encoded))
    }

    /// Apply the fitted state to another frame of the same schema.
    pub fn transform(&self, frame: &DerivedFrame) -> Result<NumericFrame, PipelineError> {
        let mut encoded = self.encoder.transform(frame)?;
        self.imputer.transform_inplace(&mut encoded)?;
        Ok(encoded)
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub metrics: Vec<IntervalMetrics>,
    pub artifacts: Vec<PathBuf>,
}

pub struct Pipeline {
    pub config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    /// Untrained quantile pair of `backend`, with the configured overrides.
    pub fn quantile_pair(&self, backend: Backend) -> Result<QuantilePair, PipelineError> {
        let seed = self.config.split.seed;
        let configure = |quantile: f64| {
            let mut cfg = backend.booster_config(quantile, seed);
            if let Some(iterations) = self.config.training.iterations {
                cfg.iterations = iterations;
            }
            cfg.log_iterations = self.config.training.log_iterations;
            cfg
        };
        QuantilePair::from_configs(
            backend,
            configure(self.config.interval.lower_quantile),
            configure(self.config.interval.upper_quantile),
        )
    }

    /// Read both input files, then run validation and the full run.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();
        let schema = &self.config.schema;
        let out = ArtifactDir::create(&self.config.data.output_dir)?;
        let config_path = out.file(CONFIG_FILE);
        self.config.save(&config_path)?;

        let train = SaleTable::from_path(&self.config.data.train_path, schema)?;
        let test = SaleTable::from_path(&self.config.data.test_path, schema)?;
        info!(
            "Loaded {} training and {} test records.",
            train.records.len(),
            test.records.len()
        );

        let mut artifacts = vec![config_path];
        let (metrics, path) = self.validate(&train, &out)?;
        artifacts.push(path);
        artifacts.extend(self.fit_full(&train, &test, &out)?);
        info!("Pipeline finished in {} seconds.", start.elapsed().as_secs());
        Ok(RunSummary { metrics, artifacts })
    }

    /// Score every backend on a held-out share of `train` and write the
    /// metrics table.
    pub fn validate(&self, train: &SaleTable, out: &ArtifactDir) -> Result<(Vec<IntervalMetrics>, PathBuf), PipelineError> {
        let split = train_test_split(train.records.len(), self.config.split.test_size, self.config.split.seed)?;
        let train_records = train.select(&split.train);
        let val_records = train.select(&split.validation);
        info!(
            "Validation split: {} train rows, {} validation rows.",
            train_records.len(),
            val_records.len()
        );
        let y_train = targets(&train_records)?;
        let y_val = targets(&val_records)?;

        let (preprocessor, x_train) = Preprocessor::fit(
            &derive(train, &train_records, &self.config),
            &y_train,
            &self.config.encoder,
        )?;
        let x_val = preprocessor.transform(&derive(train, &val_records, &self.config))?;

        let mut rows = Vec::with_capacity(self.config.backends.len());
        for backend in &self.config.backends {
            let mut pair = self.quantile_pair(*backend)?;
            pair.fit(&x_train.as_matrix(), &y_train)?;
            let (lower, upper) = pair.predict_interval(&x_val.as_matrix());
            let m = IntervalMetrics::evaluate(
                backend.name(),
                &y_val,
                &lower,
                &upper,
                self.config.interval.lower_quantile,
                self.config.interval.upper_quantile,
            );
            info!(
                "{} validation: coverage {:.4}, width {:.2}, mae_mid {:.2}, pinball10 {:.2}, pinball90 {:.2}",
                m.model, m.coverage, m.avg_width, m.mae_mid, m.pinball10, m.pinball90
            );
            rows.push(m);
        }
        let path = out.write_metrics(&rows)?;
        Ok((rows, path))
    }

    /// Refit on all of `train`, write the derived frames and one submission
    /// per backend for `test`.
    pub fn fit_full(&self, train: &SaleTable, test: &SaleTable, out: &ArtifactDir) -> Result<Vec<PathBuf>, PipelineError> {
        let schema = &self.config.schema;
        let y = targets(&train.records)?;
        let mut artifacts = Vec::new();

        let full = derive(train, &train.records, &self.config);
        artifacts.push(out.write_frame(
            DATASET_FINAL_FILE,
            &schema.id_column,
            &full,
            Some((schema.target_column.as_str(), y.as_slice())),
        )?);
        let (preprocessor, x_full) = Preprocessor::fit(&full, &y, &self.config.encoder)?;

        let test_frame = derive(test, &test.records, &self.config);
        artifacts.push(out.write_frame(TEST_FINAL_FILE, &schema.id_column, &test_frame, None)?);
        let x_test = preprocessor.transform(&test_frame)?;

        for backend in &self.config.backends {
            let mut pair = self.quantile_pair(*backend)?;
            pair.fit(&x_full.as_matrix(), &y)?;
            let (lower, upper) = pair.predict_interval(&x_test.as_matrix());
            let path = out.write_submission(backend.name(), &test_frame.ids, &lower, &upper)?;
            info!("Wrote {}", path.display());
            artifacts.push(path);
        }
        Ok(artifacts)
    }
}

/// Derived features of `records`, parsed under the layout of `table`.
pub fn derive(table: &SaleTable, records: &[SaleRecord], config: &PipelineConfig) -> DerivedFrame {
    FeatureTransform::new(&table.layout, &config.schema).transform(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawTable;

    fn csv(n: usize, with_price: bool) -> String {
        let mut s = String::from("id,sale_date,");
        if with_price {
            s.push_str("sale_price,");
        }
        s.push_str("city,zoning,subdivision,join_status,submarket,year_built,year_reno,sqft,sqft_lot,garb_sqft,gara_sqft,bath_full,bath_3qtr,bath_half,beds,stories\n");
        let cities = ["SEATTLE", "KENT", "RENTON"];
        for i in 0..n {
            let sqft = 800 + (i * 37) % 2000;
            s.push_str(&format!("{},2018-{:02}-15,", i, 1 + i % 12));
            if with_price {
                s.push_str(&format!("{},", 100 * sqft + 1000 * (i % 7)));
            }
            s.push_str(&format!(
                "{},SF,,nochg,{},{},0,{},{},0,{},{},0,1,{},{}\n",
                cities[i % 3],
                ["A", "B"][i % 2],
                1950 + i % 60,
                sqft,
                5000 + i % 300,
                200 + i % 5,
                1 + i % 3,
                2 + i % 4,
                1 + i % 2
            ));
        }
        s
    }

    fn table(n: usize, with_price: bool) -> SaleTable {
        let raw = RawTable::from_reader(csv(n, with_price).as_bytes()).unwrap();
        SaleTable::from_raw(&raw, &PipelineConfig::default().schema).unwrap()
    }

    #[test]
    fn test_preprocessor_fits_on_train_only() {
        let config = PipelineConfig::default();
        let train = table(60, true);
        let y = targets(&train.records).unwrap();
        let frame = derive(&train, &train.records, &config);
        let (pre, x) = Preprocessor::fit(&frame, &y, &config.encoder).unwrap();
        assert_eq!(x.names, frame.schema.columns());
        assert!(x.data.iter().all(|v| !v.is_nan()));

        // Changing the targets of another frame can't move the fitted encodings.
        let other = derive(&train, &train.records[..10], &config);
        let a = pre.transform(&other).unwrap();
        let b = pre.transform(&other).unwrap();
        assert_eq!(a, b);
        let (refit, _) = Preprocessor::fit(&frame, &vec![1.0; y.len()], &config.encoder).unwrap();
        assert_ne!(refit.transform(&other).unwrap(), a);
    }

    #[test]
    fn test_test_file_without_target_shares_schema() {
        let config = PipelineConfig::default();
        let train = table(40, true);
        let test = table(10, false);
        let y = targets(&train.records).unwrap();
        let (pre, _) = Preprocessor::fit(&derive(&train, &train.records, &config), &y, &config.encoder).unwrap();
        let x_test = pre.transform(&derive(&test, &test.records, &config)).unwrap();
        assert_eq!(x_test.rows, 10);
        assert!(targets(&test.records).is_err());
    }

    #[test]
    fn test_quantile_pair_overrides() {
        let mut config = PipelineConfig::default();
        config.training.iterations = Some(5);
        config.training.log_iterations = 0;
        let pipeline = Pipeline::new(config).unwrap();
        let pair = pipeline.quantile_pair(Backend::Oblivious).unwrap();
        assert_eq!(pair.lower.cfg.iterations, 5);
        assert_eq!(pair.upper.cfg.quantile, 0.9);
        assert_eq!(pair.lower.cfg.seed, 42);
    }
}

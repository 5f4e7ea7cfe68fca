//! Artifacts
//!
//! CSV writers for everything the pipeline leaves in its output directory.
//! Missing values are written as empty cells.
use crate::constants::METRICS_FILE;
use crate::errors::PipelineError;
use crate::features::DerivedFrame;
use crate::metrics::IntervalMetrics;
use csv::Writer;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Output directory of a run, created on first use.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    pub path: PathBuf,
}

impl ArtifactDir {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path).map_err(|e| PipelineError::UnableToWrite(path.display().to_string(), e.to_string()))?;
        Ok(ArtifactDir { path })
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn writer(&self, name: &str) -> Result<Writer<File>, PipelineError> {
        let path = self.file(name);
        Writer::from_path(&path).map_err(|e| PipelineError::UnableToWrite(path.display().to_string(), e.to_string()))
    }

    /// `metrics_validation.csv`, one row per backend.
    pub fn write_metrics(&self, rows: &[IntervalMetrics]) -> Result<PathBuf, PipelineError> {
        let mut wtr = self.writer(METRICS_FILE)?;
        if rows.is_empty() {
            wtr.write_record(["model", "coverage", "avg_width", "mae_mid", "pinball10", "pinball90"])?;
        }
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(self.file(METRICS_FILE))
    }

    /// A derived frame with ids first and categoricals left unencoded. When
    /// `target` is given it is appended as the last column, named `target_name`.
    pub fn write_frame(
        &self,
        name: &str,
        id_name: &str,
        frame: &DerivedFrame,
        target: Option<(&str, &[f64])>,
    ) -> Result<PathBuf, PipelineError> {
        let mut wtr = self.writer(name)?;
        let mut header = vec![id_name.to_string()];
        header.extend(frame.schema.columns());
        if let Some((target_name, _)) = target {
            header.push(target_name.to_string());
        }
        wtr.write_record(&header)?;

        for row in 0..frame.rows() {
            let mut record = Vec::with_capacity(header.len());
            record.push(frame.ids[row].clone());
            record.extend(frame.numeric.iter().map(|col| format_value(col[row])));
            record.extend(
                frame
                    .target_encoded
                    .iter()
                    .chain(&frame.ordinal)
                    .map(|col| col[row].clone().unwrap_or_default()),
            );
            if let Some((_, y)) = target {
                record.push(format_value(y[row]));
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(self.file(name))
    }

    /// `submission_<backend>.csv` with `id,pi_lower,pi_upper`.
    pub fn write_submission(
        &self,
        backend: &str,
        ids: &[String],
        lower: &[f64],
        upper: &[f64],
    ) -> Result<PathBuf, PipelineError> {
        let name = submission_file(backend);
        let mut wtr = self.writer(&name)?;
        wtr.write_record(["id", "pi_lower", "pi_upper"])?;
        for ((id, l), u) in ids.iter().zip(lower).zip(upper) {
            wtr.write_record([id.clone(), format_value(*l), format_value(*u)])?;
        }
        wtr.flush()?;
        Ok(self.file(&name))
    }
}

pub fn submission_file(backend: &str) -> String {
    format!("submission_{}.csv", backend)
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSchema;
    use tempfile::tempdir;

    fn frame() -> DerivedFrame {
        DerivedFrame {
            ids: vec!["a".to_string(), "b".to_string()],
            schema: FeatureSchema {
                numeric: vec!["sqft".to_string(), "bath_total".to_string()],
                target_encoded: vec!["city".to_string()],
                ordinal: vec!["submarket".to_string()],
            },
            numeric: vec![vec![1500.0, f64::NAN], vec![2.5, 1.0]],
            target_encoded: vec![vec![Some("KENT".to_string()), None]],
            ordinal: vec![vec![Some("A".to_string()), Some("B".to_string())]],
        }
    }

    #[test]
    fn test_write_frame_with_target() {
        let dir = tempdir().unwrap();
        let out = ArtifactDir::create(dir.path().join("nested")).unwrap();
        let path = out
            .write_frame("dataset_Final.csv", "id", &frame(), Some(("sale_price", &[10.0, 20.5][..])))
            .unwrap();
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,sqft,bath_total,city,submarket,sale_price");
        assert_eq!(lines[1], "a,1500,2.5,KENT,A,10");
        assert_eq!(lines[2], "b,,1,,B,20.5");
    }

    #[test]
    fn test_write_frame_without_target() {
        let dir = tempdir().unwrap();
        let out = ArtifactDir::create(dir.path()).unwrap();
        let path = out.write_frame("test_Final.csv", "id", &frame(), None).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().next().unwrap(), "id,sqft,bath_total,city,submarket");
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_write_submission_and_metrics() {
        let dir = tempdir().unwrap();
        let out = ArtifactDir::create(dir.path()).unwrap();
        let ids = vec!["7".to_string(), "8".to_string()];
        let path = out.write_submission("Oblivious", &ids, &[1.0, 2.0], &[3.0, 4.5]).unwrap();
        assert!(path.ends_with("submission_Oblivious.csv"));
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "id,pi_lower,pi_upper\n7,1,3\n8,2,4.5\n");

        let rows = vec![IntervalMetrics {
            model: "DepthWise".to_string(),
            coverage: 0.8,
            avg_width: 10.0,
            mae_mid: 2.0,
            pinball10: 0.5,
            pinball90: 0.25,
        }];
        let path = out.write_metrics(&rows).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "model,coverage,avg_width,mae_mid,pinball10,pinball90");
        assert!(lines[1].starts_with("DepthWise,0.8,10"));
        assert_eq!(lines.len(), 2);
    }
}

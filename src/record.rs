//! Sale records
//!
//! Reads a housing-sale CSV into typed [`SaleRecord`]s. Column positions are
//! resolved once from the header into a [`RecordLayout`]; every row is then
//! parsed against that layout. Empty numeric cells become `NaN`, empty
//! categorical cells become `None`, and anything unparseable fails the load.
use crate::config::SchemaConfig;
use crate::errors::PipelineError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Structural fields consumed by the feature transform.
pub const STRUCTURAL_COLUMNS: [&str; 10] = [
    "year_built",
    "year_reno",
    "sqft",
    "sqft_lot",
    "garb_sqft",
    "gara_sqft",
    "bath_full",
    "bath_3qtr",
    "bath_half",
    "beds",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A CSV file held as raw string rows.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = csv_reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let rows = csv_reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(RawTable { headers, rows })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let file = File::open(path.as_ref())
            .map_err(|e| PipelineError::UnableToRead(path.as_ref().display().to_string(), e.to_string()))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, PipelineError> {
        self.position(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }
}

/// Calendar fields of a sale date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaleDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for SaleDate {
    fn from(date: NaiveDate) -> Self {
        SaleDate {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// Structural attributes of the sold property. Missing values are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Structure {
    pub year_built: f64,
    pub year_reno: f64,
    pub sqft: f64,
    pub sqft_lot: f64,
    pub garb_sqft: f64,
    pub gara_sqft: f64,
    pub bath_full: f64,
    pub bath_3qtr: f64,
    pub bath_half: f64,
    pub beds: f64,
}

impl Structure {
    fn from_values(v: [f64; 10]) -> Self {
        Structure {
            year_built: v[0],
            year_reno: v[1],
            sqft: v[2],
            sqft_lot: v[3],
            garb_sqft: v[4],
            gara_sqft: v[5],
            bath_full: v[6],
            bath_3qtr: v[7],
            bath_half: v[8],
            beds: v[9],
        }
    }
}

/// One housing sale.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub id: String,
    pub sale_date: SaleDate,
    /// Absent for scoring data.
    pub sale_price: Option<f64>,
    pub structure: Structure,
    /// Aligned with [`RecordLayout::categorical`].
    pub categories: Vec<Option<String>>,
    /// Aligned with [`RecordLayout::passthrough`].
    pub passthrough: Vec<f64>,
}

/// Header positions of the columns a [`SaleRecord`] is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    id: usize,
    date: (String, usize),
    target: Option<(String, usize)>,
    structure: [usize; 10],
    /// Target-encoded columns first, then ordinal columns.
    pub categorical: Vec<(String, usize)>,
    /// Numeric feature columns carried through unchanged, in header order.
    pub passthrough: Vec<(String, usize)>,
}

impl RecordLayout {
    /// Resolve the layout of `table` under `schema`.
    ///
    /// The target column is optional so that scoring files share the same code
    /// path; [`targets`] rejects records without one.
    pub fn resolve(table: &RawTable, schema: &SchemaConfig) -> Result<Self, PipelineError> {
        let id = table.require(&schema.id_column)?;
        let date = (schema.date_column.clone(), table.require(&schema.date_column)?);
        let target = table
            .position(&schema.target_column)
            .map(|i| (schema.target_column.clone(), i));
        let mut structure = [0; 10];
        for (slot, name) in structure.iter_mut().zip(STRUCTURAL_COLUMNS) {
            *slot = table.require(name)?;
        }
        let categorical = schema
            .target_encoded_columns
            .iter()
            .chain(&schema.ordinal_columns)
            .map(|name| table.require(name).map(|i| (name.clone(), i)))
            .collect::<Result<Vec<_>, _>>()?;
        let passthrough = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                **h != schema.id_column
                    && **h != schema.target_column
                    && **h != schema.date_column
                    && !schema.is_categorical(h)
                    && !schema.is_dropped(h)
            })
            .map(|(i, h)| (h.clone(), i))
            .collect();
        Ok(RecordLayout {
            id,
            date,
            target,
            structure,
            categorical,
            passthrough,
        })
    }

    pub fn passthrough_names(&self) -> Vec<String> {
        self.passthrough.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn categorical_names(&self) -> Vec<String> {
        self.categorical.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Parse one row. `row` is the zero based data row, used in error messages.
    pub fn parse(&self, row: usize, record: &StringRecord) -> Result<SaleRecord, PipelineError> {
        let cell = |i: usize| record.get(i).unwrap_or("").trim();
        let (date_name, date_idx) = &self.date;
        let sale_date = parse_date(cell(*date_idx)).ok_or_else(|| PipelineError::InvalidDate {
            row,
            column: date_name.clone(),
            value: cell(*date_idx).to_string(),
        })?;
        let sale_price = match &self.target {
            Some((name, i)) => {
                let v = parse_number(row, name, cell(*i))?;
                if v.is_nan() {
                    None
                } else {
                    Some(v)
                }
            }
            None => None,
        };
        let mut structural = [f64::NAN; 10];
        for ((slot, idx), name) in structural.iter_mut().zip(self.structure).zip(STRUCTURAL_COLUMNS) {
            *slot = parse_number(row, name, cell(idx))?;
        }
        let categories = self
            .categorical
            .iter()
            .map(|(_, i)| {
                let v = cell(*i);
                if v.is_empty() {
                    None
                } else {
                    Some(v.to_string())
                }
            })
            .collect();
        let passthrough = self
            .passthrough
            .iter()
            .map(|(name, i)| parse_number(row, name, cell(*i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SaleRecord {
            id: cell(self.id).to_string(),
            sale_date: sale_date.into(),
            sale_price,
            structure: Structure::from_values(structural),
            categories,
            passthrough,
        })
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
                .map(|dt| dt.date())
        })
}

fn parse_number(row: usize, column: &str, value: &str) -> Result<f64, PipelineError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    match value {
        "True" | "true" => return Ok(1.0),
        "False" | "false" => return Ok(0.0),
        _ => {}
    }
    value.parse::<f64>().map_err(|_| PipelineError::InvalidNumber {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Records loaded from one file, with the layout they were parsed against.
#[derive(Debug, Clone)]
pub struct SaleTable {
    pub layout: RecordLayout,
    pub records: Vec<SaleRecord>,
}

impl SaleTable {
    pub fn from_raw(table: &RawTable, schema: &SchemaConfig) -> Result<Self, PipelineError> {
        let layout = RecordLayout::resolve(table, schema)?;
        let records = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| layout.parse(i, r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SaleTable { layout, records })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, schema: &SchemaConfig) -> Result<Self, PipelineError> {
        Self::from_raw(&RawTable::from_path(path)?, schema)
    }

    /// Copy of the records at `index`, in that order.
    pub fn select(&self, index: &[usize]) -> Vec<SaleRecord> {
        index.iter().map(|&i| self.records[i].clone()).collect()
    }
}

/// Target values of `records`, failing on the first record without one.
pub fn targets(records: &[SaleRecord]) -> Result<Vec<f64>, PipelineError> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| r.sale_price.ok_or(PipelineError::MissingTarget(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,sale_date,sale_price,sale_warning,city,zoning,subdivision,join_status,submarket,year_built,year_reno,sqft,sqft_lot,garb_sqft,gara_sqft,bath_full,bath_3qtr,bath_half,beds,stories,wfnt
1,2014-11-15,450000, 15 ,SEATTLE,SF 5000,PARK,nochg,A,1990,0,2000,5000,0,400,2,1,1,3,2,False
2,2019-01-02 00:00:00,,,RENTON,,,demo,B,1960,2005,1500,,,,1,,,2,1,True
";

    fn table() -> RawTable {
        RawTable::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_layout_passthrough() {
        let layout = RecordLayout::resolve(&table(), &SchemaConfig::default()).unwrap();
        assert_eq!(
            layout.passthrough_names(),
            vec!["year_built".to_string(), "sqft".to_string(), "stories".to_string(), "wfnt".to_string()]
        );
        assert_eq!(
            layout.categorical_names(),
            vec!["city", "zoning", "subdivision", "join_status", "submarket"]
        );
    }

    #[test]
    fn test_parse_records() {
        let t = SaleTable::from_raw(&table(), &SchemaConfig::default()).unwrap();
        let first = &t.records[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.sale_date, SaleDate { year: 2014, month: 11, day: 15 });
        assert_eq!(first.sale_price, Some(450000.0));
        assert_eq!(first.structure.bath_half, 1.0);
        assert_eq!(first.categories[0], Some("SEATTLE".to_string()));
        assert_eq!(first.passthrough, vec![1990.0, 2000.0, 2.0, 0.0]);

        let second = &t.records[1];
        assert_eq!(second.sale_date.year, 2019);
        assert_eq!(second.sale_price, None);
        assert!(second.structure.sqft_lot.is_nan());
        assert_eq!(second.categories[1], None);
        assert_eq!(second.passthrough[3], 1.0);
        assert!(matches!(targets(&t.records), Err(PipelineError::MissingTarget(1))));
    }

    #[test]
    fn test_missing_column() {
        let csv = "id,sale_date,year_built\n1,2014-01-01,1990\n";
        let t = RawTable::from_reader(csv.as_bytes()).unwrap();
        let res = RecordLayout::resolve(&t, &SchemaConfig::default());
        assert!(matches!(res, Err(PipelineError::MissingColumn(c)) if c == "year_reno"));
    }

    #[test]
    fn test_invalid_date_fails_fast() {
        let csv = CSV.replace("2014-11-15", "someday");
        let t = RawTable::from_reader(csv.as_bytes()).unwrap();
        let res = SaleTable::from_raw(&t, &SchemaConfig::default());
        assert!(matches!(res, Err(PipelineError::InvalidDate { row: 0, .. })));
    }

    #[test]
    fn test_invalid_number() {
        let csv = CSV.replace(",2000,5000,", ",big,5000,");
        let t = RawTable::from_reader(csv.as_bytes()).unwrap();
        let res = SaleTable::from_raw(&t, &SchemaConfig::default());
        assert!(matches!(res, Err(PipelineError::InvalidNumber { row: 0, .. })));
    }

    #[test]
    fn test_select() {
        let t = SaleTable::from_raw(&table(), &SchemaConfig::default()).unwrap();
        let picked = t.select(&[1, 0]);
        assert_eq!(picked[0].id, "2");
        assert_eq!(picked[1].id, "1");
    }
}

//! Feature transform
//!
//! Turns [`SaleRecord`]s into a [`DerivedFrame`]: the pass-through numeric
//! columns, the raw categorical columns, and the derived sale/structure
//! features, minus whatever the schema drops. The transform holds no fitted
//! state, so the same call serves training, validation and test records.
use crate::config::SchemaConfig;
use crate::record::{RecordLayout, SaleRecord};

/// Features computed from a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedFeature {
    SaleYear,
    SaleMonth,
    SaleDay,
    AgeAtSale,
    RenoAgeAtSale,
    IsRenovated,
    LotSqftRatio,
    GarageTotal,
    BathTotal,
    SqftPerBed,
    SqftPerBath,
}

impl DerivedFeature {
    pub const ALL: [DerivedFeature; 11] = [
        DerivedFeature::SaleYear,
        DerivedFeature::SaleMonth,
        DerivedFeature::SaleDay,
        DerivedFeature::AgeAtSale,
        DerivedFeature::RenoAgeAtSale,
        DerivedFeature::IsRenovated,
        DerivedFeature::LotSqftRatio,
        DerivedFeature::GarageTotal,
        DerivedFeature::BathTotal,
        DerivedFeature::SqftPerBed,
        DerivedFeature::SqftPerBath,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DerivedFeature::SaleYear => "sale_year",
            DerivedFeature::SaleMonth => "sale_month",
            DerivedFeature::SaleDay => "sale_day",
            DerivedFeature::AgeAtSale => "age_at_sale",
            DerivedFeature::RenoAgeAtSale => "reno_age_at_sale",
            DerivedFeature::IsRenovated => "is_renovated",
            DerivedFeature::LotSqftRatio => "lot_sqft_ratio",
            DerivedFeature::GarageTotal => "garage_total",
            DerivedFeature::BathTotal => "bath_total",
            DerivedFeature::SqftPerBed => "sqft_per_bed",
            DerivedFeature::SqftPerBath => "sqft_per_bath",
        }
    }

    /// Value of this feature for `record`.
    ///
    /// Ratio denominators get `+ 1`, and absent garage or bathroom components
    /// count as zero in the sums.
    pub fn compute(&self, record: &SaleRecord) -> f64 {
        let s = &record.structure;
        let sale_year = f64::from(record.sale_date.year);
        match self {
            DerivedFeature::SaleYear => sale_year,
            DerivedFeature::SaleMonth => f64::from(record.sale_date.month),
            DerivedFeature::SaleDay => f64::from(record.sale_date.day),
            DerivedFeature::AgeAtSale => sale_year - s.year_built,
            DerivedFeature::RenoAgeAtSale => sale_year - s.year_reno,
            DerivedFeature::IsRenovated => {
                if s.year_reno > s.year_built {
                    1.0
                } else {
                    0.0
                }
            }
            DerivedFeature::LotSqftRatio => s.sqft / (s.sqft_lot + 1.0),
            DerivedFeature::GarageTotal => zero_if_missing(s.garb_sqft) + zero_if_missing(s.gara_sqft),
            DerivedFeature::BathTotal => bath_total(record),
            DerivedFeature::SqftPerBed => s.sqft / (s.beds + 1.0),
            DerivedFeature::SqftPerBath => s.sqft / (bath_total(record) + 1.0),
        }
    }
}

#[inline]
fn zero_if_missing(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

fn bath_total(record: &SaleRecord) -> f64 {
    let s = &record.structure;
    zero_if_missing(s.bath_full) + zero_if_missing(s.bath_3qtr) + 0.5 * zero_if_missing(s.bath_half)
}

/// Column roles of a [`DerivedFrame`].
///
/// Encoders and the imputer are fitted against a schema and refuse frames
/// carrying a different one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    pub numeric: Vec<String>,
    pub target_encoded: Vec<String>,
    pub ordinal: Vec<String>,
}

impl FeatureSchema {
    /// Every column, numeric first, then target-encoded, then ordinal.
    pub fn columns(&self) -> Vec<String> {
        self.numeric
            .iter()
            .chain(&self.target_encoded)
            .chain(&self.ordinal)
            .cloned()
            .collect()
    }
}

/// Output of the feature transform.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFrame {
    pub ids: Vec<String>,
    pub schema: FeatureSchema,
    /// One vector per `schema.numeric` column.
    pub numeric: Vec<Vec<f64>>,
    /// One vector per `schema.target_encoded` column.
    pub target_encoded: Vec<Vec<Option<String>>>,
    /// One vector per `schema.ordinal` column.
    pub ordinal: Vec<Vec<Option<String>>>,
}

impl DerivedFrame {
    pub fn rows(&self) -> usize {
        self.ids.len()
    }
}

/// Stateless record-to-feature transform.
#[derive(Debug, Clone)]
pub struct FeatureTransform<'a> {
    layout: &'a RecordLayout,
    schema: &'a SchemaConfig,
}

impl<'a> FeatureTransform<'a> {
    pub fn new(layout: &'a RecordLayout, schema: &'a SchemaConfig) -> Self {
        FeatureTransform { layout, schema }
    }

    /// Derived features kept after the drop list is applied.
    pub fn derived_features(&self) -> Vec<DerivedFeature> {
        DerivedFeature::ALL
            .into_iter()
            .filter(|f| !self.schema.is_dropped(f.name()))
            .collect()
    }

    pub fn feature_schema(&self) -> FeatureSchema {
        let n_target = self.schema.target_encoded_columns.len();
        let categorical = self.layout.categorical_names();
        let mut numeric = self.layout.passthrough_names();
        numeric.extend(self.derived_features().iter().map(|f| f.name().to_string()));
        FeatureSchema {
            numeric,
            target_encoded: categorical[..n_target].to_vec(),
            ordinal: categorical[n_target..].to_vec(),
        }
    }

    pub fn transform(&self, records: &[SaleRecord]) -> DerivedFrame {
        let schema = self.feature_schema();
        let n_target = schema.target_encoded.len();
        let n_passthrough = self.layout.passthrough.len();
        let derived = self.derived_features();

        let mut numeric: Vec<Vec<f64>> = (0..schema.numeric.len())
            .map(|_| Vec::with_capacity(records.len()))
            .collect();
        let mut categorical: Vec<Vec<Option<String>>> = (0..self.layout.categorical.len())
            .map(|_| Vec::with_capacity(records.len()))
            .collect();

        for record in records {
            for (col, v) in numeric.iter_mut().zip(&record.passthrough) {
                col.push(*v);
            }
            for (col, feature) in numeric[n_passthrough..].iter_mut().zip(&derived) {
                col.push(feature.compute(record));
            }
            for (col, v) in categorical.iter_mut().zip(&record.categories) {
                col.push(v.clone());
            }
        }

        let ordinal = categorical.split_off(n_target);
        DerivedFrame {
            ids: records.iter().map(|r| r.id.clone()).collect(),
            schema,
            numeric,
            target_encoded: categorical,
            ordinal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawTable, SaleTable};

    const CSV: &str = "\
id,sale_date,sale_price,city,zoning,subdivision,join_status,submarket,year_built,year_reno,sqft,sqft_lot,garb_sqft,gara_sqft,bath_full,bath_3qtr,bath_half,beds,stories
10,2015-06-20,500000,SEATTLE,SF,PARK,nochg,A,1990,2000,2000,4999,100,400,2,1,1,3,2
11,2020-02-29,300000,KENT,,,new,C,1975,0,1200,,,,1,,1,,1
";

    fn sales() -> SaleTable {
        SaleTable::from_raw(&RawTable::from_reader(CSV.as_bytes()).unwrap(), &SchemaConfig::default()).unwrap()
    }

    fn column<'a>(frame: &'a DerivedFrame, name: &str) -> &'a [f64] {
        let i = frame.schema.numeric.iter().position(|n| n == name).unwrap();
        &frame.numeric[i]
    }

    #[test]
    fn test_hand_computed_record() {
        let sales = sales();
        let schema = SchemaConfig::default();
        let frame = FeatureTransform::new(&sales.layout, &schema).transform(&sales.records);
        assert_eq!(column(&frame, "sale_year"), &[2015.0, 2020.0]);
        assert_eq!(column(&frame, "sale_month"), &[6.0, 2.0]);
        assert_eq!(column(&frame, "age_at_sale"), &[25.0, 45.0]);
        assert_eq!(column(&frame, "reno_age_at_sale"), &[15.0, 2020.0]);
        assert_eq!(column(&frame, "bath_total"), &[3.5, 1.5]);
        assert_eq!(column(&frame, "garage_total"), &[500.0, 0.0]);
        assert_eq!(column(&frame, "lot_sqft_ratio")[0], 2000.0 / 5000.0);
        assert!(column(&frame, "lot_sqft_ratio")[1].is_nan());
        assert_eq!(column(&frame, "sqft_per_bed")[0], 500.0);
        assert!(column(&frame, "sqft_per_bed")[1].is_nan());
        assert_eq!(column(&frame, "sqft_per_bath"), &[2000.0 / 4.5, 1200.0 / 2.5]);
    }

    #[test]
    fn test_is_renovated_strictly_after_build() {
        let sales = sales();
        let schema = SchemaConfig::default();
        let mut records = sales.records.clone();
        records[1].structure.year_reno = records[1].structure.year_built;
        let frame = FeatureTransform::new(&sales.layout, &schema).transform(&records);
        assert_eq!(column(&frame, "is_renovated"), &[1.0, 0.0]);
    }

    #[test]
    fn test_bath_total_identity() {
        let sales = sales();
        let schema = SchemaConfig::default();
        let frame = FeatureTransform::new(&sales.layout, &schema).transform(&sales.records);
        let totals = column(&frame, "bath_total");
        for (record, total) in sales.records.iter().zip(totals) {
            let s = &record.structure;
            let expected = zero_if_missing(s.bath_full) + zero_if_missing(s.bath_3qtr) + 0.5 * zero_if_missing(s.bath_half);
            assert_eq!(*total, expected);
        }
    }

    #[test]
    fn test_schema_drops_configured_columns() {
        let sales = sales();
        let schema = SchemaConfig::default();
        let frame = FeatureTransform::new(&sales.layout, &schema).transform(&sales.records);
        assert_eq!(
            frame.schema.numeric,
            vec![
                "year_built",
                "sqft",
                "stories",
                "sale_year",
                "sale_month",
                "age_at_sale",
                "reno_age_at_sale",
                "is_renovated",
                "lot_sqft_ratio",
                "garage_total",
                "bath_total",
                "sqft_per_bed",
                "sqft_per_bath",
            ]
        );
        assert_eq!(frame.schema.target_encoded, vec!["city", "zoning", "subdivision", "join_status"]);
        assert_eq!(frame.schema.ordinal, vec!["submarket"]);
        assert_eq!(frame.ordinal[0], vec![Some("A".to_string()), Some("C".to_string())]);
        assert_eq!(frame.target_encoded[1][1], None);
        assert_eq!(frame.ids, vec!["10", "11"]);
    }

    #[test]
    fn test_sale_day_kept_when_not_dropped() {
        let sales = sales();
        let mut schema = SchemaConfig::default();
        schema.drop_columns.retain(|c| c != "sale_day");
        let frame = FeatureTransform::new(&sales.layout, &schema).transform(&sales.records);
        assert_eq!(column(&frame, "sale_day"), &[20.0, 29.0]);
    }
}

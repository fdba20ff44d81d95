use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::error::ParseWarning;

// ---------------------------------------------------------------------------
// Fixed metadata columns of the wide-format table
// ---------------------------------------------------------------------------

/// Column names that identify a record. Every other column holds one year.
pub const METADATA_COLUMNS: [&str; 10] = [
    "ObjectId",
    "Country",
    "ISO2",
    "ISO3",
    "Indicator",
    "Unit",
    "Source",
    "CTS_Code",
    "CTS_Name",
    "CTS_Full_Descriptor",
];

/// Whether `name` is one of the fixed metadata columns.
pub fn is_metadata_column(name: &str) -> bool {
    METADATA_COLUMNS.contains(&name)
}

// ---------------------------------------------------------------------------
// RawValue – a single cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell. CSV cells are always `Text`; JSON and Parquet
/// sources can carry real numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Null,
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{s}"),
            RawValue::Number(v) => write!(f, "{v}"),
            RawValue::Null => Ok(()),
        }
    }
}

impl RawValue {
    /// Coerce to a temperature value. Anything that is not a finite number
    /// after trimming becomes missing.
    pub fn to_temperature(&self) -> Option<f64> {
        let v = match self {
            RawValue::Number(v) => *v,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn is_null(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.is_empty(),
            RawValue::Number(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// RecordMetadata – the identifying part of a wide row
// ---------------------------------------------------------------------------

/// Metadata shared by every observation melted out of one wide row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordMetadata {
    #[serde(rename = "ObjectId")]
    pub object_id: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "ISO2")]
    pub iso2: String,
    #[serde(rename = "ISO3")]
    pub iso3: String,
    #[serde(rename = "Indicator")]
    pub indicator: String,
    #[serde(rename = "Unit")]
    pub unit: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "CTS_Code")]
    pub cts_code: String,
    #[serde(rename = "CTS_Name")]
    pub cts_name: String,
    #[serde(rename = "CTS_Full_Descriptor")]
    pub cts_full_descriptor: String,
}

impl RecordMetadata {
    /// Build from field values given in [`METADATA_COLUMNS`] order.
    pub fn from_fields(fields: [String; 10]) -> Self {
        let [
            object_id,
            country,
            iso2,
            iso3,
            indicator,
            unit,
            source,
            cts_code,
            cts_name,
            cts_full_descriptor,
        ] = fields;
        RecordMetadata {
            object_id,
            country,
            iso2,
            iso3,
            indicator,
            unit,
            source,
            cts_code,
            cts_name,
            cts_full_descriptor,
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – the wide-format table as loaded
// ---------------------------------------------------------------------------

/// One wide row: metadata plus one cell per value column.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub metadata: RecordMetadata,
    /// Aligned with [`RawTable::value_columns`].
    pub values: Vec<RawValue>,
}

/// The wide-format table exactly as read from disk.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Non-metadata column labels in source order (e.g. `F1961`).
    pub value_columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Observation – one row of the long-format table
// ---------------------------------------------------------------------------

/// One (Country, Indicator, Year) measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    #[serde(flatten)]
    pub metadata: Arc<RecordMetadata>,
    #[serde(rename = "Year")]
    pub year: i32,
    /// `None` when the source cell was missing or not a number.
    #[serde(rename = "Temperature Change")]
    pub temperature_change: Option<f64>,
}

impl Observation {
    pub fn country(&self) -> &str {
        &self.metadata.country
    }

    pub fn indicator(&self) -> &str {
        &self.metadata.indicator
    }
}

// ---------------------------------------------------------------------------
// ObservationTable – the complete long-format dataset
// ---------------------------------------------------------------------------

/// The melted dataset with pre-computed distinct values for the selection
/// controls.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    pub observations: Vec<Observation>,
    /// Distinct countries in first-appearance order.
    pub countries: Vec<String>,
    /// Distinct indicators in first-appearance order.
    pub indicators: Vec<String>,
    /// Distinct years, ascending.
    pub years: BTreeSet<i32>,
    /// Non-fatal problems met while reshaping.
    pub warnings: Vec<ParseWarning>,
}

impl ObservationTable {
    /// Build the distinct-value indices from the melted observations.
    pub fn from_observations(observations: Vec<Observation>, warnings: Vec<ParseWarning>) -> Self {
        let mut countries = Vec::new();
        let mut indicators = Vec::new();
        let mut years = BTreeSet::new();

        {
            let mut seen_countries = HashSet::new();
            let mut seen_indicators = HashSet::new();
            for obs in &observations {
                if seen_countries.insert(obs.country()) {
                    countries.push(obs.country().to_string());
                }
                if seen_indicators.insert(obs.indicator()) {
                    indicators.push(obs.indicator().to_string());
                }
                years.insert(obs.year);
            }
        }

        ObservationTable {
            observations,
            countries,
            indicators,
            years,
            warnings,
        }
    }

    /// `[min(Year), max(Year)]`, or `None` for an empty table.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

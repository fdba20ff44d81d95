use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::aggregate::numeric_safe_mean;
use super::model::{Observation, ObservationTable};
use super::stats::{Statistics, summarize};

// ---------------------------------------------------------------------------
// Selection options
// ---------------------------------------------------------------------------

/// Distinct values for populating the selection controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOptions {
    pub countries: Vec<String>,
    pub indicators: Vec<String>,
    pub years: Vec<i32>,
}

impl SelectionOptions {
    pub fn from_table(table: &ObservationTable) -> Self {
        SelectionOptions {
            countries: table.countries.clone(),
            indicators: table.indicators.clone(),
            years: table.years.iter().copied().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Time series – one line per country
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySeries {
    pub country: String,
    /// Sorted by year.
    pub points: Vec<SeriesPoint>,
}

/// Per-country series, countries in name order, points in year order.
pub fn time_series<'a, I>(rows: I) -> Vec<CountrySeries>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut by_country: BTreeMap<&str, Vec<SeriesPoint>> = BTreeMap::new();
    for obs in rows {
        by_country.entry(obs.country()).or_default().push(SeriesPoint {
            year: obs.year,
            value: obs.temperature_change,
        });
    }

    by_country
        .into_iter()
        .map(|(country, mut points)| {
            points.sort_by_key(|p| p.year);
            CountrySeries {
                country: country.to_string(),
                points,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Heatmap – Country × Year pivot
// ---------------------------------------------------------------------------

/// `cells[row][col]` is the mean for `countries[row]` in `years[col]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub countries: Vec<String>,
    pub years: Vec<i32>,
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Pivot the view into a Country × Year grid of means.
pub fn heatmap<'a, I>(rows: I) -> Heatmap
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut buckets: BTreeMap<(&str, i32), Vec<Option<f64>>> = BTreeMap::new();
    let mut countries = BTreeSet::new();
    let mut years = BTreeSet::new();
    for obs in rows {
        countries.insert(obs.country());
        years.insert(obs.year);
        buckets
            .entry((obs.country(), obs.year))
            .or_default()
            .push(obs.temperature_change);
    }

    let cells = countries
        .iter()
        .map(|&country| {
            years
                .iter()
                .map(|&year| {
                    buckets
                        .get(&(country, year))
                        .and_then(|values| numeric_safe_mean(values.iter().copied()))
                })
                .collect()
        })
        .collect();

    Heatmap {
        countries: countries.into_iter().map(str::to_string).collect(),
        years: years.into_iter().collect(),
        cells,
    }
}

// ---------------------------------------------------------------------------
// Comparison – exactly two countries side by side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSide {
    pub country: String,
    /// Valid values in year order.
    pub values: Vec<f64>,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    Ready {
        left: ComparisonSide,
        right: ComparisonSide,
    },
    /// The comparison needs exactly two selected countries.
    NeedsTwoCountries { selected: usize },
}

/// Compare the two selected countries over the view.
pub fn comparison<'a, I>(rows: I, selected: &BTreeSet<String>) -> Comparison
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut names = selected.iter();
    let (Some(left), Some(right), None) = (names.next(), names.next(), names.next()) else {
        return Comparison::NeedsTwoCountries {
            selected: selected.len(),
        };
    };

    let mut left_rows = Vec::new();
    let mut right_rows = Vec::new();
    for obs in rows {
        if obs.country() == left {
            left_rows.push(obs);
        } else if obs.country() == right {
            right_rows.push(obs);
        }
    }

    Comparison::Ready {
        left: comparison_side(left, left_rows),
        right: comparison_side(right, right_rows),
    }
}

fn comparison_side(country: &str, mut rows: Vec<&Observation>) -> ComparisonSide {
    rows.sort_by_key(|o| o.year);
    ComparisonSide {
        country: country.to_string(),
        values: rows.iter().filter_map(|o| o.temperature_change).collect(),
        statistics: summarize(rows.iter().map(|o| o.temperature_change)),
    }
}

// ---------------------------------------------------------------------------
// Map frames – one choropleth frame per year
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEntry {
    pub iso3: String,
    pub country: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrame {
    pub year: i32,
    pub entries: Vec<MapEntry>,
}

/// Frames in year order; entries keep view order within a frame.
pub fn map_frames<'a, I>(rows: I) -> Vec<MapFrame>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut frames: BTreeMap<i32, Vec<MapEntry>> = BTreeMap::new();
    for obs in rows {
        frames.entry(obs.year).or_default().push(MapEntry {
            iso3: obs.metadata.iso3.clone(),
            country: obs.country().to_string(),
            value: obs.temperature_change,
        });
    }
    frames
        .into_iter()
        .map(|(year, entries)| MapFrame { year, entries })
        .collect()
}

use std::collections::BTreeMap;

use serde::Serialize;

use super::model::Observation;
use super::region::{GroupLabel, RegionLookup};

/// Mean of one (group, year) bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedObservation {
    #[serde(rename = "Aggregated")]
    pub group: GroupLabel,
    #[serde(rename = "Year")]
    pub year: i32,
    /// `None` when the bucket had no valid value.
    #[serde(rename = "Temperature Change")]
    pub temperature_change: Option<f64>,
}

/// Mean over the valid values only. Missing and non-finite inputs are
/// skipped, not counted as zero; no valid input gives `None`.
pub fn numeric_safe_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Group `rows` by (lookup(country), year) and reduce each bucket with
/// [`numeric_safe_mean`]. Output is ordered by group, then year.
pub fn aggregate<'a, I>(rows: I, lookup: &dyn RegionLookup) -> Vec<AggregatedObservation>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut buckets: BTreeMap<(GroupLabel, i32), Vec<Option<f64>>> = BTreeMap::new();
    for obs in rows {
        let group = GroupLabel::resolve(lookup, obs.country());
        buckets
            .entry((group, obs.year))
            .or_default()
            .push(obs.temperature_change);
    }

    buckets
        .into_iter()
        .map(|((group, year), values)| AggregatedObservation {
            group,
            year,
            temperature_change: numeric_safe_mean(values),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::model::RecordMetadata;
    use crate::data::region::{CountryIdentity, RegionTable};

    fn obs(country: &str, year: i32, value: Option<f64>) -> Observation {
        Observation {
            metadata: Arc::new(RecordMetadata {
                country: country.into(),
                ..Default::default()
            }),
            year,
            temperature_change: value,
        }
    }

    fn regions() -> RegionTable {
        [("Albania", "Europe"), ("Andorra", "Europe"), ("Algeria", "Africa")]
            .into_iter()
            .collect()
    }

    #[test]
    fn mean_skips_missing_values() {
        assert_eq!(numeric_safe_mean([Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(numeric_safe_mean([None, None]), None);
        assert_eq!(numeric_safe_mean([Some(f64::NAN), Some(4.0)]), Some(4.0));
        assert_eq!(numeric_safe_mean(std::iter::empty()), None);
    }

    #[test]
    fn buckets_by_region_and_year() {
        let rows = vec![
            obs("Albania", 2020, Some(1.0)),
            obs("Andorra", 2020, Some(2.0)),
            obs("Albania", 2021, None),
            obs("Algeria", 2021, Some(3.0)),
            obs("Algeria", 2020, Some(2.0)),
        ];
        let out = aggregate(&rows, &regions());

        let row = |group: &str, year, temperature_change| AggregatedObservation {
            group: GroupLabel::Named(group.into()),
            year,
            temperature_change,
        };
        assert_eq!(
            out,
            vec![
                row("Africa", 2020, Some(2.0)),
                row("Africa", 2021, Some(3.0)),
                row("Europe", 2020, Some(1.5)),
                row("Europe", 2021, None),
            ]
        );
    }

    #[test]
    fn unmapped_countries_share_one_trailing_group() {
        let rows = vec![
            obs("Atlantis", 2020, Some(1.0)),
            obs("Lemuria", 2020, Some(3.0)),
            obs("Albania", 2020, Some(0.5)),
        ];
        let out = aggregate(&rows, &regions());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].group, GroupLabel::Named("Europe".into()));
        assert_eq!(out[1].group, GroupLabel::Unmapped);
        assert_eq!(out[1].temperature_change, Some(2.0));
    }

    #[test]
    fn country_level_keeps_countries_apart() {
        let rows = vec![obs("Albania", 2020, Some(1.0)), obs("Andorra", 2020, Some(2.0))];
        let out = aggregate(&rows, &CountryIdentity);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn empty_view_gives_empty_table() {
        let rows: Vec<Observation> = Vec::new();
        assert!(aggregate(&rows, &regions()).is_empty());
    }
}

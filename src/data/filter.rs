use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{Observation, ObservationTable};

// ---------------------------------------------------------------------------
// Filter parameters
// ---------------------------------------------------------------------------

/// Inclusive year range. Construction swaps reversed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: i32,
    pub end: i32,
}

impl DateRange {
    pub fn new(start: i32, end: i32) -> Self {
        DateRange {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Inclusive temperature-change range. Construction swaps reversed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureRange {
    pub lo: f64,
    pub hi: f64,
}

impl TemperatureRange {
    /// Bounds offered when the view holds no numeric value at all.
    pub const FALLBACK: TemperatureRange = TemperatureRange { lo: 0.0, hi: 1.0 };

    pub fn new(lo: f64, hi: f64) -> Self {
        if lo > hi {
            TemperatureRange { lo: hi, hi: lo }
        } else {
            TemperatureRange { lo, hi }
        }
    }

    /// Missing values never fall inside a range.
    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| self.lo <= v && v <= self.hi)
    }
}

// ---------------------------------------------------------------------------
// Filter – one pure predicate over a single observation
// ---------------------------------------------------------------------------

/// A single row predicate. Every variant looks at one observation only, so
/// any sequence of filters can be applied in any order.
#[derive(Debug, Clone)]
pub enum Filter<'a> {
    Date(DateRange),
    /// An empty set matches nothing.
    Countries(&'a BTreeSet<String>),
    Indicator(&'a str),
    Temperature(TemperatureRange),
}

impl Filter<'_> {
    pub fn matches(&self, obs: &Observation) -> bool {
        match self {
            Filter::Date(range) => range.contains(obs.year),
            Filter::Countries(set) => set.contains(obs.country()),
            Filter::Indicator(name) => obs.indicator() == *name,
            Filter::Temperature(range) => range.contains(obs.temperature_change),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterState – the five user-facing parameters minus aggregation level
// ---------------------------------------------------------------------------

/// Current filter selections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    pub date_range: DateRange,
    pub countries: BTreeSet<String>,
    pub indicator: String,
    /// `None` until the user sets a range; the predicate is inactive until then.
    pub temperature: Option<TemperatureRange>,
}

impl FilterState {
    /// Defaults for a freshly loaded table: the full year span, no countries
    /// selected, the first indicator and no temperature constraint.
    pub fn new(table: &ObservationTable) -> Self {
        let (start, end) = table.year_span().unwrap_or((0, 0));
        FilterState {
            date_range: DateRange::new(start, end),
            countries: BTreeSet::new(),
            indicator: table.indicators.first().cloned().unwrap_or_default(),
            temperature: None,
        }
    }

    /// Date, country and indicator predicates. The temperature bounds offered
    /// to the user are derived from the view these produce.
    pub fn upstream_filters(&self) -> Vec<Filter<'_>> {
        vec![
            Filter::Date(self.date_range),
            Filter::Countries(&self.countries),
            Filter::Indicator(&self.indicator),
        ]
    }

    /// Every active predicate.
    pub fn filters(&self) -> Vec<Filter<'_>> {
        let mut filters = self.upstream_filters();
        if let Some(range) = self.temperature {
            filters.push(Filter::Temperature(range));
        }
        filters
    }
}

// ---------------------------------------------------------------------------
// Applying filters
// ---------------------------------------------------------------------------

/// Keep the indices in `indices` whose observation passes `filter`.
pub fn narrow(table: &ObservationTable, indices: &[usize], filter: &Filter<'_>) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&i| filter.matches(&table.observations[i]))
        .collect()
}

/// Apply `filters` one after another, each narrowing the previous result.
pub fn apply_filters(table: &ObservationTable, filters: &[Filter<'_>]) -> Vec<usize> {
    let all: Vec<usize> = (0..table.len()).collect();
    filters
        .iter()
        .fold(all, |indices, filter| narrow(table, &indices, filter))
}

/// Return indices of observations that pass every active filter in `state`.
pub fn filtered_indices(table: &ObservationTable, state: &FilterState) -> Vec<usize> {
    apply_filters(table, &state.filters())
}

/// `[min, max]` of the valid values at `indices`, or
/// [`TemperatureRange::FALLBACK`] when there are none.
pub fn temperature_bounds(table: &ObservationTable, indices: &[usize]) -> TemperatureRange {
    let bounds = indices
        .iter()
        .filter_map(|&i| table.observations[i].temperature_change)
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });

    match bounds {
        Some((lo, hi)) => TemperatureRange::new(lo, hi),
        None => TemperatureRange::FALLBACK,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::model::RecordMetadata;

    fn obs(country: &str, indicator: &str, year: i32, value: Option<f64>) -> Observation {
        Observation {
            metadata: Arc::new(RecordMetadata {
                country: country.into(),
                indicator: indicator.into(),
                ..Default::default()
            }),
            year,
            temperature_change: value,
        }
    }

    fn table() -> ObservationTable {
        ObservationTable::from_observations(
            vec![
                obs("Albania", "Temp", 2019, Some(0.4)),
                obs("Albania", "Temp", 2020, Some(1.0)),
                obs("Albania", "Temp", 2021, None),
                obs("Algeria", "Temp", 2019, Some(-0.2)),
                obs("Algeria", "Temp", 2020, Some(2.0)),
                obs("Algeria", "Temp", 2021, Some(3.0)),
                obs("Algeria", "StdDev", 2020, Some(0.9)),
                obs("Andorra", "Temp", 2020, Some(1.5)),
            ],
            Vec::new(),
        )
    }

    fn countries(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_span_all_years_and_select_no_country() {
        let t = table();
        let state = FilterState::new(&t);
        assert_eq!(state.date_range, DateRange::new(2019, 2021));
        assert_eq!(state.indicator, "Temp");
        assert!(state.countries.is_empty());
        assert!(state.temperature.is_none());
    }

    #[test]
    fn empty_country_set_matches_nothing() {
        let t = table();
        let state = FilterState::new(&t);
        assert!(filtered_indices(&t, &state).is_empty());
    }

    #[test]
    fn filters_conjoin() {
        let t = table();
        let mut state = FilterState::new(&t);
        state.countries = countries(&["Albania", "Algeria"]);
        state.date_range = DateRange::new(2020, 2021);

        assert_eq!(filtered_indices(&t, &state), vec![1, 2, 4, 5]);

        state.temperature = Some(TemperatureRange::new(0.5, 2.0));
        assert_eq!(filtered_indices(&t, &state), vec![1, 4]);
    }

    #[test]
    fn filters_commute() {
        let t = table();
        let set = countries(&["Albania", "Algeria", "Andorra"]);
        let filters = [
            Filter::Date(DateRange::new(2020, 2021)),
            Filter::Countries(&set),
            Filter::Indicator("Temp"),
            Filter::Temperature(TemperatureRange::new(0.0, 2.5)),
        ];
        let expected = apply_filters(&t, &filters);
        assert_eq!(expected, vec![1, 4, 7]);

        // every permutation of the four filters
        let mut order = [0usize, 1, 2, 3];
        let mut count = 0;
        permute(&mut order, 0, &mut |perm| {
            let permuted: Vec<Filter<'_>> = perm.iter().map(|&i| filters[i].clone()).collect();
            assert_eq!(apply_filters(&t, &permuted), expected, "order {perm:?}");
            count += 1;
        });
        assert_eq!(count, 24);
    }

    fn permute(items: &mut [usize; 4], k: usize, visit: &mut dyn FnMut(&[usize; 4])) {
        if k == items.len() {
            visit(items);
            return;
        }
        for i in k..items.len() {
            items.swap(k, i);
            permute(items, k + 1, visit);
            items.swap(k, i);
        }
    }

    #[test]
    fn temperature_range_excludes_missing() {
        let range = TemperatureRange::new(-10.0, 10.0);
        assert!(!range.contains(None));
        assert!(range.contains(Some(10.0)));
        assert!(!range.contains(Some(10.01)));
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        assert_eq!(DateRange::new(2021, 2019), DateRange { start: 2019, end: 2021 });
        assert_eq!(TemperatureRange::new(2.0, -1.0), TemperatureRange { lo: -1.0, hi: 2.0 });
    }

    #[test]
    fn bounds_come_from_upstream_view() {
        let t = table();
        let mut state = FilterState::new(&t);
        state.countries = countries(&["Albania"]);
        let upstream = apply_filters(&t, &state.upstream_filters());
        assert_eq!(temperature_bounds(&t, &upstream), TemperatureRange::new(0.4, 1.0));

        state.date_range = DateRange::new(2021, 2021);
        let upstream = apply_filters(&t, &state.upstream_filters());
        assert_eq!(upstream, vec![2]);
        assert_eq!(temperature_bounds(&t, &upstream), TemperatureRange::FALLBACK);
    }
}

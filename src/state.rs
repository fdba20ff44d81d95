use std::collections::BTreeSet;

use serde::Serialize;

use crate::data::aggregate::{AggregatedObservation, aggregate};
use crate::data::filter::{
    DateRange, FilterState, TemperatureRange, apply_filters, filtered_indices, temperature_bounds,
};
use crate::data::model::{Observation, ObservationTable};
use crate::data::region::{AggregationLevel, RegionCatalog};
use crate::data::stats::{Statistics, summarize};
use crate::data::views::{
    Comparison, CountrySeries, Heatmap, MapFrame, SelectionOptions, comparison, heatmap, map_frames,
    time_series,
};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything one exploration session owns, independent of rendering.
pub struct Session {
    /// Loaded dataset; never changes after construction.
    table: ObservationTable,

    /// Lookup tables for the aggregation levels.
    regions: RegionCatalog,

    /// Current filter selections.
    pub filters: FilterState,

    /// Which lookup feeds the aggregated table.
    pub level: AggregationLevel,

    /// Indices of observations passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Temperature bounds offered for the current upstream selection (cached).
    pub temperature_bounds: TemperatureRange,
}

impl Session {
    /// Start a session with default filters.
    pub fn new(table: ObservationTable, regions: RegionCatalog) -> Self {
        let filters = FilterState::new(&table);
        let mut session = Session {
            table,
            regions,
            filters,
            level: AggregationLevel::default(),
            visible_indices: Vec::new(),
            temperature_bounds: TemperatureRange::FALLBACK,
        };
        session.refilter();
        session
    }

    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    /// Recompute the temperature bounds and `visible_indices` after a
    /// parameter change.
    pub fn refilter(&mut self) {
        let upstream = apply_filters(&self.table, &self.filters.upstream_filters());
        self.temperature_bounds = temperature_bounds(&self.table, &upstream);
        self.visible_indices = filtered_indices(&self.table, &self.filters);

        log::debug!(
            "Filtered view: {} of {} observations (bounds {:?})",
            self.visible_indices.len(),
            self.table.len(),
            self.temperature_bounds
        );
        if self.visible_indices.is_empty() {
            log::info!("Current selection matches no observations");
        }
    }

    pub fn set_date_range(&mut self, start: i32, end: i32) {
        self.filters.date_range = DateRange::new(start, end);
        self.refilter();
    }

    /// Replace the country selection. An empty set shows nothing.
    pub fn set_countries<I, S>(&mut self, countries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.countries = countries.into_iter().map(Into::into).collect();
        self.refilter();
    }

    /// Toggle a single country in the selection.
    pub fn toggle_country(&mut self, country: &str) {
        if !self.filters.countries.remove(country) {
            self.filters.countries.insert(country.to_string());
        }
        self.refilter();
    }

    /// Select all countries.
    pub fn select_all_countries(&mut self) {
        self.filters.countries = self.table.countries.iter().cloned().collect();
        self.refilter();
    }

    /// Deselect all countries.
    pub fn select_no_countries(&mut self) {
        self.filters.countries = BTreeSet::new();
        self.refilter();
    }

    pub fn set_indicator(&mut self, indicator: &str) {
        if !self.table.indicators.iter().any(|i| i == indicator) {
            log::warn!("Indicator '{indicator}' does not occur in the dataset");
        }
        self.filters.indicator = indicator.to_string();
        self.refilter();
    }

    /// Non-finite bounds are ignored and leave the current range in place.
    pub fn set_temperature_range(&mut self, lo: f64, hi: f64) {
        if !lo.is_finite() || !hi.is_finite() {
            log::warn!("Ignoring non-finite temperature range [{lo}, {hi}]");
            return;
        }
        self.filters.temperature = Some(TemperatureRange::new(lo, hi));
        self.refilter();
    }

    pub fn clear_temperature_range(&mut self) {
        self.filters.temperature = None;
        self.refilter();
    }

    pub fn set_aggregation_level(&mut self, level: AggregationLevel) {
        self.level = level;
    }

    /// Rows of the filtered view, in table order.
    pub fn visible(&self) -> Vec<&Observation> {
        self.visible_indices
            .iter()
            .map(|&i| &self.table.observations[i])
            .collect()
    }

    /// Derive every output for the current parameters.
    pub fn snapshot(&self) -> Snapshot<'_> {
        let rows = self.visible();
        let lookup = self.regions.lookup_for(self.level);

        Snapshot {
            filters: &self.filters,
            level: self.level,
            temperature_bounds: self.temperature_bounds,
            empty_selection: rows.is_empty(),
            aggregated: aggregate(rows.iter().copied(), lookup),
            statistics: summarize(rows.iter().map(|o| o.temperature_change)),
            time_series: time_series(rows.iter().copied()),
            heatmap: heatmap(rows.iter().copied()),
            comparison: comparison(rows.iter().copied(), &self.filters.countries),
            map_frames: map_frames(rows.iter().copied()),
            options: SelectionOptions::from_table(&self.table),
            filtered: rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot – the outputs handed to the presentation layer
// ---------------------------------------------------------------------------

/// Read-only outputs derived from one set of parameters.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub filters: &'a FilterState,
    pub level: AggregationLevel,
    pub temperature_bounds: TemperatureRange,
    /// The filters matched nothing.
    pub empty_selection: bool,
    pub filtered: Vec<&'a Observation>,
    pub aggregated: Vec<AggregatedObservation>,
    pub statistics: Statistics,
    pub time_series: Vec<CountrySeries>,
    pub heatmap: Heatmap,
    pub comparison: Comparison,
    pub map_frames: Vec<MapFrame>,
    pub options: SelectionOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::data::region::GroupLabel;
    use crate::data::reshape::melt;
    use std::path::Path;

    const HEADER: &str = "ObjectId,Country,ISO2,ISO3,Indicator,Unit,Source,\
                          CTS_Code,CTS_Name,CTS_Full_Descriptor,F2020,F2021";
    const DESCRIPTOR: &str =
        "Temperature change,Degree Celsius,FAO,ECCS,Surface Temperature Change,Environment";

    fn session() -> Session {
        let csv = format!(
            "{HEADER}\n\
             1,Albania,AL,ALB,{DESCRIPTOR},1.0,NA\n\
             2,Algeria,DZ,DZA,{DESCRIPTOR},2.0,3.0\n"
        );
        let raw = read_csv(csv.as_bytes(), Path::new("scenario.csv")).unwrap();
        Session::new(melt(&raw), RegionCatalog::builtin().unwrap())
    }

    #[test]
    fn albania_algeria_scenario() {
        let mut s = session();
        s.set_countries(["Albania", "Algeria"]);
        s.set_indicator("Temperature change");
        s.set_date_range(2020, 2021);
        s.set_aggregation_level(AggregationLevel::Region);

        let snap = s.snapshot();
        assert_eq!(snap.filtered.len(), 4);
        assert_eq!(snap.filtered.iter().filter(|o| o.temperature_change.is_none()).count(), 1);

        let agg: Vec<(GroupLabel, i32, Option<f64>)> = snap
            .aggregated
            .iter()
            .map(|a| (a.group.clone(), a.year, a.temperature_change))
            .collect();
        let named = |s: &str| GroupLabel::Named(s.into());
        assert_eq!(
            agg,
            vec![
                (named("Africa"), 2020, Some(2.0)),
                (named("Africa"), 2021, Some(3.0)),
                (named("Europe"), 2020, Some(1.0)),
                (named("Europe"), 2021, None),
            ]
        );

        assert_eq!(snap.statistics.count, 3);
        assert_eq!(snap.statistics.mean, Some(2.0));
        assert_eq!(snap.statistics.min, Some(1.0));
        assert_eq!(snap.statistics.max, Some(3.0));
        assert!(!snap.empty_selection);
        assert!(matches!(snap.comparison, Comparison::Ready { .. }));
    }

    #[test]
    fn fresh_session_shows_nothing() {
        let s = session();
        let snap = s.snapshot();
        assert!(snap.empty_selection);
        assert!(snap.filtered.is_empty());
        assert!(snap.aggregated.is_empty());
        assert_eq!(snap.statistics.mean, None);
        assert_eq!(snap.temperature_bounds, TemperatureRange::FALLBACK);
        assert_eq!(snap.options.countries, vec!["Albania", "Algeria"]);
        assert_eq!(snap.options.years, vec![2020, 2021]);
    }

    #[test]
    fn temperature_range_narrows_and_bounds_follow_upstream() {
        let mut s = session();
        s.select_all_countries();
        assert_eq!(s.temperature_bounds, TemperatureRange::new(1.0, 3.0));

        s.set_temperature_range(1.5, 2.5);
        assert_eq!(s.visible().len(), 1);
        // bounds are derived before the temperature filter
        assert_eq!(s.temperature_bounds, TemperatureRange::new(1.0, 3.0));

        s.clear_temperature_range();
        assert_eq!(s.visible().len(), 4);
    }

    #[test]
    fn non_finite_temperature_range_is_ignored() {
        let mut s = session();
        s.select_all_countries();
        s.set_temperature_range(f64::NAN, 1.0);
        assert_eq!(s.filters.temperature, None);
        assert_eq!(s.visible().len(), 4);

        s.set_temperature_range(1.5, 2.5);
        s.set_temperature_range(0.0, f64::INFINITY);
        assert_eq!(s.filters.temperature, Some(TemperatureRange::new(1.5, 2.5)));
        assert_eq!(s.visible().len(), 1);
    }

    #[test]
    fn toggling_countries() {
        let mut s = session();
        s.toggle_country("Algeria");
        assert_eq!(s.visible().len(), 2);
        s.toggle_country("Algeria");
        assert!(s.visible().is_empty());
        s.select_all_countries();
        s.select_no_countries();
        assert!(s.visible().is_empty());
    }

    #[test]
    fn continent_and_country_levels() {
        let mut s = session();
        s.select_all_countries();
        s.set_aggregation_level(AggregationLevel::Country);
        let snap = s.snapshot();
        assert_eq!(snap.aggregated[0].group, GroupLabel::Named("Albania".into()));

        s.set_aggregation_level(AggregationLevel::Continent);
        let snap = s.snapshot();
        assert_eq!(snap.aggregated.len(), 4);
    }

    #[test]
    fn unknown_indicator_is_an_empty_selection() {
        let mut s = session();
        s.select_all_countries();
        s.set_indicator("Precipitation");
        assert!(s.snapshot().empty_selection);
    }
}

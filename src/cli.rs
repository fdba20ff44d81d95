use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::data::region::AggregationLevel;
use crate::state::Session;

#[derive(Parser, Debug)]
#[command(
    name = "climate-explorer",
    about = "Reshape, filter and aggregate a wide-format climate indicator table"
)]
pub struct Cli {
    /// Wide-format table to load (CSV, JSON or Parquet)
    #[arg(env = "CLIMATE_DATA")]
    pub file: PathBuf,

    /// First year to include. Defaults to the earliest year in the data.
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year to include. Defaults to the latest year in the data.
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Country to include; repeat for several. No country means no rows.
    #[arg(short, long = "country", value_name = "COUNTRY")]
    pub countries: Vec<String>,

    /// Include every country in the dataset
    #[arg(long, conflicts_with = "countries")]
    pub all_countries: bool,

    /// Indicator to show. Defaults to the first indicator in the data.
    #[arg(short, long)]
    pub indicator: Option<String>,

    /// Lower temperature-change bound (requires --max-temp)
    #[arg(
        long,
        requires = "max_temp",
        allow_negative_numbers = true,
        value_parser = finite_f64
    )]
    pub min_temp: Option<f64>,

    /// Upper temperature-change bound (requires --min-temp)
    #[arg(
        long,
        requires = "min_temp",
        allow_negative_numbers = true,
        value_parser = finite_f64
    )]
    pub max_temp: Option<f64>,

    /// Grouping used for the aggregated table
    #[arg(short, long, value_enum, default_value_t = AggregationLevel::Region)]
    pub level: AggregationLevel,

    /// CSV file with Country,Region,Continent columns replacing the built-in table
    #[arg(long, env = "CLIMATE_REGIONS")]
    pub regions: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Accepts any number except NaN and the infinities.
fn finite_f64(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{s} is not a finite number"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Push the command-line selections into the session.
    pub fn apply(&self, session: &mut Session) {
        if self.start_year.is_some() || self.end_year.is_some() {
            let current = session.filters.date_range;
            session.set_date_range(
                self.start_year.unwrap_or(current.start),
                self.end_year.unwrap_or(current.end),
            );
        }

        if self.all_countries {
            session.select_all_countries();
        } else {
            session.set_countries(self.countries.iter().cloned());
        }

        if let Some(indicator) = &self.indicator {
            session.set_indicator(indicator);
        }

        if let (Some(lo), Some(hi)) = (self.min_temp, self.max_temp) {
            session.set_temperature_range(lo, hi);
        }

        session.set_aggregation_level(self.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ObservationTable;
    use crate::data::region::RegionCatalog;

    #[test]
    fn parses_repeated_countries_and_ranges() {
        let cli = Cli::try_parse_from([
            "climate-explorer",
            "data.csv",
            "-c",
            "Albania",
            "--country",
            "Algeria",
            "--start-year",
            "2020",
            "--min-temp",
            "-1.5",
            "--max-temp",
            "2",
            "--level",
            "continent",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.countries, vec!["Albania", "Algeria"]);
        assert_eq!(cli.start_year, Some(2020));
        assert_eq!(cli.end_year, None);
        assert_eq!(cli.min_temp, Some(-1.5));
        assert_eq!(cli.level, AggregationLevel::Continent);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn temperature_bounds_come_in_pairs() {
        let err = Cli::try_parse_from(["climate-explorer", "data.csv", "--min-temp", "0"]);
        assert!(err.is_err());
    }

    #[test]
    fn temperature_bounds_must_be_finite() {
        for bad in ["NaN", "inf", "-inf"] {
            let err = Cli::try_parse_from([
                "climate-explorer",
                "data.csv",
                "--min-temp",
                bad,
                "--max-temp",
                "1",
            ]);
            assert!(err.is_err(), "{bad} accepted");
        }
        let err = Cli::try_parse_from([
            "climate-explorer",
            "data.csv",
            "--min-temp",
            "0",
            "--max-temp",
            "warm",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn all_countries_conflicts_with_explicit_list() {
        let err = Cli::try_parse_from([
            "climate-explorer",
            "data.csv",
            "--all-countries",
            "-c",
            "Albania",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn apply_keeps_unset_year_bound() {
        let cli =
            Cli::try_parse_from(["climate-explorer", "data.csv", "--end-year", "1990"]).unwrap();
        let mut session = Session::new(ObservationTable::default(), RegionCatalog::default());
        session.filters.date_range = crate::data::filter::DateRange::new(1961, 2022);
        cli.apply(&mut session);
        assert_eq!(session.filters.date_range.start, 1961);
        assert_eq!(session.filters.date_range.end, 1990);
    }
}

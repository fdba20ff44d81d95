use std::sync::Arc;

use super::error::ParseWarning;
use super::model::{Observation, ObservationTable, RawTable};

/// Extract the year from a value-column label such as `F1961`.
///
/// The year is the first maximal run of ASCII digits in the label. Labels
/// without a digit run, or whose run is not a year in `1..=9999`, are
/// rejected with [`ParseWarning::InvalidYearLabel`]; the reshaper skips such
/// columns.
pub fn parse_year_label(label: &str) -> Result<i32, ParseWarning> {
    let invalid = || ParseWarning::InvalidYearLabel {
        label: label.to_string(),
    };

    let start = label.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
    let digits = &label[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<i32>() {
        Ok(year) if (1..=9999).contains(&year) => Ok(year),
        _ => Err(invalid()),
    }
}

/// Melt the wide table into one observation per (record, year column).
///
/// Observations are emitted record-major: all years of the first record,
/// then all years of the second, and so on. Cells that fail numeric
/// coercion become `None` and are tallied per column as warnings. A record
/// with fewer cells than there are value columns reads as missing past its
/// end.
pub fn melt(raw: &RawTable) -> ObservationTable {
    let mut warnings = Vec::new();

    // (position in RawRecord::values, year)
    let mut year_columns = Vec::with_capacity(raw.value_columns.len());
    for (pos, label) in raw.value_columns.iter().enumerate() {
        match parse_year_label(label) {
            Ok(year) => year_columns.push((pos, year)),
            Err(w) => {
                log::warn!("{w}");
                warnings.push(w);
            }
        }
    }

    let mut non_numeric = vec![0usize; raw.value_columns.len()];
    let mut observations = Vec::with_capacity(raw.len() * year_columns.len());

    for record in &raw.records {
        let metadata = Arc::new(record.metadata.clone());
        for &(pos, year) in &year_columns {
            let temperature_change = match record.values.get(pos) {
                Some(cell) => {
                    let value = cell.to_temperature();
                    if value.is_none() && !cell.is_null() {
                        non_numeric[pos] += 1;
                    }
                    value
                }
                None => None,
            };
            observations.push(Observation {
                metadata: Arc::clone(&metadata),
                year,
                temperature_change,
            });
        }
    }

    for (pos, count) in non_numeric.into_iter().enumerate() {
        if count > 0 {
            let w = ParseWarning::NonNumericValues {
                label: raw.value_columns[pos].clone(),
                count,
            };
            log::debug!("{w}");
            warnings.push(w);
        }
    }

    log::info!(
        "Reshaped {} records x {} year columns into {} observations",
        raw.len(),
        year_columns.len(),
        observations.len()
    );

    ObservationTable::from_observations(observations, warnings)
}

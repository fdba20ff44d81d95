use std::fmt::Write as _;

use anyhow::{Context, Result};

use crate::data::stats::ShowStat;
use crate::data::views::Comparison;
use crate::state::Snapshot;

/// Pretty-printed JSON of the whole snapshot.
pub fn to_json(snapshot: &Snapshot<'_>) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("serializing snapshot")
}

/// Plain-text summary for terminals.
pub fn to_text(snapshot: &Snapshot<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_text(&mut out, snapshot);
    out
}

fn write_text(out: &mut String, snap: &Snapshot<'_>) -> std::fmt::Result {
    let f = snap.filters;
    writeln!(out, "Indicator:   {}", f.indicator)?;
    writeln!(out, "Years:       {} to {}", f.date_range.start, f.date_range.end)?;
    let countries: Vec<&str> = f.countries.iter().map(String::as_str).collect();
    let countries = if countries.is_empty() {
        "(none)".to_string()
    } else {
        countries.join(", ")
    };
    writeln!(out, "Countries:   {countries}")?;
    let shown = f.temperature.unwrap_or(snap.temperature_bounds);
    let note = if f.temperature.is_some() { "" } else { " (available range, not applied)" };
    writeln!(out, "Temperature: {:.2} to {:.2}{note}", shown.lo, shown.hi)?;
    writeln!(out)?;

    if snap.empty_selection {
        writeln!(out, "no data: the current selection matches no observations")?;
    } else {
        writeln!(out, "Filtered view: {} observations", snap.filtered.len())?;
    }

    let s = &snap.statistics;
    writeln!(out)?;
    writeln!(out, "Statistical measures ({} values, {} missing)", s.count, s.missing)?;
    writeln!(out, "  Mean:     {}", ShowStat(s.mean))?;
    writeln!(out, "  Median:   {}", ShowStat(s.median))?;
    writeln!(out, "  Std dev:  {}", ShowStat(s.std_dev))?;
    writeln!(out, "  Max:      {}", ShowStat(s.max))?;
    writeln!(out, "  Min:      {}", ShowStat(s.min))?;

    writeln!(out)?;
    writeln!(out, "Mean temperature change by {}", snap.level)?;
    if snap.aggregated.is_empty() {
        writeln!(out, "  no data")?;
    }
    for row in &snap.aggregated {
        writeln!(
            out,
            "  {:<24} {:>6}  {}",
            row.group.to_string(),
            row.year,
            ShowStat(row.temperature_change)
        )?;
    }

    writeln!(out)?;
    match &snap.comparison {
        Comparison::Ready { left, right } => {
            writeln!(
                out,
                "Comparison: {} (mean {}) vs {} (mean {})",
                left.country,
                ShowStat(left.statistics.mean),
                right.country,
                ShowStat(right.statistics.mean)
            )?;
        }
        Comparison::NeedsTwoCountries { selected } => {
            writeln!(out, "Comparison: select exactly 2 countries ({selected} selected)")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ObservationTable;
    use crate::data::region::RegionCatalog;
    use crate::state::Session;

    #[test]
    fn empty_selection_reads_as_no_data() {
        let session = Session::new(ObservationTable::default(), RegionCatalog::default());
        let text = to_text(&session.snapshot());
        assert!(text.contains("no data"), "{text}");
        assert!(text.contains("Mean:     undefined"), "{text}");
        assert!(text.contains("select exactly 2 countries (0 selected)"), "{text}");
    }

    #[test]
    fn json_uses_null_for_undefined_statistics() {
        let session = Session::new(ObservationTable::default(), RegionCatalog::default());
        let rendered = to_json(&session.snapshot()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(json["statistics"]["mean"].is_null());
        assert_eq!(json["empty_selection"], serde_json::Value::Bool(true));
        assert_eq!(json["comparison"]["status"], "needs_two_countries");
    }
}

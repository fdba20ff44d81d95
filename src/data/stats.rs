use std::fmt;

use serde::Serialize;

/// Descriptive statistics over the valid values of a column. Each field is
/// `None` ("undefined") when it cannot be computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    /// Number of valid values.
    pub count: usize,
    /// Number of missing values skipped.
    pub missing: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (n - 1 denominator); needs two values.
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Summarize `values`, ignoring missing entries.
pub fn summarize<I>(values: I) -> Statistics
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut missing = 0;
    let mut vals: Vec<f64> = Vec::new();
    for v in values {
        match v {
            Some(v) if v.is_finite() => vals.push(v),
            _ => missing += 1,
        }
    }
    vals.sort_by(f64::total_cmp);

    let count = vals.len();
    if count == 0 {
        return Statistics {
            missing,
            ..Default::default()
        };
    }

    let mean = vals.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 1 {
        vals[count / 2]
    } else {
        (vals[count / 2 - 1] + vals[count / 2]) / 2.0
    };
    let std_dev = (count > 1).then(|| {
        let ss: f64 = vals.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    Statistics {
        count,
        missing,
        mean: Some(mean),
        median: Some(median),
        std_dev,
        min: vals.first().copied(),
        max: vals.last().copied(),
    }
}

/// Renders a statistic for display: the number, or `undefined`.
pub struct ShowStat(pub Option<f64>);

impl fmt::Display for ShowStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.4}"),
            None => write!(f, "undefined"),
        }
    }
}

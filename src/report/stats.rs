// src/report/stats.rs
//
// Plain numeric helpers over f64 slices. Kept explicit rather than delegated
// so the pandas conventions the outputs follow (ddof = 1, linearly
// interpolated quantiles, empty cells for degenerate results) stay visible
// and unit-testable.

use anyhow::{Context, Result};
use polars::prelude::*;

/// Statistic rows of the summary table, in output order.
const SUMMARY_ROWS: &[&str] = &["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Sample standard deviation (ddof = 1); undefined below two points.
pub fn std_dev(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    Some((ss / (xs.len() - 1) as f64).sqrt())
}

/// Linearly interpolated quantile, `q` in [0, 1].
pub fn quantile(xs: &[f64], q: f64) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if lo + 1 < sorted.len() {
        Some(sorted[lo] + frac * (sorted[lo + 1] - sorted[lo]))
    } else {
        Some(sorted[lo])
    }
}

/// Pearson correlation; None when either side is degenerate (fewer than two
/// points or zero variance), mirroring the empty cells pandas emits.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let ma = mean(&a[..n])?;
    let mb = mean(&b[..n])?;
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for i in 0..n {
        let da = a[i] - ma;
        let db = b[i] - mb;
        cov += da * db;
        va += da * da;
        vb += db * db;
    }
    let denom = (va * vb).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        None
    } else {
        Some(cov / denom)
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Non-null values of a column as f64.
pub fn numeric_values(column: &Column) -> Result<Vec<f64>> {
    let casted = column
        .cast(&DataType::Float64)
        .with_context(|| format!("casting {} for statistics", column.name()))?;
    Ok(casted.f64()?.into_iter().flatten().collect())
}

/// Descriptive statistics of every numeric column: one row per statistic,
/// one column per variable.
pub fn summary_stats(df: &DataFrame) -> Result<DataFrame> {
    let mut columns: Vec<Column> = vec![Column::new(
        "statistic".into(),
        SUMMARY_ROWS.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
    )];

    for c in df.get_columns() {
        if !is_numeric(c.dtype()) {
            continue;
        }
        let xs = numeric_values(c)?;
        let stats: Vec<Option<f64>> = vec![
            Some(xs.len() as f64),
            mean(&xs),
            std_dev(&xs),
            xs.iter().copied().reduce(f64::min),
            quantile(&xs, 0.25),
            quantile(&xs, 0.50),
            quantile(&xs, 0.75),
            xs.iter().copied().reduce(f64::max),
        ];
        columns.push(Column::new(c.name().clone(), stats));
    }

    DataFrame::new(columns).context("assembling the summary table")
}

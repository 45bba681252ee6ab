// src/report/mod.rs

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

pub mod heatmap;
pub mod stats;

use crate::transform::clean::CleanOutput;
use crate::transform::select::TARGET_INDICATOR;

pub const CLEANED_FILE: &str = "data_final.csv";
pub const SUMMARY_FILE: &str = "summary_stats.csv";
pub const CORR_FILE: &str = "corr_matrix.csv";
pub const MISSINGNESS_FILE: &str = "missingness_variable.csv";
pub const COUNTRY_COUNTS_FILE: &str = "country_counts.csv";
pub const YEAR_COUNTS_FILE: &str = "year_counts.csv";
pub const HEATMAP_FILE: &str = "corr_heatmap.jpeg";

/// The design-matrix correlation diagnostics: the exportable square matrix
/// and its raw form for rendering.
pub struct Diagnostics {
    pub corr: DataFrame,
    pub labels: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
}

/// One-hot encode the categorical keys, drop incomplete rows, and correlate
/// every design-matrix column against every other.
pub fn correlation_diagnostics(cleaned: &DataFrame) -> Result<Diagnostics> {
    // the encoder wants plain strings, not dictionary codes
    let materialized = cleaned
        .clone()
        .lazy()
        .with_column(col("country").cast(DataType::String))
        .collect()
        .context("materializing country names")?;
    let encoded = materialized
        .columns_to_dummies(vec!["country", "year"], None, false)
        .context("one-hot encoding country and year")?;
    let complete = encoded
        .lazy()
        .drop_nulls(None)
        .collect()
        .context("dropping incomplete rows before correlation")?;

    let design = complete.drop_many([TARGET_INDICATOR].iter().copied());
    let labels: Vec<String> = design
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let mut values: Vec<Vec<f64>> = Vec::with_capacity(design.width());
    for c in design.get_columns() {
        values.push(stats::numeric_values(c)?);
    }

    let n = labels.len();
    let mut matrix: Vec<Vec<Option<f64>>> = vec![vec![None; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let r = stats::pearson(&values[i], &values[j]);
            // pin the diagonal of non-degenerate columns to exactly one
            let r = if i == j { r.map(|_| 1.0) } else { r };
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(n + 1);
    columns.push(Column::new("variable".into(), labels.clone()));
    for (j, name) in labels.iter().enumerate() {
        let col_vals: Vec<Option<f64>> = (0..n).map(|i| matrix[i][j]).collect();
        columns.push(Column::new(name.as_str().into(), col_vals));
    }
    let corr = DataFrame::new(columns).context("assembling the correlation matrix")?;

    Ok(Diagnostics {
        corr,
        labels,
        matrix,
    })
}

/// Lower-triangular |r| sweep: log the strongest pairwise correlation as a
/// multicollinearity aid. Never persisted; the export contract is six files.
pub fn log_strongest_pair(labels: &[String], matrix: &[Vec<Option<f64>>]) {
    let mut best: Option<(f64, usize, usize)> = None;
    for i in 0..labels.len() {
        for j in 0..i {
            let v = matrix[i][j].map(f64::abs).unwrap_or(0.0);
            if best.map_or(true, |(b, _, _)| v > b) {
                best = Some((v, i, j));
            }
        }
    }
    if let Some((v, i, j)) = best {
        info!(
            a = %labels[i],
            b = %labels[j],
            abs_r = v,
            "strongest pairwise correlation in the design matrix"
        );
    }
}

pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut df = df.clone();
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Write the six tabular outputs. The heatmap is rendered separately.
pub fn write_outputs(
    out_dir: &Path,
    clean: &CleanOutput,
    summary: &DataFrame,
    corr: &DataFrame,
) -> Result<()> {
    write_csv(&clean.cleaned, &out_dir.join(CLEANED_FILE))?;
    write_csv(summary, &out_dir.join(SUMMARY_FILE))?;
    write_csv(corr, &out_dir.join(CORR_FILE))?;
    write_csv(&clean.missingness, &out_dir.join(MISSINGNESS_FILE))?;
    write_csv(&clean.country_counts, &out_dir.join(COUNTRY_COUNTS_FILE))?;
    write_csv(&clean.year_counts, &out_dir.join(YEAR_COUNTS_FILE))?;
    info!(dir = %out_dir.display(), "outputs written");
    Ok(())
}

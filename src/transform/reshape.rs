// src/transform/reshape.rs

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

/// Stack the two normalized long tables and sort by (indicator, country,
/// year). The sort keeps diagnostics reproducible and, being stable, fixes
/// the winner when the pivot hits duplicate observations.
pub fn to_long(silac: DataFrame, lmw: DataFrame) -> Result<DataFrame> {
    let long = concat([silac.lazy(), lmw.lazy()], UnionArgs::default())
        .context("stacking the long tables")?
        .sort(
            ["indicator", "country", "year"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()
        .context("sorting the long table")?;
    debug!(rows = long.height(), "long table assembled");
    Ok(long)
}

/// Pivot the long table into one row per (country, year) with one column per
/// indicator, columns in alphabetical order. A duplicate (country, year,
/// indicator) observation keeps its last value in sorted order; an absent one
/// yields a missing cell.
pub fn to_wide(long: DataFrame) -> Result<DataFrame> {
    let mut indicators: Vec<String> = long
        .column("indicator")?
        .str()?
        .unique()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    indicators.sort();

    let aggs: Vec<Expr> = indicators
        .iter()
        .map(|name| {
            col("value")
                .filter(col("indicator").eq(lit(name.as_str())))
                .last()
                .alias(name.as_str())
        })
        .collect();

    long.lazy()
        .group_by_stable([col("country"), col("year")])
        .agg(aggs)
        .sort(["country", "year"], SortMultipleOptions::default())
        .collect()
        .context("pivoting the long table to wide")
}

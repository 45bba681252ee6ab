// src/transform/clean.rs

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

use crate::transform::select::TARGET_INDICATOR;

/// A retained column may carry at most this share of missing values
/// (strictly above drops; exactly at the bound stays).
pub const MAX_COLUMN_MISSINGNESS: f64 = 0.05;
/// A country needs at least this many observations to stay in the sample.
pub const MIN_COUNTRY_OBSERVATIONS: u32 = 10;
/// Venezuelan statistics after the 2014 crisis year are excluded: the
/// hyperinflation distorts several predictor distributions and the series
/// quality deteriorates.
pub const VENEZUELA_LAST_YEAR: i32 = 2014;

/// The cleaned table plus the diagnostic series captured mid-clean, at the
/// same points where the pruning decisions were taken.
pub struct CleanOutput {
    pub cleaned: DataFrame,
    /// Per-column missing fraction after the target-row drop, covering the
    /// columns later dropped by the missingness rule as well.
    pub missingness: DataFrame,
    /// Row counts per country before the thin-country drop.
    pub country_counts: DataFrame,
    /// Row counts per year after the thin-country drop, before the Venezuela
    /// cutoff.
    pub year_counts: DataFrame,
}

fn value_counts(df: &DataFrame, key: &str) -> Result<DataFrame> {
    df.clone()
        .lazy()
        .group_by([col(key)])
        .agg([len().alias("count")])
        .sort_by_exprs(
            [col("count"), col(key)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()
        .with_context(|| format!("counting rows per {key}"))
}

/// Prune the feature table. Step order matters: every threshold is evaluated
/// against the output of the previous step.
pub fn clean(features: DataFrame) -> Result<CleanOutput> {
    // 1) rows without the target carry no label
    let df = features
        .lazy()
        .filter(col(TARGET_INDICATOR).is_not_null())
        .collect()
        .context("dropping rows with a missing target")?;

    // 2) column missingness over the remaining rows
    let rows = df.height() as f64;
    let mut names: Vec<String> = Vec::with_capacity(df.width());
    let mut fractions: Vec<f64> = Vec::with_capacity(df.width());
    for c in df.get_columns() {
        names.push(c.name().to_string());
        fractions.push(if rows == 0.0 {
            0.0
        } else {
            c.null_count() as f64 / rows
        });
    }
    let missingness = DataFrame::new(vec![
        Column::new("variable".into(), names.clone()),
        Column::new("missingness".into(), fractions.clone()),
    ])
    .context("assembling the missingness series")?;

    let over_threshold: Vec<&str> = names
        .iter()
        .zip(&fractions)
        .filter(|(_, f)| **f > MAX_COLUMN_MISSINGNESS)
        .map(|(n, _)| n.as_str())
        .collect();
    info!(columns = ?over_threshold, "dropping columns above the missingness bound");
    let df = df.drop_many(over_threshold.iter().copied());

    // 3) countries with a thin sample
    let country_counts = value_counts(&df, "country")?;
    let keep = country_counts
        .clone()
        .lazy()
        .filter(col("count").gt_eq(lit(MIN_COUNTRY_OBSERVATIONS)))
        .select([col("country").cast(DataType::String)])
        .collect()
        .context("listing countries with enough observations")?;
    let keep: Vec<String> = keep
        .column("country")?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    let keep_expr = keep
        .iter()
        .fold(lit(false), |acc, c| acc.or(col("country").eq(lit(c.as_str()))));
    let df = df
        .lazy()
        .filter(keep_expr)
        .collect()
        .context("dropping thin countries")?;

    let year_counts = value_counts(&df, "year")?;

    // 4) the Venezuela cutoff
    let mut df = df
        .lazy()
        .filter(
            col("country")
                .eq(lit("Venezuela"))
                .and(col("year").gt(lit(VENEZUELA_LAST_YEAR)))
                .not(),
        )
        .collect()
        .context("applying the Venezuela cutoff")?;

    // 5) YoY inflation, not a price level, hence the explicit names
    if df.get_column_names().iter().any(|n| n.as_str() == "CPI") {
        df.rename("CPI", "inflation".into())
            .context("renaming CPI")?;
    }
    if df.get_column_names().iter().any(|n| n.as_str() == "CPI_1") {
        df.rename("CPI_1", "inflation_minus_1".into())
            .context("renaming CPI_1")?;
    }

    Ok(CleanOutput {
        cleaned: df,
        missingness,
        country_counts,
        year_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 40 labeled rows (Argentina 20, Venezuela 15, Uruguay 5) plus two
    /// unlabeled rows; `keepme` misses 2/40 = 5%, `dropme` misses 3/40 = 7.5%.
    fn feature_frame() -> DataFrame {
        let mut country: Vec<&str> = Vec::new();
        let mut year: Vec<i32> = Vec::new();
        let mut target: Vec<Option<f64>> = Vec::new();
        let mut keepme: Vec<Option<f64>> = Vec::new();
        let mut dropme: Vec<Option<f64>> = Vec::new();

        for i in 0..20 {
            country.push("Argentina");
            year.push(2000 + i);
            target.push(Some(0.2));
            keepme.push(if i < 2 { None } else { Some(1.0) });
            dropme.push(if i < 3 { None } else { Some(1.0) });
        }
        for i in 0..15 {
            country.push("Venezuela");
            year.push(2002 + i);
            target.push(Some(0.3));
            keepme.push(Some(1.0));
            dropme.push(Some(1.0));
        }
        for i in 0..5 {
            country.push("Uruguay");
            year.push(2010 + i);
            target.push(Some(0.4));
            keepme.push(Some(1.0));
            dropme.push(Some(1.0));
        }
        // unlabeled rows disappear before any threshold is evaluated
        for y in [2030, 2031] {
            country.push("Argentina");
            year.push(y);
            target.push(None);
            keepme.push(Some(1.0));
            dropme.push(Some(1.0));
        }

        let n = country.len();
        df!(
            "country" => country,
            "year" => year,
            "CPI" => vec![Some(0.1f64); n],
            "CPI_1" => vec![Some(0.1f64); n],
            "keepme" => keepme,
            "dropme" => dropme,
            "ninis_2_15_24" => target,
        )
        .unwrap()
    }

    #[test]
    fn missingness_bound_is_strictly_greater_than() -> Result<()> {
        let out = clean(feature_frame())?;

        let cols: Vec<&str> = out
            .cleaned
            .get_column_names()
            .iter()
            .map(|n| n.as_str())
            .collect();
        assert!(cols.contains(&"keepme"), "exactly 5% missing is retained");
        assert!(!cols.contains(&"dropme"), "7.5% missing is dropped");

        let dropme_row = out
            .missingness
            .clone()
            .lazy()
            .filter(col("variable").eq(lit("dropme")))
            .collect()?;
        assert_eq!(dropme_row.column("missingness")?.f64()?.get(0), Some(0.075));
        Ok(())
    }

    #[test]
    fn thin_countries_and_unlabeled_rows_drop() -> Result<()> {
        let out = clean(feature_frame())?;

        let countries = out.cleaned.column("country")?.str()?;
        assert!(!countries.into_iter().flatten().any(|c| c == "Uruguay"));
        let years: Vec<i32> = out.cleaned.column("year")?.i32()?.into_no_null_iter().collect();
        assert!(!years.contains(&2030), "unlabeled rows are gone");

        // counts are captured before the thin-country drop
        let counted: Vec<(&str, u32)> = out
            .country_counts
            .column("country")?
            .str()?
            .into_no_null_iter()
            .zip(out.country_counts.column("count")?.u32()?.into_no_null_iter())
            .collect();
        assert_eq!(
            counted,
            vec![("Argentina", 20), ("Venezuela", 15), ("Uruguay", 5)]
        );
        Ok(())
    }

    #[test]
    fn venezuela_stops_after_2014() -> Result<()> {
        let out = clean(feature_frame())?;

        let df = out
            .cleaned
            .clone()
            .lazy()
            .filter(col("country").eq(lit("Venezuela")))
            .collect()?;
        let years: Vec<i32> = df.column("year")?.i32()?.into_no_null_iter().collect();
        assert_eq!(years.len(), 13);
        assert!(years.iter().all(|y| *y <= 2014));
        assert!(years.contains(&2014), "2014 itself stays");

        // year counts are captured before the cutoff: 2015 and 2016 still
        // count both Argentina and Venezuela
        let cut_years = out
            .year_counts
            .clone()
            .lazy()
            .filter(col("year").gt(lit(2014)).and(col("year").lt(lit(2017))))
            .collect()?;
        assert_eq!(cut_years.height(), 2);
        let counts: Vec<u32> = cut_years.column("count")?.u32()?.into_no_null_iter().collect();
        assert_eq!(counts, vec![2, 2]);
        Ok(())
    }

    #[test]
    fn inflation_columns_are_renamed() -> Result<()> {
        let out = clean(feature_frame())?;

        let cols: Vec<&str> = out
            .cleaned
            .get_column_names()
            .iter()
            .map(|n| n.as_str())
            .collect();
        assert!(cols.contains(&"inflation"));
        assert!(cols.contains(&"inflation_minus_1"));
        assert!(!cols.contains(&"CPI"));
        assert!(!cols.contains(&"CPI_1"));
        Ok(())
    }
}

// src/transform/features.rs

use anyhow::{Context, Result};
use polars::prelude::*;

/// Wage level columns consumed by the ratio features. Ratios compare better
/// across countries with different income levels, so the levels drop out.
const CONSUMED_WAGE_COLUMNS: &[&str] = &[
    "inglaboral_formales",
    "inglaboral_informales",
    "ingreso_mens_prom",
    "salmin_mes",
];

/// Derive the model predictors on the wide table: rescale the two indicators
/// quoted in percentage points, lag inflation by one year within each
/// country, and build the three wage ratios.
///
/// The lag is keyed by (country, year - 1): a gap year has no match and
/// yields a missing lag. Zero or missing ratio denominators propagate as
/// inf/missing, never as errors.
pub fn engineer(wide: DataFrame) -> Result<DataFrame> {
    let lagged = wide.clone().lazy().select([
        col("country"),
        (col("year") + lit(1)).alias("year"),
        (col("CPI") / lit(100.0)).alias("CPI_1"),
    ]);

    let df = wide
        .lazy()
        .with_columns([
            (col("CPI") / lit(100.0)).alias("CPI"),
            (col("primary_balance") / lit(100.0)).alias("primary_balance"),
        ])
        .join(
            lagged,
            [col("country"), col("year")],
            [col("country"), col("year")],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns([
            (col("salmin_mes") / col("ingreso_mens_prom")).alias("salmin_total"),
            (col("inglaboral_formales") / col("ingreso_mens_prom")).alias("salfor_total"),
            (col("inglaboral_informales") / col("ingreso_mens_prom")).alias("salinfor_total"),
        ])
        .collect()
        .context("engineering features")?;

    let df = df.drop_many(CONSUMED_WAGE_COLUMNS.iter().copied());

    // pandas treats NaN as missing; fold arithmetic NaN (0/0 denominators) to
    // null so the missingness rules downstream see one notion of "missing"
    df.lazy()
        .with_columns([dtype_col(&DataType::Float64).fill_nan(lit(NULL))])
        .collect()
        .context("normalizing NaN to missing")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_frame() -> DataFrame {
        df!(
            "country" => ["Argentina", "Argentina", "Argentina", "Bolivia"],
            "year" => [2010i32, 2011, 2013, 2010],
            "CPI" => [Some(10.0f64), Some(20.0), Some(30.0), Some(40.0)],
            "primary_balance" => [Some(-2.5f64), Some(2.0), Some(3.0), Some(4.0)],
            "ninis_2_15_24" => [Some(0.2f64), Some(0.25), Some(0.3), Some(0.4)],
            "salmin_mes" => [Some(2.0f64), Some(0.0), None, Some(3.0)],
            "ingreso_mens_prom" => [Some(4.0f64), Some(0.0), None, Some(6.0)],
            "inglaboral_formales" => [Some(6.0f64), Some(1.0), None, Some(9.0)],
            "inglaboral_informales" => [Some(2.0f64), Some(1.0), None, Some(3.0)],
        )
        .unwrap()
    }

    #[test]
    fn rescales_and_ratios() -> Result<()> {
        let out = engineer(wide_frame())?;

        let cpi = out.column("CPI")?.f64()?;
        assert_eq!(cpi.get(0), Some(0.1));
        let pb = out.column("primary_balance")?.f64()?;
        assert_eq!(pb.get(0), Some(-0.025));
        let salmin = out.column("salmin_total")?.f64()?;
        assert_eq!(salmin.get(0), Some(0.5));
        let salfor = out.column("salfor_total")?.f64()?;
        assert_eq!(salfor.get(0), Some(1.5));
        for dropped in CONSUMED_WAGE_COLUMNS {
            assert!(out.column(dropped).is_err());
        }
        Ok(())
    }

    #[test]
    fn lag_is_keyed_by_year_not_position() -> Result<()> {
        let out = engineer(wide_frame())?;

        let lag: Vec<Option<f64>> = out.column("CPI_1")?.f64()?.into_iter().collect();
        // 2010 has no prior year; 2011 sees 2010; 2013 has a gap at 2012;
        // Bolivia 2010 has no prior year
        assert_eq!(lag, vec![None, Some(0.1), None, None]);
        Ok(())
    }

    #[test]
    fn zero_over_zero_becomes_missing_and_x_over_zero_stays_infinite() -> Result<()> {
        let out = engineer(wide_frame())?;

        // row 1: salmin_mes 0.0 / ingreso 0.0 -> NaN -> missing
        assert_eq!(out.column("salmin_total")?.f64()?.get(1), None);
        // row 1: inglaboral_formales 1.0 / 0.0 -> +inf survives
        let salfor = out.column("salfor_total")?.f64()?.get(1);
        assert!(salfor.is_some_and(f64::is_infinite));
        // row 2: missing denominator -> missing ratio
        assert_eq!(out.column("salmin_total")?.f64()?.get(2), None);
        Ok(())
    }
}

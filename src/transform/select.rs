// src/transform/select.rs

use std::collections::HashMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;

/// Indicators kept from the silac dump, either used directly or consumed by a
/// derived predictor later.
pub const SILAC_INDICATORS: &[&str] = &[
    "jefa_ch",
    "pdis_ch",
    "anos_promedio_educ_sims",
    "ninis_2_15_24",
    "tasa_terminacion_c_secund",
    "tasa_terminacion_c_terc",
    "pobreza_lp2017",
    "tasa_desocupacion",
    "tenure_prom",
    "dura_desempleo",
    "horas_trabajadas",
    "inglaboral_formales",
    "inglaboral_informales",
    "sal_menor_salmin",
    "tasa_participacion",
    "ptmc_ch",
    "p90_10",
    "dependency_ratio",
    "tamh_ch",
    "ingreso_mens_prom",
    "salmin_mes",
    "salminmes_ppp",
    "ingreso_mens_prom_ppp2017",
];

/// The modeling target.
pub const TARGET_INDICATOR: &str = "ninis_2_15_24";

/// Every one of these dimensions must equal "Total" for a silac row to count
/// as a country-level observation; a row failing any single dimension drops.
pub const SILAC_TOTAL_DIMENSIONS: &[&str] = &[
    "area",
    "quintile",
    "sex",
    "education_level",
    "age",
    "ethnicity",
    "language",
    "disability",
    "migration",
    "management",
    "funding",
];

/// Indicators kept from the lmw dump.
pub const LMW_INDICATORS: &[&str] = &["primary_balance", "CPI", "RER"];

/// Required measurement unit per lmw indicator; the dump repeats each
/// indicator under several units.
static LMW_UNIT_BY_INDICATOR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("primary_balance", "% of GDP"),
        ("RER", "index, period average"),
        ("CPI", "period average inflation, %"),
    ])
});

/// OR-fold membership predicate over a fixed value list.
fn is_any_of(column: &str, values: &[&str]) -> Expr {
    values
        .iter()
        .fold(lit(false), |acc, v| acc.or(col(column).eq(lit(*v))))
}

/// Keep allow-listed silac indicators at the all-"Total" demographic cell and
/// project to the common long schema.
pub fn select_silac(df: DataFrame) -> Result<DataFrame> {
    let totals = SILAC_TOTAL_DIMENSIONS
        .iter()
        .fold(lit(true), |acc, dim| acc.and(col(*dim).eq(lit("Total"))));
    df.lazy()
        .filter(is_any_of("indicator", SILAC_INDICATORS))
        .filter(totals)
        .select([col("year"), col("country"), col("indicator"), col("value")])
        .collect()
        .context("selecting silac rows")
}

/// Keep annual lmw rows for the three allow-listed indicators at their
/// required unit, coerce the "n.a." marker to missing and the value column to
/// float, and project to the common long schema.
pub fn select_lmw(df: DataFrame) -> Result<DataFrame> {
    let unit_ok = LMW_INDICATORS.iter().fold(lit(false), |acc, ind| {
        let unit = LMW_UNIT_BY_INDICATOR[ind];
        acc.or(col("indicator")
            .eq(lit(*ind))
            .and(col("Unit").eq(lit(unit))))
    });
    df.lazy()
        .filter(col("Frequency").eq(lit("Annual")))
        .filter(unit_ok)
        .select([
            col("year"),
            col("country"),
            col("indicator"),
            when(col("value").eq(lit("n.a.")))
                .then(lit(NULL))
                .otherwise(col("value"))
                .strict_cast(DataType::Float64)
                .alias("value"),
        ])
        .collect()
        .context("selecting lmw rows")
}

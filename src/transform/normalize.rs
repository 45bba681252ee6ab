// src/transform/normalize.rs

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

/// Two upstream display names are shortened before the join so they match the
/// Latin Macro Watch country naming.
const COUNTRY_NAME_OVERRIDES: &[(&str, &str)] = &[
    ("Venezuela (Bolivarian Republic of)", "Venezuela"),
    ("Bolivia (Plurinational State of)", "Bolivia"),
];

fn country_dtype() -> DataType {
    DataType::Categorical(None, CategoricalOrdering::Lexical)
}

/// Calendar year of a `%Y-%m-%d`-prefixed date string column. Prefix match,
/// so a trailing time component is accepted; a malformed date is fatal.
fn year_of(date_col: &str) -> Expr {
    col(date_col)
        .str()
        .to_date(StrptimeOptions {
            format: Some("%Y-%m-%d".into()),
            strict: true,
            exact: false,
            ..Default::default()
        })
        .dt()
        .year()
        .alias("year")
}

/// Harmonize the raw Latin Macro Watch dump to the common long schema:
/// `year` from the date field, canonical short indicator labels, categorical
/// country. Frequency and unit metadata ride along for the select stage.
pub fn normalize_lmw(raw: DataFrame) -> Result<DataFrame> {
    let df = raw
        .lazy()
        .select([
            year_of("Date"),
            col("Country").cast(country_dtype()).alias("country"),
            when(col("Indicator").eq(lit("Primary Balance (Non Financial Public Sector)")))
                .then(lit("primary_balance"))
                .when(col("Indicator").eq(lit("RER Multilateral")))
                .then(lit("RER"))
                .otherwise(col("Indicator"))
                .alias("indicator"),
            col("Value").alias("value"),
            col("Frequency"),
            col("Unit"),
        ])
        .collect()
        .context("normalizing the lmw dump")?;
    info!(columns = ?df.get_column_names(), "lmw normalized");
    Ok(df)
}

/// Project the ISO reference dump down to (isoalpha3, country), applying the
/// fixed display-name overrides.
pub fn prepare_iso_codes(raw: DataFrame) -> Result<DataFrame> {
    let mut name = col("official_name_en");
    for (from, to) in COUNTRY_NAME_OVERRIDES {
        name = when(col("official_name_en").eq(lit(*from)))
            .then(lit(*to))
            .otherwise(name);
    }
    raw.lazy()
        .select([
            col("ISO3166-1-Alpha-3").alias("isoalpha3"),
            name.alias("country"),
        ])
        .collect()
        .context("preparing the ISO code table")
}

/// Harmonize the raw SILAC dump: `year` from the date field, country display
/// names attached via the ISO-3 join, categorical country. The demographic
/// dimension columns ride along for the select stage.
pub fn normalize_silac(raw: DataFrame, iso_codes: DataFrame) -> Result<DataFrame> {
    let df = raw
        .lazy()
        .with_column(year_of("dt"))
        .join(
            iso_codes.lazy(),
            [col("isoalpha3")],
            [col("isoalpha3")],
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(col("country").cast(country_dtype()))
        .collect()
        .context("normalizing the silac dump")?;
    info!(columns = ?df.get_column_names(), "silac normalized");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lmw_year_country_and_labels() -> Result<()> {
        polars::enable_string_cache();
        let raw = df!(
            "Period" => ["2010", "2010"],
            "Date" => ["2010-06-01", "2011-01-01"],
            "Country" => ["Argentina", "Argentina"],
            "Indicator" => ["Primary Balance (Non Financial Public Sector)", "RER Multilateral"],
            "Value" => ["-2.5", "n.a."],
            "Frequency" => ["Annual", "Annual"],
            "Unit" => ["% of GDP", "index, period average"],
        )?;

        let df = normalize_lmw(raw)?;

        let years: Vec<i32> = df.column("year")?.i32()?.into_no_null_iter().collect();
        assert_eq!(years, vec![2010, 2011]);
        let indicators: Vec<&str> = df.column("indicator")?.str()?.into_no_null_iter().collect();
        assert_eq!(indicators, vec!["primary_balance", "RER"]);
        assert!(matches!(
            df.column("country")?.dtype(),
            DataType::Categorical(_, _)
        ));
        Ok(())
    }

    #[test]
    fn iso_codes_apply_name_overrides() -> Result<()> {
        let raw = df!(
            "ISO3166-1-Alpha-3" => ["ARG", "VEN", "BOL"],
            "official_name_en" => [
                "Argentina",
                "Venezuela (Bolivarian Republic of)",
                "Bolivia (Plurinational State of)",
            ],
            "M49" => ["32", "862", "68"],
        )?;

        let iso = prepare_iso_codes(raw)?;

        assert_eq!(
            iso.get_column_names()
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>(),
            vec!["isoalpha3", "country"]
        );
        let countries: Vec<&str> = iso.column("country")?.str()?.into_no_null_iter().collect();
        assert_eq!(countries, vec!["Argentina", "Venezuela", "Bolivia"]);
        Ok(())
    }

    #[test]
    fn silac_join_attaches_country_names() -> Result<()> {
        polars::enable_string_cache();
        let raw = df!(
            "dt" => ["2012-01-01", "2012-01-01", "2012-01-01"],
            "isoalpha3" => ["ARG", "VEN", "XXX"],
            "indicator" => ["ninis_2_15_24", "ninis_2_15_24", "ninis_2_15_24"],
            "value" => [0.2f64, 0.3, 0.4],
        )?;
        let iso = df!(
            "isoalpha3" => ["ARG", "VEN"],
            "country" => ["Argentina", "Venezuela"],
        )?;

        let df = normalize_silac(raw, iso)?;

        // the unmatched ISO code drops out of the inner join
        assert_eq!(df.height(), 2);
        let years: Vec<i32> = df.column("year")?.i32()?.into_no_null_iter().collect();
        assert_eq!(years, vec![2012, 2012]);
        let countries = df.column("country")?.cast(&DataType::String)?;
        let countries: Vec<&str> = countries.str()?.into_no_null_iter().collect();
        assert_eq!(countries, vec!["Argentina", "Venezuela"]);
        Ok(())
    }
}

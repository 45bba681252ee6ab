//! Preparation pipeline for two IADB socioeconomic datasets: download the
//! Latin Macro Watch and SILAC dumps plus an ISO country-code table, harmonize
//! them into one (country, year) wide table, derive model predictors, prune by
//! missingness and sample size, and export the cleaned table with diagnostics.

pub mod fetch;
pub mod report;
pub mod transform;

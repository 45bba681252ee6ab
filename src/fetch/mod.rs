// src/fetch/mod.rs

use anyhow::{Context, Result};
use polars::prelude::{DataFrame, DataType};
use reqwest::Client;
use tracing::{debug, info};

pub mod decode;
pub mod retry;

pub use retry::{FetchError, RetryPolicy};

/// Row chunk size for CSV decoding. A memory-shape choice only; the decoded
/// table is chunk-size-invariant.
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

static LMW_URL: &str =
    "https://data.iadb.org/datastore/dump/6c9d4ecc-4f05-4f63-9539-31f021f70c28?bom=True&format=csv";
static SILAC_URL: &str =
    "https://data.iadb.org/datastore/dump/ba412771-9c90-4613-a96a-e18c005c0ab6?bom=True&format=csv";
static ISO_CODES_URL: &str = "https://datahub.io/core/country-codes/_r/-/data/country-codes.csv";

/// The two retried dataset downloads. The upstream API takes no indicator,
/// country or period parameters; each source is one full dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Lmw,
    Silac,
}

impl Source {
    pub fn id(&self) -> &'static str {
        match self {
            Source::Lmw => "lmw",
            Source::Silac => "silac",
        }
    }

    fn url(&self) -> &'static str {
        match self {
            Source::Lmw => LMW_URL,
            Source::Silac => SILAC_URL,
        }
    }

    /// Columns whose inferred dtype cannot be trusted. The lmw value column
    /// carries the literal "n.a." for missing entries and must survive to the
    /// select stage as text; the silac value column is numeric throughout.
    fn dtype_overrides(&self) -> Vec<(&'static str, DataType)> {
        match self {
            Source::Lmw => vec![("Value", DataType::String)],
            Source::Silac => vec![("value", DataType::Float64)],
        }
    }
}

async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    debug!(%url, "downloading");
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()
        .with_context(|| format!("non-success status from {url}"))?;
    let body = resp
        .bytes()
        .await
        .with_context(|| format!("reading body from {url}"))?;
    Ok(body.to_vec())
}

/// Download and decode one of the two datasets. Download and parse run inside
/// the retry policy together, so a truncated or malformed body is retried like
/// a network failure; the tenth consecutive failure is terminal.
pub async fn fetch_dataset(client: &Client, source: Source, chunk_size: usize) -> Result<DataFrame> {
    let policy = RetryPolicy::default();
    let df = policy
        .run(source.id(), || {
            let client = client.clone();
            let overrides = source.dtype_overrides();
            async move {
                let body = get_bytes(&client, source.url()).await?;
                decode::read_csv_chunked(&body, chunk_size, &overrides)
            }
        })
        .await?;
    info!(
        source = source.id(),
        rows = df.height(),
        cols = df.width(),
        "dataset fetched"
    );
    Ok(df)
}

/// The ISO country-code reference table. Not retried; a failure here is fatal.
pub async fn fetch_reference(client: &Client) -> Result<DataFrame> {
    let body = get_bytes(client, ISO_CODES_URL).await?;
    let df = decode::read_reference_csv(&body)?;
    info!(rows = df.height(), "reference table fetched");
    Ok(df)
}

use anyhow::Result;
use iadbprep::{fetch, report, transform};
use reqwest::Client;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // categoricals from both sources must share one dictionary
    polars::enable_string_cache();

    // ─── 2) configure output ─────────────────────────────────────────
    let client = Client::new();
    let out_dir = PathBuf::from(".");

    // ─── 3) fetch the three sources ──────────────────────────────────
    let lmw_raw =
        fetch::fetch_dataset(&client, fetch::Source::Lmw, fetch::DEFAULT_CHUNK_SIZE).await?;
    let silac_raw =
        fetch::fetch_dataset(&client, fetch::Source::Silac, fetch::DEFAULT_CHUNK_SIZE).await?;
    let iso_raw = fetch::fetch_reference(&client).await?;

    // ─── 4) normalize + select ───────────────────────────────────────
    let lmw = transform::select::select_lmw(transform::normalize::normalize_lmw(lmw_raw)?)?;
    let iso = transform::normalize::prepare_iso_codes(iso_raw)?;
    let silac =
        transform::select::select_silac(transform::normalize::normalize_silac(silac_raw, iso)?)?;

    // ─── 5) merge, pivot, derive ─────────────────────────────────────
    let long = transform::reshape::to_long(silac, lmw)?;
    let wide = transform::reshape::to_wide(long)?;
    info!(rows = wide.height(), cols = wide.width(), "wide table built");
    let features = transform::features::engineer(wide)?;

    // ─── 6) clean ────────────────────────────────────────────────────
    let clean = transform::clean::clean(features)?;
    info!(
        rows = clean.cleaned.height(),
        cols = clean.cleaned.width(),
        "cleaned table built"
    );

    // ─── 7) diagnostics + export ─────────────────────────────────────
    let diag = report::correlation_diagnostics(&clean.cleaned)?;
    report::log_strongest_pair(&diag.labels, &diag.matrix);
    report::heatmap::render(&diag.labels, &diag.matrix, &out_dir.join(report::HEATMAP_FILE))?;
    let summary = report::stats::summary_stats(&clean.cleaned)?;
    report::write_outputs(&out_dir, &clean, &summary, &diag.corr)?;

    info!("all done");
    Ok(())
}

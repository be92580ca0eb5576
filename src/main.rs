// src/main.rs
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;
use serde_json::Value;

use dedupe_engine::{DedupConfig, Deduper};

/// Reads a JSON-lines record file and a JSON configuration, runs the
/// engine and writes the resulting clusters to stdout as JSON lines.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(records_path)) = (args.next(), args.next()) else {
        bail!("usage: dedupe <config.json> <records.jsonl>");
    };

    let config_json = std::fs::read_to_string(PathBuf::from(&config_path))
        .with_context(|| format!("Failed to read configuration from {}", config_path))?;
    let config = DedupConfig::from_json(&config_json)?;

    let raw = std::fs::read_to_string(PathBuf::from(&records_path))
        .with_context(|| format!("Failed to read records from {}", records_path))?;
    let records: Vec<Value> = raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap_or(Value::Null))
        .collect();
    info!("Loaded {} records from {}", records.len(), records_path);

    let deduper = Deduper::new(config)?;
    let output = deduper.dedup(&records).await?;

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    for cluster in &output.clusters {
        use std::io::Write;
        serde_json::to_writer(&mut lock, cluster).context("Failed to serialize cluster")?;
        writeln!(&mut lock)?;
    }

    info!(
        "Run {} finished in {:.2}s: {} clusters from {} documents",
        output.stats.run_id,
        output.stats.total_processing_time,
        output.stats.total_clusters,
        output.stats.total_documents
    );
    Ok(())
}

//! Indexer Variant A: confusion-driven two-pointer merge pairing every
//! corpus anagram hash against itself shifted by each known CCV.

use ahash::AHashSet;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use ticcl_core::config::RunConfig;
use ticcl_core::index::{index_variant_a, render_index_file};
use ticcl_tools::{read_anahash_file, read_ccvs};

#[derive(Parser)]
#[command(about = "Confusion-driven indexer (Variant A)")]
struct Args {
    /// Anagram-hash file produced by `ticcl_anahash`.
    #[arg(long)]
    hash: PathBuf,

    /// Foci file produced by `ticcl_anahash`.
    #[arg(long)]
    foci: PathBuf,

    /// Confusion (`.charconf`) file produced by `ticcl_lexstat`.
    #[arg(long)]
    charconf: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "index.idx")]
    out: PathBuf,

    #[arg(long)]
    debug_json: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RunConfig::load_toml(path).map_err(|e| anyhow::anyhow!("{e}"))?,
        None => RunConfig::default(),
    };

    let buckets = read_anahash_file(&args.hash)?;
    let mut sorted_hashes: Vec<u64> = buckets.keys().copied().collect();
    sorted_hashes.sort_unstable();

    let foci_buckets = read_anahash_file(&args.foci)?;
    let foci: AHashSet<u64> = foci_buckets.keys().copied().collect();

    let ccvs = read_ccvs(&args.charconf)?;

    let threads = config.resolve_threads();
    let index = index_variant_a(&sorted_hashes, &ccvs, &foci, threads);

    std::fs::write(&args.out, render_index_file(&index))
        .with_context(|| format!("writing {}", args.out.display()))?;

    if let Some(path) = &args.debug_json {
        let json = serde_json::json!({ "ccv_buckets": index.entries.len() });
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!("wrote {} CCV buckets", index.entries.len());
    Ok(())
}

//! Chain: reads the ranker's output and builds the variant -> head forest,
//! flattening it into final equivalence classes.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use ticcl_core::chain::{parse_chain_input, Chain};
use ticcl_core::config::RunConfig;

#[derive(Parser)]
#[command(about = "Builds variant -> head equivalence classes from ranked candidates")]
struct Args {
    /// `.ranked` file produced by `ticcl_rank`.
    #[arg(long)]
    ranked: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "chain.chained")]
    out: PathBuf,

    #[arg(long)]
    debug_json: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let args = Args::parse();
    let _config = match &args.config {
        Some(path) => RunConfig::load_toml(path).map_err(|e| anyhow::anyhow!("{e}"))?,
        None => RunConfig::default(),
    };

    let content = std::fs::read_to_string(&args.ranked)
        .with_context(|| format!("reading {}", args.ranked.display()))?;

    let mut chain = Chain::new();
    let mut edge_count = 0u64;
    for (idx, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let input = parse_chain_input(line, &args.ranked, idx + 1).map_err(|e| anyhow::anyhow!("{e}"))?;
        chain.add_edge(&input);
        edge_count += 1;
    }
    chain.final_merge();

    let rendered = chain.render();
    std::fs::write(&args.out, &rendered).with_context(|| format!("writing {}", args.out.display()))?;

    if let Some(path) = &args.debug_json {
        let json = serde_json::json!({ "edges_read": edge_count, "chained_lines": rendered.lines().count() });
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!("wrote {} chained entries from {} edges", rendered.lines().count(), edge_count);
    Ok(())
}

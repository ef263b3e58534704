//! Chainclean: resolves overlaps between unigram and multi-gram
//! corrections in a `.chained` file, splitting it into `.cleaned` and
//! `.deleted` outputs.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use ticcl_core::chainclean::{render_cleaned, ChainedRecord, Chainclean};
use ticcl_core::config::RunConfig;
use ticcl_core::lexicon::ValidatedLexicon;

#[derive(Parser)]
#[command(about = "Resolves unigram/multi-gram correction overlaps in a chained file")]
struct Args {
    /// `.chained` file produced by `ticcl_chain`.
    #[arg(long)]
    chained: PathBuf,

    /// Validated background lexicon, `word<TAB>freq` per line.
    #[arg(long)]
    lexicon: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum total character count for a variant's parts; overrides the
    /// config value if given.
    #[arg(long)]
    low: Option<usize>,

    #[arg(long, default_value = "chainclean.cleaned")]
    out: PathBuf,

    #[arg(long, default_value = "chainclean.deleted")]
    deleted_out: PathBuf,

    #[arg(long)]
    debug_json: Option<PathBuf>,
}

/// Parses one `.chained` line: `variant#vfreq#head#hfreq[#ccv]#<C|D>`.
fn parse_chained_line(line: &str, path: &PathBuf, lineno: usize) -> Result<ChainedRecord> {
    let parts: Vec<&str> = line.split('#').collect();
    if parts.len() < 5 {
        anyhow::bail!("{}: line {} has {} '#'-separated fields, expected at least 5", path.display(), lineno, parts.len());
    }
    let variant = parts[0].to_string();
    let variant_freq: u64 = parts[1]
        .parse()
        .with_context(|| format!("{}: line {}: non-numeric variant frequency", path.display(), lineno))?;
    let candidate = parts[2].to_string();
    let candidate_freq: u64 = parts[3]
        .parse()
        .with_context(|| format!("{}: line {}: non-numeric candidate frequency", path.display(), lineno))?;
    // The trailing "ld" slot sits just before the final C/D marker in the
    // 6-field shape, or is the 5th field in the shorter shape without a ccv.
    let ld_field = parts[parts.len() - 2];
    let ld: u32 = ld_field.parse().unwrap_or(0);
    Ok(ChainedRecord { variant, variant_freq, candidate, candidate_freq, ld })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RunConfig::load_toml(path).map_err(|e| anyhow::anyhow!("{e}"))?,
        None => RunConfig::default(),
    };
    let low = args.low.unwrap_or(config.chainclean_low);

    let lexicon = ValidatedLexicon::load_freq_list(&args.lexicon, config.artifrq).map_err(|e| anyhow::anyhow!("{e}"))?;

    let content = std::fs::read_to_string(&args.chained)
        .with_context(|| format!("reading {}", args.chained.display()))?;
    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        records.push(parse_chained_line(line, &args.chained, idx + 1)?);
    }

    let mut cc = Chainclean::new();
    let rows = cc.run(&records, &lexicon, config.separator, low);
    let (cleaned, deleted) = render_cleaned(&rows);

    std::fs::write(&args.out, &cleaned).with_context(|| format!("writing {}", args.out.display()))?;
    std::fs::write(&args.deleted_out, &deleted)
        .with_context(|| format!("writing {}", args.deleted_out.display()))?;

    if let Some(path) = &args.debug_json {
        let json = serde_json::json!({
            "kept": cleaned.lines().count(),
            "deleted": deleted.lines().count(),
        });
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "wrote {} cleaned, {} deleted entries",
        cleaned.lines().count(),
        deleted.lines().count()
    );
    Ok(())
}

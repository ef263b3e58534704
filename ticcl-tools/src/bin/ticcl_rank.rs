//! Rank: groups LD-records by variant, scores each candidate against its
//! group on 14 features, and keeps the top-`k` candidates per variant.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use ticcl_core::alphabet::{fill_alphabet, Alphabet};
use ticcl_core::config::RunConfig;
use ticcl_core::ldrecord::LdRecord;
use ticcl_core::rank::{
    compute_corpus_stats, compute_pairs2, rank_variant_group, resort_by_candidate_freq_desc, top_k,
    RankOptions,
};
use ticcl_core::wordvec::WordVectors;
use ticcl_tools::{read_confusion_table, read_ld_records};

#[derive(Parser)]
#[command(about = "Scores and ranks LD-records per variant")]
struct Args {
    /// `.ldcalc` file produced by `ticcl_ldcalc`.
    #[arg(long)]
    ldcalc: PathBuf,

    /// Alphabet file, needed only to back the `pairs2` feature.
    #[arg(long)]
    alph: PathBuf,

    /// Confusion (`.charconf`) file, needed only to back the `pairs2`
    /// feature.
    #[arg(long)]
    charconf: Option<PathBuf>,

    /// Optional word2vec vector file (text format) backing `cosine_rank`.
    #[arg(long)]
    wordvec: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-variant candidate cap; overrides the config value if given.
    #[arg(long)]
    clip: Option<usize>,

    #[arg(long, default_value = "ranked.ranked")]
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
    let clip = args.clip.unwrap_or(config.rank_clip);

    let records = read_ld_records(&args.ldcalc)?;

    let alph_file = std::fs::File::open(&args.alph).with_context(|| format!("opening {}", args.alph.display()))?;
    let alphabet: Alphabet = fill_alphabet(std::io::BufReader::new(alph_file), 0, &args.alph)?;

    let stats = {
        let mut stats = compute_corpus_stats(&records);
        if let Some(path) = &args.charconf {
            let table = read_confusion_table(path)?;
            stats.pairs2_counts = compute_pairs2(&table, &alphabet, &stats.pairs1_counts);
        }
        stats
    };

    let wordvec = match &args.wordvec {
        Some(path) => {
            let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
            Some(WordVectors::load(std::io::BufReader::new(file))?)
        }
        None => None,
    };

    let opts = RankOptions {
        skipcols: &config.skipcols,
        subtract_artifreq_feature1: config.subtract_artifreq_feature1,
        subtract_artifreq_feature2: config.subtract_artifreq_feature2,
        cosine_threshold: config.cosine_threshold,
    };

    let groups = group_by_variant(records);

    let mut all_ranked = Vec::new();
    for group in groups {
        let ranked = rank_variant_group(&group, &stats, &opts, wordvec.as_ref());
        let top = top_k(ranked, clip);
        all_ranked.extend(top);
    }

    if clip == 1 {
        all_ranked = resort_by_candidate_freq_desc(all_ranked);
    }

    let mut out_text = String::new();
    for rec in &all_ranked {
        out_text.push_str(&rec.to_line());
        out_text.push('\n');
    }
    std::fs::write(&args.out, &out_text).with_context(|| format!("writing {}", args.out.display()))?;

    if let Some(path) = &args.debug_json {
        let dump: Vec<_> = all_ranked
            .iter()
            .map(|r| serde_json::json!({
                "variant": r.record.str1,
                "candidate": r.record.str2,
                "composite": r.composite,
                "ranks": r.ranks,
            }))
            .collect();
        std::fs::write(path, serde_json::to_string_pretty(&dump)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!("wrote {} ranked candidates", all_ranked.len());
    Ok(())
}

/// Groups LD-records by `str1`, preserving first-seen group order so the
/// output is deterministic for a fixed input order (S7: rank determinism).
fn group_by_variant(records: Vec<LdRecord>) -> Vec<Vec<LdRecord>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<LdRecord>> = std::collections::HashMap::new();
    for rec in records {
        if !groups.contains_key(&rec.str1) {
            order.push(rec.str1.clone());
        }
        groups.entry(rec.str1.clone()).or_default().push(rec);
    }
    order.into_iter().map(|k| groups.remove(&k).unwrap()).collect()
}

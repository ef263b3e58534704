//! LD-calc: walks every CCV bucket of the index, cross-products the two
//! anagram-hash buckets it joins, and runs each word pair through the
//! filter chain to produce `.ldcalc` records.

use ahash::AHashSet;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use ticcl_core::alphabet::{fill_alphabet, Alphabet};
use ticcl_core::config::RunConfig;
use ticcl_core::freq::FreqMaps;
use ticcl_core::ldrecord::{evaluate_pair, LdCalcContext, LdCalcPass, Outcome};
use ticcl_tools::read_anahash_file;

#[derive(Parser)]
#[command(about = "Filters indexed anagram-hash pairs into LD-records")]
struct Args {
    /// Anagram-hash file produced by `ticcl_anahash`.
    #[arg(long)]
    hash: PathBuf,

    /// Index file produced by either indexer variant.
    #[arg(long)]
    index: PathBuf,

    /// Alphabet file produced by `ticcl_lexstat`.
    #[arg(long)]
    alph: PathBuf,

    /// Clean frequency list used to build the surface/low frequency maps.
    #[arg(long)]
    clean: PathBuf,

    /// Optional known-historical-confusion pairs, `word1~word2` per line.
    #[arg(long)]
    khc: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "ldcalc.ld")]
    out: PathBuf,

    #[arg(long, default_value = "ldcalc.short")]
    short_out: PathBuf,

    #[arg(long)]
    debug_json: Option<PathBuf>,
}

fn read_index_file(path: &PathBuf) -> Result<Vec<(u64, Vec<u64>)>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut out = Vec::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, '#');
        let ccv: u64 = parts.next().and_then(|c| c.parse().ok()).unwrap_or(0);
        let inner: Vec<u64> = parts
            .next()
            .unwrap_or("")
            .split(',')
            .filter_map(|v| v.parse().ok())
            .collect();
        out.push((ccv, inner));
    }
    Ok(out)
}

fn read_khc_pairs(path: &Option<PathBuf>) -> Result<AHashSet<(String, String)>> {
    let mut out = AHashSet::new();
    if let Some(path) = path {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        for line in content.lines() {
            if let Some((a, b)) = line.split_once('~') {
                out.insert((a.to_string(), b.to_string()));
                out.insert((b.to_string(), a.to_string()));
            }
        }
    }
    Ok(out)
}

fn build_freq_maps(clean: &PathBuf, artifrq: u64) -> Result<FreqMaps> {
    let content = std::fs::read_to_string(clean).with_context(|| format!("reading {}", clean.display()))?;
    let mut maps = FreqMaps::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(2, '\t');
        let word = fields.next().unwrap_or("");
        let freq: u64 = fields.next().and_then(|f| f.trim().parse().ok()).unwrap_or(0);
        if word.is_empty() {
            continue;
        }
        maps.insert_surface(word, freq);
        maps.accumulate_low(word, freq, artifrq);
    }
    Ok(maps)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RunConfig::load_toml(path).map_err(|e| anyhow::anyhow!("{e}"))?,
        None => RunConfig::default(),
    };

    let alph_file = std::fs::File::open(&args.alph).with_context(|| format!("opening {}", args.alph.display()))?;
    let alphabet: Alphabet = fill_alphabet(std::io::BufReader::new(alph_file), 0, &args.alph)?;

    let buckets = read_anahash_file(&args.hash)?;
    let index = read_index_file(&args.index)?;
    let freqs = build_freq_maps(&args.clean, config.artifrq)?;
    let khc_pairs = read_khc_pairs(&args.khc)?;

    let ctx = LdCalcContext {
        alphabet: &alphabet,
        freqs: &freqs,
        artifrq: config.artifrq,
        ld_value: config.ld_value,
        separator: config.separator,
        low_limit: config.low,
        nohld: config.nohld,
    };

    // The inner value `k` ("smaller") of an index entry is itself a hash,
    // and the index's own keys are CCVs sharing the same numeric space; when
    // `k` also appears as an outer CCV key, §4.5's transposition scan takes
    // over B1 instead of the ordinary cross-bucket comparison.
    let index_ccv_keys: AHashSet<u64> = index.iter().map(|(ccv, _)| *ccv).collect();

    let mut pass = LdCalcPass::new();
    for (ccv, smaller_hashes) in &index {
        for &smaller in smaller_hashes {
            let words1 = match buckets.get(&smaller) {
                Some(w) => w,
                None => continue,
            };

            if index_ccv_keys.contains(&smaller) && ctx.ld_value >= 2 {
                for (i, w1) in words1.iter().enumerate() {
                    for (j, w2) in words1.iter().enumerate() {
                        if i == j {
                            continue;
                        }
                        let is_khc = khc_pairs.contains(&(w1.clone(), w2.clone()));
                        let outcome = evaluate_pair(&ctx, w1, w2, *ccv, true, is_khc, false);
                        pass.record(outcome)?;
                    }
                }
                continue;
            }

            let larger = smaller + ccv;
            let words2 = match buckets.get(&larger) {
                Some(w) => w,
                None => continue,
            };
            for w1 in words1 {
                for w2 in words2 {
                    if w1 == w2 {
                        continue;
                    }
                    let is_khc = khc_pairs.contains(&(w1.clone(), w2.clone()));
                    let outcome = evaluate_pair(&ctx, w1, w2, *ccv, false, is_khc, false);
                    pass.record(outcome)?;
                }
            }
        }
    }
    pass.apply_ambi_votes();

    let short = pass.short.clone();
    let records = pass.into_records();
    let mut out_text = String::new();
    for rec in &records {
        out_text.push_str(&rec.to_line());
        out_text.push('\n');
    }
    std::fs::write(&args.out, out_text).with_context(|| format!("writing {}", args.out.display()))?;

    let mut short_text = String::new();
    for (variant, candidate) in &short {
        short_text.push_str(&format!("{variant}~{candidate}\n"));
    }
    std::fs::write(&args.short_out, short_text)
        .with_context(|| format!("writing {}", args.short_out.display()))?;

    if let Some(path) = &args.debug_json {
        std::fs::write(path, serde_json::to_string_pretty(&records)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!("wrote {} LD-records, {} short entries", records.len(), pass.short.len());
    Ok(())
}

//! Lexstat: counts characters, assigns alphabet codes, and emits the
//! character-confusion (CCV) table and the diacritic-confusion file.

use ahash::AHashMap;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use ticcl_core::config::RunConfig;
use ticcl_core::confusion::{
    assign_codes, diacritic_confusions, generate_confusions, ConfusionMode,
};

#[derive(Parser)]
#[command(about = "Builds the alphabet and character-confusion table from a clean frequency list")]
struct Args {
    /// Clean frequency list, `word<TAB>freq` per line.
    #[arg(long)]
    clean: PathBuf,

    /// Shared run configuration (thread count, separator, ld_depth, …).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum character occurrence count to enter the alphabet.
    #[arg(long, default_value_t = 0)]
    clip: u64,

    /// Keep every colliding pair per CCV instead of only the first.
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Output path for the `.lc.chars` alphabet file.
    #[arg(long, default_value = "lexstat.chars")]
    alph_out: PathBuf,

    /// Output path for the confusion (`.charconf`) file.
    #[arg(long, default_value = "lexstat.charconf")]
    charconf_out: PathBuf,

    /// Output path for the diacritic-confusion (`.diac`) file.
    #[arg(long, default_value = "lexstat.diac")]
    diac_out: PathBuf,

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

    let content = std::fs::read_to_string(&args.clean)
        .with_context(|| format!("reading {}", args.clean.display()))?;

    let mut char_freq: AHashMap<char, u64> = AHashMap::new();
    for line in content.lines() {
        let word = line.split('\t').next().unwrap_or("");
        for c in word.to_lowercase().chars() {
            if c.is_whitespace() {
                continue;
            }
            *char_freq.entry(c).or_insert(0) += 1;
        }
    }

    let (alphabet, rows) = assign_codes(&char_freq, args.clip, Some(config.separator));
    let mut alph_text = String::new();
    for row in &rows {
        alph_text.push_str(&format!("{}\t{}\t{}\n", row.symbol, row.freq, row.code));
    }
    std::fs::write(&args.alph_out, &alph_text)
        .with_context(|| format!("writing {}", args.alph_out.display()))?;

    let chars: Vec<char> = rows.iter().map(|r| r.symbol).collect();
    let mode = if args.all { ConfusionMode::All } else { ConfusionMode::First };
    let table = generate_confusions(&alphabet, &chars, config.ld_depth, mode);

    // `<ccv>#<a1>~<b1>#<a2>~<b2>…`, one line per CCV: `#` separates the CCV
    // from its pair list and joins multiple pairs in "all" mode; "first"
    // mode's single-pair buckets fall out of the same join.
    let mut charconf_text = String::new();
    let mut ccvs: Vec<&u64> = table.buckets.keys().collect();
    ccvs.sort();
    for ccv in ccvs {
        let pairs: Vec<String> = table.buckets[ccv]
            .iter()
            .map(|(left, right)| format!("{left}~{right}"))
            .collect();
        charconf_text.push_str(&format!("{ccv}#{}\n", pairs.join("#")));
    }
    std::fs::write(&args.charconf_out, &charconf_text)
        .with_context(|| format!("writing {}", args.charconf_out.display()))?;

    let diacs = diacritic_confusions(&alphabet, &rows);
    let mut diac_text = String::new();
    for (ccv, c, stripped) in &diacs {
        diac_text.push_str(&format!("{ccv}~{c}~{stripped}\n"));
    }
    std::fs::write(&args.diac_out, &diac_text)
        .with_context(|| format!("writing {}", args.diac_out.display()))?;

    if let Some(path) = &args.debug_json {
        let json = serde_json::json!({
            "alphabet_rows": rows.len(),
            "confusion_ccvs": table.buckets.len(),
            "diacritic_pairs": diacs.len(),
        });
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "wrote {} alphabet rows, {} CCV buckets, {} diacritic pairs",
        rows.len(),
        table.buckets.len(),
        diacs.len()
    );
    Ok(())
}

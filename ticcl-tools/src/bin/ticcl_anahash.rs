//! Anahash: hashes a clean frequency list into anagram buckets and emits
//! the anagram-hash file, the foci file, and (optionally) a background
//! merge and `--list` mode dump.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use ticcl_core::alphabet::fill_alphabet;
use ticcl_core::anahash::{
    build_anahash, merge_background, read_clean_list, render_anahash_file, render_foci_file,
    render_list_mode,
};
use ticcl_core::config::RunConfig;

#[derive(Parser)]
#[command(about = "Hashes a clean frequency list into anagram buckets")]
struct Args {
    /// Clean frequency list, `word<TAB>freq` per line.
    #[arg(long)]
    clean: PathBuf,

    /// Alphabet file produced by `ticcl_lexstat`.
    #[arg(long)]
    alph: PathBuf,

    /// Optional background lexicon, same `word<TAB>freq` shape, merged in
    /// as a plain frequency union.
    #[arg(long)]
    background: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Dumps `word<TAB>hash` pairs instead of the bucket/foci files.
    #[arg(long, default_value_t = false)]
    list: bool,

    #[arg(long, default_value = "anahash.hash")]
    hash_out: PathBuf,

    #[arg(long, default_value = "anahash.foci")]
    foci_out: PathBuf,

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

    let alph_file = std::fs::File::open(&args.alph)
        .with_context(|| format!("opening {}", args.alph.display()))?;
    let alphabet = fill_alphabet(std::io::BufReader::new(alph_file), 0, &args.alph)?;

    let clean_content = std::fs::read_to_string(&args.clean)
        .with_context(|| format!("reading {}", args.clean.display()))?;
    let entries = read_clean_list(clean_content.lines(), config.low, config.high);

    if args.list {
        let rendered = render_list_mode(&entries, &alphabet);
        std::fs::write(&args.hash_out, rendered)
            .with_context(|| format!("writing {}", args.hash_out.display()))?;
        println!("wrote {} list-mode entries", entries.len());
        return Ok(());
    }

    let mut result = build_anahash(&entries, &alphabet, config.artifrq, config.separator, None);

    if let Some(background_path) = &args.background {
        let background_content = std::fs::read_to_string(background_path)
            .with_context(|| format!("reading {}", background_path.display()))?;
        let background_entries =
            read_clean_list(background_content.lines(), config.low, config.high);
        merge_background(&mut result, &background_entries, &alphabet);
    }

    std::fs::write(&args.hash_out, render_anahash_file(&result))
        .with_context(|| format!("writing {}", args.hash_out.display()))?;
    std::fs::write(&args.foci_out, render_foci_file(&result))
        .with_context(|| format!("writing {}", args.foci_out.display()))?;

    if let Some(path) = &args.debug_json {
        let json = serde_json::json!({
            "buckets": result.buckets.len(),
            "foci": result.foci.len(),
        });
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "wrote {} anagram buckets, {} foci",
        result.buckets.len(),
        result.foci.len()
    );
    Ok(())
}

//! Small file-format helpers shared by the `ticcl-tools` binaries. Parsing
//! lives here rather than in `ticcl-core` because it is pure glue between a
//! binary's own CLI surface and the library's in-memory structures.

use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use std::path::Path;

/// Parses an anagram-hash (or foci) file: `<hash>~<w1>#<w2>#…` per line.
pub fn read_anahash_file(path: &Path) -> Result<AHashMap<u64, Vec<String>>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut out = AHashMap::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, '~');
        let hash: u64 = parts
            .next()
            .and_then(|h| h.parse().ok())
            .with_context(|| format!("malformed hash line in {}", path.display()))?;
        let words: Vec<String> = parts
            .next()
            .unwrap_or("")
            .split('#')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_string())
            .collect();
        out.insert(hash, words);
    }
    Ok(out)
}

/// Parses a confusion (`.charconf`) file: `<ccv>#<a1>~<b1>#<a2>~<b2>…` per
/// line (`#` separates the CCV from its `~`-joined pair list, and joins
/// multiple pairs in "all" mode), returning the distinct sorted CCV list.
pub fn read_ccvs(path: &Path) -> Result<Vec<u64>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut ccvs: AHashSet<u64> = AHashSet::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        if let Some(ccv_str) = line.split('#').next() {
            if let Ok(ccv) = ccv_str.parse::<u64>() {
                ccvs.insert(ccv);
            }
        }
    }
    let mut out: Vec<u64> = ccvs.into_iter().collect();
    out.sort_unstable();
    Ok(out)
}

/// Parses a `.charconf` file (`<ccv>#<a1>~<b1>#<a2>~<b2>…` per line, as
/// written by `ticcl_lexstat`) into a `ConfusionTable`, used by the
/// ranker's `pairs2` feature.
pub fn read_confusion_table(path: &Path) -> Result<ticcl_core::confusion::ConfusionTable> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut table = ticcl_core::confusion::ConfusionTable::default();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('#');
        let ccv: u64 = fields
            .next()
            .and_then(|c| c.parse().ok())
            .with_context(|| format!("malformed confusion line in {}", path.display()))?;
        let bucket = table.buckets.entry(ccv).or_default();
        for pair in fields {
            let (left, right) = pair
                .split_once('~')
                .with_context(|| format!("malformed confusion pair in {}", path.display()))?;
            bucket.push((left.to_string(), right.to_string()));
        }
    }
    Ok(table)
}

/// Parses an `.ldcalc` file's 14 `~`-separated fields per line into
/// `LdRecord`s.
pub fn read_ld_records(path: &Path) -> Result<Vec<ticcl_core::ldrecord::LdRecord>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut out = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('~').collect();
        if fields.len() != 14 {
            anyhow::bail!("{}: line {} has {} fields, expected 14", path.display(), lineno + 1, fields.len());
        }
        out.push(ticcl_core::ldrecord::LdRecord {
            str1: fields[0].to_string(),
            freq1: fields[1].parse()?,
            low_freq1: fields[2].parse()?,
            str2: fields[3].to_string(),
            freq2: fields[4].parse()?,
            low_freq2: fields[5].parse()?,
            ccv: fields[6].parse()?,
            ld: fields[7].parse()?,
            cls: fields[8].parse()?,
            canon: fields[9] == "1",
            fl_overlap: fields[10] == "1",
            ll_overlap: fields[11] == "1",
            is_khc: fields[12] == "1",
            ngram_points: fields[13].parse()?,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_anahash_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.hash");
        std::fs::write(&path, "123~cab#bca\n456~dab\n").unwrap();
        let parsed = read_anahash_file(&path).unwrap();
        assert_eq!(parsed[&123], vec!["cab".to_string(), "bca".to_string()]);
        assert_eq!(parsed[&456], vec!["dab".to_string()]);
    }

    #[test]
    fn reads_ccvs_deduplicated_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.charconf");
        std::fs::write(&path, "5#a~b\n2#c~d\n5#e~f\n").unwrap();
        let ccvs = read_ccvs(&path).unwrap();
        assert_eq!(ccvs, vec![2, 5]);
    }

    #[test]
    fn reads_confusion_table_groups_multiple_pairs_per_ccv_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.charconf");
        std::fs::write(&path, "5#a~b#c~d\n2#e~f\n").unwrap();
        let table = read_confusion_table(&path).unwrap();
        assert_eq!(
            table.buckets[&5],
            vec![("a".to_string(), "b".to_string()), ("c".to_string(), "d".to_string())]
        );
        assert_eq!(table.buckets[&2], vec![("e".to_string(), "f".to_string())]);
    }
}

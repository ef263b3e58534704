//! Chainclean: resolves overlaps between unigram and multi-gram corrections
//! produced by Chain, so a multi-gram correction never fires for a part
//! that already has its own, separately ranked, unigram fix.
//!
//! Grounded on `original_source/src/TICCL-chainclean.cxx`.

use crate::lexicon::ValidatedLexicon;
use ahash::{AHashMap, AHashSet};

/// One line of a `.chained` file.
#[derive(Debug, Clone)]
pub struct ChainedRecord {
    pub variant: String,
    pub variant_freq: u64,
    pub candidate: String,
    pub candidate_freq: u64,
    pub ld: u32,
}

/// Splits a multi-gram variant into its parts on the configured separator
/// or a literal hyphen, matching the reference's double-delimiter split.
pub fn split_parts(variant: &str, separator: char) -> Vec<&str> {
    variant
        .split(|c: char| c == separator || c == '-')
        .filter(|p| !p.is_empty())
        .collect()
}

#[derive(Debug, Default)]
pub struct Chainclean {
    done: AHashMap<String, String>,
    processed: AHashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanVerdict {
    Kept,
    Deleted,
}

impl Chainclean {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs chainclean over every chained record, in input order. Records
    /// for a variant already seen in this run are silently ignored (a
    /// `clip > 1` ranker run can duplicate lines).
    ///
    /// Algorithm: for each part of a multi-gram variant that is not itself
    /// a validated word, we need some unigram record to have already fixed
    /// that part before the multi-gram record is allowed to stand. A
    /// unigram record (`variant == part`) marks the part "done" and is
    /// always kept. A multi-gram record is deleted if any of its parts is
    /// unresolved (not a validated word and not yet "done").
    pub fn run(
        &mut self,
        records: &[ChainedRecord],
        lexicon: &ValidatedLexicon,
        separator: char,
        low: usize,
    ) -> Vec<(ChainedRecord, CleanVerdict)> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            if self.processed.contains(&record.variant) {
                continue;
            }
            self.processed.insert(record.variant.clone());

            let parts = split_parts(&record.variant, separator);
            let total_chars: usize = parts.iter().map(|p| p.chars().count()).sum();
            if total_chars < low {
                out.push((record.clone(), CleanVerdict::Deleted));
                continue;
            }

            if parts.len() <= 1 {
                // Unigram record: always kept, and marks this part resolved.
                self.done.insert(record.variant.clone(), record.candidate.clone());
                out.push((record.clone(), CleanVerdict::Kept));
                continue;
            }

            let mut all_resolved = true;
            for part in &parts {
                let resolved = lexicon.contains(part) || self.done.contains_key(*part);
                if !resolved {
                    all_resolved = false;
                    break;
                }
            }
            if all_resolved {
                out.push((record.clone(), CleanVerdict::Kept));
            } else {
                out.push((record.clone(), CleanVerdict::Deleted));
            }
        }
        out
    }
}

pub fn render_cleaned(rows: &[(ChainedRecord, CleanVerdict)]) -> (String, String) {
    let mut cleaned = String::new();
    let mut deleted = String::new();
    for (record, verdict) in rows {
        let line = format!(
            "{}#{}#{}#{}#{}\n",
            record.variant, record.variant_freq, record.candidate, record.candidate_freq, record.ld
        );
        match verdict {
            CleanVerdict::Kept => cleaned.push_str(&line),
            CleanVerdict::Deleted => deleted.push_str(&line),
        }
    }
    (cleaned, deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(variant: &str, candidate: &str) -> ChainedRecord {
        ChainedRecord {
            variant: variant.to_string(),
            variant_freq: 1,
            candidate: candidate.to_string(),
            candidate_freq: 10,
            ld: 1,
        }
    }

    #[test]
    fn unigram_record_is_always_kept_and_marks_part_done() {
        let lexicon = ValidatedLexicon::build_from_words(std::iter::empty()).unwrap();
        let mut cc = Chainclean::new();
        let rows = cc.run(&[rec("foo", "food")], &lexicon, '_', 0);
        assert_eq!(rows[0].1, CleanVerdict::Kept);
    }

    #[test]
    fn multigram_kept_only_when_all_parts_resolved() {
        let lexicon =
            ValidatedLexicon::build_from_words(vec!["bar".to_string()].into_iter()).unwrap();
        let mut cc = Chainclean::new();
        let records = vec![rec("foo_bar", "food_bar")];
        let rows = cc.run(&records, &lexicon, '_', 0);
        // "foo" unresolved (not validated, not yet done) -> deleted.
        assert_eq!(rows[0].1, CleanVerdict::Deleted);
    }

    #[test]
    fn multigram_kept_once_unigram_resolves_its_unknown_part() {
        let lexicon =
            ValidatedLexicon::build_from_words(vec!["bar".to_string()].into_iter()).unwrap();
        let mut cc = Chainclean::new();
        let records = vec![rec("foo", "food"), rec("foo_bar", "food_bar")];
        let rows = cc.run(&records, &lexicon, '_', 0);
        assert_eq!(rows[0].1, CleanVerdict::Kept);
        assert_eq!(rows[1].1, CleanVerdict::Kept);
    }

    #[test]
    fn low_enforces_minimum_total_character_count() {
        let lexicon = ValidatedLexicon::build_from_words(std::iter::empty()).unwrap();
        let mut cc = Chainclean::new();
        let rows = cc.run(&[rec("ab", "cd")], &lexicon, '_', 5);
        assert_eq!(rows[0].1, CleanVerdict::Deleted);
    }

    #[test]
    fn duplicate_variant_line_is_ignored() {
        let lexicon = ValidatedLexicon::build_from_words(std::iter::empty()).unwrap();
        let mut cc = Chainclean::new();
        let records = vec![rec("foo", "food"), rec("foo", "fool")];
        let rows = cc.run(&records, &lexicon, '_', 0);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn split_parts_splits_on_separator_and_hyphen() {
        assert_eq!(split_parts("a_b-c", '_'), vec!["a", "b", "c"]);
    }
}

//! LD-calc: lifts anagram-collision buckets into concrete variant/candidate
//! string pairs, filtered by Levenshtein distance and lexicality, and fills
//! the 14-field LD-record.
//!
//! Grounded on `original_source/src/TICCL-LDcalc.cxx`.

use crate::alphabet::{ld, Alphabet};
use crate::error::{Result, TicclError};
use crate::freq::FreqMaps;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One row of the `.ldcalc` file: 14 `~`-separated fields.
///
/// Derives `Serialize`/`Deserialize` solely so `--debug-json` can render it
/// (SPEC_FULL.md's AMBIENT note on the data model); the pipeline itself
/// never round-trips this through a binary format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdRecord {
    pub str1: String,
    pub freq1: u64,
    pub low_freq1: u64,
    pub str2: String,
    pub freq2: u64,
    pub low_freq2: u64,
    pub ccv: u64,
    pub ld: u32,
    pub cls: u32,
    pub canon: bool,
    pub fl_overlap: bool,
    pub ll_overlap: bool,
    pub is_khc: bool,
    pub ngram_points: u32,
}

impl LdRecord {
    pub fn key(&self) -> String {
        format!("{}~{}", self.str1, self.str2)
    }

    /// Serializes to the `.ldcalc` 14-field, `~`-separated line shape.
    pub fn to_line(&self) -> String {
        format!(
            "{}~{}~{}~{}~{}~{}~{}~{}~{}~{}~{}~{}~{}~{}",
            self.str1,
            self.freq1,
            self.low_freq1,
            self.str2,
            self.freq2,
            self.low_freq2,
            self.ccv,
            self.ld,
            self.cls,
            self.canon as u8,
            self.fl_overlap as u8,
            self.ll_overlap as u8,
            self.is_khc as u8,
            self.ngram_points,
        )
    }
}

/// Merges two records that landed on the same `str1~str2` key. Per
/// SPEC_FULL.md §9's resolved open question: all boolean/overlap fields must
/// agree (a mismatch is a logic error — two derivations of the same pair
/// should never disagree), and `ngram_points` is kept as the maximum.
pub fn merge_records(existing: &mut LdRecord, incoming: &LdRecord) -> Result<()> {
    if existing.ld != incoming.ld
        || existing.cls != incoming.cls
        || existing.canon != incoming.canon
        || existing.fl_overlap != incoming.fl_overlap
        || existing.ll_overlap != incoming.ll_overlap
        || existing.is_khc != incoming.is_khc
    {
        return Err(TicclError::logic(format!(
            "duplicate LD-record key {} disagrees on derived fields",
            existing.key()
        )));
    }
    existing.ngram_points = existing.ngram_points.max(incoming.ngram_points);
    Ok(())
}

/// Splits an n-gram token on the configured separator.
pub fn split_ngram(word: &str, separator: char) -> Vec<&str> {
    word.split(separator).collect()
}

/// If `parts1` and `parts2` have equal arity and differ at exactly one
/// position, returns `(position, part1, part2)` for that position.
fn single_position_diff<'a>(parts1: &[&'a str], parts2: &[&'a str]) -> Option<(usize, &'a str, &'a str)> {
    if parts1.len() != parts2.len() || parts1.len() < 2 {
        return None;
    }
    let mut diffs: Vec<usize> = Vec::new();
    for i in 0..parts1.len() {
        if parts1[i] != parts2[i] {
            diffs.push(i);
        }
    }
    if diffs.len() == 1 {
        let i = diffs[0];
        Some((i, parts1[i], parts2[i]))
    } else {
        None
    }
}

/// Outcome of running a single candidate pair through the filter chain.
#[derive(Debug, Clone)]
pub enum Outcome {
    Accepted(LdRecord),
    /// N-gram reduced to a unigram diff below `low_limit`: recorded verbatim
    /// (the original n-gram pair, not the diff) in the `.short` file.
    Short { variant: String, candidate: String },
    /// N-gram reduced to a unigram diff pair that is itself accepted (and
    /// processed as its own candidate); the reduction is only tallied here.
    NgramCounted { diff_variant: String, diff_candidate: String },
    Rejected,
}

/// Carries the configuration needed to evaluate one candidate pair.
pub struct LdCalcContext<'a> {
    pub alphabet: &'a Alphabet,
    pub freqs: &'a FreqMaps,
    pub artifrq: u64,
    pub ld_value: u32,
    pub separator: char,
    pub low_limit: usize,
    pub nohld: bool,
}

/// Runs one candidate pair through the filter chain described in
/// SPEC_FULL.md §4.5. `transposition` selects the transposition-scan LD rule
/// (`ld == 2` exactly) over the set-comparison rule (`ld <= ld_value`).
/// `is_khc` marks a pair flagged as a known historical confusion, which may
/// bypass the LD check when `ctx.nohld` is set.
pub fn evaluate_pair(
    ctx: &LdCalcContext,
    mut s1: &str,
    mut s2: &str,
    ccv: u64,
    transposition: bool,
    is_khc: bool,
    diachronic: bool,
) -> Outcome {
    let lf1 = ctx.freqs.low_freq_of(s1);
    let lf2 = ctx.freqs.low_freq_of(s2);

    // Step 1: order — the higher-low-frequency word becomes the candidate
    // (str2); ties break on raw string ordering as a stand-in for the
    // reference's hash tiebreaker (both are total orders over the same
    // domain, and determinism is all §5 requires of tie-breaking).
    let (variant, candidate, low_variant, low_candidate) = if lf2 > lf1 || (lf2 == lf1 && s2 < s1) {
        (s1, s2, lf1, lf2)
    } else {
        (s2, s1, lf2, lf1)
    };
    s1 = variant;
    s2 = candidate;

    if !diachronic && low_variant >= ctx.artifrq {
        return Outcome::Rejected;
    }
    if !ctx.alphabet.all_chars_known(s2) {
        return Outcome::Rejected;
    }

    // Step 2: frequency test.
    if low_candidate < ctx.artifrq {
        return Outcome::Rejected;
    }

    // Step 3: n-gram analysis.
    let parts1 = split_ngram(s1, ctx.separator);
    let parts2 = split_ngram(s2, ctx.separator);
    let (mut cur1, mut cur2) = (s1.to_string(), s2.to_string());
    if parts1.len() > 1 {
        if let Some((_, diff1, diff2)) = single_position_diff(&parts1, &parts2) {
            let shorter_len = diff1.chars().count().min(diff2.chars().count());
            if shorter_len < ctx.low_limit {
                return Outcome::Short {
                    variant: s1.to_string(),
                    candidate: s2.to_string(),
                };
            }
            return Outcome::NgramCounted {
                diff_variant: diff1.to_string(),
                diff_candidate: diff2.to_string(),
            };
        }
        // Equal arity but more than one differing part, or unequal arity:
        // no reduction applies; fall through and evaluate the whole n-gram.
        cur1 = s1.to_string();
        cur2 = s2.to_string();
    }

    // Step 4: LD check.
    let distance = ld(&cur1.to_lowercase(), &cur2.to_lowercase());
    let bypass = is_khc && ctx.nohld;
    if !bypass {
        if transposition {
            if distance != 2 {
                return Outcome::Rejected;
            }
        } else if distance > ctx.ld_value {
            return Outcome::Rejected;
        }
    }

    // Step 5: field fill.
    let len1 = cur1.chars().count() as u32;
    let len2 = cur2.chars().count() as u32;
    let cls = len1.max(len2).saturating_sub(distance);
    let fl_overlap = first_char_eq(&cur1, &cur2);
    let ll_overlap = last_two_eq(&cur1, &cur2);
    let canon = low_candidate >= ctx.artifrq;

    Outcome::Accepted(LdRecord {
        str1: cur1.clone(),
        freq1: ctx.freqs.surface_freq(&cur1),
        low_freq1: ctx.freqs.low_freq_of(&cur1),
        str2: cur2.clone(),
        freq2: ctx.freqs.surface_freq(&cur2),
        low_freq2: ctx.freqs.low_freq_of(&cur2),
        ccv,
        ld: distance,
        cls,
        canon,
        fl_overlap,
        ll_overlap,
        is_khc,
        ngram_points: 0,
    })
}

fn first_char_eq(a: &str, b: &str) -> bool {
    a.chars().next() == b.chars().next()
}

fn last_two_eq(a: &str, b: &str) -> bool {
    let tail = |s: &str| -> Vec<char> {
        let chars: Vec<char> = s.chars().collect();
        let n = chars.len();
        chars[n.saturating_sub(2)..].to_vec()
    };
    tail(a) == tail(b)
}

/// Accumulates the whole-pass state: accepted records (merged on
/// duplicate keys), the `.short` file rows, and the ambiguity ledger that
/// tallies n-gram reductions per disambiguation key.
#[derive(Debug, Default)]
pub struct LdCalcPass {
    pub records: AHashMap<String, LdRecord>,
    pub short: Vec<(String, String)>,
    /// lowercased `diff_variant~diff_candidate` -> accumulated vote count.
    pub ambi: AHashMap<String, u32>,
}

impl LdCalcPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Accepted(rec) => {
                let key = rec.key();
                if let Some(existing) = self.records.get_mut(&key) {
                    merge_records(existing, &rec)?;
                } else {
                    self.records.insert(key, rec);
                }
            }
            Outcome::Short { variant, candidate } => {
                self.short.push((variant, candidate));
            }
            Outcome::NgramCounted { diff_variant, diff_candidate } => {
                let key = format!(
                    "{}~{}",
                    diff_variant.to_lowercase(),
                    diff_candidate.to_lowercase()
                );
                *self.ambi.entry(key).or_insert(0) += 1;
            }
            Outcome::Rejected => {}
        }
        Ok(())
    }

    /// Final pass: adds each ambiguity key's accumulated vote count onto the
    /// `ngram_points` of every surviving LD-record whose lowercased
    /// `str1~str2` key matches. This is how a popular unigram reduction
    /// "votes up" the records that reduce to it (SPEC_FULL.md §4.5 supplement).
    pub fn apply_ambi_votes(&mut self) {
        for rec in self.records.values_mut() {
            let key = format!("{}~{}", rec.str1.to_lowercase(), rec.str2.to_lowercase());
            if let Some(&votes) = self.ambi.get(&key) {
                rec.ngram_points += votes;
            }
        }
    }

    pub fn into_records(self) -> Vec<LdRecord> {
        let mut v: Vec<LdRecord> = self.records.into_values().collect();
        v.sort_by(|a, b| a.key().cmp(&b.key()));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet() -> Alphabet {
        let mut a = Alphabet::new();
        for c in "abcde".chars() {
            a.insert(c, c as u64);
        }
        a
    }

    // S4: LD-calc on (cab, cad) produces ld==1, cls==2, FLoverlap==1,
    // LLoverlap==0, canon==1.
    #[test]
    fn scenario_s4_cab_cad() {
        let alphabet = alphabet();
        let mut freqs = FreqMaps::new();
        freqs.accumulate_low("cab", 5, 100);
        freqs.accumulate_low("cad", 200, 100);
        let ctx = LdCalcContext {
            alphabet: &alphabet,
            freqs: &freqs,
            artifrq: 100,
            ld_value: 2,
            separator: '_',
            low_limit: 3,
            nohld: false,
        };
        let outcome = evaluate_pair(&ctx, "cab", "cad", 1, false, false, false);
        match outcome {
            Outcome::Accepted(rec) => {
                assert_eq!(rec.ld, 1);
                assert_eq!(rec.cls, 2);
                assert!(rec.fl_overlap);
                assert!(!rec.ll_overlap);
                assert!(rec.canon);
                assert_eq!(rec.str1, "cab");
                assert_eq!(rec.str2, "cad");
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn rejects_when_candidate_low_freq_below_artifrq() {
        let alphabet = alphabet();
        let mut freqs = FreqMaps::new();
        freqs.accumulate_low("cab", 5, 100);
        freqs.accumulate_low("cad", 10, 100);
        let ctx = LdCalcContext {
            alphabet: &alphabet,
            freqs: &freqs,
            artifrq: 100,
            ld_value: 2,
            separator: '_',
            low_limit: 3,
            nohld: false,
        };
        let outcome = evaluate_pair(&ctx, "cab", "cad", 1, false, false, false);
        assert!(matches!(outcome, Outcome::Rejected));
    }

    #[test]
    fn khc_bypasses_ld_check_under_nohld() {
        let alphabet = alphabet();
        let mut freqs = FreqMaps::new();
        freqs.accumulate_low("cab", 5, 100);
        freqs.accumulate_low("aeae", 200, 100);
        let ctx = LdCalcContext {
            alphabet: &alphabet,
            freqs: &freqs,
            artifrq: 100,
            ld_value: 1,
            separator: '_',
            low_limit: 3,
            nohld: true,
        };
        let outcome = evaluate_pair(&ctx, "cab", "aeae", 1, false, true, false);
        assert!(matches!(outcome, Outcome::Accepted(_)));
    }

    #[test]
    fn merge_keeps_max_ngram_points_and_rejects_disagreeing_fields() {
        let a = LdRecord {
            str1: "x".into(),
            freq1: 1,
            low_freq1: 1,
            str2: "y".into(),
            freq2: 1,
            low_freq2: 1,
            ccv: 1,
            ld: 1,
            cls: 1,
            canon: true,
            fl_overlap: true,
            ll_overlap: true,
            is_khc: false,
            ngram_points: 2,
        };
        let mut b = a.clone();
        b.ngram_points = 9;
        let mut merged = a.clone();
        merge_records(&mut merged, &b).unwrap();
        assert_eq!(merged.ngram_points, 9);

        let mut c = a.clone();
        c.ld = 2;
        let mut merged2 = a;
        assert!(merge_records(&mut merged2, &c).is_err());
    }

    #[test]
    fn ambi_votes_add_to_matching_unigram_record() {
        let mut pass = LdCalcPass::new();
        pass.record(Outcome::NgramCounted {
            diff_variant: "cab".into(),
            diff_candidate: "cad".into(),
        })
        .unwrap();
        pass.record(Outcome::NgramCounted {
            diff_variant: "Cab".into(),
            diff_candidate: "Cad".into(),
        })
        .unwrap();
        pass.records.insert(
            "cab~cad".to_string(),
            LdRecord {
                str1: "cab".into(),
                freq1: 1,
                low_freq1: 1,
                str2: "cad".into(),
                freq2: 1,
                low_freq2: 1,
                ccv: 1,
                ld: 1,
                cls: 2,
                canon: true,
                fl_overlap: true,
                ll_overlap: false,
                is_khc: false,
                ngram_points: 0,
            },
        );
        pass.apply_ambi_votes();
        assert_eq!(pass.records["cab~cad"].ngram_points, 2);
    }
}

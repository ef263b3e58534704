//! Ranker: scores each LD-record against its variant's other candidates
//! using 14 features, converts each feature to a within-group integer rank,
//! and aggregates a single composite rank in `[0, 1]`.
//!
//! Grounded on `original_source/src/TICCL-rank.cxx`.

use crate::confusion::ConfusionTable;
use crate::ldrecord::LdRecord;
use crate::wordvec::WordVectors;
use ahash::AHashMap;

/// 1-based feature column numbers, matching SPEC_FULL.md §4.6's numbering
/// (and the `--skipcols` CLI surface).
pub mod feature {
    pub const F2LEN: u8 = 1;
    pub const FREQ: u8 = 2;
    pub const LD: u8 = 3;
    pub const CLS: u8 = 4;
    pub const CANON: u8 = 5;
    pub const FL: u8 = 6;
    pub const LL: u8 = 7;
    pub const KHC: u8 = 8;
    pub const PAIRS1: u8 = 9;
    pub const PAIRS2: u8 = 10;
    pub const MEDIAN: u8 = 11;
    pub const VARIANT: u8 = 12;
    pub const COSINE: u8 = 13;
    pub const NGRAM: u8 = 14;
    pub const ALL: [u8; 14] = [
        F2LEN, FREQ, LD, CLS, CANON, FL, LL, KHC, PAIRS1, PAIRS2, MEDIAN, VARIANT, COSINE, NGRAM,
    ];
}

/// Corpus-wide statistics needed by features 9-11, computed once and shared
/// read-only across every variant group (SPEC_FULL.md §4.6 supplement).
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    /// CCV -> number of LD-records sharing that CCV ("pairs1").
    pub pairs1_counts: AHashMap<u64, u32>,
    /// CCV -> median candidate (`freq2`) frequency observed under it.
    pub medians: AHashMap<u64, u64>,
    /// CCV -> second-order diagonal count ("pairs2").
    pub pairs2_counts: AHashMap<u64, u32>,
}

/// Builds `pairs1_counts` and `medians` from the whole corpus's LD-records.
pub fn compute_corpus_stats(records: &[LdRecord]) -> CorpusStats {
    let mut pairs1_counts: AHashMap<u64, u32> = AHashMap::new();
    let mut freqs_by_ccv: AHashMap<u64, Vec<u64>> = AHashMap::new();
    for rec in records {
        *pairs1_counts.entry(rec.ccv).or_insert(0) += 1;
        freqs_by_ccv.entry(rec.ccv).or_default().push(rec.freq2);
    }
    let mut medians = AHashMap::new();
    for (ccv, mut freqs) in freqs_by_ccv {
        freqs.sort_unstable();
        let n = freqs.len();
        let median = if n % 2 == 0 {
            (freqs[n / 2 - 1] + freqs[n / 2]) / 2
        } else {
            freqs[n / 2]
        };
        medians.insert(ccv, median);
    }
    CorpusStats {
        pairs1_counts,
        medians,
        pairs2_counts: AHashMap::new(),
    }
}

/// Computes the "pairs2" second-order diagonal count (feature #10) from the
/// confusion table's 2-characters-per-side entries. For every such pair
/// `ab~cd` whose own CCV already has a nonzero `pairs1` count, computes the
/// CCVs of the four "diagonal" single-character substitutions (a-c, a-d,
/// b-c, b-d) and looks up each diagonal's own `pairs1` count; the winning
/// complementary pair of diagonals (a-c/b-d, or a-d/b-c, whichever combined
/// count is larger) becomes the value stored under the *original* CCV.
///
/// The reference implementation's max search only inspects three of the
/// four diagonals (an apparent off-by-one); this rewrite inspects all four,
/// noted as a deliberate correction in DESIGN.md.
pub fn compute_pairs2(
    confusion: &ConfusionTable,
    alphabet: &crate::alphabet::Alphabet,
    pairs1_counts: &AHashMap<u64, u32>,
) -> AHashMap<u64, u32> {
    let mut out = AHashMap::new();
    for (&ccv, pairs) in &confusion.buckets {
        if pairs1_counts.get(&ccv).copied().unwrap_or(0) == 0 {
            continue;
        }
        for (left, right) in pairs {
            let lchars: Vec<char> = left.chars().collect();
            let rchars: Vec<char> = right.chars().collect();
            if lchars.len() != 2 || rchars.len() != 2 {
                continue;
            }
            let codes: Option<Vec<u64>> = [lchars[0], lchars[1], rchars[0], rchars[1]]
                .iter()
                .map(|&c| alphabet.code_of(c))
                .collect();
            let codes = match codes {
                Some(c) => c,
                None => continue,
            };
            let (b1, b2, b3, b4) = (codes[0], codes[1], codes[2], codes[3]);
            let diag = |x: u64, y: u64| x.abs_diff(y);
            let counts = [
                pairs1_counts.get(&diag(b1, b3)).copied().unwrap_or(0), // a-c
                pairs1_counts.get(&diag(b1, b4)).copied().unwrap_or(0), // a-d
                pairs1_counts.get(&diag(b2, b3)).copied().unwrap_or(0), // b-c
                pairs1_counts.get(&diag(b2, b4)).copied().unwrap_or(0), // b-d
            ];
            let (max_pos, &max_val) = counts
                .iter()
                .enumerate()
                .max_by_key(|&(_, &v)| v)
                .unwrap();
            if max_val == 0 {
                continue;
            }
            let complement = counts[3 - max_pos];
            let value = max_val + complement;
            let entry = out.entry(ccv).or_insert(0);
            *entry = (*entry).max(value);
        }
    }
    out
}

/// The LD-record plus 14 per-feature within-group ranks and the composite.
#[derive(Debug, Clone)]
pub struct RankRecord {
    pub record: LdRecord,
    pub reduced_candidate_freq: u64,
    pub f2len: u32,
    pub lower_candidate: String,
    pub pairs1: u32,
    pub pairs2: u32,
    pub median: u64,
    pub cosine_present: bool,
    pub ranks: [u32; 14],
    pub composite: f64,
}

impl RankRecord {
    fn ix(feature: u8) -> usize {
        (feature - 1) as usize
    }

    pub fn rank_of(&self, feature: u8) -> u32 {
        self.ranks[Self::ix(feature)]
    }

    /// `variant#vfreq#cc#ccfreq#ccv#ld#rank` per SPEC_FULL.md §6.
    pub fn to_line(&self) -> String {
        format!(
            "{}#{}#{}#{}#{}#{}#{}",
            self.record.str1,
            self.record.freq1,
            self.record.str2,
            self.record.freq2,
            self.record.ccv,
            self.record.ld,
            self.composite,
        )
    }
}

fn dense_ranks<T: Ord + Copy>(values: &[T], descending: bool) -> Vec<u32> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    if descending {
        order.sort_by(|&a, &b| values[b].cmp(&values[a]));
    } else {
        order.sort_by(|&a, &b| values[a].cmp(&values[b]));
    }
    let mut ranks = vec![0u32; values.len()];
    let mut rank = 1u32;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 {
            let prev_idx = order[pos - 1];
            if values[idx] != values[prev_idx] {
                rank += 1;
            }
        }
        ranks[idx] = rank;
    }
    ranks
}

/// Feature-2 artifrq subtraction knobs (SPEC_FULL.md §4.6 supplement).
pub struct RankOptions<'a> {
    pub skipcols: &'a [u8],
    pub subtract_artifreq_feature1: Option<u64>,
    pub subtract_artifreq_feature2: Option<u64>,
    pub cosine_threshold: f64,
}

/// Ranks one variant's whole candidate group (all LD-records sharing the
/// same `str1`). `wordvec`, if given, backs the cosine feature.
pub fn rank_variant_group(
    group: &[LdRecord],
    stats: &CorpusStats,
    opts: &RankOptions,
    wordvec: Option<&WordVectors>,
) -> Vec<RankRecord> {
    let n = group.len();
    if n == 0 {
        return Vec::new();
    }

    let reduced1: Vec<u64> = group
        .iter()
        .map(|r| match opts.subtract_artifreq_feature1 {
            Some(a) if r.freq2 >= a => r.freq2 - a,
            _ => r.freq2,
        })
        .collect();
    let f2len: Vec<u32> = group
        .iter()
        .map(|r| {
            let digits_of = match opts.subtract_artifreq_feature2 {
                Some(a) if r.freq2 >= a => r.freq2 - a,
                _ => r.freq2,
            };
            digits_of.to_string().len() as u32
        })
        .collect();
    let ld_values: Vec<u32> = group.iter().map(|r| r.ld).collect();
    let cls_values: Vec<u32> = group.iter().map(|r| r.cls).collect();
    let pairs1: Vec<u32> = group
        .iter()
        .map(|r| stats.pairs1_counts.get(&r.ccv).copied().unwrap_or(0))
        .collect();
    let pairs2: Vec<u32> = group
        .iter()
        .map(|r| stats.pairs2_counts.get(&r.ccv).copied().unwrap_or(0))
        .collect();
    let medians: Vec<u64> = group
        .iter()
        .map(|r| stats.medians.get(&r.ccv).copied().unwrap_or(0))
        .collect();
    let ngram_points: Vec<u32> = group.iter().map(|r| r.ngram_points).collect();

    let lower_candidates: Vec<String> = group.iter().map(|r| r.str2.to_lowercase()).collect();
    let mut lowvar_counts: AHashMap<&str, u32> = AHashMap::new();
    for lc in &lower_candidates {
        *lowvar_counts.entry(lc.as_str()).or_insert(0) += 1;
    }
    let variant_counts: Vec<u32> = lower_candidates
        .iter()
        .map(|lc| lowvar_counts[lc.as_str()])
        .collect();

    let cosine_present: Vec<bool> = group
        .iter()
        .map(|r| {
            wordvec
                .map(|wv| wv.top_k_contains(&r.str1, &r.str2, 20, opts.cosine_threshold))
                .unwrap_or(false)
        })
        .collect();

    let f2len_ranks = dense_ranks(&f2len, true);
    let freq_ranks = dense_ranks(&reduced1, true);
    let ld_ranks = dense_ranks(&ld_values, false);
    let cls_ranks = dense_ranks(&cls_values, true);
    let pairs1_ranks = dense_ranks(&pairs1, true);
    let pairs2_ranks = dense_ranks(&pairs2, true);
    let median_ranks = dense_ranks(&medians, true);
    let variant_ranks = dense_ranks(&variant_counts, true);
    let ngram_ranks = dense_ranks(&ngram_points, true);

    let skip = |col: u8| opts.skipcols.contains(&col);
    let kept = feature::ALL.iter().filter(|&&c| !skip(c)).count().max(1) as f64;

    let mut out = Vec::with_capacity(n);
    let mut composites_raw = Vec::with_capacity(n);
    for i in 0..n {
        let rec = &group[i];
        let canon_rank = if rec.canon { 1 } else { 10 };
        let fl_rank = if rec.fl_overlap { 1 } else { 2 };
        let ll_rank = if rec.ll_overlap { 1 } else { 2 };
        let khc_rank = if rec.is_khc { 1 } else { 2 };
        let cosine_rank = if cosine_present[i] { 1 } else { 10 };

        let ranks = [
            f2len_ranks[i],
            freq_ranks[i],
            ld_ranks[i],
            cls_ranks[i],
            canon_rank,
            fl_rank,
            ll_rank,
            khc_rank,
            pairs1_ranks[i],
            pairs2_ranks[i],
            median_ranks[i],
            variant_ranks[i],
            cosine_rank,
            ngram_ranks[i],
        ];

        let sum: u32 = feature::ALL
            .iter()
            .enumerate()
            .filter(|&(_, &col)| !skip(col))
            .map(|(idx, _)| ranks[idx])
            .sum();
        let raw = sum as f64 / kept;
        composites_raw.push(raw);

        out.push(RankRecord {
            record: rec.clone(),
            reduced_candidate_freq: reduced1[i],
            f2len: f2len[i],
            lower_candidate: lower_candidates[i].clone(),
            pairs1: pairs1[i],
            pairs2: pairs2[i],
            median: medians[i],
            cosine_present: cosine_present[i],
            ranks,
            composite: 0.0,
        });
    }

    if n == 1 {
        out[0].composite = 1.0;
    } else {
        let total: f64 = composites_raw.iter().sum();
        for (i, rec) in out.iter_mut().enumerate() {
            rec.composite = if total > 0.0 {
                1.0 - composites_raw[i] / total
            } else {
                1.0
            };
        }
    }
    out
}

/// Sorts a variant's ranked candidates by descending composite rank and
/// keeps at most `clip`.
pub fn top_k(mut ranked: Vec<RankRecord>, clip: usize) -> Vec<RankRecord> {
    ranked.sort_by(|a, b| {
        b.composite
            .partial_cmp(&a.composite)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(clip.max(1));
    ranked
}

/// When `clip == 1`, the whole ranked file is re-sorted by candidate
/// frequency descending to feed chaining (SPEC_FULL.md §4.6).
pub fn resort_by_candidate_freq_desc(mut ranked: Vec<RankRecord>) -> Vec<RankRecord> {
    ranked.sort_by(|a, b| b.record.freq2.cmp(&a.record.freq2));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(str1: &str, str2: &str, freq2: u64, ccv: u64, ld: u32, cls: u32) -> LdRecord {
        LdRecord {
            str1: str1.into(),
            freq1: 1,
            low_freq1: 1,
            str2: str2.into(),
            freq2,
            low_freq2: freq2,
            ccv,
            ld,
            cls,
            canon: true,
            fl_overlap: true,
            ll_overlap: false,
            is_khc: false,
            ngram_points: 0,
        }
    }

    // S5 (single-candidate rule): one variant group with a single candidate
    // always gets composite rank 1.0.
    #[test]
    fn scenario_s5_single_candidate_group_is_rank_one() {
        let group = vec![rec("cab", "cad", 200, 1, 1, 2)];
        let stats = compute_corpus_stats(&group);
        let opts = RankOptions {
            skipcols: &[],
            subtract_artifreq_feature1: None,
            subtract_artifreq_feature2: None,
            cosine_threshold: 0.001,
        };
        let ranked = rank_variant_group(&group, &stats, &opts, None);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].composite, 1.0);
    }

    #[test]
    fn two_candidate_group_prefers_higher_frequency_and_lower_ld() {
        let group = vec![
            rec("cab", "cad", 500, 1, 1, 2),
            rec("cab", "dab", 50, 2, 2, 1),
        ];
        let stats = compute_corpus_stats(&group);
        let opts = RankOptions {
            skipcols: &[],
            subtract_artifreq_feature1: None,
            subtract_artifreq_feature2: None,
            cosine_threshold: 0.001,
        };
        let ranked = rank_variant_group(&group, &stats, &opts, None);
        let best = ranked
            .iter()
            .max_by(|a, b| a.composite.partial_cmp(&b.composite).unwrap())
            .unwrap();
        assert_eq!(best.record.str2, "cad");
    }

    #[test]
    fn skipcols_changes_the_divisor_not_just_the_sum() {
        let group = vec![
            rec("cab", "cad", 500, 1, 1, 2),
            rec("cab", "dab", 50, 2, 2, 1),
        ];
        let stats = compute_corpus_stats(&group);
        let opts_all = RankOptions {
            skipcols: &[],
            subtract_artifreq_feature1: None,
            subtract_artifreq_feature2: None,
            cosine_threshold: 0.001,
        };
        let opts_skip = RankOptions {
            skipcols: &[feature::COSINE, feature::KHC],
            subtract_artifreq_feature1: None,
            subtract_artifreq_feature2: None,
            cosine_threshold: 0.001,
        };
        let a = rank_variant_group(&group, &stats, &opts_all, None);
        let b = rank_variant_group(&group, &stats, &opts_skip, None);
        // Both should still sum composite proportions consistently (same
        // winner), but raw per-record composites should generally differ.
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn dense_ranks_ties_share_rank() {
        let values = [5, 5, 3, 1];
        let ranks = dense_ranks(&values, true);
        assert_eq!(ranks[0], ranks[1]);
        assert!(ranks[2] > ranks[0]);
        assert!(ranks[3] > ranks[2]);
    }
}

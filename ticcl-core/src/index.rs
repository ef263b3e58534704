//! Indexer: both the confusion-driven (Variant A) and word-driven ("NT",
//! Variant B) algorithms that pair corpus anagram hashes whose difference
//! equals a known CCV.
//!
//! Grounded on `TICCL-indexer-par.cxx` (Variant A) and
//! `TICCL-indexerNT.cxx` (Variant B).

use crate::workers::{build_pool, partition};
use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use std::sync::Mutex;

/// CCV -> ascending set of the *smaller* hash of every matched pair.
#[derive(Debug, Clone, Default)]
pub struct IndexResult {
    pub entries: AHashMap<u64, Vec<u64>>,
}

impl IndexResult {
    fn insert(&mut self, ccv: u64, smaller: u64) {
        let bucket = self.entries.entry(ccv).or_default();
        if let Err(pos) = bucket.binary_search(&smaller) {
            bucket.insert(pos, smaller);
        }
    }

    fn merge(&mut self, other: IndexResult) {
        for (ccv, values) in other.entries {
            for v in values {
                self.insert(ccv, v);
            }
        }
    }
}

/// Variant A ("confusion-driven"): for every CCV, two-pointer merges the
/// sorted hash set against itself shifted by that CCV. Note that because
/// the reference's running `shift` accumulator starts at zero and only ever
/// sums consecutive `cv - prev` deltas over an ascending CCV list, it
/// telescopes to exactly the current CCV — so each CCV can be processed
/// independently with `shift == cv`, which is what makes slice-local
/// parallelism correctness-preserving (SPEC_FULL.md §5).
pub fn index_variant_a(
    sorted_hashes: &[u64],
    ccvs: &[u64],
    foci: &AHashSet<u64>,
    threads: usize,
) -> IndexResult {
    let mut sorted_ccvs: Vec<u64> = ccvs.to_vec();
    sorted_ccvs.sort_unstable();
    sorted_ccvs.dedup();

    let pool = build_pool(threads);
    let slices = partition(sorted_ccvs.len(), threads.max(1));
    let merged = Mutex::new(IndexResult::default());

    pool.install(|| {
        slices.par_iter().for_each(|&(start, end)| {
            let mut local = IndexResult::default();
            for &cv in &sorted_ccvs[start..end] {
                two_pointer_pairs(sorted_hashes, cv, foci, &mut local);
            }
            merged.lock().unwrap().merge(local);
        });
    });

    merged.into_inner().unwrap()
}

/// For a single CCV `shift`, finds every pair `(v, v+shift)` both present in
/// `sorted_hashes` via a two-pointer walk, keeping the pair only if `v` or
/// `v+shift` is in the foci set.
fn two_pointer_pairs(sorted_hashes: &[u64], shift: u64, foci: &AHashSet<u64>, out: &mut IndexResult) {
    let mut j = 0usize;
    for &v in sorted_hashes {
        let target = v + shift;
        while j < sorted_hashes.len() && sorted_hashes[j] < target {
            j += 1;
        }
        if j >= sorted_hashes.len() {
            break;
        }
        if sorted_hashes[j] == target && (foci.contains(&v) || foci.contains(&target)) {
            out.insert(shift, v);
        }
    }
}

/// Variant B ("NT", word-driven): every corpus hash seeds an outward walk
/// in both directions over the sorted hash set, recording `diff -> smaller`
/// whenever the difference to a neighbor matches a known CCV. Each
/// direction stops once the running difference exceeds the largest known
/// CCV (SPEC_FULL.md §4.4's supplement).
pub fn index_variant_nt(
    sorted_hashes: &[u64],
    ccvs: &[u64],
    threads: usize,
) -> IndexResult {
    let ccv_set: AHashSet<u64> = ccvs.iter().copied().collect();
    let max_ccv = ccvs.iter().copied().max().unwrap_or(0);

    let pool = build_pool(threads);
    let slices = partition(sorted_hashes.len(), threads.max(1));
    let merged = Mutex::new(IndexResult::default());

    pool.install(|| {
        slices.par_iter().for_each(|&(start, end)| {
            let mut local = IndexResult::default();
            for seed_idx in start..end {
                walk_from_seed(sorted_hashes, seed_idx, &ccv_set, max_ccv, &mut local);
            }
            merged.lock().unwrap().merge(local);
        });
    });

    merged.into_inner().unwrap()
}

fn walk_from_seed(
    sorted_hashes: &[u64],
    seed_idx: usize,
    ccv_set: &AHashSet<u64>,
    max_ccv: u64,
    out: &mut IndexResult,
) {
    let seed = sorted_hashes[seed_idx];

    // Forward: neighbors with hash > seed.
    let mut i = seed_idx + 1;
    while i < sorted_hashes.len() {
        let diff = sorted_hashes[i] - seed;
        if diff > max_ccv {
            break;
        }
        if ccv_set.contains(&diff) {
            out.insert(diff, seed);
        }
        i += 1;
    }

    // Backward: neighbors with hash < seed.
    if seed_idx > 0 {
        let mut i = seed_idx - 1;
        loop {
            let diff = seed - sorted_hashes[i];
            if diff > max_ccv {
                break;
            }
            if ccv_set.contains(&diff) {
                out.insert(diff, sorted_hashes[i]);
            }
            if i == 0 {
                break;
            }
            i -= 1;
        }
    }
}

/// Renders the index file: `<ccv>#<inner1>,<inner2>,…`, one line per CCV.
/// CCV line order is unspecified (per spec); inner ordering is ascending.
pub fn render_index_file(index: &IndexResult) -> String {
    let mut out = String::new();
    for (ccv, values) in &index.entries {
        out.push_str(&ccv.to_string());
        out.push('#');
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        out.push_str(&rendered.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{hash, Alphabet};

    fn toy_alphabet() -> Alphabet {
        let mut a = Alphabet::new();
        a.insert('a', 3125);
        a.insert('b', 7776);
        a.insert('c', 16807);
        a.insert('d', 32768);
        a.insert('e', 59049);
        a
    }

    // S3: corpus {cab, cad, dab}, background {cab: F_art}. CCV |b-d|=25008
    // pairs hash(cab) with hash(cad).
    #[test]
    fn scenario_s3_indexer_pairs_cab_and_cad() {
        let alphabet = toy_alphabet();
        let h_cab = hash("cab", &alphabet);
        let h_cad = hash("cad", &alphabet);
        let h_dab = hash("dab", &alphabet);
        let mut hashes = vec![h_cab, h_cad, h_dab];
        hashes.sort_unstable();
        hashes.dedup();

        let ccv = 32768u64.abs_diff(7776);
        assert_eq!(ccv, 25008);

        let mut foci = AHashSet::new();
        foci.insert(h_cad); // cad is a correctable variant

        let index = index_variant_a(&hashes, &[ccv], &foci, 1);
        let bucket = index.entries.get(&ccv).expect("ccv present");
        let (lo, hi) = if h_cab < h_cad { (h_cab, h_cad) } else { (h_cad, h_cab) };
        assert!(bucket.contains(&lo));
        let _ = hi;
    }

    #[test]
    fn index_soundness_every_entry_has_real_corpus_pair() {
        let alphabet = toy_alphabet();
        let mut hashes: Vec<u64> = ["cab", "cad", "dab", "bad"]
            .iter()
            .map(|w| hash(w, &alphabet))
            .collect();
        hashes.sort_unstable();
        hashes.dedup();
        let mut foci: AHashSet<u64> = AHashSet::new();
        foci.extend(hashes.iter().copied());
        let ccvs = vec![25008u64, 1u64];

        let index = index_variant_a(&hashes, &ccvs, &foci, 2);
        for (&ccv, values) in &index.entries {
            for &v in values {
                assert!(hashes.binary_search(&v).is_ok());
                assert!(hashes.binary_search(&(v + ccv)).is_ok());
            }
        }
    }

    #[test]
    fn variant_a_and_nt_agree_on_pair_membership() {
        let alphabet = toy_alphabet();
        let mut hashes: Vec<u64> = ["cab", "cad", "dab", "bad", "cac"]
            .iter()
            .map(|w| hash(w, &alphabet))
            .collect();
        hashes.sort_unstable();
        hashes.dedup();
        let ccvs = vec![25008u64, 1u64, 3125u64];
        let mut foci: AHashSet<u64> = AHashSet::new();
        foci.extend(hashes.iter().copied());

        let a = index_variant_a(&hashes, &ccvs, &foci, 1);
        let b = index_variant_nt(&hashes, &ccvs, 1);

        for (&ccv, values_a) in &a.entries {
            let values_b = b.entries.get(&ccv).cloned().unwrap_or_default();
            for v in values_a {
                assert!(values_b.contains(v), "ccv {ccv} value {v} missing from NT result");
            }
        }
    }
}

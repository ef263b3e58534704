//! Worker-pool sizing and equal-cardinality partitioning shared by the
//! indexer, LD-calc and ranker stages.
//!
//! Grounded on `TICCL-indexer-par.cxx`/`TICCL-indexerNT.cxx`'s `init()`
//! functions, reimplemented over `rayon` per SPEC_FULL.md §5.

use rayon::{ThreadPool, ThreadPoolBuilder};

/// Builds a `rayon::ThreadPool` sized to `threads` (already resolved via
/// `RunConfig::resolve_threads`, including the "max" sentinel).
pub fn build_pool(threads: usize) -> ThreadPool {
    ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .expect("thread pool construction cannot fail with a non-zero count")
}

/// Splits `len` items into `workers` contiguous, equal-cardinality slices
/// (the last slice absorbs the remainder), returning `(start, end)` index
/// pairs. Mirrors the reference's `init()` chunking of the outer set.
pub fn partition(len: usize, workers: usize) -> Vec<(usize, usize)> {
    let workers = workers.max(1);
    if len == 0 {
        return Vec::new();
    }
    let chunk = len / workers;
    let remainder = len % workers;
    let mut out = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        if start >= len {
            break;
        }
        let extra = if i < remainder { 1 } else { 0 };
        let end = (start + chunk + extra).min(len);
        if end > start {
            out.push((start, end));
        }
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_every_index_exactly_once() {
        let slices = partition(17, 4);
        let mut covered = vec![false; 17];
        for (s, e) in slices {
            for i in s..e {
                assert!(!covered[i], "index {i} covered twice");
                covered[i] = true;
            }
        }
        assert!(covered.into_iter().all(|c| c));
    }

    #[test]
    fn partition_handles_more_workers_than_items() {
        let slices = partition(2, 8);
        let total: usize = slices.iter().map(|(s, e)| e - s).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn partition_handles_empty_input() {
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn build_pool_runs_work() {
        let pool = build_pool(2);
        let sum: i32 = pool.install(|| (1..=10).sum());
        assert_eq!(sum, 55);
    }
}

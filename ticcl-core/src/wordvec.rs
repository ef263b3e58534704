//! Optional word2vec vectors backing the ranker's `cosine_rank` feature.
//!
//! Grounded on `original_source/include/ticcl/word2vec.h` and
//! `src/word2vec.cxx` (`wordvec_tester`).

use ahash::AHashMap;
use std::io::BufRead;

/// A loaded Google word2vec-format vector table: word -> unit-normalized
/// embedding (normalization happens once at load time so cosine similarity
/// reduces to a dot product).
#[derive(Debug, Clone, Default)]
pub struct WordVectors {
    vocab: AHashMap<String, Vec<f32>>,
    dimension: usize,
}

impl WordVectors {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// Parses the text variant of the Google word2vec format: a header line
    /// `<vocab_size> <dimension>` followed by one `word f1 f2 … fN` line per
    /// entry. Vectors are L2-normalized on load.
    pub fn load<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(l) => l?,
            None => return Ok(Self::default()),
        };
        let mut header_parts = header.split_whitespace();
        let _vocab_size: usize = header_parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let dimension: usize = header_parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);

        let mut vocab = AHashMap::new();
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let word = match parts.next() {
                Some(w) => w.to_string(),
                None => continue,
            };
            let mut vec: Vec<f32> = parts.filter_map(|p| p.parse().ok()).collect();
            normalize(&mut vec);
            vocab.insert(word, vec);
        }
        Ok(Self { vocab, dimension })
    }

    fn cosine(&self, a: &str, b: &str) -> Option<f64> {
        let va = self.vocab.get(a)?;
        let vb = self.vocab.get(b)?;
        let dot: f32 = va.iter().zip(vb.iter()).map(|(x, y)| x * y).sum();
        Some(dot as f64)
    }

    /// The `k` nearest neighbors of `word` by cosine similarity, descending.
    pub fn nearest(&self, word: &str, k: usize) -> Vec<(String, f64)> {
        let target = match self.vocab.get(word) {
            Some(v) => v,
            None => return Vec::new(),
        };
        let mut dists: Vec<(String, f64)> = self
            .vocab
            .iter()
            .filter(|(w, _)| w.as_str() != word)
            .map(|(w, v)| {
                let dot: f32 = target.iter().zip(v.iter()).map(|(x, y)| x * y).sum();
                (w.clone(), dot as f64)
            })
            .collect();
        dists.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        dists.truncate(k);
        dists
    }

    /// True when `candidate` is among `variant`'s top-`k` nearest vectors
    /// with cosine similarity at or above `threshold` (§4.6 item 13, with
    /// the resolved semantics of SPEC_FULL.md §9: absence, including "no
    /// vectors loaded at all", yields `false`).
    pub fn top_k_contains(&self, variant: &str, candidate: &str, k: usize, threshold: f64) -> bool {
        if self.is_empty() {
            return false;
        }
        match self.cosine(variant, candidate) {
            Some(sim) if sim >= threshold => {
                self.nearest(variant, k).iter().any(|(w, _)| w == candidate)
            }
            _ => false,
        }
    }
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_header_and_vectors() {
        let data = "2 2\nfoo 1.0 0.0\nbar 0.0 1.0\n";
        let wv = WordVectors::load(data.as_bytes()).unwrap();
        assert_eq!(wv.dimension(), 2);
        assert_eq!(wv.len(), 2);
    }

    #[test]
    fn identical_direction_vectors_have_high_cosine() {
        let data = "2 2\nfoo 1.0 0.0\nbar 2.0 0.0\n";
        let wv = WordVectors::load(data.as_bytes()).unwrap();
        let sim = wv.cosine("foo", "bar").unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_vectors_never_report_presence() {
        let wv = WordVectors::default();
        assert!(!wv.top_k_contains("foo", "bar", 20, 0.001));
    }

    #[test]
    fn missing_word_yields_no_neighbors() {
        let data = "1 2\nfoo 1.0 0.0\n";
        let wv = WordVectors::load(data.as_bytes()).unwrap();
        assert!(wv.nearest("missing", 5).is_empty());
    }
}

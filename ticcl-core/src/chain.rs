//! Chain: builds the variant -> head forest from ranker output and flattens
//! it into final equivalence classes via `top_head` / `final_merge`.
//!
//! Grounded on `original_source/src/TICCL-chain.cxx`.

use crate::error::{Result, TicclError};
use ahash::{AHashMap, AHashSet};

/// One parsed ranker-output line: `variant#vfreq#cc#ccfreq[#ccv]#ld#rank`.
#[derive(Debug, Clone)]
pub struct ChainInput {
    pub variant: String,
    pub variant_freq: u64,
    pub candidate: String,
    pub candidate_freq: u64,
    pub ccv: Option<u64>,
    pub ld: u32,
}

/// Parses one `.ranked` line. Accepts both the 7-field shape (with `ccv`)
/// and the 6-field shape (without it), matching the reference's optional
/// `cc_val` column.
pub fn parse_chain_input(line: &str, path: impl AsRef<std::path::Path>, lineno: usize) -> Result<ChainInput> {
    let path = path.as_ref();
    let parts: Vec<&str> = line.split('#').collect();
    let (variant, variant_freq, candidate, candidate_freq, ccv, ld) = match parts.len() {
        7 => (
            parts[0],
            parts[1],
            parts[2],
            parts[3],
            Some(parts[4]),
            parts[5],
        ),
        6 => (parts[0], parts[1], parts[2], parts[3], None, parts[4]),
        _ => {
            return Err(TicclError::format(
                path,
                lineno,
                "expected 6 or 7 '#'-separated fields",
            ))
        }
    };
    Ok(ChainInput {
        variant: variant.to_string(),
        variant_freq: variant_freq
            .parse()
            .map_err(|_| TicclError::format(path, lineno, "non-numeric variant frequency"))?,
        candidate: candidate.to_string(),
        candidate_freq: candidate_freq
            .parse()
            .map_err(|_| TicclError::format(path, lineno, "non-numeric candidate frequency"))?,
        ccv: ccv
            .map(|s| s.parse().map_err(|_| TicclError::format(path, lineno, "non-numeric ccv")))
            .transpose()?,
        ld: ld
            .parse()
            .map_err(|_| TicclError::format(path, lineno, "non-numeric ld"))?,
    })
}

/// The chain forest: `heads` maps a word to its immediate (possibly
/// intermediate) head; `table` is its inverse, a head's direct followers.
#[derive(Debug, Default)]
pub struct Chain {
    heads: AHashMap<String, String>,
    table: AHashMap<String, AHashSet<String>>,
    var_freq: AHashMap<String, u64>,
    processed: AHashSet<String>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows `heads` to a fixed point, returning the topmost head of
    /// `word` (or `None` if `word` has no head at all).
    pub fn top_head(&self, word: &str) -> Option<String> {
        let mut current = self.heads.get(word)?.clone();
        while let Some(next) = self.heads.get(&current) {
            if next == &current {
                break;
            }
            current = next.clone();
        }
        Some(current)
    }

    pub fn head_of(&self, word: &str) -> Option<&String> {
        self.heads.get(word)
    }

    pub fn followers_of(&self, head: &str) -> Option<&AHashSet<String>> {
        self.table.get(head)
    }

    /// Ingests one edge `variant -> candidate`. A variant already seen in
    /// this run (e.g. duplicate lines from a `clip > 1` ranker run) is
    /// silently ignored.
    pub fn add_edge(&mut self, input: &ChainInput) {
        if self.processed.contains(&input.variant) {
            return;
        }
        self.processed.insert(input.variant.clone());
        self.var_freq.insert(input.variant.clone(), input.variant_freq);
        self.var_freq.insert(input.candidate.clone(), input.candidate_freq);

        match self.heads.get(&input.variant).cloned() {
            None => match self.heads.get(&input.candidate).cloned() {
                None => {
                    self.heads.insert(input.variant.clone(), input.candidate.clone());
                    self.table
                        .entry(input.candidate.clone())
                        .or_default()
                        .insert(input.variant.clone());
                }
                Some(candidate_head) => {
                    self.heads.insert(input.variant.clone(), candidate_head.clone());
                    self.table.entry(candidate_head).or_default().insert(input.variant.clone());
                }
            },
            Some(existing_head) => {
                // The variant already has a head from an earlier line; the
                // shorter path wins, so only rewrite when the new candidate
                // is itself the (or a higher) existing head.
                if existing_head != input.candidate && !self.heads.contains_key(&input.candidate) {
                    self.table.entry(existing_head).or_default().insert(input.candidate.clone());
                    self.heads.insert(input.candidate.clone(), self.heads[&input.variant].clone());
                }
            }
        }
    }

    /// Merges every sub-tree into its topmost head (S6: `A->B`, `B->C`
    /// yields `A->C`).
    pub fn final_merge(&mut self) {
        let words: Vec<String> = self.table.keys().cloned().collect();
        for word in words {
            let followers = match self.table.get(&word) {
                Some(set) if !set.is_empty() => set.clone(),
                _ => continue,
            };
            if let Some(head) = self.top_head(&word) {
                if head != word {
                    let head_entry = self.table.entry(head.clone()).or_default();
                    for follower in &followers {
                        head_entry.insert(follower.clone());
                        self.heads.insert(follower.clone(), head.clone());
                    }
                    self.table.get_mut(&word).unwrap().clear();
                }
            }
        }
    }

    /// Renders the `.chained` file: one line per `(variant, head)` edge,
    /// always marked `C` (chainclean is the stage that may demote a line
    /// to `D`eleted).
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut variants: Vec<&String> = self.heads.keys().collect();
        variants.sort();
        for variant in variants {
            let head = &self.heads[variant];
            let vfreq = self.var_freq.get(variant).copied().unwrap_or(0);
            let hfreq = self.var_freq.get(head).copied().unwrap_or(0);
            out.push_str(&format!("{variant}#{vfreq}#{head}#{hfreq}#0#C\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(variant: &str, vfreq: u64, cc: &str, ccfreq: u64) -> ChainInput {
        ChainInput {
            variant: variant.into(),
            variant_freq: vfreq,
            candidate: cc.into(),
            candidate_freq: ccfreq,
            ccv: None,
            ld: 1,
        }
    }

    // S6: A->B, B->C yields A->C after final_merge.
    #[test]
    fn scenario_s6_chain_transitive_closure() {
        let mut chain = Chain::new();
        chain.add_edge(&edge("A", 1, "B", 10));
        chain.add_edge(&edge("B", 10, "C", 100));
        chain.final_merge();
        assert_eq!(chain.top_head("A").unwrap(), "C");
    }

    #[test]
    fn duplicate_variant_line_is_ignored() {
        let mut chain = Chain::new();
        chain.add_edge(&edge("A", 1, "B", 10));
        chain.add_edge(&edge("A", 1, "Z", 999));
        assert_eq!(chain.head_of("A").unwrap(), "B");
    }

    #[test]
    fn parses_both_six_and_seven_field_lines() {
        let with_ccv = parse_chain_input("a#1#b#2#3#4#1.0", "x", 1).unwrap();
        assert_eq!(with_ccv.ccv, Some(3));
        let without_ccv = parse_chain_input("a#1#b#2#4#1.0", "x", 1).unwrap();
        assert_eq!(without_ccv.ccv, None);
    }

    #[test]
    fn chain_idempotence_running_twice_gives_same_heads() {
        let mut chain = Chain::new();
        chain.add_edge(&edge("A", 1, "B", 10));
        chain.add_edge(&edge("B", 10, "C", 100));
        chain.final_merge();
        let head_before = chain.top_head("A");
        chain.final_merge();
        let head_after = chain.top_head("A");
        assert_eq!(head_before, head_after);
    }
}

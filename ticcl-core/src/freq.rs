//! Case-sensitive and lower-cased ("low") frequency maps, including the
//! `F_art` accumulation rule.
//!
//! Grounded on `original_source/src/TICCL-LDcalc.cxx`'s `main()`, which
//! builds exactly these two maps before doing anything else. The
//! subtraction only happens here, not in Anahash's background merge (see
//! SPEC_FULL.md §3).

use ahash::AHashMap;

#[derive(Debug, Clone, Default)]
pub struct FreqMaps {
    /// Case-preserved surface frequency.
    surface: AHashMap<String, u64>,
    /// Lower-cased frequency, with `F_art` subtracted on second-hits of an
    /// already artificially-boosted word.
    low: AHashMap<String, u64>,
}

impl FreqMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_surface(&mut self, word: &str, freq: u64) {
        *self.surface.entry(word.to_string()).or_insert(0) += freq;
    }

    pub fn surface_freq(&self, word: &str) -> u64 {
        self.surface.get(word).copied().unwrap_or(0)
    }

    /// Accumulates `freq` for `word`'s lower-cased form into the low-freq
    /// map, applying the `F_art` rule: the first time a word's frequency
    /// meets or exceeds `artifrq`, the low map takes that frequency as-is;
    /// every subsequent hit for the same lowered word adds only
    /// `freq.saturating_sub(artifrq)` (so the artificial boost is not
    /// double-counted). Hits below `artifrq` simply accumulate.
    pub fn accumulate_low(&mut self, word: &str, freq: u64, artifrq: u64) {
        let lowered = word.to_lowercase();
        let entry = self.low.entry(lowered).or_insert(0);
        if freq >= artifrq && artifrq > 0 {
            if *entry == 0 {
                *entry = freq;
            } else {
                *entry += freq.saturating_sub(artifrq);
            }
        } else {
            *entry += freq;
        }
    }

    pub fn low_freq(&self, lowered_word: &str) -> u64 {
        self.low.get(lowered_word).copied().unwrap_or(0)
    }

    pub fn low_freq_of(&self, word: &str) -> u64 {
        self.low_freq(&word.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_hit_at_or_above_artifrq_is_taken_as_is() {
        let mut maps = FreqMaps::new();
        maps.accumulate_low("Cab", 1000, 500);
        assert_eq!(maps.low_freq_of("Cab"), 1000);
    }

    #[test]
    fn second_hit_subtracts_artifrq() {
        let mut maps = FreqMaps::new();
        maps.accumulate_low("Cab", 1000, 500);
        maps.accumulate_low("cab", 700, 500);
        assert_eq!(maps.low_freq_of("cab"), 1000 + (700 - 500));
    }

    #[test]
    fn hits_below_artifrq_just_accumulate() {
        let mut maps = FreqMaps::new();
        maps.accumulate_low("cab", 10, 500);
        maps.accumulate_low("cab", 20, 500);
        assert_eq!(maps.low_freq_of("cab"), 30);
    }
}

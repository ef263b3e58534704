//! Lexstat: alphabet code assignment, diacritic confusions, and the
//! character-confusion value (CCV) table.
//!
//! Grounded on `original_source/src/TICCL-lexstat.cxx`.

use crate::alphabet::{h100, h101, high_five, Alphabet};
use ahash::AHashMap;
use unicode_normalization::UnicodeNormalization;

/// One row of the `.lc.chars` alphabet file: `(symbol, freq, code)`.
pub struct AlphabetRow {
    pub symbol: char,
    pub freq: u64,
    pub code: u64,
}

/// Assigns codes to every counted character, in descending frequency
/// order, starting at `high_five(103)` (after the two reserved codes and
/// an optional separator code). Characters with `freq <= clip` are
/// dropped. Mirrors `TICCL-lexstat.cxx::create_output`.
pub fn assign_codes(
    char_freq: &AHashMap<char, u64>,
    clip: u64,
    separator: Option<char>,
) -> (Alphabet, Vec<AlphabetRow>) {
    let mut entries: Vec<(char, u64)> = char_freq
        .iter()
        .filter(|&(_, &freq)| freq > clip)
        .map(|(&c, &f)| (c, f))
        .collect();
    // Descending frequency; ties broken by character for determinism.
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut alphabet = Alphabet::new();
    let mut rows = Vec::new();

    rows.push(AlphabetRow {
        symbol: '*',
        freq: 0,
        code: h100(),
    });
    rows.push(AlphabetRow {
        symbol: '\'',
        freq: 0,
        code: h101(),
    });

    let mut next_code = 102u64;
    if let Some(sep) = separator {
        alphabet.insert(sep, high_five(next_code));
        rows.push(AlphabetRow {
            symbol: sep,
            freq: 0,
            code: high_five(next_code),
        });
        next_code += 1;
    } else {
        next_code = 103;
    }

    for (c, freq) in entries {
        let code = high_five(next_code);
        alphabet.insert(c, code);
        rows.push(AlphabetRow {
            symbol: c,
            freq,
            code,
        });
        next_code += 1;
    }

    (alphabet, rows)
}

/// For every alphabet character whose NFD-stripped form differs, records
/// `|code(c) - code(stripped)| # c ~ stripped`. Grounded on
/// `create_dia_file` / `TiCC::filter_diacritics`.
pub fn diacritic_confusions(alphabet: &Alphabet, codes: &[AlphabetRow]) -> Vec<(u64, char, char)> {
    let mut out = Vec::new();
    for row in codes {
        let stripped = strip_diacritics(row.symbol);
        if stripped != row.symbol {
            if let Some(stripped_code) = alphabet.code_of(stripped) {
                let ccv = row.code.abs_diff(stripped_code);
                out.push((ccv, row.symbol, stripped));
            }
        }
    }
    out
}

fn strip_diacritics(c: char) -> char {
    c.nfd().find(|d| !is_combining_mark(*d)).unwrap_or(c)
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfusionMode {
    First,
    All,
}

/// One CCV bucket: either a single representative pair (`First` mode) or
/// every pair that collided on this CCV (`All` mode).
#[derive(Debug, Clone, Default)]
pub struct ConfusionTable {
    pub buckets: AHashMap<u64, Vec<(String, String)>>,
}

impl ConfusionTable {
    /// Shapes enumerated per spec §4.2 step 4, gated by `depth`.
    fn shapes(depth: u32) -> Vec<(usize, usize)> {
        let mut shapes = Vec::new();
        if depth >= 1 {
            shapes.push((1, 0));
            shapes.push((1, 1));
        }
        if depth >= 2 {
            shapes.extend([(2, 0), (2, 1), (1, 2), (2, 2)]);
        }
        if depth >= 3 {
            shapes.extend([(3, 0), (3, 1), (1, 3), (3, 2), (2, 3), (3, 3)]);
        }
        shapes
    }

    fn conditionally_insert(&mut self, ccv: u64, left: String, right: String, mode: ConfusionMode) {
        let bucket = self.buckets.entry(ccv).or_default();
        match mode {
            ConfusionMode::First => {
                if bucket.is_empty() {
                    bucket.push((left, right));
                }
            }
            ConfusionMode::All => {
                let pair = (left, right);
                if !bucket.contains(&pair) {
                    bucket.push(pair);
                    if bucket.len() > 8 {
                        tracing::warn!(ccv, count = bucket.len(), "confusion collision");
                    }
                }
            }
        }
    }
}

/// Enumerates every edit shape up to `depth` over `alphabet`'s characters
/// (with repetition) and returns the resulting CCV table.
pub fn generate_confusions(alphabet: &Alphabet, chars: &[char], depth: u32, mode: ConfusionMode) -> ConfusionTable {
    let coded: Vec<(char, u64)> = chars
        .iter()
        .filter_map(|&c| alphabet.code_of(c).map(|code| (c, code)))
        .collect();

    let mut table = ConfusionTable::default();
    for &(a_len, b_len) in &ConfusionTable::shapes(depth) {
        let lefts = strings_of_length(&coded, a_len);
        let rights = strings_of_length(&coded, b_len);
        for (left_s, left_code) in &lefts {
            for (right_s, right_code) in &rights {
                if a_len == b_len && left_s == right_s {
                    continue;
                }
                let ccv = left_code.abs_diff(*right_code);
                table.conditionally_insert(ccv, left_s.clone(), right_s.clone(), mode);
            }
        }
    }
    table
}

/// Every string of exactly `len` characters drawn (with repetition) from
/// `chars`, paired with the sum of their codes. `len == 0` yields the
/// single empty string with code 0.
fn strings_of_length(chars: &[(char, u64)], len: usize) -> Vec<(String, u64)> {
    if len == 0 {
        return vec![(String::new(), 0)];
    }
    let mut out = vec![(String::new(), 0u64)];
    for _ in 0..len {
        let mut next = Vec::with_capacity(out.len() * chars.len());
        for (s, code) in &out {
            for &(c, ccode) in chars {
                let mut s2 = s.clone();
                s2.push(c);
                next.push((s2, code + ccode));
            }
        }
        out = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_alphabet() -> (Alphabet, Vec<char>) {
        let mut a = Alphabet::new();
        a.insert('a', 3125);
        a.insert('b', 7776);
        a.insert('c', 16807);
        a.insert('d', 32768);
        a.insert('e', 59049);
        (a, vec!['a', 'b', 'c', 'd', 'e'])
    }

    // S2: Lexstat at depth 1 for the pair a~b emits |3125-7776|==4651.
    #[test]
    fn scenario_s2_depth1_ab_ccv() {
        let (alphabet, chars) = toy_alphabet();
        let table = generate_confusions(&alphabet, &chars, 1, ConfusionMode::All);
        assert!(table.buckets.contains_key(&4651));
        let pairs = &table.buckets[&4651];
        assert!(pairs.contains(&("a".to_string(), "b".to_string())));
    }

    #[test]
    fn first_mode_keeps_one_representative_per_ccv() {
        let (alphabet, chars) = toy_alphabet();
        let table = generate_confusions(&alphabet, &chars, 1, ConfusionMode::First);
        for bucket in table.buckets.values() {
            assert_eq!(bucket.len(), 1);
        }
    }

    // S5 round-trip: every emitted pair's CCV actually equals |hash(a)-hash(b)|.
    #[test]
    fn ccv_round_trip_property() {
        let (alphabet, chars) = toy_alphabet();
        let table = generate_confusions(&alphabet, &chars, 2, ConfusionMode::All);
        for (&ccv, pairs) in table.buckets.iter() {
            for (l, r) in pairs {
                let hl: u64 = l.chars().map(|c| alphabet.code_of(c).unwrap()).sum();
                let hr: u64 = r.chars().map(|c| alphabet.code_of(c).unwrap()).sum();
                assert_eq!(hl.abs_diff(hr), ccv);
            }
        }
    }

    #[test]
    fn assign_codes_orders_by_descending_frequency() {
        let mut freqs = AHashMap::new();
        freqs.insert('a', 100u64);
        freqs.insert('b', 50);
        freqs.insert('c', 200);
        let (alphabet, rows) = assign_codes(&freqs, 0, None);
        // 'c' is most frequent, should get the lowest post-reserved code.
        let c_code = alphabet.code_of('c').unwrap();
        let a_code = alphabet.code_of('a').unwrap();
        let b_code = alphabet.code_of('b').unwrap();
        assert!(c_code < a_code);
        assert!(a_code < b_code);
        assert_eq!(rows[0].code, h100());
        assert_eq!(rows[1].code, h101());
    }
}

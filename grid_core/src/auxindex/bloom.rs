//! Bloom filter for negative-lookup short-circuit.
//!
//! Sizing follows the standard formulas the spec pins down exactly:
//! `m = -n·ln(fp)/ln(2)²` bits, `k = (m/n)·ln(2)` hash functions.

use std::hash::{Hash, Hasher};

pub struct BloomFilter {
    bits: Vec<bool>,
    k: usize,
}

impl BloomFilter {
    /// Builds a filter sized for `expected_items` entries at false-positive
    /// rate `fp_rate` (e.g. `0.01` for 1%).
    pub fn with_capacity(expected_items: usize, fp_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let m = (-(n * fp_rate.ln()) / (std::f64::consts::LN_2 * std::f64::consts::LN_2)).ceil();
        let m = (m as usize).max(8);
        let k = ((m as f64 / n) * std::f64::consts::LN_2).round().max(1.0) as usize;
        BloomFilter {
            bits: vec![false; m],
            k,
        }
    }

    fn hashes(&self, s: &str) -> impl Iterator<Item = usize> + '_ {
        let h1 = fnv1a(s, 0xcbf29ce484222325);
        let h2 = fnv1a(s, 0x9e3779b97f4a7c15);
        let m = self.bits.len() as u64;
        (0..self.k).map(move |i| {
            // Double hashing (Kirsch-Mitzenmacher): avoids computing k
            // independent hash functions.
            (h1.wrapping_add((i as u64).wrapping_mul(h2)) % m) as usize
        })
    }

    pub fn add(&mut self, s: &str) {
        for idx in self.hashes(s).collect::<Vec<_>>() {
            self.bits[idx] = true;
        }
    }

    /// `false` means definitely absent; `true` means possibly present.
    pub fn contains(&self, s: &str) -> bool {
        self.hashes(s).all(|idx| self.bits[idx])
    }

    pub fn len_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn num_hashes(&self) -> usize {
        self.k
    }
}

fn fnv1a(s: &str, seed: u64) -> u64 {
    // FNV-1a mixed with a seed, std-only (no external hash crate needed for
    // a bit array this small).
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    seed.hash(&mut hasher);
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_no_false_negative() {
        let mut bf = BloomFilter::with_capacity(10_000, 0.01);
        let inserted: Vec<String> = (0..10_000).map(|i| format!("item-{i}")).collect();
        for s in &inserted {
            bf.add(s);
        }
        for s in &inserted {
            assert!(bf.contains(s), "no false negatives allowed");
        }
    }

    #[test]
    fn false_positive_rate_is_roughly_bounded() {
        let mut bf = BloomFilter::with_capacity(10_000, 0.01);
        for i in 0..10_000 {
            bf.add(&format!("item-{i}"));
        }
        let mut false_positives = 0;
        let trials = 1000;
        for i in 0..trials {
            if bf.contains(&format!("absent-{i}")) {
                false_positives += 1;
            }
        }
        // Generous margin above the nominal 1% to keep the test stable.
        assert!(
            (false_positives as f64 / trials as f64) < 0.05,
            "false positive rate too high: {false_positives}/{trials}"
        );
    }

    #[test]
    fn sizing_grows_with_items_and_shrinks_with_fp_rate() {
        let loose = BloomFilter::with_capacity(1000, 0.1);
        let tight = BloomFilter::with_capacity(1000, 0.001);
        assert!(tight.len_bits() > loose.len_bits());
    }
}

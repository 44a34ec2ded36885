//! Suffix array over a column's concatenated text, for O(m log n) substring
//! search. A standalone index a host can build and query
//! directly (e.g. for autocomplete or an accelerated `contains` UI) rather
//! than something `FilterEngine` consults itself — `FilterEngine`'s own
//! fast path is the bloom-filter pre-pass in `filter/mod.rs`.

/// Sentinel separating consecutive row values in the concatenated text.
/// Chosen to sort below any printable ASCII/Unicode scalar likely to appear
/// in real data, so a suffix starting mid-value never "bleeds" a match into
/// the next row.
const SENTINEL: char = '\u{0}';

pub struct SuffixArray {
    text: Vec<char>,
    /// Suffix array: `order[i]` is the starting offset (into `text`) of the
    /// `i`-th suffix in sorted order.
    order: Vec<u32>,
    /// Start offset of each row's value within `text`, ascending, used to
    /// map a match position back to a row index via binary search.
    row_start: Vec<u32>,
    case_insensitive: bool,
}

impl SuffixArray {
    /// Builds the index over `values`, one entry per row, in row order.
    /// Empty column is a valid (trivially empty) index.
    pub fn build(values: &[String], case_insensitive: bool) -> Self {
        let mut text = Vec::new();
        let mut row_start = Vec::with_capacity(values.len());
        for v in values {
            row_start.push(text.len() as u32);
            let chars: Vec<char> = if case_insensitive {
                v.to_lowercase().chars().collect()
            } else {
                v.chars().collect()
            };
            text.extend(chars);
            text.push(SENTINEL);
        }

        let mut order: Vec<u32> = (0..text.len() as u32).collect();
        // O(n log^2 n) comparison sort is sufficient for column-sized text;
        // this is not the hot path for 10^5-10^6 *rows* because each
        // column is indexed once, not per scroll tick.
        order.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));

        SuffixArray {
            text,
            order,
            row_start,
            case_insensitive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_start.is_empty()
    }

    fn normalize(&self, pattern: &str) -> Vec<char> {
        if self.case_insensitive {
            pattern.to_lowercase().chars().collect()
        } else {
            pattern.chars().collect()
        }
    }

    /// All text offsets where `pattern` occurs, in ascending order.
    pub fn search(&self, pattern: &str) -> Vec<u32> {
        if pattern.is_empty() || self.text.is_empty() {
            return Vec::new();
        }
        let pat = self.normalize(pattern);
        let (lo, hi) = self.match_range(&pat);
        let mut positions: Vec<u32> = self.order[lo..hi].to_vec();
        positions.sort_unstable();
        positions
    }

    pub fn contains(&self, pattern: &str) -> bool {
        if pattern.is_empty() {
            return false;
        }
        let pat = self.normalize(pattern);
        let (lo, hi) = self.match_range(&pat);
        lo < hi
    }

    pub fn count(&self, pattern: &str) -> usize {
        if pattern.is_empty() {
            return 0;
        }
        let pat = self.normalize(pattern);
        let (lo, hi) = self.match_range(&pat);
        hi - lo
    }

    /// Positions where `pattern` occurs, mapped back to row indices via
    /// binary search over `row_start`.
    pub fn matching_rows(&self, pattern: &str) -> Vec<usize> {
        let mut rows: Vec<usize> = self
            .search(pattern)
            .into_iter()
            .map(|pos| self.row_of(pos))
            .collect();
        rows.dedup();
        rows
    }

    fn row_of(&self, text_pos: u32) -> usize {
        match self.row_start.binary_search(&text_pos) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        }
    }

    /// Binary search twice over the suffix array for the contiguous range
    /// of suffixes prefixed by `pat`: O(m log n).
    fn match_range(&self, pat: &[char]) -> (usize, usize) {
        let lo = lower_bound(&self.order, &self.text, pat);
        let hi = upper_bound(&self.order, &self.text, pat);
        (lo, hi)
    }
}

fn suffix_cmp_prefix(text: &[char], start: u32, pat: &[char]) -> std::cmp::Ordering {
    let suffix = &text[start as usize..];
    let n = pat.len().min(suffix.len());
    match suffix[..n].cmp(&pat[..n]) {
        std::cmp::Ordering::Equal if suffix.len() < pat.len() => std::cmp::Ordering::Less,
        other => other,
    }
}

fn lower_bound(order: &[u32], text: &[char], pat: &[char]) -> usize {
    let mut lo = 0usize;
    let mut hi = order.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if suffix_cmp_prefix(text, order[mid], pat) == std::cmp::Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

fn upper_bound(order: &[u32], text: &[char], pat: &[char]) -> usize {
    let mut lo = 0usize;
    let mut hi = order.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if suffix_cmp_prefix(text, order[mid], pat) == std::cmp::Ordering::Greater {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Vec<String> {
        vec!["Alice".into(), "Bob".into(), "Charlie".into()]
    }

    #[test]
    fn s3_quick_filter_substring() {
        let sa = SuffixArray::build(&values(), true);
        let mut rows = sa.matching_rows("li");
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 2]); // Alice, Charlie
    }

    #[test]
    fn contains_and_count_agree_with_search() {
        let sa = SuffixArray::build(&values(), true);
        assert!(sa.contains("a"));
        assert_eq!(sa.count("a"), sa.search("a").len());
        assert!(!sa.contains("zz"));
    }

    #[test]
    fn empty_pattern_matches_nothing() {
        let sa = SuffixArray::build(&values(), true);
        assert!(!sa.contains(""));
        assert!(sa.search("").is_empty());
    }

    #[test]
    fn empty_column_is_empty_index() {
        let sa = SuffixArray::build(&[], true);
        assert!(sa.is_empty());
        assert!(!sa.contains("x"));
    }
}

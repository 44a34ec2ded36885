//! Column auxiliary indexes: a suffix array for substring search, a bloom
//! filter for negative-lookup short-circuit, and a trie for prefix
//! autocomplete. Built from scratch, in a plain-struct,
//! no-unnecessary-abstraction style, to satisfy `FilterEngine`'s large-column
//! fast paths.

mod bloom;
mod suffix_array;
mod trie;

pub use bloom::BloomFilter;
pub use suffix_array::SuffixArray;
pub use trie::Trie;

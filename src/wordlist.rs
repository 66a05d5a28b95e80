//! fgrep-style matching of path basenames against a word list.
//!
//! `TRAZAR_INLIBS`/`TRAZAR_EXLIBS` hold a colon-separated list of DSO
//! basenames, and the list is consulted on every single hook invocation, so
//! matching has to be cheap: each word carries a precalculated primitive
//! hash (the unsigned sum of its bytes), and a candidate is compared
//! byte-for-byte only after hash and length agree. For the handful of words
//! these lists hold, this beats a general-purpose hash table.

/// One entry of a parsed word list.
#[derive(Debug, Clone)]
struct Word {
    /// Unsigned additive hash of the word's bytes. Necessary, not
    /// sufficient: a hit still requires the length and byte checks.
    hash: u32,
    text: String,
}

/// A parsed colon-separated list of basenames.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: Vec<Word>,
}

impl WordList {
    /// Parse `a:b:c` into a word list. An empty string yields an empty list.
    pub fn parse(list: &str) -> WordList {
        if list.is_empty() {
            return WordList::default();
        }
        let words = list
            .split(':')
            .map(|segment| Word {
                hash: byte_sum(segment),
                text: segment.to_string(),
            })
            .collect();
        WordList { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Return the basename of `path` if it matches any word, else `None`.
    pub fn find<'a>(&self, path: &'a str) -> Option<&'a str> {
        let base = basename(path);
        let hash = byte_sum(base);
        self.words
            .iter()
            .find(|word| {
                word.hash == hash
                    && word.text.len() == base.len()
                    && word.text.as_bytes() == base.as_bytes()
            })
            .map(|_| base)
    }
}

/// The substring after the last `/`, or the whole string if there is none.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(slash) => &path[slash + 1..],
        None => path,
    }
}

fn byte_sum(text: &str) -> u32 {
    text.bytes().fold(0u32, |sum, b| sum.wrapping_add(b as u32))
}

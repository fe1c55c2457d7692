// This module implements the generic table-driven decoder shared by every instruction set.
// An encoding is described by a pattern string in which '0' and '1' are fixed bits and any
// other character is a don't-care position; the pattern is parsed into a (mask, expected)
// pair. A table stable-sorts its matchers by the number of fixed bits, most specific first,
// so the first match is the winner and ties keep table order. The order is a static property
// of the table. Tables are built once behind a OnceLock and only read afterwards, which makes
// them safe for unsynchronized concurrent use from any number of execution contexts.

//! Mask/value decode tables.

use std::cmp::Reverse;

/// Parse a pattern into `(mask, expected)`. The first character is the most
/// significant bit of a `pat.len()`-bit word.
pub const fn parse_pattern(pat: &[u8]) -> (u32, u32) {
    let mut mask = 0u32;
    let mut expected = 0u32;
    let mut i = 0;
    while i < pat.len() {
        let bit_pos = pat.len() - 1 - i;
        match pat[i] {
            b'0' => mask |= 1 << bit_pos,
            b'1' => {
                mask |= 1 << bit_pos;
                expected |= 1 << bit_pos;
            }
            _ => {}
        }
        i += 1;
    }
    (mask, expected)
}

/// One decode table entry: a pattern plus the field extractor for it.
pub struct Matcher<T> {
    name: &'static str,
    mask: u32,
    expected: u32,
    width: u32,
    decode: fn(u32) -> T,
}

impl<T> Matcher<T> {
    pub fn new(name: &'static str, pattern: &[u8], decode: fn(u32) -> T) -> Self {
        let (mask, expected) = parse_pattern(pattern);
        Self {
            name,
            mask,
            expected,
            width: pattern.len() as u32,
            decode,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn expected(&self) -> u32 {
        self.expected
    }

    /// Number of fixed (non don't-care) bits.
    pub fn specificity(&self) -> u32 {
        self.mask.count_ones()
    }

    pub fn matches(&self, word: u32) -> bool {
        word & self.mask == self.expected
    }

    pub fn decode(&self, word: u32) -> T {
        (self.decode)(word)
    }
}

/// An immutable, specificity-ordered list of matchers.
pub struct DecodeTable<T> {
    width: u32,
    matchers: Vec<Matcher<T>>,
}

impl<T> DecodeTable<T> {
    /// Build a table for `width`-bit words.
    ///
    /// # Panics
    /// If a pattern has the wrong width. Tables are static, so this can only
    /// fire on a malformed table definition.
    pub fn new(width: u32, mut matchers: Vec<Matcher<T>>) -> Self {
        for matcher in &matchers {
            assert_eq!(
                matcher.width, width,
                "pattern for {} is {} bits wide, table expects {}",
                matcher.name, matcher.width, width
            );
        }
        matchers.sort_by_key(|matcher| Reverse(matcher.specificity()));
        Self { width, matchers }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn matchers(&self) -> &[Matcher<T>] {
        &self.matchers
    }

    /// The winning matcher for `word`, if any.
    pub fn lookup(&self, word: u32) -> Option<&Matcher<T>> {
        self.matchers.iter().find(|matcher| matcher.matches(word))
    }

    /// Decode `word` into its mnemonic and typed fields.
    pub fn decode(&self, word: u32) -> Option<(&'static str, T)> {
        self.lookup(word)
            .map(|matcher| (matcher.name, matcher.decode(word)))
    }

    /// Every matcher that accepts `word`, most specific first.
    pub fn matching(&self, word: u32) -> impl Iterator<Item = &Matcher<T>> + '_ {
        self.matchers.iter().filter(move |matcher| matcher.matches(word))
    }

    /// True if the two most specific matches for `word` tie, meaning the
    /// table order rather than the encoding decides the winner.
    pub fn is_ambiguous(&self, word: u32) -> bool {
        let mut matches = self.matching(word);
        match (matches.next(), matches.next()) {
            (Some(first), Some(second)) => first.specificity() == second.specificity(),
            _ => false,
        }
    }
}

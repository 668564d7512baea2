//! Declared symbol sets and the sequences drawn from them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ordered, duplicate-free set of symbols.
///
/// The order fixes every index used by the counters, so the same symbols in a
/// different order produce differently laid-out (but equivalent) tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Alphabet {
    symbols: Vec<String>,
    index: HashMap<String, usize>,
}

impl Alphabet {
    /// Build an alphabet from an explicit ordered list of symbols.
    pub fn new<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return Err(Error::InvalidAlphabet("alphabet has no symbols".into()));
        }
        let mut index = HashMap::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if index.insert(symbol.clone(), i).is_some() {
                return Err(Error::InvalidAlphabet(format!(
                    "duplicate symbol {symbol:?}"
                )));
            }
        }
        Ok(Self { symbols, index })
    }

    /// One symbol per character of `chars`, in order.
    pub fn from_chars(chars: &str) -> Result<Self> {
        Self::new(chars.chars().map(String::from))
    }

    /// The ten decimal digits `0`..`9`.
    pub fn digits() -> Self {
        Self::from_distinct(('0'..='9').map(String::from).collect())
    }

    /// The 26 uppercase Latin letters `A`..`Z`.
    pub fn latin_uppercase() -> Self {
        Self::from_distinct(('A'..='Z').map(String::from).collect())
    }

    // Caller guarantees `symbols` is non-empty and duplicate-free.
    fn from_distinct(symbols: Vec<String>) -> Self {
        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        Self { symbols, index }
    }

    /// Sorted distinct symbols of `sequence`.
    ///
    /// Only for callers that explicitly opt in: expected frequencies computed
    /// over an inferred alphabet ignore symbols the sample happened to miss.
    pub fn inferred_from(sequence: &Sequence) -> Result<Self> {
        let mut distinct: Vec<&str> = sequence
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        distinct.sort_unstable();
        Self::new(distinct)
    }

    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Symbol at `index`, if in range.
    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.index.contains_key(symbol)
    }

    pub fn index_of(&self, symbol: &str) -> Result<usize> {
        self.index
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    /// Map every symbol of `sequence` to its index, failing on the first
    /// symbol outside the alphabet.
    pub fn encode(&self, sequence: &Sequence) -> Result<Vec<usize>> {
        sequence.iter().map(|s| self.index_of(s)).collect()
    }

    /// Map symbols to indices, yielding `None` for symbols outside the alphabet.
    pub fn encode_lossy(&self, sequence: &Sequence) -> Vec<Option<usize>> {
        sequence.iter().map(|s| self.index.get(s).copied()).collect()
    }
}

impl TryFrom<Vec<String>> for Alphabet {
    type Error = Error;

    fn try_from(symbols: Vec<String>) -> Result<Self> {
        Self::new(symbols)
    }
}

impl From<Alphabet> for Vec<String> {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.symbols
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.symbols.join(", "))
    }
}

/// Ordered symbols under analysis.
///
/// A sequence is not validated against any alphabet when built; each analyzer
/// resolves symbols itself and decides whether an unknown symbol is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    symbols: Vec<String>,
}

impl Sequence {
    /// Each character is one symbol.
    pub fn from_chars(text: &str) -> Self {
        text.chars().map(String::from).collect()
    }

    /// Each character is one symbol, whitespace dropped (grouped ciphertext).
    pub fn from_compact_chars(text: &str) -> Self {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .map(String::from)
            .collect()
    }

    /// Whitespace-separated tokens are the symbols (multi-character symbols).
    pub fn from_tokens(text: &str) -> Self {
        text.split_whitespace().map(String::from).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols.iter().map(String::as_str)
    }

    /// Number of distinct symbols, whether or not they belong to any alphabet.
    pub fn distinct_count(&self) -> usize {
        self.iter().collect::<HashSet<_>>().len()
    }
}

impl<S: Into<String>> FromIterator<S> for Sequence {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            symbols: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<String>> for Sequence {
    fn from(symbols: Vec<String>) -> Self {
        Self { symbols }
    }
}

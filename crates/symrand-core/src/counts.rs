//! Observed-count tables: unigrams, overlapping n-grams, adjacent-pair
//! (Markov) rows and lagged pairs.
//!
//! Every counter makes a single pass over the sequence and zero-pads its table
//! over all keys the alphabet allows, so two tables over the same alphabet
//! compare and serialize cell by cell.

use serde::Serialize;

use crate::alphabet::{Alphabet, Sequence};
use crate::error::{Error, Result};

/// Upper bound on `k^t` cells for an n-gram table.
pub const MAX_NGRAM_CELLS: usize = 1 << 24;

// ---------------------------------------------------------------------------
// Table types
// ---------------------------------------------------------------------------

/// Counts over every ordered `width`-tuple of alphabet symbols.
///
/// Cell `i` holds the tuple whose symbol indices spell `i` in base `k`, most
/// significant symbol first. Width 1 is a plain per-symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
    alphabet: Alphabet,
    width: usize,
    counts: Vec<u64>,
}

/// One key of a [`FrequencyTable`] with its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyShare {
    pub key: Vec<String>,
    pub count: u64,
    /// Percentage of all observations in the table.
    pub percent: f64,
}

impl FrequencyTable {
    fn zeroed(alphabet: &Alphabet, width: usize) -> Result<Self> {
        let cells = cell_count(alphabet.size(), width)?;
        Ok(Self {
            alphabet: alphabet.clone(),
            width,
            counts: vec![0; cells],
        })
    }

    /// Wrap raw per-symbol counts (width 1) in alphabet order.
    pub fn from_counts(alphabet: &Alphabet, counts: Vec<u64>) -> Result<Self> {
        if counts.len() != alphabet.size() {
            return Err(Error::LengthMismatch {
                observed: counts.len(),
                expected: alphabet.size(),
            });
        }
        Ok(Self {
            alphabet: alphabet.clone(),
            width: 1,
            counts,
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Tuple size of each key.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Counts in cell order (zero-padded).
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of cells with a non-zero count.
    pub fn occupied(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Count for one key, given as its symbols.
    pub fn get(&self, key: &[&str]) -> Result<u64> {
        if key.len() != self.width {
            return Err(Error::LengthMismatch {
                observed: key.len(),
                expected: self.width,
            });
        }
        let k = self.alphabet.size();
        let mut cell = 0usize;
        for symbol in key {
            cell = cell * k + self.alphabet.index_of(symbol)?;
        }
        Ok(self.counts[cell])
    }

    /// Symbols spelling cell `cell`.
    pub fn key(&self, cell: usize) -> Vec<&str> {
        let k = self.alphabet.size();
        let mut digits = vec![0usize; self.width];
        let mut rest = cell;
        for slot in digits.iter_mut().rev() {
            *slot = rest % k;
            rest /= k;
        }
        digits
            .into_iter()
            .filter_map(|i| self.alphabet.symbol(i))
            .collect()
    }

    /// `(key, count)` for every cell, zero cells included.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<&str>, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(cell, &count)| (self.key(cell), count))
    }

    /// Observed proportions; all zero when the table is empty.
    pub fn proportions(&self) -> Vec<f64> {
        let total = self.total();
        if total == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect()
    }

    /// The `limit` most frequent non-zero keys, ties broken by cell order.
    pub fn most_common(&self, limit: usize) -> Vec<KeyShare> {
        let total = self.total();
        let mut cells: Vec<(usize, u64)> = self
            .counts
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, c)| c > 0)
            .collect();
        cells.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        cells
            .into_iter()
            .take(limit)
            .map(|(cell, count)| KeyShare {
                key: self.key(cell).into_iter().map(String::from).collect(),
                count,
                percent: count as f64 / total as f64 * 100.0,
            })
            .collect()
    }
}

/// Square grid of counts indexed by `(row symbol, column symbol)`.
///
/// Rows are the earlier position (predecessor or `s[t]`), columns the later one
/// (successor or `s[t + lag]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContingencyTable {
    alphabet: Alphabet,
    counts: Vec<u64>,
}

impl ContingencyTable {
    fn zeroed(alphabet: &Alphabet) -> Self {
        let k = alphabet.size();
        Self {
            alphabet: alphabet.clone(),
            counts: vec![0; k * k],
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Side length `k`.
    pub fn size(&self) -> usize {
        self.alphabet.size()
    }

    /// Count in cell `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not below [`size`](Self::size).
    pub fn count(&self, row: usize, col: usize) -> u64 {
        self.counts[row * self.size() + col]
    }

    /// Count for `(from, to)` given as symbols.
    pub fn get(&self, from: &str, to: &str) -> Result<u64> {
        let row = self.alphabet.index_of(from)?;
        let col = self.alphabet.index_of(to)?;
        Ok(self.count(row, col))
    }

    /// Row `row` as a slice of counts in alphabet order.
    ///
    /// # Panics
    ///
    /// Panics if `row` is not below [`size`](Self::size).
    pub fn row(&self, row: usize) -> &[u64] {
        let k = self.size();
        &self.counts[row * k..(row + 1) * k]
    }

    pub fn row_totals(&self) -> Vec<u64> {
        (0..self.size()).map(|r| self.row(r).iter().sum()).collect()
    }

    pub fn column_totals(&self) -> Vec<u64> {
        let k = self.size();
        let mut totals = vec![0u64; k];
        for row in 0..k {
            for (col, total) in totals.iter_mut().enumerate() {
                *total += self.count(row, col);
            }
        }
        totals
    }

    pub fn grand_total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// All counts, row-major.
    pub fn cells(&self) -> &[u64] {
        &self.counts
    }

    /// Successor counts of `symbol` as a per-symbol table.
    pub fn row_table(&self, symbol: &str) -> Result<FrequencyTable> {
        let row = self.alphabet.index_of(symbol)?;
        FrequencyTable::from_counts(&self.alphabet, self.row(row).to_vec())
    }

    /// Every row as `(symbol, table)`, in alphabet order.
    pub fn row_tables(&self) -> Vec<(String, FrequencyTable)> {
        self.alphabet
            .symbols()
            .iter()
            .enumerate()
            .map(|(row, symbol)| {
                (
                    symbol.clone(),
                    FrequencyTable {
                        alphabet: self.alphabet.clone(),
                        width: 1,
                        counts: self.row(row).to_vec(),
                    },
                )
            })
            .collect()
    }

    /// Flatten into a width-2 table over ordered pairs.
    pub fn to_pair_table(&self) -> FrequencyTable {
        FrequencyTable {
            alphabet: self.alphabet.clone(),
            width: 2,
            counts: self.counts.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Per-symbol counts over the alphabet.
pub fn unigram_counts(sequence: &Sequence, alphabet: &Alphabet) -> Result<FrequencyTable> {
    let mut table = FrequencyTable::zeroed(alphabet, 1)?;
    for symbol in sequence.iter() {
        table.counts[alphabet.index_of(symbol)?] += 1;
    }
    Ok(table)
}

/// Counts of overlapping `tuple_size`-grams over all `k^tuple_size` tuples.
pub fn ngram_counts(
    sequence: &Sequence,
    alphabet: &Alphabet,
    tuple_size: usize,
) -> Result<FrequencyTable> {
    if tuple_size == 0 {
        return Err(Error::InvalidConfiguration(
            "tuple size must be at least 1".into(),
        ));
    }
    let mut table = FrequencyTable::zeroed(alphabet, tuple_size)?;
    let n = sequence.len();
    if n < tuple_size {
        return Err(Error::InsufficientData {
            needed: tuple_size,
            got: n,
        });
    }

    let k = alphabet.size();
    let cells = table.counts.len();
    let mut cell = 0usize;
    for (i, symbol) in sequence.iter().enumerate() {
        // Rolling base-k window: drop the oldest digit, append the new one.
        cell = (cell * k + alphabet.index_of(symbol)?) % cells;
        if i + 1 >= tuple_size {
            table.counts[cell] += 1;
        }
    }
    Ok(table)
}

/// Transition counts `s[i] -> s[i+1]` over every adjacent pair.
pub fn markov_row_counts(sequence: &Sequence, alphabet: &Alphabet) -> Result<ContingencyTable> {
    let encoded = alphabet.encode(sequence)?;
    let mut table = ContingencyTable::zeroed(alphabet);
    let k = alphabet.size();
    for pair in encoded.windows(2) {
        table.counts[pair[0] * k + pair[1]] += 1;
    }
    Ok(table)
}

/// Counts of `(s[t], s[t + lag])` for every valid `t`.
///
/// Pairs touching a symbol outside the alphabet are skipped rather than
/// rejected, so noisy samples (separators, erasure marks) can still be tested.
pub fn lagged_pair_counts(
    sequence: &Sequence,
    alphabet: &Alphabet,
    lag: usize,
) -> Result<ContingencyTable> {
    if lag == 0 {
        return Err(Error::InvalidConfiguration("lag must be at least 1".into()));
    }
    let n = sequence.len();
    if n <= lag {
        return Err(Error::InsufficientData {
            needed: lag + 1,
            got: n,
        });
    }
    let encoded = alphabet.encode_lossy(sequence);
    let mut table = ContingencyTable::zeroed(alphabet);
    let k = alphabet.size();
    let mut skipped = 0usize;
    for t in 0..n - lag {
        match (encoded[t], encoded[t + lag]) {
            (Some(a), Some(b)) => table.counts[a * k + b] += 1,
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!("lagged pairs (lag={lag}): skipped {skipped} pair(s) with unknown symbols");
    }
    Ok(table)
}

/// Per-position symbol counts across a set of records (e.g. fixed-length draws).
///
/// Table `i` counts the symbol at position `i` of every record long enough to
/// have one.
pub fn positional_counts(records: &[Sequence], alphabet: &Alphabet) -> Result<Vec<FrequencyTable>> {
    let width = records.iter().map(Sequence::len).max().unwrap_or(0);
    let mut tables = (0..width)
        .map(|_| FrequencyTable::zeroed(alphabet, 1))
        .collect::<Result<Vec<_>>>()?;
    for record in records {
        for (position, symbol) in record.iter().enumerate() {
            tables[position].counts[alphabet.index_of(symbol)?] += 1;
        }
    }
    Ok(tables)
}

/// Transition counts pooled over several records, never crossing from the end
/// of one record into the start of the next.
pub fn record_markov_row_counts(
    records: &[Sequence],
    alphabet: &Alphabet,
) -> Result<ContingencyTable> {
    let mut table = ContingencyTable::zeroed(alphabet);
    let k = alphabet.size();
    for record in records {
        let encoded = alphabet.encode(record)?;
        for pair in encoded.windows(2) {
            table.counts[pair[0] * k + pair[1]] += 1;
        }
    }
    Ok(table)
}

/// Overlapping `tuple_size`-grams pooled over several records; no window
/// spans two records.
///
/// Records shorter than `tuple_size` contribute nothing. Fails with
/// [`Error::InsufficientData`] when no record holds a full window.
pub fn record_ngram_counts(
    records: &[Sequence],
    alphabet: &Alphabet,
    tuple_size: usize,
) -> Result<FrequencyTable> {
    if tuple_size == 0 {
        return Err(Error::InvalidConfiguration(
            "tuple size must be at least 1".into(),
        ));
    }
    let mut table = FrequencyTable::zeroed(alphabet, tuple_size)?;
    for record in records.iter().filter(|r| r.len() >= tuple_size) {
        let part = ngram_counts(record, alphabet, tuple_size)?;
        for (cell, count) in table.counts.iter_mut().zip(part.counts()) {
            *cell += count;
        }
    }
    if table.total() == 0 {
        let longest = records.iter().map(Sequence::len).max().unwrap_or(0);
        return Err(Error::InsufficientData {
            needed: tuple_size,
            got: longest,
        });
    }
    Ok(table)
}

/// Lagged pairs `(s[t], s[t + lag])` pooled over several records, each pair
/// taken inside one record.
///
/// Unknown symbols are skipped as in [`lagged_pair_counts`]. Fails with
/// [`Error::InsufficientData`] when no record is longer than `lag`.
pub fn record_lagged_pair_counts(
    records: &[Sequence],
    alphabet: &Alphabet,
    lag: usize,
) -> Result<ContingencyTable> {
    if lag == 0 {
        return Err(Error::InvalidConfiguration("lag must be at least 1".into()));
    }
    let mut table = ContingencyTable::zeroed(alphabet);
    let mut used = 0usize;
    for record in records.iter().filter(|r| r.len() > lag) {
        let part = lagged_pair_counts(record, alphabet, lag)?;
        for (cell, count) in table.counts.iter_mut().zip(part.cells()) {
            *cell += count;
        }
        used += 1;
    }
    if used == 0 {
        let longest = records.iter().map(Sequence::len).max().unwrap_or(0);
        return Err(Error::InsufficientData {
            needed: lag + 1,
            got: longest,
        });
    }
    Ok(table)
}

/// Transition counts per position across a set of records.
///
/// Table `i` counts `record[i] -> record[i + 1]` over every record long enough
/// to have that pair, so a draw's first and last positions can be compared.
pub fn positional_transition_counts(
    records: &[Sequence],
    alphabet: &Alphabet,
) -> Result<Vec<ContingencyTable>> {
    let width = records
        .iter()
        .map(|r| r.len().saturating_sub(1))
        .max()
        .unwrap_or(0);
    let mut tables = vec![ContingencyTable::zeroed(alphabet); width];
    let k = alphabet.size();
    for record in records {
        let encoded = alphabet.encode(record)?;
        for (position, pair) in encoded.windows(2).enumerate() {
            tables[position].counts[pair[0] * k + pair[1]] += 1;
        }
    }
    Ok(tables)
}

fn cell_count(k: usize, width: usize) -> Result<usize> {
    u32::try_from(width)
        .ok()
        .and_then(|w| k.checked_pow(w))
        .filter(|&cells| cells <= MAX_NGRAM_CELLS)
        .ok_or_else(|| {
            Error::InvalidConfiguration(format!(
                "{k}^{width} cells exceeds the limit of {MAX_NGRAM_CELLS}"
            ))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

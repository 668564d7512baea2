//! Shannon entropy of observed distributions.

use serde::Serialize;

use crate::alphabet::{Alphabet, Sequence};
use crate::counts::{FrequencyTable, unigram_counts};
use crate::error::{Error, Result};

/// Entropy of a count table measured against its maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntropySummary {
    /// Observed Shannon entropy in bits.
    pub entropy_bits: f64,
    /// `log2(cells)`: entropy of the uniform distribution over the table.
    pub max_entropy_bits: f64,
    /// `entropy_bits / max_entropy_bits`, 1.0 for a single-cell table.
    pub ratio: f64,
    pub cells: usize,
    pub occupied_cells: usize,
    pub observations: u64,
}

impl EntropySummary {
    pub fn from_table(table: &FrequencyTable) -> Result<Self> {
        let entropy_bits = shannon_entropy(table)?;
        let max_entropy_bits = max_entropy(table.len());
        Ok(Self {
            entropy_bits,
            max_entropy_bits,
            ratio: entropy_ratio(entropy_bits, table.len()),
            cells: table.len(),
            occupied_cells: table.occupied(),
            observations: table.total(),
        })
    }

    /// Symbol-level summary of `sequence` over `alphabet`.
    pub fn of_sequence(sequence: &Sequence, alphabet: &Alphabet) -> Result<Self> {
        Self::from_table(&unigram_counts(sequence, alphabet)?)
    }
}

/// `H = -Σ p log2 p` over the non-zero cells of `table`.
pub fn shannon_entropy(table: &FrequencyTable) -> Result<f64> {
    entropy_from_counts(table.counts())
}

/// Shannon entropy in bits of raw counts.
pub fn entropy_from_counts(counts: &[u64]) -> Result<f64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return Err(Error::EmptyTable);
    }
    let total = total as f64;
    let h = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum::<f64>();
    // A single occupied cell sums to -0.0.
    Ok(h.max(0.0))
}

/// `log2(k)`; zero for `k <= 1`.
pub fn max_entropy(k: usize) -> f64 {
    if k <= 1 { 0.0 } else { (k as f64).log2() }
}

/// Entropy relative to its maximum over `k` cells.
///
/// A one-symbol alphabet has zero entropy and zero maximum; its ratio is
/// defined as 1.0 since the sample is as spread out as that alphabet allows.
pub fn entropy_ratio(entropy_bits: f64, k: usize) -> f64 {
    let max = max_entropy(k);
    if max == 0.0 { 1.0 } else { entropy_bits / max }
}

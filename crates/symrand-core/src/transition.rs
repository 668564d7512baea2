//! First-order and higher-order Markov transition estimates.
//!
//! A [`TransitionMatrix`] is derived from adjacent-pair counts and never
//! mutated on its own; rebuild it when the counts change. Rows for symbols that
//! never occur as a predecessor are all zero, which means "no data" and must
//! not be read as a uniform row.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::alphabet::{Alphabet, Sequence};
use crate::counts::{ContingencyTable, markov_row_counts, record_markov_row_counts};
use crate::entropy::EntropySummary;
use crate::error::{Error, Result};

/// Row-normalized transition probabilities plus the counts they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionMatrix {
    counts: ContingencyTable,
    probabilities: Vec<f64>,
}

/// Weighted directed edge for graph consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionEdge {
    pub from: String,
    pub to: String,
    pub count: u64,
    /// `P(to | from)`.
    pub probability: f64,
    /// Percentage of all observed transitions.
    pub percent: f64,
}

impl TransitionMatrix {
    pub fn from_counts(counts: ContingencyTable) -> Self {
        let k = counts.size();
        let mut probabilities = vec![0.0; k * k];
        for (row, total) in counts.row_totals().into_iter().enumerate() {
            if total == 0 {
                continue;
            }
            for col in 0..k {
                probabilities[row * k + col] = counts.count(row, col) as f64 / total as f64;
            }
        }
        Self {
            counts,
            probabilities,
        }
    }

    /// Pool transitions over records without crossing record boundaries.
    pub fn from_records(records: &[Sequence], alphabet: &Alphabet) -> Result<Self> {
        Ok(Self::from_counts(record_markov_row_counts(records, alphabet)?))
    }

    pub fn alphabet(&self) -> &Alphabet {
        self.counts.alphabet()
    }

    pub fn counts(&self) -> &ContingencyTable {
        &self.counts
    }

    /// Probability row for predecessor index `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is not below the alphabet size; use
    /// [`row_for`](Self::row_for) for a checked lookup by symbol.
    pub fn row(&self, row: usize) -> &[f64] {
        let k = self.counts.size();
        &self.probabilities[row * k..(row + 1) * k]
    }

    /// Probability row for predecessor `symbol`.
    pub fn row_for(&self, symbol: &str) -> Result<&[f64]> {
        Ok(self.row(self.alphabet().index_of(symbol)?))
    }

    /// `P(to | from)`; zero when `from` was never observed as a predecessor.
    pub fn probability(&self, from: &str, to: &str) -> Result<f64> {
        let k = self.counts.size();
        let row = self.alphabet().index_of(from)?;
        let col = self.alphabet().index_of(to)?;
        Ok(self.probabilities[row * k + col])
    }

    /// Whether `symbol` has at least one outgoing transition.
    pub fn has_data(&self, symbol: &str) -> Result<bool> {
        let row = self.alphabet().index_of(symbol)?;
        Ok(self.counts.row(row).iter().any(|&c| c > 0))
    }

    /// Edges with at least `min_count` observations, in row-major order.
    pub fn edges(&self, min_count: u64) -> Vec<TransitionEdge> {
        let k = self.counts.size();
        let total = self.counts.grand_total();
        let mut edges = Vec::new();
        for row in 0..k {
            for col in 0..k {
                let count = self.counts.count(row, col);
                if count == 0 || count < min_count {
                    continue;
                }
                edges.push(self.edge(row, col, count, total));
            }
        }
        edges
    }

    /// The `limit` most frequent transitions, ties in row-major order.
    pub fn top_transitions(&self, limit: usize) -> Vec<TransitionEdge> {
        let mut edges = self.edges(1);
        edges.sort_by(|a, b| b.count.cmp(&a.count));
        edges.truncate(limit);
        edges
    }

    fn edge(&self, row: usize, col: usize, count: u64, total: u64) -> TransitionEdge {
        let k = self.counts.size();
        let alphabet = self.alphabet();
        TransitionEdge {
            from: alphabet.symbol(row).unwrap_or_default().to_string(),
            to: alphabet.symbol(col).unwrap_or_default().to_string(),
            count,
            probability: self.probabilities[row * k + col],
            percent: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
        }
    }
}

/// Transition matrix of adjacent symbols in `sequence`.
pub fn build_transition_matrix(sequence: &Sequence, alphabet: &Alphabet) -> Result<TransitionMatrix> {
    Ok(TransitionMatrix::from_counts(markov_row_counts(
        sequence, alphabet,
    )?))
}

/// Entropy of the joint adjacent-pair distribution against `log2(k²)`.
///
/// A ratio near 1 means every ordered pair is about equally common.
pub fn transition_entropy(counts: &ContingencyTable) -> Result<EntropySummary> {
    EntropySummary::from_table(&counts.to_pair_table())
}

/// Next-symbol counts conditioned on the preceding `order` symbols.
///
/// Only contexts that actually occur are stored, so the model stays sparse
/// for large alphabets and orders. Serialize [`ContextModel::rows`] to export it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextModel {
    alphabet: Alphabet,
    order: usize,
    contexts: BTreeMap<Vec<usize>, Vec<u64>>,
}

/// One observed context with its successor distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextRow {
    pub context: Vec<String>,
    pub total: u64,
    pub probabilities: Vec<f64>,
}

impl ContextModel {
    pub fn fit(sequence: &Sequence, alphabet: &Alphabet, order: usize) -> Result<Self> {
        Self::fit_records(std::slice::from_ref(sequence), alphabet, order)
    }

    /// Fit over several records; contexts never span two records.
    pub fn fit_records(records: &[Sequence], alphabet: &Alphabet, order: usize) -> Result<Self> {
        if order == 0 {
            return Err(Error::InvalidConfiguration(
                "context order must be at least 1".into(),
            ));
        }
        let longest = records.iter().map(Sequence::len).max().unwrap_or(0);
        if longest <= order {
            return Err(Error::InsufficientData {
                needed: order + 1,
                got: longest,
            });
        }
        let k = alphabet.size();
        let mut contexts: BTreeMap<Vec<usize>, Vec<u64>> = BTreeMap::new();
        for record in records {
            let encoded = alphabet.encode(record)?;
            for window in encoded.windows(order + 1) {
                let (context, next) = window.split_at(order);
                contexts.entry(context.to_vec()).or_insert_with(|| vec![0; k])[next[0]] += 1;
            }
        }
        Ok(Self {
            alphabet: alphabet.clone(),
            order,
            contexts,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of distinct contexts observed.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Successor distribution after `context`, or `None` if it never occurred.
    pub fn next_distribution(&self, context: &[&str]) -> Result<Option<Vec<f64>>> {
        if context.len() != self.order {
            return Err(Error::LengthMismatch {
                observed: context.len(),
                expected: self.order,
            });
        }
        let key = context
            .iter()
            .map(|s| self.alphabet.index_of(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.contexts.get(&key).map(|row| normalize(row)))
    }

    /// Every observed context in lexicographic index order.
    pub fn rows(&self) -> Vec<ContextRow> {
        self.contexts
            .iter()
            .map(|(key, row)| ContextRow {
                context: key
                    .iter()
                    .filter_map(|&i| self.alphabet.symbol(i))
                    .map(String::from)
                    .collect(),
                total: row.iter().sum(),
                probabilities: normalize(row),
            })
            .collect()
    }
}

fn normalize(row: &[u64]) -> Vec<f64> {
    let total: u64 = row.iter().sum();
    if total == 0 {
        return vec![0.0; row.len()];
    }
    row.iter().map(|&c| c as f64 / total as f64).collect()
}

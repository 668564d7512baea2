//! Descriptive profile of a sequence beyond hypothesis tests.
//!
//! Gathers the numbers an analyst looks at before (or next to) the test
//! battery: symbol frequencies, entropy, the most common n-grams, candidate
//! block sizes, and how evenly adjacent pairs are spread.

use serde::Serialize;

use crate::alphabet::{Alphabet, Sequence};
use crate::counts::{
    ContingencyTable, FrequencyTable, KeyShare, markov_row_counts, ngram_counts,
    record_markov_row_counts, record_ngram_counts, unigram_counts,
};
use crate::entropy::EntropySummary;
use crate::error::{Error, Result};
use crate::transition::transition_entropy;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Full descriptive profile of one sequence.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceProfile {
    pub length: usize,
    pub alphabet_size: usize,
    pub distinct_observed: usize,
    pub unigrams: FrequencyTable,
    /// `None` for an empty sequence.
    pub entropy: Option<EntropySummary>,
    pub tuple_size: usize,
    /// Most common overlapping n-grams; empty when the sequence is shorter
    /// than `tuple_size`.
    pub top_ngrams: Vec<KeyShare>,
    /// Divisors of the length greater than 1 (candidate block or key sizes).
    pub length_factors: Vec<usize>,
    /// Joint adjacent-pair entropy; `None` with fewer than two symbols.
    pub transition_entropy: Option<EntropySummary>,
}

// ---------------------------------------------------------------------------
// Analysis functions
// ---------------------------------------------------------------------------

/// Divisors of `n` greater than 1, ascending.
pub fn length_factors(n: usize) -> Vec<usize> {
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = 1usize;
    while d * d <= n {
        if n % d == 0 {
            small.push(d);
            if d != n / d {
                large.push(n / d);
            }
        }
        d += 1;
    }
    small
        .into_iter()
        .chain(large.into_iter().rev())
        .filter(|&f| f > 1)
        .collect()
}

/// Profile `sequence` over `alphabet`, listing the `top` most common
/// `tuple_size`-grams.
pub fn profile(
    sequence: &Sequence,
    alphabet: &Alphabet,
    tuple_size: usize,
    top: usize,
) -> Result<SequenceProfile> {
    let unigrams = unigram_counts(sequence, alphabet)?;
    let ngrams = ngram_counts(sequence, alphabet, tuple_size);
    let pairs = markov_row_counts(sequence, alphabet)?;
    assemble(sequence, alphabet, unigrams, tuple_size, ngrams, top, &pairs)
}

/// [`profile`] of a set of records. Frequencies and length cover all records;
/// n-grams and adjacent pairs are counted inside each record only.
pub fn record_profile(
    records: &[Sequence],
    alphabet: &Alphabet,
    tuple_size: usize,
    top: usize,
) -> Result<SequenceProfile> {
    let pooled: Sequence = records
        .iter()
        .flat_map(|r| r.symbols().iter().cloned())
        .collect();
    let unigrams = unigram_counts(&pooled, alphabet)?;
    let ngrams = record_ngram_counts(records, alphabet, tuple_size);
    let pairs = record_markov_row_counts(records, alphabet)?;
    assemble(&pooled, alphabet, unigrams, tuple_size, ngrams, top, &pairs)
}

fn assemble(
    sequence: &Sequence,
    alphabet: &Alphabet,
    unigrams: FrequencyTable,
    tuple_size: usize,
    ngrams: Result<FrequencyTable>,
    top: usize,
    pairs: &ContingencyTable,
) -> Result<SequenceProfile> {
    let entropy = optional(EntropySummary::from_table(&unigrams))?;

    let top_ngrams = match ngrams {
        Ok(table) => table.most_common(top),
        Err(Error::InsufficientData { .. }) => Vec::new(),
        Err(e) => return Err(e),
    };

    let transition_entropy = optional(transition_entropy(pairs))?;

    log::debug!(
        "profiled {} symbols over {} (distinct observed: {})",
        sequence.len(),
        alphabet,
        sequence.distinct_count()
    );

    Ok(SequenceProfile {
        length: sequence.len(),
        alphabet_size: alphabet.size(),
        distinct_observed: sequence.distinct_count(),
        unigrams,
        entropy,
        tuple_size,
        top_ngrams,
        length_factors: length_factors(sequence.len()),
        transition_entropy,
    })
}

fn optional(summary: Result<EntropySummary>) -> Result<Option<EntropySummary>> {
    match summary {
        Ok(s) => Ok(Some(s)),
        Err(Error::EmptyTable) => Ok(None),
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

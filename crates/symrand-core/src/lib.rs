//! # symrand-core
//!
//! **Counting primitives for finite-alphabet randomness analysis.**
//!
//! `symrand-core` turns a symbol sequence (ciphertext, PRNG output, lottery
//! draws) into the value types every statistical test builds on: zero-padded
//! frequency tables, contingency tables, entropy summaries and Markov
//! transition matrices.
//!
//! ## Quick Start
//!
//! ```
//! use symrand_core::{Alphabet, Sequence, build_transition_matrix, unigram_counts};
//!
//! let alphabet = Alphabet::from_chars("01").unwrap();
//! let sequence = Sequence::from_chars("101010101010");
//!
//! let counts = unigram_counts(&sequence, &alphabet).unwrap();
//! assert_eq!(counts.counts(), &[6, 6]);
//!
//! let matrix = build_transition_matrix(&sequence, &alphabet).unwrap();
//! assert_eq!(matrix.probability("1", "0").unwrap(), 1.0);
//! ```
//!
//! ## Architecture
//!
//! Alphabet → counters → {entropy, transition matrix, profile}
//!
//! The alphabet is always declared by the caller and passed to every call;
//! nothing here reads global state or prints.

pub mod alphabet;
pub mod counts;
pub mod entropy;
pub mod error;
pub mod profile;
pub mod transition;

pub use alphabet::{Alphabet, Sequence};
pub use counts::{
    ContingencyTable, FrequencyTable, KeyShare, MAX_NGRAM_CELLS, lagged_pair_counts,
    markov_row_counts, ngram_counts, positional_counts, positional_transition_counts,
    record_lagged_pair_counts, record_markov_row_counts, record_ngram_counts, unigram_counts,
};
pub use entropy::{EntropySummary, entropy_from_counts, entropy_ratio, max_entropy, shannon_entropy};
pub use error::{Error, Result, validate_alpha};
pub use profile::{SequenceProfile, length_factors, profile, record_profile};
pub use transition::{
    ContextModel, ContextRow, TransitionEdge, TransitionMatrix, build_transition_matrix,
    transition_entropy,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

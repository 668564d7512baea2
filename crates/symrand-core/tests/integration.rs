//! Integration tests for symrand-core.
//!
//! These exercise the counting pipeline end to end:
//! alphabet → counters → entropy / transition matrix / profile.

use proptest::prelude::*;
use symrand_core::{
    Alphabet, ContextModel, EntropySummary, Error, Sequence, TransitionMatrix,
    build_transition_matrix, lagged_pair_counts, markov_row_counts, ngram_counts, profile,
    unigram_counts,
};

#[test]
fn repeated_symbol_has_zero_entropy() {
    let alphabet = Alphabet::from_chars("abc").unwrap();
    let summary = EntropySummary::of_sequence(&Sequence::from_chars("aaaaaaaaaaaa"), &alphabet)
        .unwrap();
    assert_eq!(summary.entropy_bits, 0.0);
    assert_eq!(summary.ratio, 0.0);
}

#[test]
fn alternating_bits_count_six_and_six() {
    let alphabet = Alphabet::from_chars("01").unwrap();
    let seq = Sequence::from_chars("101010101010");
    let table = unigram_counts(&seq, &alphabet).unwrap();
    assert_eq!(table.counts(), &[6, 6]);

    let matrix = build_transition_matrix(&seq, &alphabet).unwrap();
    assert_eq!(matrix.probability("0", "1").unwrap(), 1.0);
    assert_eq!(matrix.probability("1", "1").unwrap(), 0.0);
}

#[test]
fn nine_symbol_sample_is_zero_padded() {
    let alphabet = Alphabet::from_chars("123456789").unwrap();
    let seq = Sequence::from_chars("111222333456789");
    let table = unigram_counts(&seq, &alphabet).unwrap();
    assert_eq!(table.counts(), &[3, 3, 3, 1, 1, 1, 1, 1, 1]);
    assert_eq!(table.total(), 15);
}

#[test]
fn table_totals_match_observation_counts() {
    let alphabet = Alphabet::latin_uppercase();
    let seq = Sequence::from_compact_chars("THEQU ICKBR OWNFO XJUMP SOVER THELA ZYDOG");
    let n = seq.len() as u64;
    assert_eq!(unigram_counts(&seq, &alphabet).unwrap().total(), n);
    assert_eq!(ngram_counts(&seq, &alphabet, 3).unwrap().total(), n - 2);
    assert_eq!(markov_row_counts(&seq, &alphabet).unwrap().grand_total(), n - 1);
    assert_eq!(
        lagged_pair_counts(&seq, &alphabet, 5).unwrap().grand_total(),
        n - 5
    );
}

#[test]
fn unknown_symbols_are_fatal_for_strict_counters() {
    let alphabet = Alphabet::digits();
    let seq = Sequence::from_chars("12a4");
    assert!(matches!(
        unigram_counts(&seq, &alphabet),
        Err(Error::UnknownSymbol { .. })
    ));
    assert!(matches!(
        build_transition_matrix(&seq, &alphabet),
        Err(Error::UnknownSymbol { .. })
    ));
    // The lagged counter skips them instead.
    assert_eq!(
        lagged_pair_counts(&seq, &alphabet, 1).unwrap().grand_total(),
        1
    );
}

#[test]
fn draws_pool_transitions_per_record() {
    let alphabet = Alphabet::digits();
    let draws: Vec<Sequence> = ["0417", "7731", "1042"]
        .iter()
        .map(|d| Sequence::from_chars(d))
        .collect();
    let matrix = TransitionMatrix::from_records(&draws, &alphabet).unwrap();
    assert_eq!(matrix.counts().grand_total(), 9);
    // "7" ends the first record and starts the second; no 7 -> 7 from the seam.
    assert_eq!(matrix.counts().get("7", "7").unwrap(), 1);

    let model = ContextModel::fit_records(&draws, &alphabet, 2).unwrap();
    let next = model.next_distribution(&["0", "4"]).unwrap().unwrap();
    assert_eq!(next[alphabet.index_of("1").unwrap()], 0.5);
    assert_eq!(next[alphabet.index_of("2").unwrap()], 0.5);
}

#[test]
fn profile_serializes_to_json() {
    let alphabet = Alphabet::from_chars("abc").unwrap();
    let p = profile(&Sequence::from_chars("abcabcabcabc"), &alphabet, 2, 3).unwrap();
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["length"], 12);
    assert_eq!(json["length_factors"], serde_json::json!([2, 3, 4, 6, 12]));
    assert_eq!(json["top_ngrams"][0]["key"], serde_json::json!(["a", "b"]));
}

fn symbols(k: usize, max_len: usize) -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0..k, 0..max_len)
}

proptest! {
    #[test]
    fn transition_rows_sum_to_one_or_zero(indices in symbols(5, 200)) {
        let alphabet = Alphabet::from_chars("abcde").unwrap();
        let seq: Sequence = indices.iter().filter_map(|&i| alphabet.symbol(i)).collect();
        let matrix = build_transition_matrix(&seq, &alphabet).unwrap();
        for row in 0..alphabet.size() {
            let sum: f64 = matrix.row(row).iter().sum();
            prop_assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-9, "row {row} sums to {sum}");
        }
    }

    #[test]
    fn entropy_ratio_stays_in_unit_interval(indices in symbols(4, 200)) {
        prop_assume!(!indices.is_empty());
        let alphabet = Alphabet::from_chars("wxyz").unwrap();
        let seq: Sequence = indices.iter().filter_map(|&i| alphabet.symbol(i)).collect();
        let summary = EntropySummary::of_sequence(&seq, &alphabet).unwrap();
        prop_assert!(summary.ratio >= 0.0 && summary.ratio <= 1.0 + 1e-12);
    }

    #[test]
    fn ngram_tables_are_zero_padded(indices in symbols(3, 60), t in 1usize..4) {
        let alphabet = Alphabet::from_chars("abc").unwrap();
        let seq: Sequence = indices.iter().filter_map(|&i| alphabet.symbol(i)).collect();
        match ngram_counts(&seq, &alphabet, t) {
            Ok(table) => {
                prop_assert_eq!(table.len(), 3usize.pow(t as u32));
                prop_assert_eq!(table.total() as usize, seq.len() + 1 - t);
            }
            Err(e) => {
                prop_assert!(seq.len() < t);
                prop_assert_eq!(e, Error::InsufficientData { needed: t, got: seq.len() });
            }
        }
    }
}

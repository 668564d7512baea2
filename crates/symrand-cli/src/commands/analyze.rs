use serde::Serialize;
use symrand_core::{
    ContingencyTable, FrequencyTable, SequenceProfile, positional_counts,
    positional_transition_counts, profile, record_profile,
};

use super::InputArgs;

#[derive(Serialize)]
struct AnalyzeReport {
    profile: SequenceProfile,
    /// Per-position symbol counts; only with --records.
    #[serde(skip_serializing_if = "Option::is_none")]
    positional: Option<Vec<FrequencyTable>>,
    /// Transition counts from position `i` to `i + 1`; only with --records.
    #[serde(skip_serializing_if = "Option::is_none")]
    positional_transitions: Option<Vec<ContingencyTable>>,
}

pub fn run(input: &InputArgs, tuple_size: usize, top: usize, output_path: Option<&str>) {
    let loaded = super::load_input(input);

    let result = if input.records {
        record_profile(&loaded.records, &loaded.alphabet, tuple_size, top)
    } else {
        profile(&loaded.sequence, &loaded.alphabet, tuple_size, top)
    };
    let profile = match result {
        Ok(p) => p,
        Err(e) => super::exit_with("Analysis failed", e),
    };
    let (positional, positional_transitions) = if input.records {
        let symbols = match positional_counts(&loaded.records, &loaded.alphabet) {
            Ok(tables) => tables,
            Err(e) => super::exit_with("Positional analysis failed", e),
        };
        let transitions = match positional_transition_counts(&loaded.records, &loaded.alphabet) {
            Ok(tables) => tables,
            Err(e) => super::exit_with("Positional analysis failed", e),
        };
        (Some(symbols), Some(transitions))
    } else {
        (None, None)
    };

    print_profile(&profile);
    if let Some(tables) = &positional {
        print_positional(tables);
    }
    if let Some(tables) = &positional_transitions {
        print_positional_transitions(tables);
    }

    if let Some(path) = output_path {
        super::write_json(
            path,
            &AnalyzeReport {
                profile,
                positional,
                positional_transitions,
            },
        );
    }
}

fn print_profile(p: &SequenceProfile) {
    println!("Length:          {}", p.length);
    println!(
        "Alphabet:        {} symbols ({} observed)",
        p.alphabet_size, p.distinct_observed
    );
    match &p.entropy {
        Some(e) => println!(
            "Entropy:         {:.4} / {:.4} bits ({:.1}% of max)",
            e.entropy_bits,
            e.max_entropy_bits,
            e.ratio * 100.0
        ),
        None => println!("Entropy:         — (empty sequence)"),
    }
    if let Some(t) = &p.transition_entropy {
        println!(
            "Pair entropy:    {:.4} / {:.4} bits (uniformity {:.3})",
            t.entropy_bits, t.max_entropy_bits, t.ratio
        );
    }
    let factors: Vec<String> = p.length_factors.iter().map(|f| f.to_string()).collect();
    println!("Length factors:  {}", factors.join(", "));

    println!("\n{:<12} {:>10} {:>9}", "Symbol", "Count", "Share");
    println!("{}", "-".repeat(33));
    let total = p.unigrams.total().max(1) as f64;
    for (key, count) in p.unigrams.iter() {
        println!(
            "{:<12} {:>10} {:>8.2}%",
            key.join(""),
            count,
            count as f64 / total * 100.0
        );
    }

    if !p.top_ngrams.is_empty() {
        println!("\nMost common {}-grams:", p.tuple_size);
        for share in &p.top_ngrams {
            println!(
                "  {:<16} {:>8} {:>8.2}%",
                share.key.join(" "),
                share.count,
                share.percent
            );
        }
    }
}

fn print_positional(tables: &[FrequencyTable]) {
    println!("\n{:<10} {:>8} {:>12} {:>8}", "Position", "Records", "Top symbol", "Count");
    println!("{}", "-".repeat(41));
    for (position, table) in tables.iter().enumerate() {
        let top = table.most_common(1);
        let (symbol, count) = top
            .first()
            .map(|s| (s.key.join(""), s.count))
            .unwrap_or_else(|| ("—".to_string(), 0));
        println!(
            "{:<10} {:>8} {:>12} {:>8}",
            position + 1,
            table.total(),
            symbol,
            count
        );
    }
}

fn print_positional_transitions(tables: &[ContingencyTable]) {
    println!(
        "\n{:<10} {:>8} {:>16} {:>8}",
        "Step", "Pairs", "Top transition", "Count"
    );
    println!("{}", "-".repeat(45));
    for (position, table) in tables.iter().enumerate() {
        let top = table.to_pair_table().most_common(1);
        let (pair, count) = top
            .first()
            .map(|s| (s.key.join(" -> "), s.count))
            .unwrap_or_else(|| ("—".to_string(), 0));
        println!(
            "{:<10} {:>8} {:>16} {:>8}",
            format!("{}->{}", position + 1, position + 2),
            table.grand_total(),
            pair,
            count
        );
    }
}

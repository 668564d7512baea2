use serde::Serialize;
use symrand_core::{
    ContextModel, ContextRow, Error, TransitionEdge, TransitionMatrix, transition_entropy,
};

use super::InputArgs;

pub struct TransitionsCommandConfig<'a> {
    pub input: &'a InputArgs,
    pub min_count: u64,
    pub top: usize,
    pub order: Option<usize>,
    pub output_path: Option<&'a str>,
}

#[derive(Serialize)]
struct TransitionsReport {
    matrix: TransitionMatrix,
    edges: Vec<TransitionEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contexts: Option<Vec<ContextRow>>,
}

pub fn run(cfg: TransitionsCommandConfig<'_>) {
    let loaded = super::load_input(cfg.input);

    let matrix = match TransitionMatrix::from_records(&loaded.records, &loaded.alphabet) {
        Ok(m) => m,
        Err(e) => super::exit_with("Transition counting failed", e),
    };
    let edges = matrix.edges(cfg.min_count);

    let contexts = cfg.order.map(|order| {
        match ContextModel::fit_records(&loaded.records, &loaded.alphabet, order) {
            Ok(model) => model.rows(),
            Err(e @ Error::InsufficientData { .. }) => {
                log::warn!("context model of order {order} skipped: {e}");
                Vec::new()
            }
            Err(e) => super::exit_with("Context model failed", e),
        }
    });

    print_matrix(&matrix);
    match transition_entropy(matrix.counts()) {
        Ok(t) => println!(
            "\nPair entropy: {:.4} / {:.4} bits (uniformity {:.3})",
            t.entropy_bits, t.max_entropy_bits, t.ratio
        ),
        Err(_) => println!("\nPair entropy: — (no transitions)"),
    }

    println!("\nTop transitions:");
    for edge in matrix.top_transitions(cfg.top) {
        println!(
            "  {} -> {:<8} {:>8} {:>8.2}%  P={:.3}",
            edge.from, edge.to, edge.count, edge.percent, edge.probability
        );
    }
    println!(
        "\n{} edge(s) with at least {} observation(s)",
        edges.len(),
        cfg.min_count
    );

    if let Some(rows) = &contexts {
        print_contexts(rows, cfg.top);
    }

    if let Some(path) = cfg.output_path {
        super::write_json(
            path,
            &TransitionsReport {
                matrix,
                edges,
                contexts,
            },
        );
    }
}

fn print_matrix(matrix: &TransitionMatrix) {
    let symbols = matrix.alphabet().symbols();
    print!("{:<8}", "from\\to");
    for s in symbols {
        print!(" {s:>7}");
    }
    println!();
    for (row, from) in symbols.iter().enumerate() {
        print!("{from:<8}");
        for p in matrix.row(row) {
            print!(" {p:>7.3}");
        }
        if matrix.counts().row(row).iter().all(|&c| c == 0) {
            print!("   (no data)");
        }
        println!();
    }
}

fn print_contexts(rows: &[ContextRow], limit: usize) {
    let mut rows: Vec<&ContextRow> = rows.iter().collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    println!("\nMost frequent contexts:");
    for row in rows.into_iter().take(limit) {
        let best = row
            .probabilities
            .iter()
            .copied()
            .fold(0.0f64, f64::max);
        println!(
            "  {:<16} seen {:>6}x  max P(next)={:.3}",
            row.context.join(" "),
            row.total,
            best
        );
    }
}

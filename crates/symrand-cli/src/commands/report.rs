use serde::Serialize;
use symrand_tests::{CorrectedPanel, TestOutcome, Verdict, run_panel_with, run_record_panel};

use super::{InputArgs, PanelArgs};

/// JSON export: the panel plus its overall verdict.
#[derive(Serialize)]
struct PanelReport<'a> {
    verdict: Verdict,
    #[serde(flatten)]
    panel: &'a CorrectedPanel,
}

pub fn run(input: &InputArgs, panel_args: &PanelArgs, output_path: Option<&str>, format: &str) {
    let loaded = super::load_input(input);
    let config = super::panel_config(panel_args);

    let scope = if input.records {
        format!("{} records", loaded.records.len())
    } else {
        "one sequence".to_string()
    };
    println!(
        "Running {} test(s) on {} symbols ({scope}) over {} ({} correction, alpha={})...\n",
        config.tests.len(),
        loaded.sequence.len(),
        loaded.alphabet,
        config.correction,
        config.alpha
    );

    let result = if input.records {
        run_record_panel(&loaded.records, &loaded.alphabet, &config)
    } else {
        run_panel_with(&loaded.sequence, &loaded.alphabet, &config)
    };
    let panel = match result {
        Ok(panel) => panel,
        Err(e) => super::exit_with("Panel failed", e),
    };

    print_table(&panel);

    if let Some(path) = output_path {
        if format == "markdown" {
            match std::fs::write(path, generate_markdown(&panel)) {
                Ok(()) => println!("\nReport saved to: {path}"),
                Err(e) => eprintln!("Failed to write report to {path}: {e}"),
            }
        } else {
            let report = PanelReport {
                verdict: panel.verdict(),
                panel: &panel,
            };
            super::write_json(path, &report);
        }
    }
}

fn print_table(panel: &CorrectedPanel) {
    println!("{}", "=".repeat(86));
    println!(
        "{:<38} {:>10} {:>10} {:>10} {:>5}  {}",
        "Test", "Statistic", "p-value", "adj. p", "Grade", "Verdict"
    );
    println!("{}", "-".repeat(86));

    for entry in &panel.entries {
        match &entry.outcome {
            TestOutcome::Completed(r) => {
                let verdict = if entry.rejected == Some(true) {
                    "REJECT"
                } else {
                    "random"
                };
                println!(
                    "{:<38} {:>10.4} {:>10.6} {:>10.6} {:>5}  {}",
                    r.name,
                    r.statistic,
                    r.p_value,
                    entry.adjusted_p_value.unwrap_or(r.p_value),
                    r.grade,
                    verdict
                );
            }
            TestOutcome::NotApplicable { name, reason } => {
                println!(
                    "{name:<38} {:>10} {:>10} {:>10} {:>5}  n/a ({reason})",
                    "—", "—", "—", "—"
                );
            }
        }
    }

    println!("{}", "=".repeat(86));
    let completed = panel.completed().count();
    println!(
        "{}/{} applicable tests rejected after {} correction ({} before correction)",
        panel.rejections(),
        completed,
        panel.method,
        panel.raw_rejections()
    );
    println!("Verdict: {}", verdict_line(panel));
}

fn verdict_line(panel: &CorrectedPanel) -> String {
    match panel.verdict() {
        Verdict::Random => format!(
            "consistent with a uniform, memoryless source at alpha={}",
            panel.alpha
        ),
        Verdict::NotRandom => format!(
            "NOT consistent with a uniform, memoryless source at alpha={}",
            panel.alpha
        ),
        Verdict::Inconclusive => {
            "inconclusive: no test could run on this sample".to_string()
        }
    }
}

fn generate_markdown(panel: &CorrectedPanel) -> String {
    let mut report = String::new();
    report.push_str("# symrand — Randomness Test Report\n\n");
    report.push_str(&format!(
        "- Verdict: {}\n- Sequence length: {}\n- Alphabet size: {}\n- Correction: {} at alpha={}\n- Rejected: {}/{} (raw {})\n",
        verdict_line(panel),
        panel.sequence_length,
        panel.alphabet_size,
        panel.method,
        panel.alpha,
        panel.rejections(),
        panel.completed().count(),
        panel.raw_rejections()
    ));
    if let Some(records) = panel.records {
        report.push_str(&format!("- Records: {records}\n"));
    }
    report.push('\n');

    report.push_str("| Test | Verdict | Grade | Statistic | dof | p-value | adj. p | Details |\n");
    report.push_str("|------|---------|-------|-----------|-----|---------|--------|---------|\n");
    for entry in &panel.entries {
        match &entry.outcome {
            TestOutcome::Completed(r) => {
                let ok = if entry.rejected == Some(true) { "✗" } else { "✓" };
                let dof = r
                    .degrees_of_freedom
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "—".to_string());
                report.push_str(&format!(
                    "| {} | {} | {} | {:.4} | {} | {:.6} | {:.6} | {} |\n",
                    r.name,
                    ok,
                    r.grade,
                    r.statistic,
                    dof,
                    r.p_value,
                    entry.adjusted_p_value.unwrap_or(r.p_value),
                    r.details
                ));
            }
            TestOutcome::NotApplicable { name, reason } => {
                report.push_str(&format!(
                    "| {name} | n/a | — | — | — | — | — | {reason} |\n"
                ));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use symrand_core::{Alphabet, Sequence};
    use symrand_tests::{CorrectionMethod, TestKind, run_panel};

    #[test]
    fn test_markdown_lists_every_entry() {
        let panel = run_panel(
            &Sequence::from_chars("0110"),
            &Alphabet::from_chars("01").unwrap(),
            &[TestKind::Frequency, TestKind::LjungBox],
            0.05,
            CorrectionMethod::Holm,
        )
        .unwrap();
        let md = generate_markdown(&panel);
        assert!(md.contains("| Symbol Frequency | ✓ |"));
        assert!(md.contains("| Ljung-Box (lags=10) | n/a |"));
    }

    #[test]
    fn test_markdown_marks_empty_panel_inconclusive() {
        let panel = run_panel(
            &Sequence::default(),
            &Alphabet::from_chars("01").unwrap(),
            &[TestKind::Serial, TestKind::LjungBox],
            0.05,
            CorrectionMethod::Holm,
        )
        .unwrap();
        let md = generate_markdown(&panel);
        assert!(md.contains("- Verdict: inconclusive"));
        assert!(!md.contains("consistent with a uniform"));
    }

    #[test]
    fn test_markdown_lists_record_count() {
        let records = vec![Sequence::from_chars("0110"), Sequence::from_chars("1001")];
        let config = symrand_tests::PanelConfig {
            tests: vec![TestKind::Frequency],
            ..Default::default()
        };
        let panel = run_record_panel(&records, &Alphabet::from_chars("01").unwrap(), &config)
            .unwrap();
        let md = generate_markdown(&panel);
        assert!(md.contains("- Records: 2\n"));
        assert!(md.contains("- Verdict: consistent with a uniform, memoryless source"));
    }

    #[test]
    fn test_json_export_carries_verdict() {
        let panel = run_panel(
            &Sequence::from_chars("0110"),
            &Alphabet::from_chars("01").unwrap(),
            &[TestKind::LjungBox],
            0.05,
            CorrectionMethod::Holm,
        )
        .unwrap();
        let json = serde_json::to_value(PanelReport {
            verdict: panel.verdict(),
            panel: &panel,
        })
        .unwrap();
        assert_eq!(json["verdict"], "inconclusive");
        assert_eq!(json["sequence_length"], 4);
        assert!(json["records"].is_null());
    }
}

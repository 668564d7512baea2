//! False-positive calibration.
//!
//! Runs a panel over many uniform i.i.d. sequences. Every rejection is then a
//! false positive, so the rejection rates show how often the configured panel
//! flags genuinely random data, before and after correction.

use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;
use symrand_core::{Alphabet, Error, Result, Sequence};

use crate::correction::CorrectionMethod;
use crate::panel::{PanelConfig, run_panel_with};

/// How often one named test rejected across the trials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRejectionRate {
    pub name: String,
    /// Trials in which the test produced a p-value.
    pub applicable: usize,
    pub raw_rejections: usize,
    pub corrected_rejections: usize,
    /// `raw_rejections / applicable`, 0 when never applicable.
    pub raw_rate: f64,
    pub corrected_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub trials: usize,
    pub sequence_length: usize,
    pub alphabet_size: usize,
    pub alpha: f64,
    pub method: CorrectionMethod,
    /// Trials where at least one raw p-value fell below alpha.
    pub panels_with_raw_rejection: usize,
    /// Trials where at least one test was rejected after correction.
    pub panels_with_corrected_rejection: usize,
    pub raw_panel_rate: f64,
    pub corrected_panel_rate: f64,
    /// Per-test rates, in first-seen order.
    pub tests: Vec<TestRejectionRate>,
}

/// Simulate `trials` uniform sequences of `length` symbols and run `config`
/// on each.
pub fn calibrate<R: Rng>(
    alphabet: &Alphabet,
    length: usize,
    trials: usize,
    config: &PanelConfig,
    rng: &mut R,
) -> Result<CalibrationReport> {
    if trials == 0 {
        return Err(Error::InvalidConfiguration(
            "calibration needs at least one trial".into(),
        ));
    }
    config.validate()?;

    let k = alphabet.size();
    let mut tests: Vec<TestRejectionRate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut panels_with_raw_rejection = 0;
    let mut panels_with_corrected_rejection = 0;

    for trial in 0..trials {
        let sequence: Sequence = (0..length)
            .filter_map(|_| alphabet.symbol(rng.random_range(0..k)))
            .collect();
        let panel = run_panel_with(&sequence, alphabet, config)?;

        if panel.raw_rejections() > 0 {
            panels_with_raw_rejection += 1;
        }
        if panel.rejections() > 0 {
            panels_with_corrected_rejection += 1;
        }

        for entry in &panel.entries {
            let Some(result) = entry.outcome.result() else {
                continue;
            };
            let slot = *index.entry(result.name.clone()).or_insert_with(|| {
                tests.push(TestRejectionRate {
                    name: result.name.clone(),
                    applicable: 0,
                    raw_rejections: 0,
                    corrected_rejections: 0,
                    raw_rate: 0.0,
                    corrected_rate: 0.0,
                });
                tests.len() - 1
            });
            let rate = &mut tests[slot];
            rate.applicable += 1;
            if !result.passed {
                rate.raw_rejections += 1;
            }
            if entry.rejected == Some(true) {
                rate.corrected_rejections += 1;
            }
        }
        log::debug!(
            "calibration trial {}/{}: {} raw, {} corrected rejections",
            trial + 1,
            trials,
            panel.raw_rejections(),
            panel.rejections()
        );
    }

    for rate in &mut tests {
        if rate.applicable > 0 {
            rate.raw_rate = rate.raw_rejections as f64 / rate.applicable as f64;
            rate.corrected_rate = rate.corrected_rejections as f64 / rate.applicable as f64;
        }
    }

    let report = CalibrationReport {
        trials,
        sequence_length: length,
        alphabet_size: k,
        alpha: config.alpha,
        method: config.correction,
        panels_with_raw_rejection,
        panels_with_corrected_rejection,
        raw_panel_rate: panels_with_raw_rejection as f64 / trials as f64,
        corrected_panel_rate: panels_with_corrected_rejection as f64 / trials as f64,
        tests,
    };
    log::info!(
        "calibrated {} trials of {} symbols: raw panel rate {:.3}, corrected {:.3} ({})",
        report.trials,
        report.sequence_length,
        report.raw_panel_rate,
        report.corrected_panel_rate,
        report.method
    );
    Ok(report)
}

use rand::SeedableRng;
use rand::rngs::StdRng;
use symrand_tests::calibrate;

use super::{AlphabetArgs, PanelArgs};

pub struct CalibrateCommandConfig<'a> {
    pub alphabet: &'a AlphabetArgs,
    pub panel: &'a PanelArgs,
    pub length: usize,
    pub trials: usize,
    pub seed: Option<u64>,
    pub output_path: Option<&'a str>,
}

pub fn run(cfg: CalibrateCommandConfig<'_>) {
    let alphabet = match super::resolve_alphabet(cfg.alphabet, None) {
        Ok(a) => a,
        Err(e) => super::exit_with("Invalid alphabet", e),
    };
    let config = super::panel_config(cfg.panel);
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    println!(
        "Simulating {} uniform sequences of {} symbols over {}...\n",
        cfg.trials, cfg.length, alphabet
    );

    let report = match calibrate(&alphabet, cfg.length, cfg.trials, &config, &mut rng) {
        Ok(r) => r,
        Err(e) => super::exit_with("Calibration failed", e),
    };

    println!(
        "{:<38} {:>10} {:>10} {:>10}",
        "Test", "Applied", "Raw rate", "Corrected"
    );
    println!("{}", "-".repeat(71));
    for t in &report.tests {
        println!(
            "{:<38} {:>10} {:>10.4} {:>10.4}",
            t.name, t.applicable, t.raw_rate, t.corrected_rate
        );
    }
    println!("{}", "-".repeat(71));
    println!(
        "Panels with any rejection: raw {:.4}, after {} {:.4} (alpha={})",
        report.raw_panel_rate, report.method, report.corrected_panel_rate, report.alpha
    );

    if let Some(path) = cfg.output_path {
        super::write_json(path, &report);
    }
}

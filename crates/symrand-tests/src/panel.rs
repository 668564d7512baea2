//! Test panels: run a configured subset of the battery and correct the
//! resulting p-values as one family.

use serde::{Deserialize, Serialize};
use symrand_core::{Alphabet, Error, Result, Sequence, validate_alpha};

use crate::correction::{CorrectionMethod, adjust_p_values};
use crate::{
    RunsMode, TestOutcome, TestResult, independence_test, ljung_box_test, markov_row_tests,
    record_independence_test, record_markov_row_tests, record_runs_test, record_serial_test,
    runs_test, serial_test, unigram_test,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tests a panel can include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    /// Unigram chi-square.
    Frequency,
    /// Overlapping n-gram chi-square.
    Serial,
    /// One chi-square per predecessor symbol.
    MarkovRows,
    /// Lagged-pair contingency chi-square.
    Independence,
    Runs,
    LjungBox,
}

impl TestKind {
    pub const ALL: [TestKind; 6] = [
        TestKind::Frequency,
        TestKind::Serial,
        TestKind::MarkovRows,
        TestKind::Independence,
        TestKind::Runs,
        TestKind::LjungBox,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestKind::Frequency => "frequency",
            TestKind::Serial => "serial",
            TestKind::MarkovRows => "markov-rows",
            TestKind::Independence => "independence",
            TestKind::Runs => "runs",
            TestKind::LjungBox => "ljung-box",
        }
    }

    /// Display name used when the whole test is not applicable.
    fn label(self, config: &PanelConfig) -> String {
        match self {
            TestKind::Frequency => "Symbol Frequency".to_string(),
            TestKind::Serial => format!("Serial (t={})", config.tuple_size),
            TestKind::MarkovRows => "Markov Rows".to_string(),
            TestKind::Independence => format!("Lagged Pair Independence (lag={})", config.lag),
            TestKind::Runs => "Runs".to_string(),
            TestKind::LjungBox => format!("Ljung-Box (lags={})", config.nlags),
        }
    }
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        TestKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .or(match normalized.as_str() {
                "unigram" => Some(TestKind::Frequency),
                "markov" => Some(TestKind::MarkovRows),
                "ljungbox" | "autocorrelation" => Some(TestKind::LjungBox),
                _ => None,
            })
            .ok_or_else(|| Error::InvalidConfiguration(format!("unknown test {s:?}")))
    }
}

/// Everything a panel run needs besides the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub tests: Vec<TestKind>,
    /// Family-wise significance level.
    pub alpha: f64,
    pub correction: CorrectionMethod,
    /// n-gram width for the serial test.
    pub tuple_size: usize,
    /// Offset for the independence test.
    pub lag: usize,
    /// Lags for Ljung-Box.
    pub nlags: usize,
    pub runs_mode: RunsMode,
    /// Run the tests on scoped threads.
    pub parallel: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            tests: TestKind::ALL.to_vec(),
            alpha: 0.05,
            correction: CorrectionMethod::default(),
            tuple_size: 2,
            lag: 1,
            nlags: 10,
            runs_mode: RunsMode::default(),
            parallel: false,
        }
    }
}

impl PanelConfig {
    pub fn validate(&self) -> Result<()> {
        validate_alpha(self.alpha)?;
        if self.tests.is_empty() {
            return Err(Error::InvalidConfiguration(
                "a panel needs at least one test".into(),
            ));
        }
        for (field, value) in [
            ("tuple_size", self.tuple_size),
            ("lag", self.lag),
            ("nlags", self.nlags),
        ] {
            if value == 0 {
                return Err(Error::InvalidConfiguration(format!(
                    "{field} must be at least 1"
                )));
            }
        }
        Ok(())
    }

    /// Configured tests with duplicates removed, first occurrence kept.
    fn distinct_tests(&self) -> Vec<TestKind> {
        let mut seen = Vec::with_capacity(self.tests.len());
        for &kind in &self.tests {
            if !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One test's outcome with its corrected decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelEntry {
    pub kind: TestKind,
    pub outcome: TestOutcome,
    /// `None` when the test was not applicable.
    pub adjusted_p_value: Option<f64>,
    pub rejected: Option<bool>,
}

/// Panel-level conclusion after correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// At least one test ran and none was rejected.
    Random,
    /// At least one test was rejected.
    NotRandom,
    /// No test could run on this sample.
    Inconclusive,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Random => "random",
            Verdict::NotRandom => "not random",
            Verdict::Inconclusive => "inconclusive",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered panel outcomes plus the correction that produced the decisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectedPanel {
    pub entries: Vec<PanelEntry>,
    pub method: CorrectionMethod,
    pub alpha: f64,
    /// Total symbols, summed over records for a record set.
    pub sequence_length: usize,
    pub alphabet_size: usize,
    /// Number of records when the panel ran on a record set.
    pub records: Option<usize>,
}

impl CorrectedPanel {
    pub fn completed(&self) -> impl Iterator<Item = &TestResult> + '_ {
        self.entries.iter().filter_map(|e| e.outcome.result())
    }

    pub fn not_applicable(&self) -> impl Iterator<Item = &PanelEntry> + '_ {
        self.entries.iter().filter(|e| !e.outcome.is_applicable())
    }

    /// Tests rejected after correction.
    pub fn rejections(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.rejected == Some(true))
            .count()
    }

    /// Tests whose raw p-value is below alpha.
    pub fn raw_rejections(&self) -> usize {
        self.completed().filter(|r| !r.passed).count()
    }

    pub fn verdict(&self) -> Verdict {
        if self.rejections() > 0 {
            Verdict::NotRandom
        } else if self.completed().next().is_none() {
            Verdict::Inconclusive
        } else {
            Verdict::Random
        }
    }

    /// At least one test completed and none was rejected after correction.
    pub fn appears_random(&self) -> bool {
        self.verdict() == Verdict::Random
    }
}

// ---------------------------------------------------------------------------
// Panel runner
// ---------------------------------------------------------------------------

/// Data a panel runs on.
#[derive(Clone, Copy)]
enum Sample<'a> {
    Sequence(&'a Sequence),
    /// Independent records plus their concatenation, used only where order
    /// across records cannot matter (symbol frequencies).
    Records {
        records: &'a [Sequence],
        pooled: &'a Sequence,
    },
}

impl Sample<'_> {
    fn len(&self) -> usize {
        match self {
            Sample::Sequence(sequence) => sequence.len(),
            Sample::Records { pooled, .. } => pooled.len(),
        }
    }

    fn record_count(&self) -> Option<usize> {
        match self {
            Sample::Sequence(_) => None,
            Sample::Records { records, .. } => Some(records.len()),
        }
    }
}

/// Run `tests` at `alpha` and correct with `method`; other settings take
/// their [`PanelConfig`] defaults.
pub fn run_panel(
    sequence: &Sequence,
    alphabet: &Alphabet,
    tests: &[TestKind],
    alpha: f64,
    method: CorrectionMethod,
) -> Result<CorrectedPanel> {
    let config = PanelConfig {
        tests: tests.to_vec(),
        alpha,
        correction: method,
        ..PanelConfig::default()
    };
    run_panel_with(sequence, alphabet, &config)
}

/// Run the panel described by `config`.
///
/// Data conditions (too little data, more distinct symbols than declared)
/// become not-applicable entries; any other error aborts the whole panel.
pub fn run_panel_with(
    sequence: &Sequence,
    alphabet: &Alphabet,
    config: &PanelConfig,
) -> Result<CorrectedPanel> {
    run_sample(Sample::Sequence(sequence), alphabet, config)
}

/// Run the panel over a set of independent records (e.g. one draw per line).
///
/// No statistic links the end of one record to the start of the next: serial
/// windows, Markov rows, lagged pairs and runs are pooled per record. Ljung-Box
/// needs one contiguous series and is reported as not applicable.
pub fn run_record_panel(
    records: &[Sequence],
    alphabet: &Alphabet,
    config: &PanelConfig,
) -> Result<CorrectedPanel> {
    let pooled: Sequence = records
        .iter()
        .flat_map(|r| r.symbols().iter().cloned())
        .collect();
    run_sample(
        Sample::Records {
            records,
            pooled: &pooled,
        },
        alphabet,
        config,
    )
}

fn run_sample(
    sample: Sample<'_>,
    alphabet: &Alphabet,
    config: &PanelConfig,
) -> Result<CorrectedPanel> {
    config.validate()?;
    let tests = config.distinct_tests();

    let per_test: Vec<Result<Vec<TestOutcome>>> = if config.parallel {
        std::thread::scope(|s| {
            let handles: Vec<_> = tests
                .iter()
                .map(|&kind| s.spawn(move || run_kind(kind, sample, alphabet, config)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    } else {
        tests
            .iter()
            .map(|&kind| run_kind(kind, sample, alphabet, config))
            .collect()
    };

    let mut rows: Vec<(TestKind, TestOutcome)> = Vec::new();
    for (&kind, result) in tests.iter().zip(per_test) {
        rows.extend(result?.into_iter().map(|outcome| (kind, outcome)));
    }

    let p_values: Vec<f64> = rows.iter().filter_map(|(_, o)| o.p_value()).collect();
    let mut adjustments = adjust_p_values(&p_values, config.alpha, config.correction)?.into_iter();

    let entries: Vec<PanelEntry> = rows
        .into_iter()
        .map(|(kind, outcome)| {
            let adjustment = if outcome.is_applicable() {
                adjustments.next()
            } else {
                None
            };
            PanelEntry {
                kind,
                outcome,
                adjusted_p_value: adjustment.map(|a| a.adjusted_p_value),
                rejected: adjustment.map(|a| a.rejected),
            }
        })
        .collect();

    let panel = CorrectedPanel {
        entries,
        method: config.correction,
        alpha: config.alpha,
        sequence_length: sample.len(),
        alphabet_size: alphabet.size(),
        records: sample.record_count(),
    };
    log::info!(
        "panel over {} symbols: {} tests, {} not applicable, {} rejected ({} raw) with {} at alpha={}: {}",
        panel.sequence_length,
        panel.entries.len(),
        panel.not_applicable().count(),
        panel.rejections(),
        panel.raw_rejections(),
        panel.method,
        panel.alpha,
        panel.verdict()
    );
    Ok(panel)
}

fn run_kind(
    kind: TestKind,
    sample: Sample<'_>,
    alphabet: &Alphabet,
    config: &PanelConfig,
) -> Result<Vec<TestOutcome>> {
    let result = match sample {
        Sample::Sequence(sequence) => run_on_sequence(kind, sequence, alphabet, config),
        Sample::Records { records, pooled } => {
            run_on_records(kind, records, pooled, alphabet, config)
        }
    };

    match result {
        Ok(outcomes) => {
            for outcome in &outcomes {
                if let Some(r) = outcome.result() {
                    log::debug!(
                        "{}: statistic={:.4} p={:.6} grade={}",
                        r.name,
                        r.statistic,
                        r.p_value,
                        r.grade
                    );
                }
            }
            Ok(outcomes)
        }
        Err(e) if e.is_data_condition() => {
            let name = kind.label(config);
            log::warn!("{name}: not applicable ({e})");
            Ok(vec![TestOutcome::NotApplicable {
                name,
                reason: e.to_string(),
            }])
        }
        Err(e) => Err(e),
    }
}

fn run_on_sequence(
    kind: TestKind,
    sequence: &Sequence,
    alphabet: &Alphabet,
    config: &PanelConfig,
) -> Result<Vec<TestOutcome>> {
    let alpha = config.alpha;
    match kind {
        TestKind::Frequency => unigram_test(sequence, alphabet, alpha).map(|r| vec![r.into()]),
        TestKind::Serial => {
            serial_test(sequence, alphabet, config.tuple_size, alpha).map(|r| vec![r.into()])
        }
        TestKind::MarkovRows => markov_row_tests(sequence, alphabet, alpha),
        TestKind::Independence => {
            independence_test(sequence, alphabet, config.lag, alpha).map(|r| vec![r.into()])
        }
        TestKind::Runs => {
            runs_test(sequence, alphabet, config.runs_mode, alpha).map(|r| vec![r.into()])
        }
        TestKind::LjungBox => {
            ljung_box_test(sequence, alphabet, config.nlags, alpha).map(|r| vec![r.into()])
        }
    }
}

fn run_on_records(
    kind: TestKind,
    records: &[Sequence],
    pooled: &Sequence,
    alphabet: &Alphabet,
    config: &PanelConfig,
) -> Result<Vec<TestOutcome>> {
    let alpha = config.alpha;
    match kind {
        TestKind::Frequency => unigram_test(pooled, alphabet, alpha).map(|r| vec![r.into()]),
        TestKind::Serial => record_serial_test(records, alphabet, config.tuple_size, alpha)
            .map(|r| vec![r.into()]),
        TestKind::MarkovRows => record_markov_row_tests(records, alphabet, alpha),
        TestKind::Independence => {
            record_independence_test(records, alphabet, config.lag, alpha).map(|r| vec![r.into()])
        }
        TestKind::Runs => {
            record_runs_test(records, alphabet, config.runs_mode, alpha).map(|r| vec![r.into()])
        }
        TestKind::LjungBox => {
            let name = kind.label(config);
            log::warn!("{name}: not applicable to a record set");
            Ok(vec![TestOutcome::NotApplicable {
                name,
                reason: "needs one contiguous sequence, got a record set".into(),
            }])
        }
    }
}

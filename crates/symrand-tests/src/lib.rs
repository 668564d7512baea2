//! Randomness test battery for finite-alphabet symbol sequences.
//!
//! Each test returns a [`TestResult`] carrying the statistic, an upper-tail or
//! two-sided p-value, the degrees of freedom where they apply, an
//! "appears random" decision against the caller's alpha, and a letter grade
//! (A through F). [`run_panel`] composes a subset of tests and applies a
//! multiple-testing correction across them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use symrand_core::{
    Alphabet, ContingencyTable, Error, FrequencyTable, Result, Sequence, lagged_pair_counts,
    markov_row_counts, ngram_counts, record_lagged_pair_counts, record_markov_row_counts,
    record_ngram_counts, unigram_counts, validate_alpha,
};

pub mod calibration;
pub mod correction;
pub mod panel;

pub use calibration::{CalibrationReport, TestRejectionRate, calibrate};
pub use correction::{Adjustment, CorrectionMethod, adjust_p_values};
pub use panel::{
    CorrectedPanel, PanelConfig, PanelEntry, TestKind, Verdict, run_panel, run_panel_with,
    run_record_panel,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a single randomness test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub name: String,
    pub statistic: f64,
    pub p_value: f64,
    /// `None` for tests with a normal reference distribution.
    pub degrees_of_freedom: Option<usize>,
    /// Significance level the decision was taken at.
    pub alpha: f64,
    /// "Appears random": `p_value >= alpha`.
    pub passed: bool,
    pub details: String,
    pub grade: char,
}

impl TestResult {
    fn new(
        name: impl Into<String>,
        statistic: f64,
        p_value: f64,
        degrees_of_freedom: Option<usize>,
        alpha: f64,
        details: String,
    ) -> Self {
        Self {
            name: name.into(),
            statistic,
            p_value,
            degrees_of_freedom,
            alpha,
            passed: Self::pass_from_p(p_value, alpha),
            details,
            grade: Self::grade_from_p(p_value),
        }
    }

    /// Assign a letter grade based on p-value.
    ///
    /// - A: p >= 0.1
    /// - B: p >= 0.01
    /// - C: p >= 0.001
    /// - D: p >= 0.0001
    /// - F: otherwise
    pub fn grade_from_p(p: f64) -> char {
        if p >= 0.1 {
            'A'
        } else if p >= 0.01 {
            'B'
        } else if p >= 0.001 {
            'C'
        } else if p >= 0.0001 {
            'D'
        } else {
            'F'
        }
    }

    /// A test passes ("appears random") when its p-value is not below alpha.
    pub fn pass_from_p(p: f64, alpha: f64) -> bool {
        p >= alpha
    }
}

/// What a panel recorded for one test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    Completed(TestResult),
    /// The sample cannot support the test (too short, or more distinct
    /// symbols than the declared alphabet).
    NotApplicable { name: String, reason: String },
}

impl TestOutcome {
    pub fn name(&self) -> &str {
        match self {
            TestOutcome::Completed(r) => &r.name,
            TestOutcome::NotApplicable { name, .. } => name,
        }
    }

    pub fn result(&self) -> Option<&TestResult> {
        match self {
            TestOutcome::Completed(r) => Some(r),
            TestOutcome::NotApplicable { .. } => None,
        }
    }

    pub fn p_value(&self) -> Option<f64> {
        self.result().map(|r| r.p_value)
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, TestOutcome::Completed(_))
    }
}

impl From<TestResult> for TestOutcome {
    fn from(result: TestResult) -> Self {
        TestOutcome::Completed(result)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Upper-tail chi-square probability `P(X >= statistic)`.
///
/// Zero degrees of freedom is a point mass at 0.
fn chi_square_sf(statistic: f64, dof: usize) -> Result<f64> {
    if statistic <= 0.0 {
        return Ok(1.0);
    }
    if dof == 0 {
        return Ok(0.0);
    }
    let dist = ChiSquared::new(dof as f64)
        .map_err(|e| Error::InvalidConfiguration(format!("chi-square with {dof} dof: {e}")))?;
    Ok(dist.sf(statistic))
}

/// Two-sided p-value of a standard normal score.
fn two_sided_normal_p(z: f64) -> f64 {
    let norm = Normal::standard();
    2.0 * (1.0 - norm.cdf(z.abs()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 1. CHI-SQUARE TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Pearson chi-square statistic with its upper-tail p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoodnessOfFit {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
}

/// Chi-square goodness of fit of `observed` against `expected` counts.
///
/// `statistic = Σ (O−E)²/E` with `len − 1` degrees of freedom.
pub fn goodness_of_fit(observed: &[u64], expected: &[f64]) -> Result<GoodnessOfFit> {
    if observed.len() != expected.len() {
        return Err(Error::LengthMismatch {
            observed: observed.len(),
            expected: expected.len(),
        });
    }
    if observed.is_empty() {
        return Err(Error::InvalidConfiguration(
            "goodness of fit needs at least one cell".into(),
        ));
    }
    if let Some((index, &value)) = expected
        .iter()
        .enumerate()
        .find(|&(_, &e)| !(e.is_finite() && e > 0.0))
    {
        return Err(Error::DegenerateExpectation { index, value });
    }

    let statistic: f64 = observed
        .iter()
        .zip(expected)
        .map(|(&o, &e)| {
            let d = o as f64 - e;
            d * d / e
        })
        .sum();
    let degrees_of_freedom = observed.len() - 1;
    Ok(GoodnessOfFit {
        statistic,
        p_value: chi_square_sf(statistic, degrees_of_freedom)?,
        degrees_of_freedom,
    })
}

/// Goodness of fit against the uniform distribution over every cell.
fn uniform_fit(observed: &[u64]) -> Result<GoodnessOfFit> {
    let total: u64 = observed.iter().sum();
    let e = total as f64 / observed.len() as f64;
    goodness_of_fit(observed, &vec![e; observed.len()])
}

/// Symbol frequency: unigram counts against `E = n/k`.
pub fn unigram_test(sequence: &Sequence, alphabet: &Alphabet, alpha: f64) -> Result<TestResult> {
    let name = "Symbol Frequency";
    validate_alpha(alpha)?;
    let table = unigram_counts(sequence, alphabet)?;
    let n = table.total();
    if n == 0 {
        return Err(Error::InsufficientData { needed: 1, got: 0 });
    }
    let fit = uniform_fit(table.counts())?;
    let k = alphabet.size();
    Ok(TestResult::new(
        name,
        fit.statistic,
        fit.p_value,
        Some(fit.degrees_of_freedom),
        alpha,
        format!(
            "n={n}, k={k}, expected={:.3} per symbol, occupied={}",
            n as f64 / k as f64,
            table.occupied()
        ),
    ))
}

/// Serial test: overlapping `tuple_size`-grams against `E = (n−t+1)/k^t`.
pub fn serial_test(
    sequence: &Sequence,
    alphabet: &Alphabet,
    tuple_size: usize,
    alpha: f64,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    serial_result(&ngram_counts(sequence, alphabet, tuple_size)?, alpha)
}

fn serial_result(table: &FrequencyTable, alpha: f64) -> Result<TestResult> {
    let fit = uniform_fit(table.counts())?;
    Ok(TestResult::new(
        format!("Serial (t={})", table.width()),
        fit.statistic,
        fit.p_value,
        Some(fit.degrees_of_freedom),
        alpha,
        format!(
            "windows={}, cells={}, occupied={}",
            table.total(),
            table.len(),
            table.occupied()
        ),
    ))
}

/// One goodness-of-fit test per predecessor symbol: are its successors uniform?
///
/// Rows whose symbol never precedes another are reported as not applicable.
pub fn markov_row_tests(
    sequence: &Sequence,
    alphabet: &Alphabet,
    alpha: f64,
) -> Result<Vec<TestOutcome>> {
    validate_alpha(alpha)?;
    row_tests(&markov_row_counts(sequence, alphabet)?, alpha)
}

/// [`markov_row_tests`] over transitions pooled from several records.
pub fn record_markov_row_tests(
    records: &[Sequence],
    alphabet: &Alphabet,
    alpha: f64,
) -> Result<Vec<TestOutcome>> {
    validate_alpha(alpha)?;
    row_tests(&record_markov_row_counts(records, alphabet)?, alpha)
}

fn row_tests(table: &ContingencyTable, alpha: f64) -> Result<Vec<TestOutcome>> {
    table
        .row_tables()
        .into_iter()
        .map(|(symbol, row)| {
            let name = format!("Markov Row [{symbol}]");
            let total = row.total();
            if total == 0 {
                return Ok(TestOutcome::NotApplicable {
                    name,
                    reason: format!("{symbol:?} has no outgoing transitions"),
                });
            }
            let fit = uniform_fit(row.counts())?;
            Ok(TestResult::new(
                name,
                fit.statistic,
                fit.p_value,
                Some(fit.degrees_of_freedom),
                alpha,
                format!("transitions={total}, successors seen={}", row.occupied()),
            )
            .into())
        })
        .collect()
}

/// Pearson chi-square test of independence on a contingency table.
///
/// All-zero rows and columns are dropped first, so an unused symbol does not
/// produce a zero expectation. Degrees of freedom are `(r−1)(c−1)` over the
/// remaining grid: `(k−1)²` when every symbol occurs, fewer when a symbol is
/// absent from a margin (k = 4 with one symbol never seen gives 4, not 9).
pub fn contingency_chi_square(table: &ContingencyTable) -> Result<GoodnessOfFit> {
    let grand = table.grand_total();
    if grand == 0 {
        return Err(Error::InsufficientData { needed: 1, got: 0 });
    }
    let row_totals = table.row_totals();
    let col_totals = table.column_totals();
    let rows: Vec<usize> = (0..table.size()).filter(|&r| row_totals[r] > 0).collect();
    let cols: Vec<usize> = (0..table.size()).filter(|&c| col_totals[c] > 0).collect();
    if rows.len() < 2 || cols.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: rows.len().min(cols.len()),
        });
    }

    let grand = grand as f64;
    let mut statistic = 0.0;
    for &r in &rows {
        for &c in &cols {
            let e = row_totals[r] as f64 * col_totals[c] as f64 / grand;
            let d = table.count(r, c) as f64 - e;
            statistic += d * d / e;
        }
    }
    let degrees_of_freedom = (rows.len() - 1) * (cols.len() - 1);
    Ok(GoodnessOfFit {
        statistic,
        p_value: chi_square_sf(statistic, degrees_of_freedom)?,
        degrees_of_freedom,
    })
}

/// Independence of `s[t]` and `s[t+lag]`.
pub fn independence_test(
    sequence: &Sequence,
    alphabet: &Alphabet,
    lag: usize,
    alpha: f64,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    independence_result(&lagged_pair_counts(sequence, alphabet, lag)?, lag, alpha)
}

fn independence_result(table: &ContingencyTable, lag: usize, alpha: f64) -> Result<TestResult> {
    let fit = contingency_chi_square(table)?;
    Ok(TestResult::new(
        format!("Lagged Pair Independence (lag={lag})"),
        fit.statistic,
        fit.p_value,
        Some(fit.degrees_of_freedom),
        alpha,
        format!("pairs={}", table.grand_total()),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 2. RUNS TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Which runs statistic to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunsMode {
    /// Binary for a two-symbol alphabet, general otherwise.
    #[default]
    Auto,
    Binary,
    General,
}

impl RunsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunsMode::Auto => "auto",
            RunsMode::Binary => "binary",
            RunsMode::General => "general",
        }
    }

    fn resolve(self, k: usize) -> RunsMode {
        match self {
            RunsMode::Auto if k == 2 => RunsMode::Binary,
            RunsMode::Auto => RunsMode::General,
            other => other,
        }
    }
}

impl std::str::FromStr for RunsMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(RunsMode::Auto),
            "binary" => Ok(RunsMode::Binary),
            "general" => Ok(RunsMode::General),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown runs mode {other:?} (expected auto, binary or general)"
            ))),
        }
    }
}

/// Observed runs against their expectation under independence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunsResult {
    /// Resolved mode, never `Auto`.
    pub mode: RunsMode,
    pub n: usize,
    pub runs: usize,
    pub expected_runs: f64,
    pub variance: f64,
    pub z: f64,
    pub p_value: f64,
}

impl RunsResult {
    fn neutral(mode: RunsMode, n: usize) -> Self {
        Self {
            mode,
            n,
            runs: 0,
            expected_runs: 0.0,
            variance: 0.0,
            z: 0.0,
            p_value: 1.0,
        }
    }

    fn scored(mode: RunsMode, n: usize, runs: usize, expected_runs: f64, variance: f64) -> Self {
        let z = if variance > 0.0 {
            (runs as f64 - expected_runs) / variance.sqrt()
        } else {
            0.0
        };
        Self {
            mode,
            n,
            runs,
            expected_runs,
            variance,
            z,
            p_value: two_sided_normal_p(z),
        }
    }

    pub fn to_test_result(&self, alpha: f64) -> TestResult {
        TestResult::new(
            format!("Runs ({})", self.mode.as_str()),
            self.z,
            self.p_value,
            None,
            alpha,
            format!(
                "runs={}, expected={:.3}, var={:.3}, n={}",
                self.runs, self.expected_runs, self.variance, self.n
            ),
        )
    }
}

/// Number of maximal blocks of equal adjacent symbols; 0 below two symbols.
pub fn count_runs<T: PartialEq>(symbols: &[T]) -> usize {
    if symbols.len() < 2 {
        return 0;
    }
    1 + symbols.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Runs test for a two-symbol alphabet.
///
/// `E[R] = (2n−k)/(k+1)` and `Var[R] = 2n(2n−k−1)/((k+1)²(k+2))` with `k = 2`.
pub fn runs_test_binary(sequence: &Sequence, alphabet: &Alphabet) -> Result<RunsResult> {
    let k = alphabet.size();
    if k != 2 {
        return Err(Error::InvalidConfiguration(format!(
            "binary runs test needs a 2-symbol alphabet, got {k}"
        )));
    }
    let encoded = alphabet.encode(sequence)?;
    let n = encoded.len();
    if n < 2 {
        return Ok(RunsResult::neutral(RunsMode::Binary, n));
    }
    let runs = count_runs(&encoded);
    let (nf, kf) = (n as f64, k as f64);
    let expected = (2.0 * nf - kf) / (kf + 1.0);
    let variance = 2.0 * nf * (2.0 * nf - kf - 1.0) / ((kf + 1.0).powi(2) * (kf + 2.0));
    Ok(RunsResult::scored(RunsMode::Binary, n, runs, expected, variance))
}

/// Runs test for a multi-symbol sequence against a declared alphabet size `k`.
///
/// Symbols are compared as-is; only their distinct count is checked against
/// `k`. With `S = Σ n_j²`: `E[R] = 1 + (n² − S)/n`, change probability
/// `q = (n² − S)/(n(n−1))`, `Var[R] ≈ (n−1)q(1−q)`.
pub fn runs_test_general(sequence: &Sequence, k: usize) -> Result<RunsResult> {
    if k == 0 {
        return Err(Error::InvalidConfiguration(
            "alphabet size must be at least 1".into(),
        ));
    }
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for symbol in sequence.iter() {
        *counts.entry(symbol).or_insert(0) += 1;
    }
    if counts.len() > k {
        return Err(Error::AlphabetTooSmall {
            declared: k,
            observed: counts.len(),
        });
    }
    let n = sequence.len();
    if n < 2 {
        return Ok(RunsResult::neutral(RunsMode::General, n));
    }

    let runs = count_runs(sequence.symbols());
    let nf = n as f64;
    let s: f64 = counts.values().map(|&c| (c as f64).powi(2)).sum();
    let expected = 1.0 + (nf * nf - s) / nf;
    let q = (nf * nf - s) / (nf * (nf - 1.0));
    let variance = (nf - 1.0) * q * (1.0 - q);
    Ok(RunsResult::scored(RunsMode::General, n, runs, expected, variance))
}

/// Runs test in the requested mode, as a [`TestResult`].
pub fn runs_test(
    sequence: &Sequence,
    alphabet: &Alphabet,
    mode: RunsMode,
    alpha: f64,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    let result = match mode.resolve(alphabet.size()) {
        RunsMode::Binary => runs_test_binary(sequence, alphabet)?,
        _ => runs_test_general(sequence, alphabet.size())?,
    };
    Ok(result.to_test_result(alpha))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 3. AUTOCORRELATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Ljung-Box statistic accumulated up to one lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LagStatistic {
    pub lag: usize,
    pub autocorrelation: f64,
    pub q: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LjungBoxResult {
    pub n: usize,
    /// One entry per lag `1..=nlags`.
    pub lags: Vec<LagStatistic>,
    /// The index series was constant; every Q is 0 and every p-value 1.
    pub zero_variance: bool,
}

impl LjungBoxResult {
    /// Statistic at the largest lag.
    pub fn last(&self) -> Option<&LagStatistic> {
        self.lags.last()
    }
}

/// Ljung-Box Q for lags `1..=nlags` over the symbols' alphabet indices.
///
/// `r_k = Σ(x_t−m)(x_{t−k}−m) / Σ(x_t−m)²`, `Q(h) = n(n+2) Σ_{k≤h} r_k²/(n−k)`,
/// compared against chi-square with `h` degrees of freedom.
pub fn ljung_box(sequence: &Sequence, alphabet: &Alphabet, nlags: usize) -> Result<LjungBoxResult> {
    if nlags == 0 {
        return Err(Error::InvalidConfiguration(
            "Ljung-Box needs at least one lag".into(),
        ));
    }
    let n = sequence.len();
    if n <= nlags {
        return Err(Error::InsufficientData {
            needed: nlags + 1,
            got: n,
        });
    }
    let x: Vec<f64> = alphabet
        .encode(sequence)?
        .into_iter()
        .map(|i| i as f64)
        .collect();
    let nf = n as f64;
    let mean = x.iter().sum::<f64>() / nf;
    let denom: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();

    if denom == 0.0 {
        let lags = (1..=nlags)
            .map(|lag| LagStatistic {
                lag,
                autocorrelation: 0.0,
                q: 0.0,
                p_value: 1.0,
            })
            .collect();
        return Ok(LjungBoxResult {
            n,
            lags,
            zero_variance: true,
        });
    }

    let mut acc = 0.0;
    let mut lags = Vec::with_capacity(nlags);
    for lag in 1..=nlags {
        let num: f64 = (lag..n)
            .map(|t| (x[t] - mean) * (x[t - lag] - mean))
            .sum();
        let r = num / denom;
        acc += r * r / (n - lag) as f64;
        let q = nf * (nf + 2.0) * acc;
        lags.push(LagStatistic {
            lag,
            autocorrelation: r,
            q,
            p_value: chi_square_sf(q, lag)?,
        });
    }
    Ok(LjungBoxResult {
        n,
        lags,
        zero_variance: false,
    })
}

/// Ljung-Box at the final lag, as a [`TestResult`].
pub fn ljung_box_test(
    sequence: &Sequence,
    alphabet: &Alphabet,
    nlags: usize,
    alpha: f64,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    let result = ljung_box(sequence, alphabet, nlags)?;
    let (q, p) = result
        .last()
        .map(|s| (s.q, s.p_value))
        .unwrap_or((0.0, 1.0));
    let min_p = result
        .lags
        .iter()
        .map(|s| s.p_value)
        .fold(f64::INFINITY, f64::min);
    let details = if result.zero_variance {
        format!("n={}, constant index series", result.n)
    } else {
        format!("n={}, min p over lags={min_p:.4}", result.n)
    };
    Ok(TestResult::new(
        format!("Ljung-Box (lags={nlags})"),
        q,
        p,
        Some(nlags),
        alpha,
        details,
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 4. RECORD SETS
// ═══════════════════════════════════════════════════════════════════════════════
//
// A record set is many short independent sequences (one draw per line). Every
// statistic below pools per-record counts so that nothing links the last
// symbol of one record to the first symbol of the next.

/// [`serial_test`] over n-gram windows taken inside each record.
pub fn record_serial_test(
    records: &[Sequence],
    alphabet: &Alphabet,
    tuple_size: usize,
    alpha: f64,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    serial_result(&record_ngram_counts(records, alphabet, tuple_size)?, alpha)
}

/// [`independence_test`] over lagged pairs taken inside each record.
pub fn record_independence_test(
    records: &[Sequence],
    alphabet: &Alphabet,
    lag: usize,
    alpha: f64,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    independence_result(&record_lagged_pair_counts(records, alphabet, lag)?, lag, alpha)
}

/// Runs pooled over records.
///
/// Records are independent, so observed runs, expectations and variances add
/// across records; the pooled z is scored once. Records shorter than two
/// symbols contribute only to `n`.
pub fn record_runs(records: &[Sequence], alphabet: &Alphabet, mode: RunsMode) -> Result<RunsResult> {
    let k = alphabet.size();
    let mode = mode.resolve(k);
    if mode == RunsMode::General {
        let mut distinct: Vec<&str> = records.iter().flat_map(Sequence::iter).collect();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() > k {
            return Err(Error::AlphabetTooSmall {
                declared: k,
                observed: distinct.len(),
            });
        }
    }

    let (mut n, mut runs, mut expected, mut variance) = (0usize, 0usize, 0.0, 0.0);
    let mut scored = 0usize;
    for record in records {
        let part = match mode {
            RunsMode::Binary => runs_test_binary(record, alphabet)?,
            _ => runs_test_general(record, k)?,
        };
        n += part.n;
        if part.n >= 2 {
            runs += part.runs;
            expected += part.expected_runs;
            variance += part.variance;
            scored += 1;
        }
    }
    if scored == 0 {
        return Ok(RunsResult::neutral(mode, n));
    }
    Ok(RunsResult::scored(mode, n, runs, expected, variance))
}

/// [`record_runs`] as a [`TestResult`].
pub fn record_runs_test(
    records: &[Sequence],
    alphabet: &Alphabet,
    mode: RunsMode,
    alpha: f64,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    Ok(record_runs(records, alphabet, mode)?.to_test_result(alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generate pseudo-random symbols for testing (simple LCG).
    fn pseudo_random(n: usize, k: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(n);
        let mut state: u64 = 0xDEAD_BEEF_CAFE_BABE;
        for _ in 0..n {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            out.push((state >> 33) as usize % k);
        }
        out
    }

    fn sequence_over(alphabet: &Alphabet, indices: &[usize]) -> Sequence {
        indices
            .iter()
            .filter_map(|&i| alphabet.symbol(i))
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_grade_from_p() {
        assert_eq!(TestResult::grade_from_p(0.5), 'A');
        assert_eq!(TestResult::grade_from_p(0.05), 'B');
        assert_eq!(TestResult::grade_from_p(0.005), 'C');
        assert_eq!(TestResult::grade_from_p(0.0005), 'D');
        assert_eq!(TestResult::grade_from_p(0.00000001), 'F');
    }

    #[test]
    fn test_pass_from_p() {
        assert!(TestResult::pass_from_p(0.05, 0.05));
        assert!(!TestResult::pass_from_p(0.049, 0.05));
    }

    #[test]
    fn test_goodness_of_fit_errors() {
        assert_eq!(
            goodness_of_fit(&[1, 2], &[1.0]),
            Err(Error::LengthMismatch {
                observed: 2,
                expected: 1
            })
        );
        assert_eq!(
            goodness_of_fit(&[1, 2], &[1.5, 0.0]),
            Err(Error::DegenerateExpectation {
                index: 1,
                value: 0.0
            })
        );
        assert!(goodness_of_fit(&[], &[]).is_err());
    }

    #[test]
    fn test_goodness_of_fit_nine_symbols() {
        let expected = vec![15.0 / 9.0; 9];
        let fit = goodness_of_fit(&[3, 3, 3, 1, 1, 1, 1, 1, 1], &expected).unwrap();
        assert!(close(fit.statistic, 4.8));
        assert_eq!(fit.degrees_of_freedom, 8);
        assert!((fit.p_value - 0.778722911036317).abs() < 1e-6);
    }

    #[test]
    fn test_unigram_alternating_bits() {
        let alphabet = Alphabet::from_chars("01").unwrap();
        let r = unigram_test(&Sequence::from_chars("101010101010"), &alphabet, 0.05).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
        assert_eq!(r.degrees_of_freedom, Some(1));
        assert!(r.passed);
        assert_eq!(r.grade, 'A');
    }

    #[test]
    fn test_unigram_constant_sequence_rejects() {
        let alphabet = Alphabet::from_chars("abc").unwrap();
        let r = unigram_test(&Sequence::from_chars("aaaaaaaaaaaa"), &alphabet, 0.05).unwrap();
        assert!(close(r.statistic, 24.0));
        assert!((r.p_value - 6.14421235332821e-06).abs() < 1e-9);
        assert!(!r.passed);
    }

    #[test]
    fn test_unigram_empty_sequence_is_insufficient() {
        let alphabet = Alphabet::from_chars("ab").unwrap();
        assert_eq!(
            unigram_test(&Sequence::default(), &alphabet, 0.05),
            Err(Error::InsufficientData { needed: 1, got: 0 })
        );
    }

    #[test]
    fn test_unigram_rejects_bad_alpha() {
        let alphabet = Alphabet::from_chars("ab").unwrap();
        let seq = Sequence::from_chars("abab");
        assert!(matches!(
            unigram_test(&seq, &alphabet, 1.5),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_serial_alternating_bits() {
        let alphabet = Alphabet::from_chars("01").unwrap();
        let r = serial_test(&Sequence::from_chars("101010101010"), &alphabet, 2, 0.05).unwrap();
        // 11 windows: "10" x6, "01" x5, against 11/4 each.
        assert!((r.statistic - 11.181818181818182).abs() < 1e-9);
        assert_eq!(r.degrees_of_freedom, Some(3));
        assert!((r.p_value - 0.010782266742573987).abs() < 1e-6);
        assert!(!r.passed);
        assert_eq!(r.name, "Serial (t=2)");
    }

    #[test]
    fn test_serial_insufficient_data() {
        let alphabet = Alphabet::from_chars("ab").unwrap();
        assert_eq!(
            serial_test(&Sequence::from_chars("ab"), &alphabet, 3, 0.05),
            Err(Error::InsufficientData { needed: 3, got: 2 })
        );
    }

    #[test]
    fn test_markov_rows() {
        let alphabet = Alphabet::from_chars("abc").unwrap();
        let outcomes =
            markov_row_tests(&Sequence::from_chars("aabbaabbaabb"), &alphabet, 0.05).unwrap();
        assert_eq!(outcomes.len(), 3);

        // a -> a 3, a -> b 3, a -> c 0
        let a = outcomes[0].result().unwrap();
        assert_eq!(a.name, "Markov Row [a]");
        assert!(close(a.statistic, 3.0));
        assert_eq!(a.degrees_of_freedom, Some(2));

        assert!(outcomes[1].is_applicable());
        assert!(matches!(
            &outcomes[2],
            TestOutcome::NotApplicable { name, .. } if name == "Markov Row [c]"
        ));
    }

    #[test]
    fn test_markov_row_binary_values() {
        let alphabet = Alphabet::from_chars("ab").unwrap();
        let outcomes =
            markov_row_tests(&Sequence::from_chars("aabbaabbaabb"), &alphabet, 0.05).unwrap();
        let a = outcomes[0].result().unwrap();
        assert_eq!(a.statistic, 0.0);
        assert_eq!(a.p_value, 1.0);
        let b = outcomes[1].result().unwrap();
        assert!(close(b.statistic, 0.2));
        assert!((b.p_value - 0.654720846018577).abs() < 1e-6);
    }

    #[test]
    fn test_record_markov_rows_ignore_boundaries() {
        let alphabet = Alphabet::from_chars("ab").unwrap();
        let records = vec![Sequence::from_chars("ab"), Sequence::from_chars("ab")];
        let outcomes = record_markov_row_tests(&records, &alphabet, 0.05).unwrap();
        // "b" only ever ends a record.
        assert!(outcomes[0].is_applicable());
        assert!(!outcomes[1].is_applicable());
    }

    #[test]
    fn test_independence_round_robin_is_dependent() {
        let alphabet = Alphabet::from_chars("abc").unwrap();
        let r = independence_test(&Sequence::from_chars("abcabcabcabc"), &alphabet, 1, 0.05)
            .unwrap();
        // Perfect association over 11 pairs: chi2 = N * (min(r, c) - 1).
        assert!(close(r.statistic, 22.0));
        assert_eq!(r.degrees_of_freedom, Some(4));
        assert!((r.p_value - 0.00020042040948253792).abs() < 1e-8);
        assert!(!r.passed);
    }

    #[test]
    fn test_independence_drops_unused_symbols() {
        let alphabet = Alphabet::from_chars("abcd").unwrap();
        let r = independence_test(&Sequence::from_chars("abbaabba"), &alphabet, 1, 0.05).unwrap();
        assert_eq!(r.degrees_of_freedom, Some(1));
    }

    #[test]
    fn test_independence_constant_sequence_is_insufficient() {
        let alphabet = Alphabet::from_chars("ab").unwrap();
        let err = independence_test(&Sequence::from_chars("aaaa"), &alphabet, 1, 0.05)
            .unwrap_err();
        assert!(err.is_data_condition());
    }

    #[test]
    fn test_count_runs() {
        assert_eq!(count_runs::<u8>(&[]), 0);
        assert_eq!(count_runs(&[1]), 0);
        assert_eq!(count_runs(&[1, 1, 1]), 1);
        assert_eq!(count_runs(&[1, 2, 2, 3]), 3);
    }

    #[test]
    fn test_runs_binary_alternating() {
        let alphabet = Alphabet::from_chars("01").unwrap();
        let r = runs_test_binary(&Sequence::from_chars("101010101010"), &alphabet).unwrap();
        assert_eq!(r.runs, 12);
        assert!(close(r.expected_runs, 22.0 / 3.0));
        assert!(close(r.variance, 14.0));
        assert!((r.z - 1.2472191289246473).abs() < 1e-9);
        assert!((r.p_value - 0.21231716077296495).abs() < 1e-6);
    }

    #[test]
    fn test_runs_binary_requires_two_symbols() {
        let alphabet = Alphabet::from_chars("abc").unwrap();
        assert!(matches!(
            runs_test_binary(&Sequence::from_chars("abc"), &alphabet),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_runs_general_round_robin() {
        let r = runs_test_general(&Sequence::from_chars("abcabcabc"), 3).unwrap();
        assert_eq!(r.runs, 9);
        assert!(close(r.expected_runs, 7.0));
        assert!(close(r.variance, 1.5));
        assert!((r.z - 1.6329931618554523).abs() < 1e-9);
        assert!((r.p_value - 0.10247043485974938).abs() < 1e-6);
    }

    #[test]
    fn test_runs_general_constant_is_neutral() {
        let r = runs_test_general(&Sequence::from_chars("zzzzzz"), 4).unwrap();
        assert_eq!(r.runs, 1);
        assert_eq!(r.variance, 0.0);
        assert_eq!(r.z, 0.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_runs_general_alphabet_too_small() {
        assert_eq!(
            runs_test_general(&Sequence::from_chars("abcd"), 3),
            Err(Error::AlphabetTooSmall {
                declared: 3,
                observed: 4
            })
        );
    }

    #[test]
    fn test_runs_short_sequence_is_neutral() {
        let alphabet = Alphabet::from_chars("01").unwrap();
        let r = runs_test(&Sequence::from_chars("1"), &alphabet, RunsMode::Auto, 0.05).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
        assert_eq!(r.name, "Runs (binary)");
    }

    #[test]
    fn test_runs_mode_parse() {
        assert_eq!("Binary".parse::<RunsMode>().unwrap(), RunsMode::Binary);
        assert_eq!("auto".parse::<RunsMode>().unwrap(), RunsMode::Auto);
        assert!("sideways".parse::<RunsMode>().is_err());
    }

    #[test]
    fn test_ljung_box_round_robin() {
        let alphabet = Alphabet::from_chars("abc").unwrap();
        let r = ljung_box(&Sequence::from_chars("abcabcabcabc"), &alphabet, 3).unwrap();
        assert_eq!(r.lags.len(), 3);
        assert!(close(r.lags[0].autocorrelation, -0.375));
        assert!((r.lags[0].q - 2.147727272727273).abs() < 1e-9);
        assert!((r.lags[0].p_value - 0.1427811086923677).abs() < 1e-6);
        assert!(close(r.lags[2].autocorrelation, 0.75));
        assert!((r.lags[2].q - 16.847727272727273).abs() < 1e-9);
        assert!((r.lags[2].p_value - 0.0007595752114515353).abs() < 1e-7);
    }

    #[test]
    fn test_ljung_box_q_is_monotone_in_lag() {
        let alphabet = Alphabet::from_chars("abcd").unwrap();
        let seq = sequence_over(&alphabet, &pseudo_random(500, 4));
        let r = ljung_box(&seq, &alphabet, 10).unwrap();
        for pair in r.lags.windows(2) {
            assert!(pair[1].q >= pair[0].q);
        }
    }

    #[test]
    fn test_ljung_box_constant_series() {
        let alphabet = Alphabet::from_chars("ab").unwrap();
        let r = ljung_box(&Sequence::from_chars("bbbbbbbb"), &alphabet, 3).unwrap();
        assert!(r.zero_variance);
        assert!(r.lags.iter().all(|s| s.q == 0.0 && s.p_value == 1.0));
    }

    #[test]
    fn test_ljung_box_insufficient_data() {
        let alphabet = Alphabet::from_chars("ab").unwrap();
        assert_eq!(
            ljung_box(&Sequence::from_chars("abab"), &alphabet, 4),
            Err(Error::InsufficientData { needed: 5, got: 4 })
        );
        assert!(ljung_box(&Sequence::from_chars("abab"), &alphabet, 0).is_err());
    }

    #[test]
    fn test_pseudo_random_passes_battery() {
        let alphabet = Alphabet::from_chars("abcdefgh").unwrap();
        let seq = sequence_over(&alphabet, &pseudo_random(5000, 8));
        let results = [
            unigram_test(&seq, &alphabet, 0.001).unwrap(),
            serial_test(&seq, &alphabet, 2, 0.001).unwrap(),
            independence_test(&seq, &alphabet, 1, 0.001).unwrap(),
            runs_test(&seq, &alphabet, RunsMode::Auto, 0.001).unwrap(),
        ];
        let passed = results.iter().filter(|r| r.passed).count();
        assert!(passed >= 3, "only {passed}/4 passed: {results:?}");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let alphabet = Alphabet::from_chars("01").unwrap();
        let r = unigram_test(&Sequence::from_chars("0110"), &alphabet, 0.05).unwrap();
        let json = serde_json::to_value(TestOutcome::from(r)).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["name"], "Symbol Frequency");

        let na = TestOutcome::NotApplicable {
            name: "Markov Row [x]".into(),
            reason: "none".into(),
        };
        let json = serde_json::to_value(na).unwrap();
        assert_eq!(json["status"], "not_applicable");
    }

    #[test]
    fn test_record_serial_ignores_seams() {
        let alphabet = Alphabet::from_chars("abc").unwrap();
        let records = vec![
            Sequence::from_chars("ab"),
            Sequence::from_chars("ca"),
            Sequence::from_chars("b"),
        ];
        // 2 windows over 9 cells: 7 * (2/9) + 2 * (7/9)^2 / (2/9) = 7
        let r = record_serial_test(&records, &alphabet, 2, 0.05).unwrap();
        assert!(close(r.statistic, 7.0));
        assert_eq!(r.degrees_of_freedom, Some(8));
        assert!(r.details.starts_with("windows=2,"));
        assert_eq!(r.name, "Serial (t=2)");
    }

    #[test]
    fn test_record_independence_ignores_seams() {
        let alphabet = Alphabet::from_chars("abc").unwrap();
        let records = vec![Sequence::from_chars("abc"), Sequence::from_chars("cab")];
        let pooled = record_independence_test(&records, &alphabet, 1, 0.05).unwrap();
        assert_eq!(pooled.details, "pairs=4");
        let flat = independence_test(&Sequence::from_chars("abccab"), &alphabet, 1, 0.05).unwrap();
        assert_eq!(flat.details, "pairs=5");
    }

    #[test]
    fn test_record_runs_pool_expectations() {
        let alphabet = Alphabet::from_chars("01").unwrap();
        let records = vec![Sequence::from_chars("0101"), Sequence::from_chars("0011")];
        // Per record: E = 2, Var = 10/9; runs 4 and 2.
        let r = record_runs(&records, &alphabet, RunsMode::Auto).unwrap();
        assert_eq!(r.mode, RunsMode::Binary);
        assert_eq!(r.n, 8);
        assert_eq!(r.runs, 6);
        assert!(close(r.expected_runs, 4.0));
        assert!(close(r.variance, 20.0 / 9.0));
        assert!(close(r.z, 2.0 / (20.0f64 / 9.0).sqrt()));

        let singles = vec![Sequence::from_chars("0"), Sequence::from_chars("1")];
        let r = record_runs(&singles, &alphabet, RunsMode::Binary).unwrap();
        assert_eq!((r.n, r.runs, r.p_value), (2, 0, 1.0));
    }

    #[test]
    fn test_record_runs_checks_distinct_symbols_across_records() {
        let records = vec![Sequence::from_chars("ab"), Sequence::from_chars("cd")];
        let err = record_runs(&records, &Alphabet::from_chars("ab").unwrap(), RunsMode::General)
            .unwrap_err();
        assert_eq!(
            err,
            Error::AlphabetTooSmall {
                declared: 2,
                observed: 4
            }
        );
    }

    #[test]
    fn test_independence_dof_drops_absent_symbol() {
        // "d" never occurs: the grid is 3x3, so dof is 4 rather than (4-1)^2.
        let abcd = Alphabet::from_chars("abcd").unwrap();
        let abc = Alphabet::from_chars("abc").unwrap();
        let seq = Sequence::from_chars("abcabcabcabc");
        let wide = independence_test(&seq, &abcd, 1, 0.05).unwrap();
        let narrow = independence_test(&seq, &abc, 1, 0.05).unwrap();
        assert_eq!(wide.degrees_of_freedom, Some(4));
        assert!(close(wide.statistic, narrow.statistic));
        assert!(close(wide.p_value, narrow.p_value));
    }
}

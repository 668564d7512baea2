pub mod analyze;
pub mod calibrate;
pub mod report;
pub mod transitions;

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use symrand_core::{Alphabet, Error, Result, Sequence};
use symrand_tests::{CorrectionMethod, PanelConfig, RunsMode, TestKind};

// ---------------------------------------------------------------------------
// Shared arguments
// ---------------------------------------------------------------------------

/// Where the alphabet comes from. At most one may be given.
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct AlphabetArgs {
    /// Alphabet as a string of single-character symbols, e.g. "01" or "ACGT"
    #[arg(long)]
    pub alphabet: Option<String>,

    /// Alphabet as comma-separated symbols, for multi-character tokens
    #[arg(long)]
    pub symbols: Option<String>,

    /// Use the decimal digits 0-9
    #[arg(long)]
    pub digits: bool,

    /// Use the Latin capitals A-Z
    #[arg(long)]
    pub uppercase: bool,

    /// Use the distinct symbols found in the input (sorted).
    /// Symbols absent from the sample are then invisible to every test.
    #[arg(long)]
    pub infer_alphabet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Input file (stdin when omitted and --text is not given)
    pub input: Option<PathBuf>,

    /// Analyze this literal text instead of a file
    #[arg(long, conflicts_with = "input")]
    pub text: Option<String>,

    /// How to split the input into symbols: every character (chars),
    /// every non-whitespace character (compact), or whitespace-separated tokens
    #[arg(long, default_value = "chars", value_parser = ["chars", "compact", "tokens"])]
    pub tokenize: String,

    /// Treat each non-empty line as a separate record (e.g. one draw per line)
    #[arg(long)]
    pub records: bool,

    #[command(flatten)]
    pub alphabet: AlphabetArgs,
}

/// Panel settings. Anything given here overrides the --config file.
#[derive(Args, Debug, Clone, Default)]
pub struct PanelArgs {
    /// JSON file with a full or partial panel configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comma-separated tests: frequency, serial, markov-rows, independence,
    /// runs, ljung-box
    #[arg(long)]
    pub tests: Option<String>,

    /// Family-wise significance level
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Correction: bonferroni, holm, benjamini-hochberg (bh), benjamini-yekutieli (by)
    #[arg(long)]
    pub correction: Option<String>,

    /// n-gram width for the serial test
    #[arg(long)]
    pub tuple_size: Option<usize>,

    /// Offset for the lagged-pair independence test
    #[arg(long)]
    pub lag: Option<usize>,

    /// Number of lags for Ljung-Box
    #[arg(long)]
    pub nlags: Option<usize>,

    /// Runs statistic: auto, binary or general
    #[arg(long)]
    pub runs_mode: Option<String>,

    /// Run the tests on separate threads
    #[arg(long)]
    pub parallel: bool,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A tokenized input with the alphabet it is analyzed over.
#[derive(Debug)]
pub struct LoadedInput {
    /// All symbols in order (records concatenated).
    pub sequence: Sequence,
    /// One entry per line with --records, otherwise just the sequence.
    pub records: Vec<Sequence>,
    pub alphabet: Alphabet,
}

/// Print `err` and exit with status 1.
pub fn exit_with(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {err}");
    std::process::exit(1);
}

/// Read, tokenize and resolve the alphabet, exiting on failure.
pub fn load_input(args: &InputArgs) -> LoadedInput {
    let text = match read_text(args) {
        Ok(text) => text,
        Err(e) => exit_with("Failed to read input", e),
    };
    match parse_input(&text, args) {
        Ok(loaded) => {
            log::debug!(
                "loaded {} symbols in {} record(s) over {}",
                loaded.sequence.len(),
                loaded.records.len(),
                loaded.alphabet
            );
            loaded
        }
        Err(e) => exit_with("Invalid input", e),
    }
}

fn read_text(args: &InputArgs) -> std::io::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    match &args.input {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

pub fn tokenize(text: &str, mode: &str) -> Sequence {
    match mode {
        "tokens" => Sequence::from_tokens(text),
        "compact" => Sequence::from_compact_chars(text),
        _ => Sequence::from_chars(text.trim_end_matches(['\r', '\n'])),
    }
}

pub fn parse_input(text: &str, args: &InputArgs) -> Result<LoadedInput> {
    let records: Vec<Sequence> = if args.records {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| tokenize(line, &args.tokenize))
            .collect()
    } else {
        vec![tokenize(text, &args.tokenize)]
    };
    let sequence: Sequence = records
        .iter()
        .flat_map(|r| r.symbols().iter().cloned())
        .collect();
    let alphabet = resolve_alphabet(&args.alphabet, Some(&sequence))?;
    Ok(LoadedInput {
        sequence,
        records,
        alphabet,
    })
}

/// Build the alphabet from the flags; `sample` is only consulted for
/// --infer-alphabet.
pub fn resolve_alphabet(args: &AlphabetArgs, sample: Option<&Sequence>) -> Result<Alphabet> {
    if let Some(chars) = &args.alphabet {
        return Alphabet::from_chars(chars);
    }
    if let Some(list) = &args.symbols {
        return Alphabet::new(list.split(',').map(str::trim).filter(|s| !s.is_empty()));
    }
    if args.digits {
        return Ok(Alphabet::digits());
    }
    if args.uppercase {
        return Ok(Alphabet::latin_uppercase());
    }
    if args.infer_alphabet {
        let Some(sample) = sample else {
            return Err(Error::InvalidConfiguration(
                "--infer-alphabet needs input data".into(),
            ));
        };
        let alphabet = Alphabet::inferred_from(sample)?;
        log::warn!(
            "alphabet inferred from the data ({} symbols); symbols that never occur are not tested",
            alphabet.size()
        );
        return Ok(alphabet);
    }
    Err(Error::InvalidConfiguration(
        "no alphabet given: use --alphabet, --symbols, --digits, --uppercase or --infer-alphabet"
            .into(),
    ))
}

/// Panel configuration from --config plus flag overrides, exiting on failure.
pub fn panel_config(args: &PanelArgs) -> PanelConfig {
    let base = match &args.config {
        Some(path) => {
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => exit_with(&format!("Failed to read {}", path.display()), e),
            };
            match serde_json::from_str::<PanelConfig>(&text) {
                Ok(config) => config,
                Err(e) => exit_with(&format!("Invalid config {}", path.display()), e),
            }
        }
        None => PanelConfig::default(),
    };
    match apply_overrides(base, args) {
        Ok(config) => config,
        Err(e) => exit_with("Invalid panel configuration", e),
    }
}

pub fn apply_overrides(mut config: PanelConfig, args: &PanelArgs) -> Result<PanelConfig> {
    if let Some(tests) = &args.tests {
        config.tests = parse_tests(tests)?;
    }
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(method) = &args.correction {
        config.correction = method.parse::<CorrectionMethod>()?;
    }
    if let Some(t) = args.tuple_size {
        config.tuple_size = t;
    }
    if let Some(lag) = args.lag {
        config.lag = lag;
    }
    if let Some(nlags) = args.nlags {
        config.nlags = nlags;
    }
    if let Some(mode) = &args.runs_mode {
        config.runs_mode = mode.parse::<RunsMode>()?;
    }
    if args.parallel {
        config.parallel = true;
    }
    config.validate()?;
    Ok(config)
}

/// Parse a comma-separated test list; "all" selects every test.
pub fn parse_tests(list: &str) -> Result<Vec<TestKind>> {
    if list.trim().eq_ignore_ascii_case("all") {
        return Ok(TestKind::ALL.to_vec());
    }
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<TestKind>)
        .collect()
}

/// Write `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize>(path: &str, value: &T) {
    let json = match serde_json::to_string_pretty(value) {
        Ok(json) => json,
        Err(e) => exit_with("Failed to serialize results", e),
    };
    match std::fs::write(path, json) {
        Ok(()) => println!("\nResults written to: {path}"),
        Err(e) => eprintln!("Failed to write {path}: {e}"),
    }
}

//! Purpose: `tabsort` CLI entry point: parse args, run commands, report errors.
//! Role: Binary crate root; loads bid tables, times sorts, emits JSON or text on stdout.
//! Invariants: Data goes to stdout; diagnostics and logs go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tabsort::api::{
    Bid, ColumnMapping, ConversionMode, Error, ErrorKind, ParseOptions, Source, Table,
    load_bids_with,
    sort::{Algorithm, SortKey, SortStats, sort_records},
    to_exit_code,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod menu;

const DEFAULT_CSV_PATH: &str = "eBid_Monthly_Sales_Dec_2016.csv";

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `tabsort --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let config = LoadConfig::from_cli(&cli).map_err(|err| (err, color_mode))?;

    command_dispatch::dispatch_command(cli.command, &config, color_mode)
        .map_err(add_parse_hint)
        .map_err(add_io_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "tabsort",
    version,
    about = "Load delimited bid exports and sort them in place",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Rows are read from a delimited text file (first line is the header) and
projected into bids: title, id, amount, fund.
"#,
    after_help = r#"EXAMPLES
  $ tabsort menu bids.csv                       # interactive load/display/sort loop
  $ tabsort load bids.csv                       # parse + project, report timing
  $ tabsort sort bids.csv --by title            # quicksort by title
  $ tabsort sort bids.csv --by fund --algo selection --show
  $ tabsort --sep ';' --map title=2,id=0 show export.txt

NOTES
  - Default column mapping: title=0,id=1,amount=4,fund=8
  - --lenient reads unparseable amounts as 0 instead of failing the load
  - Quoted cells are not unquoted; the separator always splits
  - Set RUST_LOG=info to log load/sort timings on stderr"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, default_value_t = ',', help = "Cell separator (single character)")]
    sep: char,
    #[arg(
        long,
        value_name = "SPEC",
        help = "Column mapping, e.g. title=0,id=1,amount=4,fund=8"
    )]
    map: Option<String>,
    #[arg(long, help = "Read unparseable amounts as 0 instead of failing the load")]
    lenient: bool,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SortKeyCli {
    Title,
    Id,
    Fund,
}

impl From<SortKeyCli> for SortKey {
    fn from(value: SortKeyCli) -> Self {
        match value {
            SortKeyCli::Title => SortKey::Title,
            SortKeyCli::Id => SortKey::Id,
            SortKeyCli::Fund => SortKey::Fund,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AlgorithmCli {
    Quick,
    Selection,
}

impl From<AlgorithmCli> for Algorithm {
    fn from(value: AlgorithmCli) -> Self {
        match value {
            AlgorithmCli::Quick => Algorithm::Quick,
            AlgorithmCli::Selection => Algorithm::Selection,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Interactive load/display/sort menu",
        after_help = r#"EXAMPLES
  $ tabsort menu
  $ tabsort menu eBid_Monthly_Sales.csv

NOTES
  - Without FILE, reads eBid_Monthly_Sales_Dec_2016.csv from the working directory
  - Load and sort actions report elapsed time"#
    )]
    Menu {
        #[arg(help = "CSV file to load", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
    #[command(arg_required_else_help = true, about = "Load a file and report counts and timing")]
    Load {
        #[arg(help = "CSV file to load", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(
        arg_required_else_help = true,
        about = "Sort bids by a field and report timing",
        after_help = r#"EXAMPLES
  $ tabsort sort bids.csv --by title
  $ tabsort sort bids.csv --by id --algo selection
  $ tabsort sort bids.csv --by fund --show"#
    )]
    Sort {
        #[arg(help = "CSV file to load", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, value_enum, default_value = "title", help = "Sort field: title|id|fund")]
        by: SortKeyCli,
        #[arg(
            long,
            value_enum,
            default_value = "quick",
            help = "Sort algorithm: quick|selection"
        )]
        algo: AlgorithmCli,
        #[arg(long, help = "Include the sorted bids in the output")]
        show: bool,
    },
    #[command(arg_required_else_help = true, about = "Print bids in file order")]
    Show {
        #[arg(help = "CSV file to load", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Emit one JSON object per bid")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Debug)]
struct LoadConfig {
    options: ParseOptions,
    mapping: ColumnMapping,
    mode: ConversionMode,
}

impl LoadConfig {
    fn from_cli(cli: &Cli) -> Result<Self, Error> {
        let mapping = match &cli.map {
            Some(spec) => ColumnMapping::parse(spec)?,
            None => ColumnMapping::default(),
        };
        Ok(Self {
            options: ParseOptions::default().with_separator(cli.sep),
            mapping,
            mode: if cli.lenient {
                ConversionMode::Lenient
            } else {
                ConversionMode::Strict
            },
        })
    }
}

struct Loaded {
    table: Table,
    bids: Vec<Bid>,
    elapsed: Duration,
}

fn load_file(path: &Path, config: &LoadConfig) -> Result<Loaded, Error> {
    debug!(path = %path.display(), "loading table");
    let start = Instant::now();
    let table = Table::parse(Source::file(path), config.options)?;
    let bids = load_bids_with(&table, &config.mapping, config.mode)
        .map_err(|err| err.with_path(path))?;
    let elapsed = start.elapsed();
    info!(
        path = %path.display(),
        rows = table.row_count(),
        bids = bids.len(),
        elapsed_ms = millis(elapsed),
        "loaded"
    );
    Ok(Loaded {
        table,
        bids,
        elapsed,
    })
}

fn timed_sort(
    bids: &mut [Bid],
    key: SortKey,
    algorithm: Algorithm,
) -> Result<(SortStats, Duration), Error> {
    let start = Instant::now();
    let stats = sort_records(bids, key, algorithm)?;
    let elapsed = start.elapsed();
    info!(
        key = key.name(),
        algorithm = algorithm.name(),
        records = stats.records,
        comparisons = stats.comparisons,
        swaps = stats.swaps,
        elapsed_ms = millis(elapsed),
        "sorted"
    );
    Ok((stats, elapsed))
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn bid_json(bid: &Bid) -> Value {
    serde_json::to_value(bid).unwrap_or_else(|_| json!({ "error": "json encode failed" }))
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn add_parse_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Parse || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check the file path and that the first line is a header row.")
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Io => err.with_hint("I/O error. Check the path, permissions, and disk space."),
        ErrorKind::Index => err.with_hint(
            "A mapped column is missing. Check --map against the header or the --sep value.",
        ),
        ErrorKind::Conversion => {
            err.with_hint(
                "A cell could not be read as a number. Check the amount column in --map, or pass --lenient to read it as 0.",
            )
        }
        _ => err,
    }
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Parse => "could not parse input".to_string(),
        ErrorKind::Index => "index out of range".to_string(),
        ErrorKind::Conversion => "conversion failed".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(row) = err.row() {
        inner.insert("row".to_string(), json!(row));
    }
    if let Some(column) = err.column() {
        inner.insert("column".to_string(), json!(column));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    )];
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(row) = err.row() {
        lines.push(format!(
            "{} {row}",
            colorize_label("row:", use_color, AnsiColor::Yellow)
        ));
    }
    for cause in error_causes(err) {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{Cli, ColorMode, LoadConfig, add_io_hint, error_json, error_text};
    use clap::{CommandFactory, Parser};
    use tabsort::api::{ConversionMode, Error, ErrorKind};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn load_config_reads_separator_and_mapping() {
        let cli = Cli::try_parse_from(["tabsort", "--sep", ";", "--map", "fund=3", "load", "x.csv"])
            .expect("parse");
        let config = LoadConfig::from_cli(&cli).expect("config");
        assert_eq!(config.options.separator, ';');
        assert_eq!(config.mapping.fund, 3);
        assert_eq!(config.mapping.title, 0);
        assert_eq!(config.mode, ConversionMode::Strict);

        let cli = Cli::try_parse_from(["tabsort", "--lenient", "load", "x.csv"]).expect("parse");
        let config = LoadConfig::from_cli(&cli).expect("config");
        assert_eq!(config.mode, ConversionMode::Lenient);
    }

    #[test]
    fn bad_mapping_is_usage_error() {
        let cli = Cli::try_parse_from(["tabsort", "--map", "price=1", "load", "x.csv"])
            .expect("parse");
        let err = LoadConfig::from_cli(&cli).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn error_json_carries_context() {
        let err = add_io_hint(
            Error::new(ErrorKind::Index)
                .with_message("column index 8 out of range (len 3)")
                .with_path("bids.csv")
                .with_row(2),
        );
        let value = error_json(&err);
        let inner = &value["error"];
        assert_eq!(inner["kind"], "Index");
        assert_eq!(inner["path"], "bids.csv");
        assert_eq!(inner["row"], 2);
        assert!(inner["hint"].as_str().unwrap().contains("--map"));
    }

    #[test]
    fn error_text_without_color_is_plain() {
        let err = Error::new(ErrorKind::Usage).with_message("bad");
        assert_eq!(error_text(&err, ColorMode::Never.use_color(true)), "error: bad");
    }
}

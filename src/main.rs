//! Purpose: `exdview` CLI entry point for inspecting extracted sheet data.
//! Role: Binary crate root; parses args, opens the data directory, emits JSON on stdout.
//! Invariants: Commands emit stable JSON envelopes on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod data_dir;
mod render;
mod sheet_json;

use data_dir::default_data_dir;
use exdview::api::{Error, ErrorKind, to_exit_code};
use render::render_json;

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

fn main() {
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
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing(cli.verbose);

    let color_mode = cli.color;
    let context = command_dispatch::Context {
        data_dir: cli.dir.unwrap_or_else(default_data_dir),
        lang: cli.lang,
        color_mode,
    };

    command_dispatch::dispatch_command(cli.command, context)
        .map_err(add_config_hint)
        .map_err(add_corrupt_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing(verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "exdview",
    version,
    about = "Inspect paginated binary sheet data (.exh/.exd)",
    long_about = None,
    after_help = r#"EXAMPLES
  $ exdview --dir ./data sheets
  $ exdview --dir ./data info Item
  $ exdview --dir ./data --lang en get Item 42
  $ exdview --dir ./data rows Recipe --limit 5
  $ exdview --dir ./data resolve 7 --sheet Quest --sheet Item

The data directory holds an `exd/` folder with headers, pages, and root.exl.
Set EXDVIEW_DIR to avoid passing --dir every time."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Data directory containing exd/ (default: $EXDVIEW_DIR or .)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Language code: none|ja|en|de|fr|chs|cht|ko (falls back to none)"
    )]
    lang: Option<String>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Emit debug logs on stderr (repeat for trace); RUST_LOG overrides"
    )]
    verbose: u8,

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

#[derive(Subcommand)]
enum Command {
    #[command(about = "List sheet names from exd/root.exl")]
    Sheets,
    #[command(
        arg_required_else_help = true,
        about = "Show a sheet's header and loaded-row statistics"
    )]
    Info {
        #[arg(help = "Sheet name, e.g. Item or quest/000/Foo")]
        sheet: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "List rows in key order",
        after_help = r#"On subrow sheets every subrow is listed, grouped by row id."#
    )]
    Rows {
        #[arg(help = "Sheet name")]
        sheet: String,
        #[arg(long, help = "Maximum rows to emit")]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0, help = "Rows to skip before emitting")]
        skip: usize,
        #[arg(long, help = "Emit row ids only, without decoded columns")]
        ids: bool,
    },
    #[command(arg_required_else_help = true, about = "Fetch one row (or subrow) by id")]
    Get {
        #[arg(help = "Sheet name")]
        sheet: String,
        #[arg(help = "Row id")]
        row: u32,
        #[arg(long, help = "Subrow id (subrow sheets only)")]
        subrow: Option<u16>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Find the first candidate sheet containing a row id"
    )]
    Resolve {
        #[arg(help = "Row id")]
        row: u32,
        #[arg(long = "sheet", required = true, help = "Candidate sheet, in probe order (repeatable)")]
        sheets: Vec<String>,
    },
    #[command(arg_required_else_help = true, about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(about = "Show version")]
    Version,
}

fn add_config_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Config || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check the sheet name (see `exdview sheets`) and --dir.")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check the path and file permissions under --dir.")
}

fn add_corrupt_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Corrupt || err.hint().is_some() {
        return err;
    }
    err.with_hint("Sheet data appears malformed. Re-extract the files and retry.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Unexpected internal failure. Retry with -v and RUST_BACKTRACE=1.")
}

fn emit_version_output(color_mode: ColorMode) {
    if io::stdout().is_terminal() {
        println!("exdview {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(
            json!({
                "name": "exdview",
                "version": env!("CARGO_PKG_VERSION"),
            }),
            color_mode,
        );
    }
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let use_color = color_mode.use_color(is_tty);
    let json = if is_tty || use_color {
        render_json(&value, use_color)
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error",
        ErrorKind::Usage => "usage error",
        ErrorKind::NotFound => "not found",
        ErrorKind::Config => "invalid sheet configuration",
        ErrorKind::Unsupported => "unsupported operation",
        ErrorKind::OutOfRange => "out of range",
        ErrorKind::Corrupt => "corrupt data",
        ErrorKind::Io => "i/o error",
    }
    .to_string()
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
    if let Some(sheet) = err.sheet() {
        inner.insert("sheet".to_string(), json!(sheet));
    }
    if let Some(row) = err.row() {
        inner.insert("row".to_string(), json!(row));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn colorize_label(label: &str, enabled: bool, code: &str) -> String {
    if !enabled {
        return label.to_string();
    }
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn error_text(err: &Error, use_color: bool) -> String {
    const RED: &str = "31";
    const YELLOW: &str = "33";

    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color, RED),
        error_message(err)
    )];
    if let Some(hint) = err.hint() {
        lines.push(format!("{} {hint}", colorize_label("hint:", use_color, YELLOW)));
    }
    if let Some(sheet) = err.sheet() {
        lines.push(format!("{} {sheet}", colorize_label("sheet:", use_color, YELLOW)));
    }
    if let Some(row) = err.row() {
        lines.push(format!("{} {row}", colorize_label("row:", use_color, YELLOW)));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, YELLOW),
            path.display()
        ));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!("{} {offset}", colorize_label("offset:", use_color, YELLOW)));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("{} {cause}", colorize_label("caused by:", use_color, YELLOW)));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error:").unwrap_or(line).trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let command = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .and_then(|usage| {
            let mut tokens = usage.split_whitespace().skip_while(|token| *token != "exdview");
            tokens.next()?;
            tokens.next().filter(|token| {
                !token.starts_with('-') && !token.starts_with('<') && !token.starts_with('[')
            })
        });
    match command {
        Some(command) => format!("Try `exdview {command} --help`."),
        None => "Try `exdview --help`.".to_string(),
    }
}

fn completion_script(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut out = Vec::new();
    clap_complete::aot::generate(shell, &mut cmd, "exdview", &mut out);
    out
}

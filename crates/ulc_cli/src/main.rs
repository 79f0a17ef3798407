//! ulc: Compile a ULC lexical spec.
//!
//! Usage:
//!   ulc [options] <SPEC>
//!
//! Prints warnings to stderr, then a summary of the compiled lexicon or,
//! with `--json`, the whole lexicon as JSON. Set `RUST_LOG` for traces.

use clap::Parser as ClapParser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::sync::Once;
use std::time::Instant;
use ulc_diagnostics::Diagnostic;
use ulc_spec::{parse_options_file, CompileOptions, CompiledSpec, UlcSpecCompiler};

#[derive(ClapParser, Debug)]
#[command(name = "ulc", version, about = "Compile a ULC lexical spec")]
struct Cli {
    /// Spec file to compile.
    #[arg(value_name = "SPEC")]
    spec: PathBuf,

    /// Directory searched for parent specs. May be repeated.
    #[arg(short = 'I', long = "search-path", value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// JSON file with compiler options.
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dump the compiled lexicon as JSON.
    #[arg(long)]
    json: bool,

    /// Do not print warnings.
    #[arg(short = 'q', long)]
    quiet: bool,
}

const EXIT_FAILURE: i32 = 1;
const EXIT_SPEC_ERROR: i32 = 2;

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

static TRACING_INIT: Once = Once::new();

/// Install the fmt subscriber, filtered by `RUST_LOG`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let start = Instant::now();

    let mut options = match &cli.config {
        Some(path) => match parse_options_file(path) {
            Ok(options) => options,
            Err(e) => {
                print_error(&e.to_string());
                return EXIT_FAILURE;
            }
        },
        None => CompileOptions::default(),
    };
    options.search_paths.extend(cli.search_paths.iter().cloned());

    let mut compiler = match UlcSpecCompiler::new(options) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return EXIT_SPEC_ERROR;
        }
    };

    let result = compiler.compile_file(&cli.spec);
    let use_color = std::io::stderr().is_terminal();
    if !cli.quiet {
        for diag in compiler.diagnostics().warnings() {
            print_diagnostic(diag, use_color);
        }
    }

    let spec = match result {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return EXIT_SPEC_ERROR;
        }
    };
    tracing::debug!(elapsed = ?start.elapsed(), "done");

    if cli.json {
        match spec.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                print_error(&format!("Failed to serialize '{}': {}", spec.name, e));
                return EXIT_FAILURE;
            }
        }
    } else {
        println!("{}", summary(&spec));
    }
    0
}

fn summary(spec: &CompiledSpec) -> String {
    format!(
        "{} (ulc-c{}): {} tokens, {} keywords, {} quote types, {} comment types, ids {}..={}",
        spec.name,
        spec.version,
        spec.tokens.reserved().len() + spec.tokens.views().len(),
        spec.tokens.keywords().len(),
        spec.quote_types.len(),
        spec.comment_types.len(),
        spec.tok_id_min,
        spec.tok_id_max,
    )
}

fn print_diagnostic(diag: &Diagnostic, use_color: bool) {
    if !use_color {
        eprintln!("{diag}");
        return;
    }
    let color = if diag.is_error() { RED } else { YELLOW };
    if let Some(ref location) = diag.location {
        eprint!("{CYAN}{location}{RESET}: ");
    }
    eprintln!(
        "{BOLD}{color}{}{RESET} {CYAN}ULC{}{RESET}: {}",
        diag.category, diag.code, diag.message_text
    );
}

fn print_error(msg: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{BOLD}{RED}error{RESET}: {msg}");
    } else {
        eprintln!("error: {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ulc_spec::MemoryResolver;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from(["ulc", "-I", "specs", "--search-path", "more", "--json", "lang.ulc"]).unwrap();
        assert_eq!(cli.spec, PathBuf::from("lang.ulc"));
        assert_eq!(cli.search_paths, vec![PathBuf::from("specs"), PathBuf::from("more")]);
        assert!(cli.json && !cli.quiet);
        assert!(Cli::try_parse_from(["ulc"]).is_err());
    }

    #[test]
    fn test_summary() {
        let text = "\u{FEFF}#@ulc-c2.3\nQUOTE_TYPE: \"\n%%\nPLUS +\nWHILE while 300\n";
        let mut compiler = UlcSpecCompiler::new(CompileOptions::default()).unwrap();
        let spec = compiler
            .compile_with("demo", text.as_bytes(), &MemoryResolver::new())
            .unwrap();
        assert_eq!(
            summary(&spec),
            "demo (ulc-c2.3.0): 11 tokens, 1 keywords, 1 quote types, 0 comment types, ids 0..=300"
        );
    }

    #[test]
    fn test_missing_file_is_spec_error() {
        let cli = Cli::try_parse_from(["ulc", "-q", "/nonexistent/dir/missing.ulc"]).unwrap();
        assert_eq!(run(&cli), EXIT_SPEC_ERROR);
    }
}

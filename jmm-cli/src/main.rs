use anyhow::{Context, Result};
use clap::Parser;
use jmm_compiler::{compile_with_reports, BackendConfig, SemanticsResult};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "jmm")]
#[command(about = "Java-- backend: IR generation, register allocation and Jasmin emission")]
struct Args {
    /// Semantic analysis result (annotated tree, symbol table, reports) as JSON
    file: PathBuf,

    /// Backend configuration file (JSON); command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable the iinc peephole
    #[arg(short = 'o', long)]
    optimize: bool,

    /// Allocate locals into at most N registers using graph coloring
    #[arg(short = 'r', long, value_name = "N")]
    registers: Option<u16>,

    /// Emit IR. If none of --ir/--jasmin/--both is given, defaults to --jasmin.
    #[arg(long)]
    ir: bool,

    /// Emit Jasmin assembly
    #[arg(long)]
    jasmin: bool,

    /// Emit both IR and Jasmin assembly
    #[arg(long)]
    both: bool,

    /// Write the Jasmin output to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Log pipeline progress to stderr (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(&args)?;

    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("reading '{}'", args.file.display()))?;
    let semantics = SemanticsResult::from_json(&text)
        .with_context(|| format!("parsing semantics result '{}'", args.file.display()))?;

    // Determine outputs
    let mut want_ir = args.ir;
    let mut want_jasmin = args.jasmin;
    if args.both {
        want_ir = true;
        want_jasmin = true;
    }
    if !want_ir && !want_jasmin {
        want_jasmin = true;
    }

    let output = match compile_with_reports(&semantics, &config) {
        Ok(output) => output,
        Err(reports) => {
            for report in &reports {
                eprintln!("{report}");
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    for report in &output.reports {
        eprintln!("{report}");
    }

    if want_ir {
        print!("{}", output.ir);
        println!();
    }

    if want_jasmin {
        match &args.out {
            Some(path) => fs::write(path, &output.jasmin)
                .with_context(|| format!("writing '{}'", path.display()))?,
            None => println!("{}", output.jasmin),
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config(args: &Args) -> Result<BackendConfig> {
    let mut config: BackendConfig = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config '{}'", path.display()))?
        }
        None => BackendConfig::default(),
    };
    if args.optimize {
        config.optimize = true;
    }
    if args.registers.is_some() {
        config.max_registers = args.registers;
    }
    Ok(config)
}

// ── Logging ─────────────────────────────────────────────────────────────

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::*;
use solir::{Action, Contract, JobSpec, SourceBuffer, Target};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "solir")]
#[command(about = "solir - lower a resolved Solidity AST to IR and legalize it for EraVM")]
#[command(version)]
#[command(author = "Gianluca Brigandi <gbrigand@gmail.com>")]
struct Cli {
    /// JSON AST exported by the front end.
    input: PathBuf,

    /// Source file the AST offsets refer to. Defaults to the input path with a `.sol` extension.
    #[arg(long)]
    source: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "init")]
    action: ActionArg,

    #[arg(long, value_enum, default_value = "eravm")]
    target: TargetArg,

    /// IR printing and verification flags, e.g. "--print-debuginfo --verify-each".
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    mlir_opts: String,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    /// Print the high-level IR.
    Init,
    /// Legalize and print the low-level IR.
    LowLevel,
    /// Legalize and verify without printing.
    Verify,
}

impl From<ActionArg> for Action {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Init => Action::PrintInitIr,
            ActionArg::LowLevel => Action::PrintLowLevelIr,
            ActionArg::Verify => Action::VerifyOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
    Eravm,
}

impl From<TargetArg> for Target {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Eravm => Target::EraVm,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cmd_compile(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".bright_red().bold(), format!("{:#}", err).red());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_compile(cli: &Cli) -> Result<()> {
    let start = Instant::now();

    let contracts = read_contracts(&cli.input)?;
    let source_path = cli
        .source
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("sol"));
    let source = read_source(&source_path)?;
    info!(contracts = contracts.len(), source = %source_path.display(), "loaded input");

    let mut ir_args: Vec<String> = cli.mlir_opts.split_whitespace().map(str::to_string).collect();
    if cli.output.is_some() || !std::io::stdout().is_terminal() {
        ir_args.push("--no-color".to_string());
    }

    let job = JobSpec::new(cli.action.into(), cli.target.into());
    let output = solir::run_solidity_to_ir(&contracts, &source, &job, ir_args)?;

    match (output.ir, &cli.output) {
        (Some(ir), Some(path)) => {
            fs::write(path, ir).with_context(|| format!("failed to write {}", path.display()))?;
            if cli.verbose > 0 {
                eprintln!(
                    "{} wrote {} in {:.3}s",
                    "SUCCESS:".bright_green().bold(),
                    path.display(),
                    start.elapsed().as_secs_f64()
                );
            }
        }
        (Some(ir), None) => print!("{}", ir),
        (None, _) => println!("{}", "VALID".bright_green().bold()),
    }

    for stat in &output.statistics {
        eprintln!("  {:<20} {:>10.3}ms", stat.name, stat.duration.as_secs_f64() * 1000.0);
    }
    Ok(())
}

fn read_contracts(path: &Path) -> Result<Vec<Contract>> {
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    solir::contracts_from_json(&json).with_context(|| format!("invalid AST in {}", path.display()))
}

fn read_source(path: &Path) -> Result<SourceBuffer> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceBuffer::new(&name, text)?)
}

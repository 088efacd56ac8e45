//! sdiff - Structural diff CLI tool
//!
//! Compares or hashes YAML/JSON documents with the structural diff engine.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use structural_diff::config::Config;
use structural_diff::diff::{Converters, DeepDiff, DiffReport};
use structural_diff::hash::DeepHash;
use structural_diff::value::{self, Value};

#[derive(Parser, Debug)]
#[command(name = "sdiff", about = "Structural diff of YAML/JSON documents", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Options file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output location. Use '-' for stdout
    #[arg(short, long, global = true, default_value = "-")]
    output: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two YAML/JSON files
    Diff(DiffArgs),
    /// Print the canonical hash of a YAML/JSON file
    Hash(HashArgs),
}

#[derive(Args, Debug)]
struct DiffArgs {
    #[arg(long)]
    lhs: PathBuf,

    #[arg(long)]
    rhs: PathBuf,

    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct HashArgs {
    file: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(same) if same => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Runs the command; returns false if the compared documents differ.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config file {:?}: {}", path, e))?;
            Config::from_yaml(&content)?
        }
        None => Config::default(),
    };

    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(&cli.output)
                .map_err(|e| format!("Failed to create output file {:?}: {}", cli.output, e))?,
        )
    };

    match cli.command {
        Command::Diff(args) => diff(&config, &args, &mut output),
        Command::Hash(args) => {
            hash(&config, &args.file, &mut output)?;
            Ok(true)
        }
    }
}

fn read_value(file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read file {:?}: {}", file, e))?;
    let value = value::from_yaml(&content)
        .map_err(|e| format!("Failed to parse file {:?}: {}", file, e))?;
    Ok(value)
}

fn diff(config: &Config, args: &DiffArgs, output: &mut dyn Write) -> Result<bool, Box<dyn std::error::Error>> {
    let lhs = read_value(&args.lhs)?;
    let rhs = read_value(&args.rhs)?;

    let tree = DeepDiff::new(config).compare(&lhs, &rhs);
    let report = DiffReport::from(&tree);
    for warning in report.diagnostics().warnings() {
        eprintln!("warning: {}", warning);
    }

    let converters = Converters::new();
    match args.format {
        OutputFormat::Text if report.is_empty() => writeln!(output, "Objects are identical")?,
        OutputFormat::Text => writeln!(output, "{}", report)?,
        OutputFormat::Json => writeln!(output, "{}", report.to_json_string(&converters)?)?,
        OutputFormat::Yaml => write!(output, "{}", report.to_yaml_string(&converters)?)?,
    }
    Ok(report.is_empty())
}

fn hash(config: &Config, file: &Path, output: &mut dyn Write) -> Result<(), Box<dyn std::error::Error>> {
    let value = read_value(file)?;
    let deep = DeepHash::new(&value, config);
    match deep.root() {
        Some(token) => writeln!(output, "{}  {}", token, file.display())?,
        None => writeln!(output, "(excluded)  {}", file.display())?,
    }
    for item in deep.unprocessed() {
        eprintln!("warning: {}: value of type {} left unprocessed", item.path, item.type_tag());
    }
    Ok(())
}

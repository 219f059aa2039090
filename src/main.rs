//! Payables Engine CLI
//!
//! Reads an invoice export and a supplier balance export, applies the
//! configured eligibility rules and writes the filtered line items and the
//! per-supplier summary as CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- invoices.csv balances.csv --config rules.toml --output-dir out
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `info` or `debug` to see what each rule removed

use payables_engine::{read_table, EngineConfig, EngineError, PayablesEngine, Result};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Parsed command line.
struct CliArgs {
    invoices: PathBuf,
    balances: PathBuf,
    config: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    prefix: Option<String>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut positional = Vec::new();
        let mut config = None;
        let mut output_dir = None;
        let mut prefix = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config = Some(PathBuf::from(option_value(&arg, args.next())?)),
                "--output-dir" => output_dir = Some(PathBuf::from(option_value(&arg, args.next())?)),
                "--prefix" => prefix = Some(option_value(&arg, args.next())?),
                other if other.starts_with("--") => {
                    return Err(EngineError::InvalidArgument(format!("unknown option {}", other)));
                }
                _ => positional.push(PathBuf::from(&arg)),
            }
        }

        let mut positional = positional.into_iter();
        let (invoices, balances) = match (positional.next(), positional.next()) {
            (Some(invoices), Some(balances)) => (invoices, balances),
            _ => return Err(EngineError::MissingArgument),
        };
        if let Some(extra) = positional.next() {
            return Err(EngineError::InvalidArgument(format!(
                "unexpected argument {}",
                extra.display()
            )));
        }

        Ok(CliArgs {
            invoices,
            balances,
            config,
            output_dir,
            prefix,
        })
    }
}

fn option_value(option: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| EngineError::InvalidArgument(format!("{} requires a value", option)))
}

fn run() -> Result<()> {
    let args = CliArgs::parse(env::args().skip(1))?;

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = args.output_dir {
        config.output.output_folder = dir;
    }
    if let Some(prefix) = args.prefix {
        config.output.file_prefix = Some(prefix);
    }

    let engine = PayablesEngine::new(config)?;
    let input = &engine.config().input;

    let invoices = read_table(
        BufReader::new(File::open(&args.invoices)?),
        input.invoice_header_row,
    )?;
    let balances = read_table(
        BufReader::new(File::open(&args.balances)?),
        input.balance_header_row,
    )?;

    let output = engine.process(&invoices, &balances)?;
    let (filtered_path, summary_path) = engine.write_outputs(&output)?;

    println!("{}", filtered_path.display());
    println!("{}", summary_path.display());

    Ok(())
}

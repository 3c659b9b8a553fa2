// korad-ps -- query and control a KORAD KD3305P power supply from the command line.
//
// Usage:
//   korad-ps query vset1?
//   korad-ps q vset1? q iset1?
//   korad-ps q status?
//   korad-ps set vastep1 25,15,0.5,1
//   korad-ps command lock1

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use korad_psu::{
    locator::{DeviceLocator, SerialPortScan},
    operation::{Operation, Outcome, parse_operations},
    protocol::KoradPsu,
    serial::SerialConnector,
    store::FileStore,
};

const USAGE: &str = "\
Usage: korad-ps query vset1?
Usage: korad-ps q vset1? q iset1?
Usage: korad-ps set vastep1 25,15,0.5,1
Usage: korad-ps command lock1
";

/// Longest reply line we accept from the PSU.
const REPLY_CAPACITY: usize = 128;

/// Query and control a KORAD KD3305P power supply.
///
/// The PSU is found automatically and its device path remembered in ~/.korad-power-supply.
#[derive(Parser)]
#[command(name = "korad-ps", version, about, after_help = USAGE)]
struct Cli {
    /// Log more detail to stderr (repeat for more).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Operations to run in order: `query NAME`, `command NAME`, `set NAME VALUE`.
    #[arg(value_name = "OPERATION", trailing_var_arg = true, allow_hyphen_values = true)]
    operations: Vec<String>,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.operations.is_empty() {
        eprint!("{USAGE}");
        return ExitCode::from(1);
    }

    let operations = match parse_operations(&cli.operations).collect::<Result<Vec<_>, _>>() {
        Ok(operations) => operations,
        Err(e) => {
            eprintln!("{e}");
            eprint!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(&operations) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Find the PSU, then run each operation in turn, stopping at the first failure.
fn run(operations: &[Operation<'_>]) -> Result<()> {
    let store = FileStore::in_home().context("cannot determine home directory")?;
    let mut locator =
        DeviceLocator::new(SerialConnector::default(), store, SerialPortScan::default());
    let path = locator.locate()?;

    let mut psu: KoradPsu<'_, _, REPLY_CAPACITY> =
        KoradPsu::new(SerialConnector::default(), &path);
    for operation in operations {
        let outcome = operation
            .execute(&mut psu)
            .with_context(|| format!("{} - failed on device {path}", operation.name()))?;
        match outcome {
            Outcome::Done => {}
            outcome => println!("{outcome}"),
        }
    }
    Ok(())
}

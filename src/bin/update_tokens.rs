//! One-shot helper: write the current token count to the counter file.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use tokentrack_core::config::Settings;
use tokentrack_core::counter::CounterFile;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    name = "update_tokens",
    version,
    about = "Write the current token count for tokentrack to display"
)]
struct Args {
    /// Cumulative token count
    count: u64,

    /// Counter file to write (defaults to the configured path)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help / --version are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(&args) {
        Ok(()) => {
            println!("Updated: {} tokens", args.count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let path = match args.file {
        Some(ref path) => path.clone(),
        None => Settings::load(args.config.as_ref())?.counter.path,
    };
    CounterFile::new(path).write_count(args.count)?;
    Ok(())
}

mod cli;
mod console;
mod operator;

use std::io::{self, BufReader};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use raop_sender_core::{MdnsDirectory, SessionController};
use raop_sender_windows::LoopbackCapture;

use cli::Args;
use console::ConsoleReporter;
use operator::LineOperator;

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_logging(&args);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = args.session_configuration();
    let reporter = Arc::new(ConsoleReporter::stdout(config.meter_width));
    let input = LineOperator::spawn(BufReader::new(io::stdin()))
        .context("failed to start operator input thread")?;
    let interrupter = input.interrupter();
    ctrlc::set_handler(move || interrupter.interrupt())
        .context("failed to install Ctrl-C handler")?;

    println!("=== RAOP Loopback Sender ===");

    let mut controller = SessionController::new(
        config,
        MdnsDirectory::new(),
        LoopbackCapture::default_device(),
        input,
        reporter,
    )
    .context("invalid session configuration")?;

    // Failures were already shown by the reporter; only the exit code is left.
    let result = controller.run();

    if args.summary_json {
        if let Some(summary) = controller.summary() {
            println!("{}", summary.to_json().context("failed to encode session summary")?);
        }
    }

    match result {
        Ok(summary) => {
            log::info!(
                "Session {} ran {:.1}s, {} buffers, max peak {:.2}",
                summary.id,
                summary.duration_secs(),
                summary.diagnostics.buffers_delivered,
                summary.max_peak
            );
            Ok(ExitCode::SUCCESS)
        }
        // Distinguish "never started" from a session that failed mid-capture.
        Err(e) if e.is_pre_capture() => Ok(ExitCode::from(2)),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

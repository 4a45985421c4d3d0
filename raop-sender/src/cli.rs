//! Command-line interface for the sender.
//!
//! Handles argument parsing and logging configuration.

use std::time::Duration;

use clap::Parser;
use log::LevelFilter;

use raop_sender_core::{SessionConfiguration, RAOP_SERVICE_TYPE};

/// Discover AirPlay receivers and meter whatever this machine is playing.
#[derive(Parser, Debug)]
#[command(name = "raop-sender")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// mDNS service type to browse for
    #[arg(long, default_value = RAOP_SERVICE_TYPE)]
    pub service_type: String,

    /// Seconds to wait for discovery replies
    #[arg(long, default_value_t = 3)]
    pub timeout_secs: u64,

    /// Milliseconds between checks for the quit key
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    /// Width of the level meter in bars
    #[arg(long, default_value_t = 50)]
    pub meter_width: usize,

    /// Print a JSON session summary on exit
    #[arg(long)]
    pub summary_json: bool,

    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn session_configuration(&self) -> SessionConfiguration {
        SessionConfiguration {
            service_type: self.service_type.clone(),
            discovery_timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_millis(self.poll_ms),
            meter_width: self.meter_width,
        }
    }

    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Initialize the logging system based on CLI arguments.
///
/// Logs go to stderr; at the default level nothing interrupts the meter line.
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Base level for all modules - keep at warn to suppress noisy deps
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("raop_sender", args.log_level());
    builder.filter_module("raop_sender_core", args.log_level());
    builder.filter_module("raop_sender_windows", args.log_level());

    // mDNS internals only at -vvv
    if args.verbose >= 3 {
        builder.filter_module("mdns_sd", args.log_level());
    }

    // RUST_LOG still wins when set.
    builder.parse_default_env();
    builder.format_timestamp_millis().init();
}

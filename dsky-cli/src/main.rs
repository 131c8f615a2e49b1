//! DSKY Controller CLI Application
//!
//! Command-line front end for the dsky-protocol library. It adds:
//! - The simulator socket client (frames in, key presses out)
//! - Device links to the display, indicator and keyboard controllers
//! - A lamp test that exercises every digit, sign and lamp
//! - Replay of captured socket byte streams

use anyhow::Result;
use clap::{Parser, Subcommand};
use dsky_protocol::Dispatcher;
use std::path::PathBuf;
use std::time::Duration;

mod config;
mod lamp_test;
mod replay;
mod sim;
mod transport;

use config::AppConfig;
use sim::{KeySource, SessionSummary, SimClient};
use transport::{KeyboardLink, Peripherals};

/// DSKY Controller - Drive a replica DSKY from the guidance computer channel bus
#[derive(Parser, Debug)]
#[command(name = "dsky")]
#[command(about = "Translate AGC channel traffic for the DSKY controllers", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (dsky.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Simulator address (host:port)
    #[arg(long, value_name = "ADDR", global = true)]
    sim: Option<String>,

    /// Display controller device
    #[arg(long, value_name = "PATH", global = true)]
    display: Option<PathBuf>,

    /// Indicator controller device
    #[arg(long, value_name = "PATH", global = true)]
    indicators: Option<PathBuf>,

    /// Keyboard controller device (default: key names on stdin)
    #[arg(long, value_name = "PATH", global = true)]
    keyboard: Option<PathBuf>,

    /// Print commands instead of writing them to the controllers
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print commands as JSON lines (implies --dry-run)
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the simulator and drive the controllers (default)
    Run,
    /// Run every digit, sign and lamp through its states
    LampTest {
        /// Pause between test steps, in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        step_ms: u64,
    },
    /// Decode a captured simulator byte stream
    Replay {
        /// Capture file with raw socket bytes
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("DSKY Controller CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using protocol library v{}", dsky_protocol::VERSION);

    let config = resolve_config(&args)?;
    let mut peripherals = if args.dry_run || args.json {
        Peripherals::trace(args.json)
    } else {
        Peripherals::open(&config.peripherals)
    };
    let mut dispatcher = Dispatcher::new(config.protocol.clone());

    match args.command.as_ref().unwrap_or(&Command::Run) {
        Command::Run => {
            let client = SimClient::connect(&config.simulator.address(), dispatcher)?;
            let keys = match &config.peripherals.keyboard {
                Some(path) => KeySource::Device(KeyboardLink::open(path)?),
                None => KeySource::Stdin,
            };
            client.spawn_keyboard(keys)?;

            let summary = client.run(&mut peripherals)?;
            if !args.quiet {
                print_summary("Simulator session", &summary);
            }
        }
        Command::LampTest { step_ms } => {
            let produced = lamp_test::run(
                &mut dispatcher,
                &mut peripherals,
                Duration::from_millis(*step_ms),
            )?;
            log::info!(
                "Lamp test complete: {} commands ({} sent, {} dropped)",
                produced,
                peripherals.sent(),
                peripherals.dropped()
            );
        }
        Command::Replay { file } => {
            let summary = replay::replay_file(file, &mut dispatcher, &mut peripherals)?;
            if !args.quiet {
                print_summary("Replay", &summary);
            }
        }
    }

    Ok(())
}

/// Load the config file (if any) and apply command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(address) = &args.sim {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("Simulator address must be host:port, got {}", address))?;
        config.simulator.host = host.to_string();
        config.simulator.port = port
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid simulator port {:?}: {}", port, e))?;
    }
    if let Some(path) = &args.display {
        config.peripherals.display = Some(path.clone());
    }
    if let Some(path) = &args.indicators {
        config.peripherals.indicators = Some(path.clone());
    }
    if let Some(path) = &args.keyboard {
        config.peripherals.keyboard = Some(path.clone());
    }

    log::debug!("Configuration: {:?}", config);
    Ok(config)
}

fn print_summary(title: &str, summary: &SessionSummary) {
    eprintln!("{} summary:", title);
    eprintln!("  Bytes:            {}", summary.bytes);
    eprintln!("  Frames:           {}", summary.frames.frames);
    eprintln!("  Dropped bytes:    {}", summary.frames.dropped_bytes);
    eprintln!("  Truncated frames: {}", summary.frames.truncated_frames);
    eprintln!("  Rejected frames:  {}", summary.dispatch.rejected_frames);
    eprintln!("  Skipped frames:   {}", summary.dispatch.skipped_frames);
    eprintln!(
        "  Commands:         {} ({} sent, {} dropped)",
        summary.dispatch.commands, summary.commands_sent, summary.commands_dropped
    );
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

//! rfidme command-line tool
//!
//! Runs one operation against an RFID ME reader and always hands the device
//! back to the kernel afterwards.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rfidme::{
    Device, DeviceId, InventoryOutcome, Operation, PowerAck, Report, RetryPolicy,
};
use rfidme_core::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_READ_TIMEOUT_MS};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rfidme")]
#[command(author, version, about = "Control an RFID ME USB reader")]
#[command(long_about = "
Talks to an RFID ME UHF reader over USB. The kernel HID driver is detached for
the duration of the command and reattached before exit.

EXAMPLES:
    # Run a tag inventory
    rfidme inventory

    # Set antenna power, then run an inventory
    rfidme inventory --power 30

    # Only set antenna power
    rfidme power 30

    # Read the tag in the field in quick-access mode
    rfidme read

    # Debug logging
    rfidme -vv inventory
")]
struct Cli {
    /// Reader identity as vendor:product in hex
    #[arg(long, value_name = "VID:PID", env = "RFIDME_DEVICE", default_value = "1325:c029")]
    device: DeviceId,
    
    /// Reads attempted before giving up on a reply
    #[arg(long, env = "RFIDME_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    attempts: u32,
    
    /// Timeout per read attempt in milliseconds
    #[arg(long, value_name = "MS", env = "RFIDME_TIMEOUT_MS", default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    timeout_ms: u64,
    
    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a tag inventory
    Inventory {
        /// Set antenna port power first
        #[arg(long, value_name = "LEVEL")]
        power: Option<u8>,
    },
    
    /// Set antenna port power only
    Power {
        /// Power level byte sent to the reader
        level: u8,
    },
    
    /// Read the tag in the field in quick-access mode
    Read,
}

impl From<Command> for Operation {
    fn from(command: Command) -> Self {
        match command {
            Command::Inventory { power } => Operation::Inventory { power },
            Command::Power { level } => Operation::SetPower { level },
            Command::Read => Operation::ReadTag,
        }
    }
}

fn setup_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_power(ack: PowerAck) {
    match ack {
        PowerAck::Applied => println!("Antenna power set"),
        PowerAck::Rejected { echo_code, status } => {
            println!("Antenna power rejected (echo 0x{echo_code:02X}, status 0x{status:02X})")
        }
    }
}

fn print_report(report: &Report) {
    match report {
        Report::Inventory { power, outcome } => {
            if let Some(ack) = power {
                print_power(*ack);
            }
            match outcome {
                InventoryOutcome::Completed(inventory) => {
                    println!("Tags: {}", inventory.tag_count);
                    if let Some(tag) = &inventory.first_tag {
                        println!("First tag: {tag}");
                    }
                }
                InventoryOutcome::Rejected { echo_code, status } => {
                    println!("Inventory rejected (echo 0x{echo_code:02X}, status 0x{status:02X})")
                }
            }
        }
        Report::Power(ack) => print_power(*ack),
        Report::TagData(data) => println!("Tag data: {}", hex::encode_upper(data)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    
    setup_logging(cli.verbose);
    
    info!("rfidme v{}", env!("CARGO_PKG_VERSION"));
    
    let policy = RetryPolicy::new(cli.attempts, Duration::from_millis(cli.timeout_ms));
    let mut device = Device::new()
        .with_device_id(cli.device)
        .with_retry_policy(policy);
    
    match device.run(cli.command.into()).await {
        Ok(report) => {
            print_report(&report);
            if report.is_accepted() {
                ExitCode::SUCCESS
            } else {
                warn!("Reader rejected the command");
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

//! rylr-term - talk to a Reyax RYLR module over a serial port.
//!
//! One-shot commands for checking the module, sending a message and listening
//! for traffic, plus an interactive AT terminal.

mod prompt;
mod serial;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rylr_driver::{ConfigError, DriverError, LoraModem, ModemConfig};
use rylr_protocol::{Command, Response};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::prompt::prompt_for_address;
use crate::serial::SerialTransport;

type Modem = LoraModem<SerialTransport>;

#[derive(Parser)]
#[command(name = "rylr-term")]
#[command(about = "Terminal and tools for Reyax RYLR LoRa modules")]
#[command(version)]
struct Cli {
    /// Serial device the module is attached to
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// UART baud rate
    #[arg(short, long, default_value_t = 115200)]
    baud: u32,

    /// Driver configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the module responds and show its version and address
    Status,

    /// Send one text message
    Send {
        /// Destination address
        to: u16,

        /// Message text
        text: String,

        /// Set the local address first
        #[arg(short, long)]
        address: Option<u16>,
    },

    /// Print received messages until interrupted
    Listen {
        /// Set the local address first
        #[arg(short, long)]
        address: Option<u16>,
    },

    /// Interactive AT terminal
    Term {
        /// Prompt label
        #[arg(long, default_value = "")]
        prompt: String,

        /// Ask for the local address before starting
        #[arg(long)]
        ask_address: bool,
    },
}

#[derive(Debug, Error)]
enum TermError {
    #[error("Failed to open serial port {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Driver(#[from] DriverError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), TermError> {
    let config = match &cli.config {
        Some(path) => ModemConfig::load(path)?,
        None => ModemConfig::default(),
    };
    rylr_driver::metrics::describe_metrics();

    let transport = SerialTransport::open(&cli.port, cli.baud).map_err(|source| TermError::Serial {
        port: cli.port.clone(),
        source,
    })?;
    info!("Opened {} at {} baud", cli.port, cli.baud);
    let mut modem = LoraModem::with_config(transport, config);

    match cli.command {
        Commands::Status => status(&mut modem),
        Commands::Send { to, text, address } => send(&mut modem, to, &text, address),
        Commands::Listen { address } => listen(&mut modem, address),
        Commands::Term {
            prompt,
            ask_address,
        } => term(&mut modem, &prompt, ask_address),
    }
}

fn status(modem: &mut Modem) -> Result<(), TermError> {
    modem.check_status()?;
    println!("Module:  OK");
    println!("Version: {}", modem.version()?);
    println!("Address: {}", modem.address()?);
    Ok(())
}

fn send(modem: &mut Modem, to: u16, text: &str, address: Option<u16>) -> Result<(), TermError> {
    if let Some(address) = address {
        modem.set_address(address)?;
    }

    modem.start_tx_message();
    let written = modem.add_tx_str(text);
    if written < text.len() {
        println!("Message truncated to {} bytes", written);
    }
    modem.send_tx_message(to)?;
    println!("Sent {} bytes to {}", written, to);
    Ok(())
}

fn listen(modem: &mut Modem, address: Option<u16>) -> Result<(), TermError> {
    if let Some(address) = address {
        modem.set_address(address)?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    println!("Listening, press Ctrl-C to stop");
    let idle = modem.config().poll_interval().max(std::time::Duration::from_millis(1));
    while running.load(Ordering::SeqCst) {
        match modem.poll_message() {
            Some(msg) => print_message(
                msg.from_address,
                msg.rssi,
                msg.snr,
                &String::from_utf8_lossy(msg.data),
            ),
            None => std::thread::sleep(idle),
        }
    }

    println!();
    println!("{}", modem.stats());
    Ok(())
}

fn term(modem: &mut Modem, label: &str, ask_address: bool) -> Result<(), TermError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    if ask_address {
        match prompt_for_address(&mut input, &mut stdout)? {
            Some(address) => modem.set_address(address)?,
            None => return Ok(()),
        }
    }

    let prompt = format!("{}$ ", label);
    let mut line = String::new();
    loop {
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            println!("exit...");
            break;
        }

        let command = line.trim();
        match command {
            "" => {}
            "stats" => println!("{}", modem.stats()),
            _ => run_command(modem, command),
        }
        drain_messages(modem);
    }
    Ok(())
}

fn run_command(modem: &mut Modem, command: &str) {
    let command = Command::Raw {
        command: command.to_string(),
    };
    match modem.execute(&command) {
        Ok(Response::Unknown(text)) => println!("{}", text),
        Ok(response) => println!("{:?} (status {})", response, response.status_code()),
        Err(e) => println!("{} (status {})", e, e.status_code()),
    }
}

fn drain_messages(modem: &mut Modem) {
    while let Some(msg) = modem.poll_message() {
        print_message(
            msg.from_address,
            msg.rssi,
            msg.snr,
            &String::from_utf8_lossy(msg.data),
        );
    }
    let buffer = modem.buffer();
    debug!(
        "Receive buffer: read {} write {} of {}",
        buffer.read_cursor(),
        buffer.write_cursor(),
        buffer.capacity()
    );
}

fn print_message(from: u16, rssi: i32, snr: i32, data: &str) {
    println!("[{}] rssi {} snr {}: {}", from, rssi, snr, data);
}

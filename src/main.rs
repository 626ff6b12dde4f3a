//! # gpslog
//!
//! Decode GPS+IMU logger telemetry.
//!
//! The `listen` command receives live telegrams over UDP, `parse` reads a
//! binary archive file, and `replay` streams an archive back out as live
//! telegrams for testing receivers.

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::UdpSocket;
use tokio::time::interval;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use gpslog::codec::encoder::encode_preserving_validity;
use gpslog::codec::protocol::Variant;
use gpslog::config::Config;
use gpslog::receiver::{DatagramSource, LivePacket, LiveReceiver, UdpDatagramSource};
use gpslog::stream::{read_header, RecordReader};
use gpslog::telemetry::export::{ExportFormat, RecordExporter};
use gpslog::telemetry::report::{Report, ReportContext};
use gpslog::telemetry::stats::BatchStats;

/// Number of telegrams between replay status log messages
const LOG_INTERVAL_PACKETS: u64 = 1000;

/// Pause before receiving again after a socket error
const RECEIVE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Consecutive socket errors after which `listen` gives up
const MAX_CONSECUTIVE_RECEIVE_ERRORS: u32 = 10;

#[derive(Debug, Parser)]
#[command(name = "gpslog", version, about = "Decode GPS+IMU logger telemetry")]
struct Cli {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Receive and decode live telegrams over UDP
    Listen {
        /// Override the configured UDP port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Decode a binary archive file
    Parse {
        /// Archive file to read
        input: PathBuf,

        /// Export decoded records to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format (csv or jsonl); overrides the configured format
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Only print the batch statistics
        #[arg(short, long)]
        quiet: bool,
    },
    /// Send an archive file as live telegrams to a UDP target
    Replay {
        /// Archive file to read
        input: PathBuf,

        /// Destination address (e.g., 127.0.0.1:9000)
        #[arg(short, long)]
        target: SocketAddr,

        /// Telegrams per second
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=1000))]
        rate_hz: u32,
    },
}

/// Main entry point
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse the command line
///    - Set up logging with tracing subscriber (stderr or `--log-file`)
///    - Load configuration, or fall back to defaults
///
/// 2. **Command**
///    - `listen`: decode telegrams until Ctrl+C
///    - `parse`: decode the archive, print reports and statistics, export
///    - `replay`: re-encode archive records as live telegrams at a fixed rate
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded
/// - The UDP socket cannot be bound
/// - The input or export file cannot be opened
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.log_file.as_deref())?;

    info!("gpslog v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Command::Listen { port } => run_listener(&config, port).await,
        Command::Parse {
            input,
            output,
            format,
            quiet,
        } => run_parse(&config, &input, output.as_deref(), format, quiet),
        Command::Replay {
            input,
            target,
            rate_hz,
        } => run_replay(&config, &input, target, rate_hz).await,
    }
}

/// Install the tracing subscriber
///
/// The returned guard must be held until exit so buffered file logs are
/// flushed.
fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn report_context(config: &Config, heading_delta: Option<f64>) -> ReportContext {
    ReportContext {
        heading_delta,
        heading_delta_threshold: config.report.heading_delta_threshold_deg,
        thresholds: config.motion,
    }
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

async fn run_listener(config: &Config, port: Option<u16>) -> Result<()> {
    let mut listener = config.listener.clone();
    if let Some(port) = port {
        listener.port = port;
    }

    let source = UdpDatagramSource::bind(listener.socket_addr(), listener.max_datagram_size)
        .await
        .with_context(|| format!("failed to bind UDP {}", listener.socket_addr()))?;
    let mut receiver = LiveReceiver::new(source);

    info!("Expecting {}-byte live telegrams", Variant::Live.size());
    info!("Press Ctrl+C to exit");

    receive_until_shutdown(config, &mut receiver).await
}

/// Print every received packet until Ctrl+C
///
/// Socket errors are retried after [`RECEIVE_RETRY_DELAY`]; after
/// [`MAX_CONSECUTIVE_RECEIVE_ERRORS`] in a row the last one is returned.
async fn receive_until_shutdown<S: DatagramSource>(
    config: &Config,
    receiver: &mut LiveReceiver<S>,
) -> Result<()> {
    let mut consecutive_errors: u32 = 0;

    loop {
        tokio::select! {
            packet = receiver.next_packet() => {
                match packet {
                    Ok(packet) => {
                        consecutive_errors = 0;
                        print_live_packet(config, &packet);
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        warn!("Receive failed ({} in a row): {}", consecutive_errors, e);
                        if consecutive_errors >= MAX_CONSECUTIVE_RECEIVE_ERRORS {
                            return Err(e).with_context(|| {
                                format!("giving up after {} consecutive receive errors", consecutive_errors)
                            });
                        }
                        tokio::time::sleep(RECEIVE_RETRY_DELAY).await;
                    }
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!(
                    "Total packets received: {} ({} decoded)",
                    receiver.received(),
                    receiver.decoded()
                );
                break;
            }
        }
    }

    Ok(())
}

fn print_live_packet(config: &Config, packet: &LivePacket) {
    println!();
    println!("Packet #{} from {}", packet.index, packet.from);
    println!("Received {} bytes", packet.raw.len());

    match &packet.outcome {
        Ok(record) => {
            let ctx = report_context(config, packet.heading_delta);
            print!("{}", Report::new(record, &ctx));
        }
        Err(e) => {
            println!("Invalid packet: {}", e);
            if config.report.show_raw_hex_on_error {
                println!("Raw HEX: {}", hex_dump(&packet.raw));
            }
        }
    }
}

fn open_archive(config: &Config, input: &Path) -> Result<RecordReader<BufReader<File>>> {
    let file = File::open(input)
        .with_context(|| format!("failed to open input {}", input.display()))?;
    let mut reader = BufReader::new(file);

    // A mismatch is logged by read_header; records are read either way
    read_header(&mut reader, &config.archive.header_line)?;

    Ok(RecordReader::new(reader, Variant::Archive))
}

fn run_parse(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    format: Option<ExportFormat>,
    quiet: bool,
) -> Result<()> {
    let mut records = open_archive(config, input)?;
    let mut stats = BatchStats::new();

    let mut exporter = match output {
        Some(path) => Some(
            RecordExporter::create(path, format.unwrap_or(config.export.format))
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => None,
    };

    while let Some(result) = records.next() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping record {}: {}", records.records_read(), e);
                continue;
            }
        };

        stats.record(&record);

        if !quiet {
            let ctx = report_context(config, records.last_heading_delta());
            print!("{}", Report::new(&record, &ctx));
        }

        if let Some(exporter) = exporter.as_mut() {
            exporter.write(&record)?;
        }
    }

    print!("{}", stats);

    if let (Some(exporter), Some(path)) = (exporter, output) {
        let rows = exporter.rows();
        exporter.finish()?;
        println!("Data written to {} ({} rows)", path.display(), rows);
    }

    Ok(())
}

async fn run_replay(config: &Config, input: &Path, target: SocketAddr, rate_hz: u32) -> Result<()> {
    let records = open_archive(config, input)?;
    let socket = UdpSocket::bind("0.0.0.0:0").await?;

    let mut tick = interval(Duration::from_secs_f64(1.0 / f64::from(rate_hz)));
    let mut sent: u64 = 0;
    let mut invalid: u64 = 0;

    info!("Replaying {} to {} at {}Hz", input.display(), target, rate_hz);

    for result in records {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping record: {}", e);
                continue;
            }
        };

        if !record.checksum.valid {
            invalid += 1;
            warn!(
                "Record {} has an invalid checksum (RX:{:04X} vs CALC:{:04X}), replaying it as invalid",
                record.timestamp, record.checksum.transmitted, record.checksum.computed
            );
        }

        tick.tick().await;
        let telegram = encode_preserving_validity(&record, Variant::Live);
        socket.send_to(&telegram, target).await?;
        sent += 1;

        if sent % LOG_INTERVAL_PACKETS == 0 {
            info!("Sent {} telegrams", sent);
        }
    }

    info!(
        "Replay complete: {} telegrams sent ({} with invalid checksums)",
        sent, invalid
    );
    Ok(())
}

mod decode;
mod sinks;

use std::fs::File;
use std::io::stderr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nasa::bridge::Bridge;
use nasa::bytes::Bytes;
use nasa::config::Config;
use nasa::sink::Sink;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a live byte stream and publish the values.
    ///
    /// Values go to the TCP sink at sink.host:sink.port from the configuration, one JSON
    /// object per line, or to stdout when no host is configured.
    ///
    /// A serial device must already be configured for the bus, i.e., 9600 baud, 8 data bits,
    /// even parity and 1 stop bit.
    Run {
        /// Bridge configuration (JSON). Defaults are used for anything not set.
        #[arg(short, long, value_name = "path")]
        config: Option<PathBuf>,

        /// Publish to stdout even if a sink host is configured.
        #[arg(long, action)]
        stdout: bool,

        /// Device or capture file to read. Reads stdin if not provided.
        input: Option<PathBuf>,
    },
    /// Decode the packets in a capture file.
    Decode {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: decode::Format,

        /// Message table to merge with the built-in one, used to name messages.
        #[arg(long, value_name = "path")]
        catalog: Option<PathBuf>,

        /// Capture file
        input: PathBuf,
    },
}

fn run(config: Option<&PathBuf>, stdout: bool, input: Option<&PathBuf>) -> Result<()> {
    let config = match config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {path:?}"))?,
        None => Config::default(),
    };
    debug!("{config:?}");

    let sink: Box<dyn Sink> = if stdout || config.sink.host.is_empty() {
        info!("publishing to stdout");
        Box::new(sinks::StdoutSink::default())
    } else {
        info!(
            "publishing to {}:{}",
            config.sink.host, config.sink.port
        );
        Box::new(sinks::TcpSink::default())
    };
    let mut bridge = Bridge::with_config(config, sink).context("creating bridge")?;

    let mut bytes = match input {
        Some(path) => {
            info!("reading {path:?}");
            let file = File::open(path).with_context(|| format!("opening input {path:?}"))?;
            Bytes::new(file)
        }
        None => {
            info!("reading stdin");
            Bytes::new(std::io::stdin())
        }
    }
    .context("starting reader")?;

    bridge.run(&mut bytes);
    bridge.sink_mut().disconnect();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("NASA_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Run {
            config,
            stdout,
            input,
        } => run(config.as_ref(), *stdout, input.as_ref()),
        Commands::Decode {
            format,
            catalog,
            input,
        } => decode::decode(input, format, catalog.as_ref()),
    }
}

use std::io::{stdout, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use nasa::config::SinkConfig;
use nasa::sink::Sink;
use serde::Serialize;
use tracing::{debug, warn};

/// Writes `<topic> <payload>` lines to stdout.
#[derive(Default)]
pub struct StdoutSink {
    connected: bool,
}

impl Sink for StdoutSink {
    fn connect(&mut self, _config: &SinkConfig) -> bool {
        self.connected = true;
        true
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        if !self.connected {
            return false;
        }
        let mut out = stdout().lock();
        if let Err(err) = writeln!(out, "{topic} {payload}") {
            warn!("writing to stdout failed: {err}");
            self.connected = false;
            return false;
        }
        true
    }

    fn disconnect(&mut self) {
        let _ = stdout().flush();
        self.connected = false;
    }
}

#[derive(Serialize)]
struct Message<'a> {
    topic: &'a str,
    payload: &'a str,
}

/// Writes one JSON object per published value to a TCP connection.
#[derive(Default)]
pub struct TcpSink {
    stream: Option<TcpStream>,
}

impl TcpSink {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
    const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

    fn open(config: &SinkConfig) -> std::io::Result<TcpStream> {
        let mut last_err = None;
        for addr in (config.host.as_str(), config.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, Self::CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_write_timeout(Some(Self::WRITE_TIMEOUT))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "host did not resolve")
        }))
    }
}

impl Sink for TcpSink {
    fn connect(&mut self, config: &SinkConfig) -> bool {
        if !config.username.is_empty() {
            debug!("line sink does not authenticate; ignoring credentials");
        }
        match Self::open(config) {
            Ok(stream) => {
                self.stream = Some(stream);
                true
            }
            Err(err) => {
                warn!("connecting to {}:{} failed: {err}", config.host, config.port);
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        let zult = serde_json::to_writer(&mut *stream, &Message { topic, payload })
            .map_err(std::io::Error::from)
            .and_then(|()| stream.write_all(b"\n"));
        if let Err(err) = zult {
            warn!("publishing failed, disconnecting: {err}");
            self.stream = None;
            return false;
        }
        true
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }
}

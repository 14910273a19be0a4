use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::SinkConfig;

/// Destination for published values.
///
/// Every operation is a best-effort attempt that reports its outcome right away; retrying is
/// up to the caller.
pub trait Sink {
    /// Try to connect, returning whether the sink is connected afterwards.
    fn connect(&mut self, config: &SinkConfig) -> bool;

    fn is_connected(&self) -> bool;

    /// Publish a single value, returning false if it was not accepted.
    fn publish(&mut self, topic: &str, payload: &str) -> bool;

    fn disconnect(&mut self) {}
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn connect(&mut self, config: &SinkConfig) -> bool {
        (**self).connect(config)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        (**self).publish(topic, payload)
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }
}

/// Sink that keeps everything published to it, mostly useful for testing.
///
/// It starts disconnected; [connect](Sink::connect) succeeds unless connections are being
/// refused.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub published: Vec<(String, String)>,
    pub connected: bool,
    /// Make connection attempts fail.
    pub refuse: bool,
    /// Number of connection attempts made.
    pub attempts: usize,
}

impl MemorySink {
    pub fn connected() -> Self {
        MemorySink {
            connected: true,
            ..Default::default()
        }
    }
}

impl Sink for MemorySink {
    fn connect(&mut self, _config: &SinkConfig) -> bool {
        self.attempts += 1;
        self.connected = !self.refuse;
        self.connected
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        if !self.connected {
            return false;
        }
        self.published.push((topic.to_string(), payload.to_string()));
        true
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}

/// Reconnect back-off.
///
/// After each failed attempt the next one is held off for a delay that doubles from `base`
/// up to `max`. A successful attempt resets it.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    delay: Duration,
    next_attempt: Option<Instant>,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Backoff {
            base,
            max,
            delay: base,
            next_attempt: None,
        }
    }

    /// Whether an attempt may be made at `now`.
    #[must_use]
    pub fn ready(&self, now: Instant) -> bool {
        self.next_attempt.map_or(true, |t| now >= t)
    }

    /// Delay that will follow the next failure.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn failed(&mut self, now: Instant) {
        self.next_attempt = Some(now + self.delay);
        debug!("next connection attempt in {:?}", self.delay);
        self.delay = (self.delay * 2).min(self.max);
    }

    pub fn succeeded(&mut self) {
        self.delay = self.base;
        self.next_attempt = None;
    }
}

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::bytes::ByteSource;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::dispatch::{Dispatcher, Summary};
use crate::framer::Framer;
use crate::nasa::Packet;
use crate::registry::Discovered;
use crate::sink::{Backoff, Sink};
use crate::Result;

/// Counters for everything the bridge has processed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Frames outside the valid packet size range.
    pub unknown: usize,
    /// Frames that failed validation or decoding.
    pub decode_errors: usize,
    /// Successfully decoded packets, of any data type.
    pub packets: usize,
    pub published: usize,
    pub dropped: usize,
}

/// Owns all state between the byte stream and the sink.
///
/// Nothing is shared: the framer, the dispatcher with its known devices, and the sink are
/// all driven from whichever thread calls [poll](Bridge::poll) and [update](Bridge::update).
pub struct Bridge<S>
where
    S: Sink,
{
    config: Config,
    framer: Framer,
    dispatcher: Dispatcher,
    sink: S,
    backoff: Backoff,
    started: bool,
    pub stats: Stats,
}

impl<S> Bridge<S>
where
    S: Sink,
{
    const IDLE_SLEEP: Duration = Duration::from_millis(10);

    pub fn new(config: Config, catalog: Catalog, sink: S) -> Self {
        let framer =
            Framer::new(config.frame_timeout()).with_resync(config.resync_on_start_marker);
        let dispatcher = Dispatcher::new(catalog, &config);
        let backoff = Backoff::new(
            Duration::from_millis(config.reconnect_base_ms),
            Duration::from_millis(config.reconnect_max_ms),
        );
        Bridge {
            config,
            framer,
            dispatcher,
            sink,
            backoff,
            started: false,
            stats: Stats::default(),
        }
    }

    /// Creates a bridge using the catalog named by `config`.
    ///
    /// # Errors
    /// If the configuration is invalid or its catalog cannot be loaded.
    pub fn with_config(config: Config, sink: S) -> Result<Self> {
        config.validate()?;
        let catalog = config.load_catalog()?;
        Ok(Self::new(config, catalog, sink))
    }

    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// False until the first [update](Bridge::update); no input is consumed before then.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Process everything `source` has available right now.
    ///
    /// A frame that has been in flight without a new byte for longer than the frame timeout
    /// is abandoned first. Returns the number of packets decoded.
    pub fn poll<B>(&mut self, source: &mut B, now: Instant) -> usize
    where
        B: ByteSource + ?Sized,
    {
        if !self.started {
            return 0;
        }
        self.framer.expire(now);

        let mut count = 0;
        while let Some(byte) = source.next_byte() {
            if let Some(frame) = self.framer.push(byte, now) {
                if self.process_frame(&frame).is_some() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Decode and dispatch a single complete frame. Returns `None` if it did not decode.
    pub fn process_frame(&mut self, frame: &[u8]) -> Option<Summary> {
        if self.config.debug_log_messages_raw {
            warn!("RAW: {}", hex::encode(frame));
        }
        if frame.len() < Packet::MIN_LEN || frame.len() > Packet::MAX_LEN {
            warn!("unknown message type {}", hex::encode(frame));
            self.stats.unknown += 1;
            return None;
        }

        let packet = match Packet::decode(frame) {
            Ok(packet) => packet,
            Err(err) => {
                debug!("dropping frame: {err}");
                self.stats.decode_errors += 1;
                return None;
            }
        };
        self.stats.packets += 1;
        if self.config.debug_log_messages {
            info!("MSG: {packet}");
        }

        let summary = self.dispatcher.dispatch(&packet, &mut self.sink);
        self.stats.published += summary.published;
        self.stats.dropped += summary.dropped;
        Some(summary)
    }

    /// Slow-period housekeeping: (re)connect the sink and report the known devices.
    ///
    /// The first call also enables processing of input.
    pub fn update(&mut self, now: Instant) -> Discovered {
        if !self.started {
            info!("data processing starting");
            self.started = true;
        }

        if self.sink.is_connected() {
            debug!("sink connected");
        } else if self.backoff.ready(now) {
            if self.sink.connect(&self.config.sink) {
                info!("sink connected");
                self.backoff.succeeded();
            } else {
                warn!("sink connection failed");
                self.backoff.failed(now);
            }
        }

        let discovered = self.dispatcher.known_addresses().discovered();
        info!("discovered devices: {discovered}");
        discovered
    }

    /// Drive the bridge from `source` until the source is closed, updating every
    /// `update_interval`.
    pub fn run<B>(&mut self, source: &mut B)
    where
        B: ByteSource + ?Sized,
    {
        let interval = self.config.update_interval();
        let mut next_update = Instant::now();
        loop {
            let now = Instant::now();
            if now >= next_update {
                self.update(now);
                next_update = now + interval;
            }
            if self.poll(source, now) == 0 {
                if source.is_closed() {
                    break;
                }
                thread::sleep(Self::IDLE_SLEEP);
            }
        }
        info!(
            "input closed after {} frames; {:?}",
            self.framer.stats.frames, self.stats
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::sink::MemorySink;

    const SINGLE: &str = "320012100000b000ffc0157f01820400c8e7b034";

    fn bridge(config: Config, sink: MemorySink) -> Bridge<MemorySink> {
        Bridge::new(config, Catalog::default(), sink)
    }

    fn source(hex_str: &str) -> VecDeque<u8> {
        hex::decode(hex_str).unwrap().into()
    }

    #[test]
    fn nothing_is_consumed_before_first_update() {
        let mut bridge = bridge(Config::default(), MemorySink::default());
        let mut src = source(SINGLE);
        let now = Instant::now();

        assert_eq!(bridge.poll(&mut src, now), 0);
        assert_eq!(src.len(), 20);

        bridge.update(now);
        assert!(bridge.is_started());
        assert!(bridge.sink().is_connected());
        assert_eq!(bridge.poll(&mut src, now), 1);
        assert!(src.is_empty());
        assert_eq!(
            bridge.sink().published,
            vec![("samsung_ehs/8204/state".to_string(), "200".to_string())]
        );
    }

    #[test]
    fn update_backs_off_failed_connections() {
        let config = Config::builder()
            .reconnect_base_ms(1000)
            .reconnect_max_ms(4000)
            .build();
        let sink = MemorySink {
            refuse: true,
            ..Default::default()
        };
        let mut bridge = bridge(config, sink);
        let start = Instant::now();

        bridge.update(start);
        bridge.update(start + Duration::from_millis(500));
        assert_eq!(bridge.sink().attempts, 1);

        bridge.update(start + Duration::from_millis(1000));
        assert_eq!(bridge.sink().attempts, 2);

        bridge.sink_mut().refuse = false;
        bridge.update(start + Duration::from_millis(2500));
        assert_eq!(bridge.sink().attempts, 2, "still backing off");
        bridge.update(start + Duration::from_millis(3000));
        assert_eq!(bridge.sink().attempts, 3);
        assert!(bridge.sink().is_connected());
    }

    #[test]
    fn update_reports_devices() {
        let mut bridge = bridge(Config::default(), MemorySink::default());
        let now = Instant::now();
        bridge.update(now);
        bridge.poll(&mut source(SINGLE), now);

        let discovered = bridge.update(now);

        assert_eq!(discovered.outdoor, vec!["10.00.00"]);
        assert!(discovered.indoor.is_empty());
    }

    #[test]
    fn process_frame_counts_failures() {
        let mut bridge = bridge(
            Config::builder().debug_log_messages_raw(true).build(),
            MemorySink::connected(),
        );

        assert!(bridge.process_frame(&[0x32, 0x00, 0x02, 0x34]).is_none());
        assert_eq!(bridge.stats.unknown, 1);

        let mut dat = hex::decode(SINGLE).unwrap();
        dat[15] ^= 0x01;
        assert!(bridge.process_frame(&dat).is_none());
        assert_eq!(bridge.stats.decode_errors, 1);

        let summary = bridge.process_frame(&hex::decode(SINGLE).unwrap()).unwrap();
        assert_eq!(summary.published, 1);
        assert_eq!(bridge.stats.packets, 1);
        assert_eq!(bridge.stats.published, 1);
    }

    #[test]
    fn run_until_closed() {
        let config = Config::builder().update_interval_ms(1).build();
        let mut bridge = bridge(config, MemorySink::default());
        let frame = hex::decode(SINGLE).unwrap();
        let mut src: VecDeque<u8> = [frame.clone(), frame].concat().into();

        bridge.run(&mut src);

        assert_eq!(bridge.stats.packets, 2);
        assert_eq!(bridge.sink().published.len(), 2);
    }

    #[test]
    fn raw_logging_does_not_change_outcome() {
        let mut dat = hex::decode(SINGLE).unwrap();
        dat.resize(Packet::MAX_LEN + 1, 0x00);

        for raw in [false, true] {
            let mut bridge = bridge(
                Config::builder().debug_log_messages_raw(raw).build(),
                MemorySink::connected(),
            );
            assert!(bridge.process_frame(&dat).is_none());
            assert_eq!(bridge.stats.unknown, 1);
            assert!(bridge.process_frame(&hex::decode(SINGLE).unwrap()).is_some());
            assert_eq!(bridge.stats.published, 1);
        }
    }
}

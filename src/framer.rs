use std::io::{BufReader, Read};
use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::nasa::START_BYTE;
use crate::Result;

/// Framer receive state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// Waiting for a start byte; anything else is dropped.
    Idle,
    /// Accumulating a frame.
    Receiving,
}

/// Counters describing what the framer has seen.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Frames handed out.
    pub frames: usize,
    /// In-flight frames dropped because a new start byte arrived.
    pub resyncs: usize,
    /// In-flight frames dropped because the sender stalled.
    pub timeouts: usize,
}

/// Framer reconstructs frames from a byte stream one byte at a time.
///
/// A frame starts at a start byte and its length is taken from the 2 bytes that follow, so
/// the framer only needs to count. Only one frame is ever in flight.
pub struct Framer {
    state: State,
    // Bytes accumulated for the current frame, including the start byte
    bytes_seen: usize,
    // Declared size from frame bytes 2 and 3, the frame length minus 2
    size: usize,
    buf: Vec<u8>,
    last_byte: Option<Instant>,
    timeout: Duration,
    resync: bool,
    pub stats: Stats,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl Framer {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

    /// Creates a new ``Framer`` that abandons a frame when no byte arrived for `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Framer {
            state: State::Idle,
            bytes_seen: 0,
            size: 0,
            buf: Vec::new(),
            last_byte: None,
            timeout,
            resync: true,
            stats: Stats::default(),
        }
    }

    /// Whether a start byte seen mid-frame restarts framing at that byte. When disabled a
    /// start byte inside a frame is treated as frame data.
    #[must_use]
    pub fn with_resync(mut self, resync: bool) -> Self {
        self.resync = resync;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Bytes of the frame currently in flight.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    fn start(&mut self) {
        self.state = State::Receiving;
        self.bytes_seen = 0;
        self.size = 0;
        self.buf.clear();
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.bytes_seen = 0;
        self.size = 0;
        self.buf.clear();
    }

    /// Feed a single byte received at `now`, returning the frame it completes, if any.
    ///
    /// Returned frames are complete as far as their declared size goes but otherwise
    /// unvalidated.
    pub fn push(&mut self, byte: u8, now: Instant) -> Option<Vec<u8>> {
        if byte == START_BYTE {
            match self.state {
                State::Idle => self.start(),
                State::Receiving if self.resync => {
                    debug!(
                        "start byte while receiving; dropping {} bytes",
                        self.bytes_seen
                    );
                    self.stats.resyncs += 1;
                    self.start();
                }
                State::Receiving => (),
            }
        }
        if self.state == State::Idle {
            return None;
        }

        self.buf.push(byte);
        self.bytes_seen += 1;
        self.last_byte = Some(now);

        match self.bytes_seen {
            1 => (),
            2 => self.size = usize::from(byte),
            3 => {
                self.size = self.size << 8 | usize::from(byte);
                trace!("message size in packet: {}", self.size);
            }
            // The declared size does not count the start byte and the first size byte
            n if n >= self.size + 2 => {
                self.state = State::Idle;
                self.bytes_seen = 0;
                self.stats.frames += 1;
                return Some(mem::take(&mut self.buf));
            }
            _ => (),
        }
        None
    }

    /// Abandon the in-flight frame if the last byte arrived at least the timeout before
    /// `now`. Returns true if a frame was abandoned.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.state != State::Receiving {
            return false;
        }
        let Some(last) = self.last_byte else {
            return false;
        };
        if now.saturating_duration_since(last) < self.timeout {
            return false;
        }
        warn!(
            "last transmission too long ago; dropping {} bytes",
            self.bytes_seen
        );
        self.stats.timeouts += 1;
        self.reset();
        true
    }
}

/// Iterates over the frames found in a reader. Created using [read_frames].
pub struct FrameIter<R>
where
    R: Read,
{
    bytes: std::io::Bytes<BufReader<R>>,
    framer: Framer,
}

impl<R> FrameIter<R>
where
    R: Read,
{
    pub fn new(reader: R, framer: Framer) -> Self {
        FrameIter {
            bytes: BufReader::new(reader).bytes(),
            framer,
        }
    }
}

impl<R> Iterator for FrameIter<R>
where
    R: Read,
{
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        for zult in self.bytes.by_ref() {
            match zult {
                Ok(b) => {
                    if let Some(frame) = self.framer.push(b, Instant::now()) {
                        return Some(Ok(frame));
                    }
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
        None
    }
}

/// Creates an iterator over the frames in a captured byte stream.
///
/// Frames are only delimited here, not validated; pass them to
/// [Packet::decode](crate::Packet::decode). A partial frame at the end of the stream is
/// dropped.
pub fn read_frames<R>(reader: R) -> FrameIter<R>
where
    R: Read,
{
    FrameIter::new(reader, Framer::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = "320012100000b000ffc0157f01820400c8e7b034";

    fn push_all(framer: &mut Framer, dat: &[u8], now: Instant) -> Vec<Vec<u8>> {
        dat.iter().filter_map(|b| framer.push(*b, now)).collect()
    }

    #[test]
    fn frames_with_leading_garbage() {
        let now = Instant::now();
        let mut framer = Framer::default();
        let mut dat = vec![0x00, 0xff, 0x34];
        dat.extend(hex::decode(SINGLE).unwrap());

        let frames = push_all(&mut framer, &dat, now);

        assert_eq!(frames, vec![hex::decode(SINGLE).unwrap()]);
        assert_eq!(framer.state(), State::Idle);
        assert_eq!(framer.stats.frames, 1);
    }

    #[test]
    fn back_to_back_frames() {
        let now = Instant::now();
        let mut framer = Framer::default();
        let frame = hex::decode(SINGLE).unwrap();
        let dat = [frame.clone(), frame.clone()].concat();

        let frames = push_all(&mut framer, &dat, now);

        assert_eq!(frames, vec![frame.clone(), frame]);
    }

    #[test]
    fn completes_on_declared_size_only() {
        let now = Instant::now();
        let mut framer = Framer::default();
        // declares 6, i.e., 8 bytes total, whatever the bytes are
        let frames = push_all(&mut framer, &[0x32, 0x00, 0x06, 1, 2, 3, 4, 5, 6], now);
        assert_eq!(frames, vec![vec![0x32, 0x00, 0x06, 1, 2, 3, 4, 5]]);
        assert_eq!(framer.state(), State::Idle);
    }

    #[test]
    fn start_byte_mid_frame_resyncs() {
        let now = Instant::now();
        let mut framer = Framer::default();
        let frame = hex::decode(SINGLE).unwrap();
        let dat = [&frame[..7], &frame[..]].concat();

        let frames = push_all(&mut framer, &dat, now);

        assert_eq!(frames, vec![frame]);
        assert_eq!(framer.stats.resyncs, 1);
    }

    #[test]
    fn start_byte_mid_frame_is_data_without_resync() {
        let now = Instant::now();
        let mut framer = Framer::default().with_resync(false);
        let dat = [0x32, 0x00, 0x06, 0x32, 0x32, 0x32, 0x32, 0x34];

        let frames = push_all(&mut framer, &dat, now);

        assert_eq!(frames, vec![dat.to_vec()]);
        assert_eq!(framer.stats.resyncs, 0);
    }

    #[test]
    fn stalled_frame_expires() {
        let start = Instant::now();
        let mut framer = Framer::default();
        let frame = hex::decode(SINGLE).unwrap();

        assert!(push_all(&mut framer, &frame[..9], start).is_empty());
        assert_eq!(framer.state(), State::Receiving);

        assert!(!framer.expire(start + Duration::from_millis(100)));
        assert_eq!(framer.pending().len(), 9);

        assert!(framer.expire(start + Duration::from_millis(600)));
        assert_eq!(framer.state(), State::Idle);
        assert!(framer.pending().is_empty());
        assert_eq!(framer.stats.timeouts, 1);

        // nothing from the abandoned frame leaks into the next one
        let later = start + Duration::from_millis(700);
        assert_eq!(push_all(&mut framer, &frame, later), vec![frame]);
    }

    #[test]
    fn idle_framer_never_expires() {
        let mut framer = Framer::default();
        assert!(!framer.expire(Instant::now() + Duration::from_secs(10)));
        assert_eq!(framer.stats.timeouts, 0);
    }

    #[test]
    fn read_frames_from_reader() {
        let frame = hex::decode(SINGLE).unwrap();
        let dat = [&[0x00, 0x01][..], &frame, &frame[..5]].concat();

        let frames: Vec<Vec<u8>> = read_frames(&dat[..]).filter_map(|z| z.ok()).collect();

        assert_eq!(frames, vec![frame]);
    }
}

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::thread;

use crossbeam::channel::{bounded, Receiver, TryRecvError};
use tracing::{debug, error};

/// A byte stream that is polled rather than blocked on.
pub trait ByteSource {
    /// Next available byte, or `None` if no byte is available right now.
    fn next_byte(&mut self) -> Option<u8>;

    /// True once no more bytes will ever become available.
    fn is_closed(&self) -> bool {
        false
    }
}

impl ByteSource for VecDeque<u8> {
    fn next_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }

    fn is_closed(&self) -> bool {
        self.is_empty()
    }
}

/// Bytes provides non-blocking access to a blocking reader.
///
/// The reader is drained by a background thread that hands over chunks as they arrive.
/// Everything else stays with the owner of the ``Bytes``, which only ever takes what has
/// already arrived.
pub struct Bytes {
    rx: Receiver<Vec<u8>>,
    cache: VecDeque<u8>,
    num_read: usize,
    closed: bool,
}

impl Bytes {
    const DEFAULT_BUFFER_SIZE: usize = 1024;
    const CHUNK_SIZE: usize = 256;

    /// Start reading `reader` on a background thread.
    ///
    /// # Errors
    /// If the reader thread cannot be spawned.
    pub fn new<R>(mut reader: R) -> std::io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = bounded(Self::DEFAULT_BUFFER_SIZE);

        thread::Builder::new()
            .name("nasa_reader".into())
            .spawn(move || {
                let mut buf = [0u8; Self::CHUNK_SIZE];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => {
                            debug!("input reached EOF");
                            break;
                        }
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                        Err(err) => {
                            error!("reading input failed: {err}");
                            break;
                        }
                    }
                }
            })?;

        Ok(Bytes {
            rx,
            cache: VecDeque::new(),
            num_read: 0,
            closed: false,
        })
    }

    /// Number of bytes handed out so far.
    pub fn offset(&self) -> usize {
        self.num_read
    }
}

impl ByteSource for Bytes {
    fn next_byte(&mut self) -> Option<u8> {
        loop {
            if let Some(b) = self.cache.pop_front() {
                self.num_read += 1;
                return Some(b);
            }
            match self.rx.try_recv() {
                Ok(chunk) => self.cache.extend(chunk),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    /// True once the reader has finished and every byte it produced was consumed.
    fn is_closed(&self) -> bool {
        self.closed && self.cache.is_empty()
    }
}

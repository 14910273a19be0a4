#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid start byte {0:#04x}")]
    BadStartByte(u8),
    #[error("invalid end byte {0:#04x}")]
    BadEndByte(u8),
    #[error("unexpected size - should be between 16 and 1500 but is {0}")]
    BadSize(usize),
    #[error("message size did not match data size - message says {declared}, real size is {actual}")]
    SizeMismatch { declared: usize, actual: usize },
    #[error("invalid crc - calculated {calculated:#06x} but message says {expected:#06x}")]
    CrcMismatch { calculated: u16, expected: u16 },

    #[error("Not enough bytes")]
    NotEnoughData {
        /// Number of bytes we got
        actual: usize,
        /// Minimum number of expected bytes
        minimum: usize,
    },

    /// A structure message set shared its packet with other message sets.
    #[error("structure messages can only have one message but packet has {0}")]
    StructureNotAlone(usize),

    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

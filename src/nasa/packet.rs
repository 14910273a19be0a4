use std::fmt::Display;

use serde::Serialize;

use super::{Address, Command, MessageSet};
use crate::crc::crc16;
use crate::{Error, Result};

/// First byte of every frame.
pub const START_BYTE: u8 = 0x32;
/// Last byte of every frame.
pub const END_BYTE: u8 = 0x34;

/// A decoded NASA packet.
///
/// Frames look like
/// ```text
/// [0x32][size:2][source:3][destination:3][command:3][count:1][message set]*[crc:2][0x34]
/// ```
/// where `size` is the frame length minus 2 and the CRC covers everything between the size
/// and the CRC itself.
///
/// # Example
/// ```
/// use nasa::{DataType, Packet};
///
/// let dat: &[u8] = &[
///     0x32, 0x00, 0x12,
///     // source and destination addresses
///     0x10, 0x00, 0x00, 0xb0, 0x00, 0xff,
///     // command: normal response, packet number 0x7f
///     0xc0, 0x15, 0x7f,
///     // one variable message set, 0x8204 = 200
///     0x01, 0x82, 0x04, 0x00, 0xc8,
///     // crc and end byte
///     0xe7, 0xb0, 0x34,
/// ];
/// let packet = Packet::decode(dat).unwrap();
/// assert_eq!(packet.source.to_string(), "10.00.00");
/// assert_eq!(packet.command.data_type, DataType::Response);
/// assert_eq!(packet.messages[0].int_value(), Some(200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    pub source: Address,
    pub destination: Address,
    pub command: Command,
    pub messages: Vec<MessageSet>,
}

impl Packet {
    /// Smallest valid frame length.
    pub const MIN_LEN: usize = 16;
    /// Largest valid frame length.
    pub const MAX_LEN: usize = 1500;
    /// Start byte plus the two size bytes.
    const HEADER_LEN: usize = 3;
    /// CRC plus end byte.
    const FOOTER_LEN: usize = 3;

    /// Validate and decode a complete frame.
    ///
    /// # Errors
    /// One of [Error::BadStartByte], [Error::BadEndByte], [Error::BadSize],
    /// [Error::SizeMismatch] or [Error::CrcMismatch] if the frame is not valid, in that order
    /// of precedence, or any error decoding the contained fields.
    pub fn decode(dat: &[u8]) -> Result<Packet> {
        let (Some(&first), Some(&last)) = (dat.first(), dat.last()) else {
            return Err(Error::BadSize(0));
        };
        if first != START_BYTE {
            return Err(Error::BadStartByte(first));
        }
        if last != END_BYTE {
            return Err(Error::BadEndByte(last));
        }
        if dat.len() < Self::MIN_LEN || dat.len() > Self::MAX_LEN {
            return Err(Error::BadSize(dat.len()));
        }

        let size = u16::from_be_bytes([dat[1], dat[2]]) as usize;
        if size + 2 != dat.len() {
            return Err(Error::SizeMismatch {
                declared: size,
                actual: dat.len() - 2,
            });
        }

        let crc_idx = dat.len() - Self::FOOTER_LEN;
        let calculated = crc16(dat, Self::HEADER_LEN, size - 4);
        let expected = u16::from_be_bytes([dat[crc_idx], dat[crc_idx + 1]]);
        if calculated != expected {
            return Err(Error::CrcMismatch {
                calculated,
                expected,
            });
        }

        // Everything up to the CRC; a structure message set takes whatever remains of it.
        let body = &dat[..crc_idx];
        let mut cursor = Self::HEADER_LEN;

        let source = Address::decode(body, cursor)?;
        cursor += Address::LEN;
        let destination = Address::decode(body, cursor)?;
        cursor += Address::LEN;
        let command = Command::decode(body, cursor)?;
        cursor += Command::LEN;

        let count = *body.get(cursor).ok_or(Error::NotEnoughData {
            actual: 0,
            minimum: 1,
        })? as usize;
        cursor += 1;

        let mut messages = Vec::with_capacity(count);
        for _ in 0..count {
            let message = MessageSet::decode(body, cursor, count)?;
            cursor += message.encoded_len();
            messages.push(message);
        }

        Ok(Packet {
            source,
            destination,
            command,
            messages,
        })
    }
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "#Packet Sa:{} Da:{}", self.source, self.destination)?;
        write!(f, "Command: {}", self.command)?;
        for message in &self.messages {
            write!(f, "\nMessage: {message}")?;
        }
        Ok(())
    }
}

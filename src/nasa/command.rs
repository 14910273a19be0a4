use std::fmt::Display;

use serde::Serialize;

use crate::{Error, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PacketType {
    StandBy,
    Normal,
    Gathering,
    Install,
    Download,
    Unknown(u8),
}

impl From<u8> for PacketType {
    fn from(nibble: u8) -> Self {
        match nibble {
            0 => Self::StandBy,
            1 => Self::Normal,
            2 => Self::Gathering,
            3 => Self::Install,
            4 => Self::Download,
            x => Self::Unknown(x),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(value: PacketType) -> Self {
        match value {
            PacketType::StandBy => 0,
            PacketType::Normal => 1,
            PacketType::Gathering => 2,
            PacketType::Install => 3,
            PacketType::Download => 4,
            PacketType::Unknown(x) => x,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum DataType {
    Undefined,
    Read,
    Write,
    Request,
    Notification,
    Response,
    Ack,
    Nack,
    Unknown(u8),
}

impl From<u8> for DataType {
    fn from(nibble: u8) -> Self {
        match nibble {
            0 => Self::Undefined,
            1 => Self::Read,
            2 => Self::Write,
            3 => Self::Request,
            4 => Self::Notification,
            5 => Self::Response,
            6 => Self::Ack,
            7 => Self::Nack,
            x => Self::Unknown(x),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::Undefined => 0,
            DataType::Read => 1,
            DataType::Write => 2,
            DataType::Request => 3,
            DataType::Notification => 4,
            DataType::Response => 5,
            DataType::Ack => 6,
            DataType::Nack => 7,
            DataType::Unknown(x) => x,
        }
    }
}

/// The 3-byte command field following the addresses.
///
/// ```text
/// byte 0: [7] packet information  [6:5] protocol version  [4:3] retry count  [2:0] unused
/// byte 1: [7:4] packet type  [3:0] data type
/// byte 2: packet number
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub packet_information: bool,
    pub protocol_version: u8,
    pub retry_count: u8,
    pub packet_type: PacketType,
    pub data_type: DataType,
    pub packet_number: u8,
}

impl Command {
    /// Size of an encoded ``Command``
    pub const LEN: usize = 3;

    /// Decode the command starting at `index`.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if fewer than 3 bytes are available at `index`.
    pub fn decode(dat: &[u8], index: usize) -> Result<Self> {
        let Some(buf) = dat.get(index..index + Self::LEN) else {
            return Err(Error::NotEnoughData {
                actual: dat.len().saturating_sub(index),
                minimum: Self::LEN,
            });
        };

        Ok(Command {
            packet_information: buf[0] >> 7 & 0x1 == 1,
            protocol_version: buf[0] >> 5 & 0x3,
            retry_count: buf[0] >> 3 & 0x3,
            packet_type: PacketType::from(buf[1] >> 4 & 0xf),
            data_type: DataType::from(buf[1] & 0xf),
            packet_number: buf[2],
        })
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{PacketInformation: {}; ProtocolVersion: {}; RetryCount: {}; PacketType: {}; DataType: {}; PacketNumber: {}}}",
            u8::from(self.packet_information),
            self.protocol_version,
            self.retry_count,
            u8::from(self.packet_type),
            u8::from(self.data_type),
            self.packet_number,
        )
    }
}

use std::fmt::Display;

use serde::Serialize;

use crate::{Error, Result};

/// Message identifier. Bits 9-10 select the value encoding, see [MessageKind].
pub type MessageNumber = u16;

/// Value encoding of a message set, derived from its [MessageNumber].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    Enum,
    Variable,
    LongVariable,
    Structure,
}

impl MessageKind {
    #[must_use]
    pub fn of(number: MessageNumber) -> Self {
        match number >> 9 & 0b11 {
            0 => Self::Enum,
            1 => Self::Variable,
            2 => Self::LongVariable,
            _ => Self::Structure,
        }
    }

    /// Topic segment used for debug publishing. Structures carry no numeric value and are
    /// never published, so they have none.
    #[must_use]
    pub fn topic_name(&self) -> Option<&'static str> {
        match self {
            Self::Enum => Some("enum"),
            Self::Variable => Some("var"),
            Self::LongVariable => Some("var_long"),
            Self::Structure => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageValue {
    Enum(u8),
    Variable(u16),
    LongVariable(i32),
    Structure(Vec<u8>),
}

/// One data item within a packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSet {
    pub number: MessageNumber,
    pub value: MessageValue,
}

impl MessageSet {
    const NUMBER_LEN: usize = 2;

    #[must_use]
    pub fn kind(&self) -> MessageKind {
        MessageKind::of(self.number)
    }

    /// Numeric value of this message, `None` for structures.
    #[must_use]
    pub fn int_value(&self) -> Option<i32> {
        match &self.value {
            MessageValue::Enum(x) => Some(i32::from(*x)),
            MessageValue::Variable(x) => Some(i32::from(*x)),
            MessageValue::LongVariable(x) => Some(*x),
            MessageValue::Structure(_) => None,
        }
    }

    /// Number of encoded bytes this message set occupies, including the identifier.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        Self::NUMBER_LEN
            + match &self.value {
                MessageValue::Enum(_) => 1,
                MessageValue::Variable(_) => 2,
                MessageValue::LongVariable(_) => 4,
                MessageValue::Structure(buf) => buf.len(),
            }
    }

    /// Decode the message set starting at `index`.
    ///
    /// `dat` must end where the packet's message sets end, i.e., without the CRC and end
    /// marker, because a structure takes all remaining bytes. `count` is the number of message
    /// sets the packet declares.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the value runs past the end of `dat`, or
    /// [Error::StructureNotAlone] for a structure in a packet with more than one message set.
    pub fn decode(dat: &[u8], index: usize, count: usize) -> Result<Self> {
        let not_enough = |minimum: usize| Error::NotEnoughData {
            actual: dat.len().saturating_sub(index),
            minimum,
        };
        let Some(id) = dat.get(index..index + Self::NUMBER_LEN) else {
            return Err(not_enough(Self::NUMBER_LEN));
        };
        let number = u16::from_be_bytes([id[0], id[1]]);
        let start = index + Self::NUMBER_LEN;

        let value = match MessageKind::of(number) {
            MessageKind::Enum => {
                let buf = dat.get(start..start + 1).ok_or_else(|| not_enough(3))?;
                MessageValue::Enum(buf[0])
            }
            MessageKind::Variable => {
                let buf = dat.get(start..start + 2).ok_or_else(|| not_enough(4))?;
                MessageValue::Variable(u16::from_be_bytes([buf[0], buf[1]]))
            }
            MessageKind::LongVariable => {
                let buf = dat.get(start..start + 4).ok_or_else(|| not_enough(6))?;
                MessageValue::LongVariable(i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
            }
            MessageKind::Structure => {
                if count != 1 {
                    return Err(Error::StructureNotAlone(count));
                }
                MessageValue::Structure(dat[start..].to_vec())
            }
        };

        Ok(MessageSet { number, value })
    }
}

impl Display for MessageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            MessageValue::Enum(x) => write!(f, "Enum {:02x} {x}", self.number),
            MessageValue::Variable(x) => write!(f, "Variable {:02x} {x}", self.number),
            MessageValue::LongVariable(x) => write!(f, "LongVariable {:02x} {x}", self.number),
            MessageValue::Structure(buf) => {
                write!(f, "Structure #{:02x} {}", self.number, buf.len())
            }
        }
    }
}

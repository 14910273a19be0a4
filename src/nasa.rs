//! NASA packet decoding.
//!
//! Each field codec decodes from a buffer at an offset and reports how many bytes it
//! consumed, so a packet is decoded by walking a single cursor through the frame.
mod address;
mod command;
mod message;
mod packet;

pub use address::{is_nasa_address, Address, AddressClass};
pub use command::{Command, DataType, PacketType};
pub use message::{MessageKind, MessageNumber, MessageSet, MessageValue};
pub use packet::{Packet, END_BYTE, START_BYTE};

#![doc = include_str!("../README.md")]

mod error;

pub mod bridge;
pub mod bytes;
pub mod catalog;
pub mod config;
pub mod crc;
pub mod dispatch;
pub mod framer;
pub mod nasa;
pub mod registry;
pub mod sink;

pub use error::{Error, Result};
pub use nasa::{
    Address, AddressClass, Command, DataType, MessageKind, MessageNumber, MessageSet,
    MessageValue, Packet, PacketType,
};

use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Device class of a bus participant.
///
/// Classes not in this table are kept as [AddressClass::Unknown] rather than rejected so
/// newer devices still decode. Classes order by their byte value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AddressClass {
    Outdoor,
    Htu,
    Indoor,
    Erv,
    Diffuser,
    Mcu,
    Rmc,
    WiredRemote,
    Pim,
    Sim,
    Peak,
    PowerDivider,
    OnOffController,
    WiFiKit,
    CentralController,
    Dms,
    JigTester,
    BroadcastSelfLayer,
    BroadcastControlLayer,
    BroadcastSetLayer,
    BroadcastControlAndSetLayer,
    BroadcastModuleLayer,
    BroadcastCsm,
    BroadcastLocalLayer,
    BroadcastCsml,
    Undefined,
    Unknown(u8),
}

impl From<u8> for AddressClass {
    fn from(byte: u8) -> Self {
        match byte {
            0x10 => Self::Outdoor,
            0x11 => Self::Htu,
            0x20 => Self::Indoor,
            0x30 => Self::Erv,
            0x35 => Self::Diffuser,
            0x38 => Self::Mcu,
            0x40 => Self::Rmc,
            0x50 => Self::WiredRemote,
            0x58 => Self::Pim,
            0x59 => Self::Sim,
            0x5a => Self::Peak,
            0x5b => Self::PowerDivider,
            0x60 => Self::OnOffController,
            0x62 => Self::WiFiKit,
            0x65 => Self::CentralController,
            0x6a => Self::Dms,
            0x80 => Self::JigTester,
            0xb0 => Self::BroadcastSelfLayer,
            0xb1 => Self::BroadcastControlLayer,
            0xb2 => Self::BroadcastSetLayer,
            0xb3 => Self::BroadcastControlAndSetLayer,
            0xb4 => Self::BroadcastModuleLayer,
            0xb7 => Self::BroadcastCsm,
            0xb8 => Self::BroadcastLocalLayer,
            0xbf => Self::BroadcastCsml,
            0xff => Self::Undefined,
            x => Self::Unknown(x),
        }
    }
}

impl From<AddressClass> for u8 {
    fn from(class: AddressClass) -> u8 {
        match class {
            AddressClass::Outdoor => 0x10,
            AddressClass::Htu => 0x11,
            AddressClass::Indoor => 0x20,
            AddressClass::Erv => 0x30,
            AddressClass::Diffuser => 0x35,
            AddressClass::Mcu => 0x38,
            AddressClass::Rmc => 0x40,
            AddressClass::WiredRemote => 0x50,
            AddressClass::Pim => 0x58,
            AddressClass::Sim => 0x59,
            AddressClass::Peak => 0x5a,
            AddressClass::PowerDivider => 0x5b,
            AddressClass::OnOffController => 0x60,
            AddressClass::WiFiKit => 0x62,
            AddressClass::CentralController => 0x65,
            AddressClass::Dms => 0x6a,
            AddressClass::JigTester => 0x80,
            AddressClass::BroadcastSelfLayer => 0xb0,
            AddressClass::BroadcastControlLayer => 0xb1,
            AddressClass::BroadcastSetLayer => 0xb2,
            AddressClass::BroadcastControlAndSetLayer => 0xb3,
            AddressClass::BroadcastModuleLayer => 0xb4,
            AddressClass::BroadcastCsm => 0xb7,
            AddressClass::BroadcastLocalLayer => 0xb8,
            AddressClass::BroadcastCsml => 0xbf,
            AddressClass::Undefined => 0xff,
            AddressClass::Unknown(x) => x,
        }
    }
}

impl Ord for AddressClass {
    fn cmp(&self, other: &Self) -> Ordering {
        u8::from(*self).cmp(&u8::from(*other))
    }
}

impl PartialOrd for AddressClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bus address of a device, rendered as `cc.ch.aa`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub class: AddressClass,
    pub channel: u8,
    pub unit: u8,
}

impl Address {
    /// Size of an encoded ``Address``
    pub const LEN: usize = 3;

    /// The address this bridge would use on the bus, `80.ff.00`.
    pub const OWN: Address = Address {
        class: AddressClass::JigTester,
        channel: 0xff,
        unit: 0,
    };

    /// Decode the address starting at `index`.
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
        Ok(Address {
            class: AddressClass::from(buf[0]),
            channel: buf[1],
            unit: buf[2],
        })
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}.{:02x}.{:02x}",
            u8::from(self.class),
            self.channel,
            self.unit
        )
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; Self::LEN];
        for (dst, part) in bytes.iter_mut().zip(parts) {
            *dst = u8::from_str_radix(part, 16).map_err(|_| Error::InvalidAddress(s.to_string()))?;
        }
        Ok(Address {
            class: AddressClass::from(bytes[0]),
            channel: bytes[1],
            unit: bytes[2],
        })
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Addresses of pre-NASA devices are only 2 characters long.
#[must_use]
pub fn is_nasa_address(address: &str) -> bool {
    address.len() != 2
}

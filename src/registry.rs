use std::collections::BTreeSet;
use std::fmt::Display;

use serde::Serialize;

use crate::nasa::is_nasa_address;

/// Textual addresses of every device seen as a packet source.
///
/// Grows for the life of the process; nothing is ever removed.
#[derive(Debug, Default, Clone)]
pub struct KnownAddresses {
    addresses: BTreeSet<String>,
}

impl KnownAddresses {
    /// Record an address, returning true if it had not been seen before.
    pub fn insert<S: Into<String>>(&mut self, address: S) -> bool {
        self.addresses.insert(address.into())
    }

    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addresses.iter().map(String::as_str)
    }

    /// Group the known addresses by kind of device.
    #[must_use]
    pub fn discovered(&self) -> Discovered {
        let mut report = Discovered::default();
        for address in &self.addresses {
            if address == "00" || address.starts_with("10.") {
                report.outdoor.push(address.clone());
            } else if !is_nasa_address(address) || address.starts_with("20.") {
                report.indoor.push(address.clone());
            } else {
                report.other.push(address.clone());
            }
        }
        report
    }
}

/// Known addresses grouped into outdoor units, indoor units and everything else.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Discovered {
    pub outdoor: Vec<String>,
    pub indoor: Vec<String>,
    pub other: Vec<String>,
}

fn join(addresses: &[String]) -> String {
    if addresses.is_empty() {
        "-".to_string()
    } else {
        addresses.join(", ")
    }
}

impl Display for Discovered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Outdoor: {}; Indoor: {}",
            join(&self.outdoor),
            join(&self.indoor)
        )?;
        if !self.other.is_empty() {
            write!(f, "; Other: {}", join(&self.other))?;
        }
        Ok(())
    }
}

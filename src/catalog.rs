use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::nasa::MessageNumber;
use crate::Result;

const MESSAGESDB: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/src/messagesdb.json"));

/// A known message number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "from_hex")]
    pub number: MessageNumber,
    pub name: String,
    /// Whether the message is forwarded under the canonical namespace.
    #[serde(default = "default_publish")]
    pub publish: bool,
}

fn default_publish() -> bool {
    true
}

fn from_hex<'de, D>(deserializer: D) -> std::result::Result<MessageNumber, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(&s);
    MessageNumber::from_str_radix(digits, 16).map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
struct DB {
    #[allow(dead_code)]
    version: String,
    messages: Vec<Message>,
}

/// Message number database.
///
/// Decides which message numbers are forwarded to the canonical namespace and gives them a
/// name for logging. The default implementation uses a database embedded at compile-time.
/// To use a specific/custom database use [with_file](Catalog::with_file).
///
/// # Example
/// ```
/// use nasa::catalog::Catalog;
///
/// let catalog = Catalog::default();
/// assert!(catalog.is_relevant(0x4203));
/// assert_eq!(catalog.name(0x4203), Some("VAR_IN_TEMP_ROOM_F_4203"));
/// assert!(!catalog.is_relevant(0x8401));
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    messages: HashMap<MessageNumber, Message>,
    relevant: HashSet<MessageNumber>,
}

impl Default for Catalog {
    fn default() -> Self {
        let db: DB = serde_json::from_str(MESSAGESDB).expect("built-in message db is not valid");
        Self::from_messages(db.messages)
    }
}

impl Catalog {
    fn from_messages(messages: Vec<Message>) -> Self {
        let relevant = messages
            .iter()
            .filter(|m| m.publish)
            .map(|m| m.number)
            .collect();
        let messages = messages.into_iter().map(|m| (m.number, m)).collect();
        Catalog { messages, relevant }
    }

    /// Load a message database from `path`.
    ///
    /// If `built_in` is true the embedded database is merged in; entries from the file take
    /// precedence, so a file can also turn forwarding of a built-in message off.
    ///
    /// # Errors
    /// If the file cannot be read or is not a valid database.
    pub fn with_file<P: AsRef<Path>>(path: P, built_in: bool) -> Result<Catalog> {
        let mut db: DB = serde_json::from_reader(File::open(path)?)?;
        let file_ids: HashSet<MessageNumber> = db.messages.iter().map(|m| m.number).collect();

        if built_in {
            let builtin: DB =
                serde_json::from_str(MESSAGESDB).expect("built-in message db is not valid");
            for msg in builtin.messages {
                // skip any that already exist from the file
                if file_ids.contains(&msg.number) {
                    continue;
                }
                db.messages.push(msg);
            }
        }

        Ok(Self::from_messages(db.messages))
    }

    /// True if `number` should be published under the canonical namespace.
    #[must_use]
    pub fn is_relevant(&self, number: MessageNumber) -> bool {
        self.relevant.contains(&number)
    }

    #[must_use]
    pub fn name(&self, number: MessageNumber) -> Option<&str> {
        self.messages.get(&number).map(|m| m.name.as_str())
    }

    /// Number of known messages, forwarded or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::nasa::{DataType, MessageKind, MessageNumber, MessageSet, Packet};
use crate::registry::KnownAddresses;
use crate::sink::Sink;

/// What happened to the messages of one packet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Values published under the canonical namespace.
    pub published: usize,
    /// Values published under the debug namespace.
    pub debug_published: usize,
    /// Allow-listed values dropped because the sink was not connected.
    pub dropped: usize,
    /// Messages not on the allow-list.
    pub skipped: usize,
}

/// Decides what gets published for each decoded packet and tracks the devices seen.
///
/// Only response packets carry values worth republishing; every other data type is logged
/// and ignored. Values are never queued: with the sink disconnected they are dropped.
pub struct Dispatcher {
    catalog: Catalog,
    namespace: String,
    debug_namespace: String,
    debug_messages: bool,
    known: KnownAddresses,
}

impl Dispatcher {
    pub fn new(catalog: Catalog, config: &Config) -> Self {
        Dispatcher {
            catalog,
            namespace: config.namespace.clone(),
            debug_namespace: config.debug_namespace.clone(),
            debug_messages: config.debug_log_messages,
            known: KnownAddresses::default(),
        }
    }

    pub fn known_addresses(&self) -> &KnownAddresses {
        &self.known
    }

    /// Topic for an allow-listed value, e.g., `samsung_ehs/4203/state`.
    #[must_use]
    pub fn topic(&self, number: MessageNumber) -> String {
        format!("{}/{:02x}/state", self.namespace, number)
    }

    /// Debug topic for a message, e.g., `samsung_ehs_debug/nasa/var/4203`. Structures have
    /// none.
    #[must_use]
    pub fn debug_topic(&self, kind: MessageKind, number: MessageNumber) -> Option<String> {
        kind.topic_name()
            .map(|name| format!("{}/nasa/{}/{:02x}", self.debug_namespace, name, number))
    }

    pub fn dispatch<S>(&mut self, packet: &Packet, sink: &mut S) -> Summary
    where
        S: Sink + ?Sized,
    {
        let mut summary = Summary::default();
        if packet.command.data_type != DataType::Response {
            debug!("{:?} {packet}", packet.command.data_type);
            return summary;
        }

        let source = packet.source.to_string();
        if self.known.insert(source.as_str()) {
            debug!("new device {source}");
        }

        for message in &packet.messages {
            if self.debug_messages && sink.is_connected() {
                summary.debug_published += usize::from(self.publish_debug(message, sink));
            }

            if !self.catalog.is_relevant(message.number) {
                trace!(
                    "skipped message s:{} d:{} {message}",
                    packet.source,
                    packet.destination
                );
                summary.skipped += 1;
                continue;
            }
            let Some(value) = message.int_value() else {
                trace!("no value to publish for {message}");
                summary.skipped += 1;
                continue;
            };
            if !sink.is_connected() {
                trace!("sink not connected; dropping {message}");
                summary.dropped += 1;
                continue;
            }
            if sink.publish(&self.topic(message.number), &value.to_string()) {
                summary.published += 1;
            } else {
                debug!("publish failed; dropping {message}");
                summary.dropped += 1;
            }
        }

        summary
    }

    fn publish_debug<S>(&self, message: &MessageSet, sink: &mut S) -> bool
    where
        S: Sink + ?Sized,
    {
        match (
            message.int_value(),
            self.debug_topic(message.kind(), message.number),
        ) {
            (Some(value), Some(topic)) => sink.publish(&topic, &value.to_string()),
            _ => false,
        }
    }
}

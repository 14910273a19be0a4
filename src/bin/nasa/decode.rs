use std::fs::File;
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nasa::catalog::Catalog;
use nasa::framer::read_frames;
use nasa::{MessageNumber, Packet};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Serialize)]
struct Named<'a> {
    #[serde(flatten)]
    packet: &'a Packet,
    /// Catalog names of the message sets, in order; null for unknown numbers.
    names: Vec<Option<&'a str>>,
}

#[derive(Debug, Default)]
struct Summary {
    frames: usize,
    packets: usize,
    failed: usize,
}

fn names<'a>(
    catalog: &'a Catalog,
    numbers: impl Iterator<Item = MessageNumber>,
) -> Vec<Option<&'a str>> {
    numbers.map(|n| catalog.name(n)).collect()
}

pub fn decode(input: &Path, format: &Format, catalog: Option<&PathBuf>) -> Result<()> {
    let catalog = match catalog {
        Some(path) => Catalog::with_file(path, true)
            .with_context(|| format!("loading catalog {path:?}"))?,
        None => Catalog::default(),
    };
    let file = File::open(input).with_context(|| format!("opening input {input:?}"))?;

    let mut out = stdout().lock();
    let mut summary = Summary::default();
    for zult in read_frames(file) {
        let frame = zult.context("reading input")?;
        summary.frames += 1;
        let packet = match Packet::decode(&frame) {
            Ok(packet) => packet,
            Err(err) => {
                debug!("frame {} failed to decode: {err}", summary.frames);
                summary.failed += 1;
                continue;
            }
        };
        summary.packets += 1;

        match format {
            Format::Text => {
                writeln!(out, "{packet}")?;
                for message in &packet.messages {
                    if let Some(name) = catalog.name(message.number) {
                        writeln!(out, "  {:02x} {name}", message.number)?;
                    }
                }
            }
            Format::Json => {
                let named = Named {
                    packet: &packet,
                    names: names(&catalog, packet.messages.iter().map(|m| m.number)),
                };
                serde_json::to_writer(&mut out, &named)?;
                writeln!(out)?;
            }
        }
    }

    info!(
        "{} frames, {} packets, {} failed",
        summary.frames, summary.packets, summary.failed
    );
    Ok(())
}

use crate::{load_config, LinkKind};
use anyhow::{bail, Context, Result};
use colored::*;
use serde::{Deserialize, Serialize};
use spacelink_core::{
    ewc::{EwcDecoder, EwcMessage},
    ms200::Ms200Decoder,
    ExecutionContext, Ingress, LinkStack, MemoryDriver, PacketType, StatsSnapshot,
};
use std::fs;
use tracing::info;

/// A packet recovered from the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedPacket {
    pub src: u8,
    pub dst: u8,
    pub sport: u8,
    pub apid: u16,
    pub packet_type: PacketType,
    pub sequence: u16,
    /// Payload as hex
    pub payload: String,
    /// Parsed application message (EWC only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<EwcMessage>,
}

impl DecodedPacket {
    fn from_ingress(ingress: &Ingress, link: LinkKind) -> Self {
        let packet = &ingress.packet;
        let message = match link {
            LinkKind::Ms200 => None,
            LinkKind::Ewc => EwcMessage::parse(packet.payload()).ok(),
        };
        Self {
            src: packet.meta.src,
            dst: packet.meta.dst,
            sport: packet.meta.sport,
            apid: packet.meta.apid,
            packet_type: packet.meta.packet_type,
            sequence: packet.meta.sequence,
            payload: hex::encode(packet.payload()),
            message,
        }
    }
}

/// Outcome of a decode run
#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    pub packets: Vec<DecodedPacket>,
    pub stats: StatsSnapshot,
}

enum Decoder {
    Ms200(Ms200Decoder),
    Ewc(EwcDecoder),
}

impl Decoder {
    fn feed(&mut self, bytes: &[u8]) {
        match self {
            Decoder::Ms200(d) => d.feed(bytes, ExecutionContext::Task),
            Decoder::Ewc(d) => d.feed(bytes, ExecutionContext::Task),
        }
    }
}

pub fn execute(
    input: &str,
    output: Option<&str>,
    link: LinkKind,
    chunk: usize,
    config: Option<&str>,
) -> Result<DecodeReport> {
    if chunk == 0 {
        bail!("Chunk size must be at least 1");
    }
    info!("Decoding {:?} frames from {}", link, input);

    let config = load_config(config)?;
    let data = fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;

    info!("File size: {} bytes", data.len());

    let stack = LinkStack::new(&config.stack);
    let (iface, mut decoder) = match link {
        LinkKind::Ms200 => {
            let (iface, d) =
                spacelink_core::ms200::add_interface(&stack, MemoryDriver::new(), &config.link)?;
            (iface, Decoder::Ms200(d))
        }
        LinkKind::Ewc => {
            let (iface, d) =
                spacelink_core::ewc::add_interface(&stack, MemoryDriver::new(), &config.link)?;
            (iface, Decoder::Ewc(d))
        }
    };

    let mut packets = Vec::new();
    for piece in data.chunks(chunk) {
        decoder.feed(piece);
        // Keep the queue and pool from filling up on long captures
        packets.extend(
            stack
                .queue()
                .drain()
                .iter()
                .map(|ingress| DecodedPacket::from_ingress(ingress, link)),
        );
    }

    let stats = iface.stats().snapshot();

    println!("\n=== Decode Results ===");
    println!("Bytes processed:   {} bytes", data.len());
    println!("Packets received:  {}", stats.rx.to_string().green());
    println!("Payload bytes:     {} bytes", stats.rxbytes);
    let counted = [
        ("Frame errors:      ", stats.frame),
        ("Receive errors:    ", stats.rx_error),
        ("Dropped:           ", stats.drop),
    ];
    for (label, count) in counted {
        if count > 0 {
            println!("{}{}", label, count.to_string().red());
        } else {
            println!("{}{}", label, count);
        }
    }
    println!();

    let report = DecodeReport { packets, stats };

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&report.packets)
            .with_context(|| "Failed to serialize decoded packets")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Decoded packets written to: {}", output_path);
    } else {
        println!("=== Decoded Packets ===");
        for packet in &report.packets {
            println!(
                "{} apid {} seq {}: {} -> {} ({} bytes)",
                "✓".green(),
                packet.apid,
                packet.sequence,
                packet.src,
                packet.dst,
                packet.payload.len() / 2
            );
        }
    }

    Ok(report)
}

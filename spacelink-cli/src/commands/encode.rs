use crate::{load_config, LinkKind};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use spacelink_core::{
    ewc::{self, EwcMessage},
    ms200, LinkStack, MemoryDriver, PacketMeta, Route,
};
use std::fs;
use std::sync::Arc;
use tracing::info;

/// Turn the JSON payload list into packet payloads for the chosen link
fn payloads(values: &[Value], link: LinkKind) -> Result<Vec<Vec<u8>>> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| match link {
            LinkKind::Ms200 => {
                let text = value
                    .as_str()
                    .ok_or_else(|| anyhow!("Payload {} is not a hex string", i))?;
                hex::decode(text).with_context(|| format!("Payload {} is not valid hex", i))
            }
            LinkKind::Ewc => {
                let message: EwcMessage = serde_json::from_value(value.clone())
                    .with_context(|| format!("Payload {} is not an EWC message", i))?;
                Ok(message.to_bytes().to_vec())
            }
        })
        .collect()
}

pub fn execute(
    input: &str,
    output: &str,
    link: LinkKind,
    apid: u16,
    config: Option<&str>,
) -> Result<()> {
    info!("Encoding {:?} frames from {} to {}", link, input, output);

    let config = load_config(config)?;
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;
    let values: Vec<Value> =
        serde_json::from_str(&content).with_context(|| "Failed to parse JSON input")?;
    let payloads = payloads(&values, link)?;

    info!("Found {} payloads to encode", payloads.len());

    let stack = LinkStack::new(&config.stack);
    let driver = Arc::new(MemoryDriver::new());
    let iface = match link {
        LinkKind::Ms200 => ms200::add_interface(&stack, Arc::clone(&driver), &config.link)?.0,
        LinkKind::Ewc => ewc::add_interface(&stack, Arc::clone(&driver), &config.link)?.0,
    };
    let route = Route::direct(Arc::clone(&iface));

    let meta = PacketMeta {
        src: config.link.node,
        dst: config.link.host_node,
        apid,
        ..PacketMeta::default()
    };

    for (i, payload) in payloads.iter().enumerate() {
        let packet = stack.pool().packet_from(meta, payload).ok_or_else(|| {
            anyhow!(
                "Payload {} ({} bytes) does not fit a {} byte packet buffer",
                i,
                payload.len(),
                stack.pool().data_size()
            )
        })?;
        route
            .transmit(packet)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to encode payload {}", i))?;
    }

    let output_data = driver.take();
    fs::write(output, &output_data)
        .with_context(|| format!("Failed to write output file: {}", output))?;

    info!(
        "Successfully encoded {} frames ({} bytes total)",
        payloads.len(),
        output_data.len()
    );

    Ok(())
}

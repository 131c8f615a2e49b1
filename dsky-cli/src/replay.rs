//! Replay of a captured simulator byte stream

use crate::sim::SessionSummary;
use crate::transport::Peripherals;
use anyhow::{Context, Result};
use dsky_protocol::{Dispatcher, FrameCodec};
use std::fs;
use std::path::Path;

/// Decode a capture file as if it had arrived on the simulator socket
pub fn replay_file(
    path: &Path,
    dispatcher: &mut Dispatcher,
    peripherals: &mut Peripherals,
) -> Result<SessionSummary> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read capture file: {:?}", path))?;
    log::info!("Replaying {} bytes from {:?}", bytes.len(), path);
    replay_bytes(&bytes, dispatcher, peripherals)
}

pub fn replay_bytes(
    bytes: &[u8],
    dispatcher: &mut Dispatcher,
    peripherals: &mut Peripherals,
) -> Result<SessionSummary> {
    let mut codec = FrameCodec::new();
    for frame in codec.feed(bytes) {
        let commands = dispatcher.handle_frame(frame);
        peripherals
            .send_all(&commands)
            .with_context(|| format!("Failed to forward commands for {}", frame))?;
    }

    if codec.position() != 0 {
        log::warn!("Capture ends inside a frame (at byte {} of 4)", codec.position());
    }

    Ok(SessionSummary {
        bytes: bytes.len(),
        frames: codec.stats(),
        dispatch: dispatcher.stats(),
        commands_sent: peripherals.sent(),
        commands_dropped: peripherals.dropped(),
    })
}

//! Simulator socket client
//!
//! The simulator streams 4-byte channel frames over TCP. Decoded frames go through
//! the shared dispatcher and out to the controllers; key presses travel the other
//! way as Channel 15 frames.

use crate::transport::{KeyboardLink, Peripherals};
use anyhow::{anyhow, Context, Result};
use dsky_protocol::{
    keypress_frame, DispatchStats, Dispatcher, FrameCodec, FrameStats, KeyCode, KeyEvent,
};
use std::io::{self, BufRead, Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

const READ_BUFFER_SIZE: usize = 1024;

/// Totals reported when the session ends
#[derive(Debug, Clone, Copy)]
pub struct SessionSummary {
    pub bytes: usize,
    pub frames: FrameStats,
    pub dispatch: DispatchStats,
    pub commands_sent: usize,
    pub commands_dropped: usize,
}

/// Where key presses come from
pub enum KeySource {
    /// Raw key codes from the keyboard controller
    Device(KeyboardLink),
    /// Key names typed on stdin
    Stdin,
}

fn lock(dispatcher: &Mutex<Dispatcher>) -> Result<MutexGuard<'_, Dispatcher>> {
    dispatcher
        .lock()
        .map_err(|_| anyhow!("Dispatcher lock poisoned"))
}

/// A connection to the simulator socket
pub struct SimClient {
    stream: TcpStream,
    dispatcher: Arc<Mutex<Dispatcher>>,
}

impl SimClient {
    /// Connect to the simulator
    pub fn connect(address: &str, dispatcher: Dispatcher) -> Result<Self> {
        let stream = TcpStream::connect(address)
            .with_context(|| format!("Failed to connect to simulator at {}", address))?;
        log::info!("Connected to simulator at {}", address);

        Ok(Self {
            stream,
            dispatcher: Arc::new(Mutex::new(dispatcher)),
        })
    }

    /// Start forwarding key presses to the simulator on a background thread
    pub fn spawn_keyboard(&self, source: KeySource) -> Result<()> {
        let mut writer = self
            .stream
            .try_clone()
            .context("Failed to clone simulator socket")?;
        let dispatcher = Arc::clone(&self.dispatcher);

        let mut forward = move |byte: u8| -> Result<()> {
            let event = lock(&dispatcher)?.handle_key(byte);
            match event {
                Ok(event) => send_key(&mut writer, event),
                Err(e) => {
                    log::warn!("Ignoring keyboard byte {:#04x}: {}", byte, e);
                    Ok(())
                }
            }
        };

        match source {
            KeySource::Device(mut link) => {
                thread::spawn(move || {
                    let mut buffer = [0u8; 16];
                    loop {
                        match link.read(&mut buffer) {
                            Ok(0) => {
                                log::info!("Keyboard link closed");
                                break;
                            }
                            Ok(n) => {
                                if let Err(e) = buffer[..n].iter().try_for_each(|&b| forward(b)) {
                                    log::error!("Keyboard forwarding stopped: {:#}", e);
                                    break;
                                }
                            }
                            Err(e) => {
                                log::error!("{}", e);
                                break;
                            }
                        }
                    }
                });
            }
            KeySource::Stdin => {
                thread::spawn(move || {
                    for line in io::stdin().lock().lines() {
                        let Ok(line) = line else { break };
                        let keys = match parse_keys(&line) {
                            Ok(keys) => keys,
                            Err(e) => {
                                log::warn!("{}", e);
                                continue;
                            }
                        };
                        if let Err(e) = keys.into_iter().try_for_each(&mut forward) {
                            log::error!("Keyboard forwarding stopped: {:#}", e);
                            break;
                        }
                    }
                });
            }
        }
        Ok(())
    }

    /// Read frames until the simulator closes the connection
    pub fn run(mut self, peripherals: &mut Peripherals) -> Result<SessionSummary> {
        let mut codec = FrameCodec::new();
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let mut bytes = 0;

        loop {
            let n = self
                .stream
                .read(&mut buffer)
                .context("Failed to read from simulator")?;
            if n == 0 {
                log::info!("Simulator closed the connection");
                break;
            }
            bytes += n;

            for frame in codec.feed(&buffer[..n]) {
                let commands = lock(&self.dispatcher)?.handle_frame(frame);
                peripherals
                    .send_all(&commands)
                    .context("Failed to write to a controller")?;
            }
        }

        let dispatch = lock(&self.dispatcher)?.stats();
        Ok(SessionSummary {
            bytes,
            frames: codec.stats(),
            dispatch,
            commands_sent: peripherals.sent(),
            commands_dropped: peripherals.dropped(),
        })
    }
}

/// Send the Channel 15 frame for a key event
fn send_key<W: Write>(writer: &mut W, event: KeyEvent) -> Result<()> {
    let key = match event {
        KeyEvent::Key(key) => key,
        // The simulator takes PRO as key code 0 on Channel 15
        KeyEvent::Proceed => KeyCode::new(0)?,
    };
    writer
        .write_all(&keypress_frame(key))
        .context("Failed to send key to simulator")?;
    log::debug!("Sent key {:?} to simulator", event);
    Ok(())
}

/// Translate typed key names into keyboard controller bytes
///
/// Tokens are separated by whitespace. A run of digits is one key per digit;
/// `PRO` maps to the controller's code 0.
pub fn parse_keys(line: &str) -> Result<Vec<u8>> {
    let mut keys = Vec::new();
    for token in line.split_whitespace() {
        if token.chars().all(|c| c.is_ascii_digit()) {
            for c in token.bytes() {
                let key = KeyCode::digit(c - b'0')
                    .ok_or_else(|| anyhow!("Not a digit key: {}", c as char))?;
                keys.push(key.value());
            }
            continue;
        }

        let key = match token.to_ascii_uppercase().as_str() {
            "V" | "VERB" => KeyCode::VERB,
            "N" | "NOUN" => KeyCode::NOUN,
            "E" | "ENTR" | "ENTER" => KeyCode::ENTER,
            "C" | "CLR" | "CLEAR" => KeyCode::CLEAR,
            "K" | "KEYREL" | "KEY_REL" => KeyCode::KEY_REL,
            "R" | "RSET" | "RESET" => KeyCode::RESET,
            "+" => KeyCode::PLUS,
            "-" => KeyCode::MINUS,
            "P" | "PRO" => {
                keys.push(0);
                continue;
            }
            other => return Err(anyhow!("Unknown key: {}", other)),
        };
        keys.push(key.value());
    }
    Ok(keys)
}

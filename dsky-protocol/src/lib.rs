//! DSKY Channel-Bus Protocol Library
//!
//! Translates Apollo guidance computer channel traffic into commands for the
//! peripheral controllers that drive a replica Display/Keyboard unit, and key
//! presses back into the channel encoding the computer expects.
//!
//! # Architecture
//!
//! The library is the protocol layer only:
//! - Decodes the Channel 10 display register (relay words, digit patterns, signs)
//! - Tracks Channel 11 and pseudo channel 163 indicator bits, edge-triggered
//! - Decodes and encodes the 4-byte simulator socket framing
//! - Encodes semantic commands into controller byte sequences
//!
//! The library does NOT:
//! - Open sockets, serial devices or GPIO pins
//! - Pace writes to the controllers
//! - Decide which channel-bus source is active
//!
//! All transport concerns live in the application layer (dsky-cli).
//!
//! # Example Usage
//!
//! ```
//! use dsky_protocol::{CommandEncoder, Dispatcher, FrameCodec, ProtocolConfig};
//!
//! let mut codec = FrameCodec::new();
//! let mut dispatcher = Dispatcher::new(ProtocolConfig::new());
//!
//! // Channel 10, MD1/MD2 = "88"
//! for frame in codec.feed(&[0x01, 0x45, 0xAE, 0xFD]) {
//!     for command in dispatcher.handle_frame(frame) {
//!         let bytes = CommandEncoder::encode(&command);
//!         println!("{} -> {:?}", command, bytes);
//!     }
//! }
//! ```

// Public modules
pub mod command;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod frame;
pub mod indicator;
pub mod keyboard;
pub mod register;
pub mod segment;
pub mod types;

// Re-export main types for convenience
pub use command::{CommandEncoder, DisplayField, Indicator, PeripheralCommand, PeripheralRole};
pub use config::{ProtocolConfig, SignPrecedence};
pub use dispatch::{ControlLineEvent, DispatchStats, Dispatcher, Reaction};
pub use display::{DisplayDecoder, DisplayStats};
pub use frame::{FrameCodec, FrameStats};
pub use indicator::{IndicatorMap, IndicatorTarget, IndicatorTracker};
pub use keyboard::{keypress_frame, KeyCode, KeyEvent, Keyboard};
pub use register::{Bit, ChannelRegister};
pub use segment::{Digit, SevenSegmentCodec};
pub use types::{ChannelFrame, ProtocolError, Result, Row, Sign};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Event dispatch
//!
//! Channel data reaches the DSKY from two kinds of sources: control-line strobes from
//! real hardware, and decoded frames from the simulator socket. Both are funnelled
//! through one [`Dispatcher`] that owns every piece of persisted state, so the order
//! in which events are applied is the order in which they are handed in.
//!
//! The dispatcher is plain data. When more than one thread feeds it, wrap it in a
//! single `Mutex` so every register and tracker mutation is serialized.

use crate::command::{Indicator, PeripheralCommand};
use crate::config::{ProtocolConfig, CHANNEL_DISPLAY, CHANNEL_DSKY_LAMPS, CHANNEL_INDICATORS};
use crate::display::DisplayDecoder;
use crate::indicator::{IndicatorMap, IndicatorTracker};
use crate::keyboard::{KeyEvent, Keyboard};
use crate::register::{Bit, ChannelRegister};
use crate::types::{ChannelFrame, Result};

/// A control line asserted by the guidance computer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLineEvent {
    /// DISP strobe with the channel bus contents (Channel 10)
    Disp(u16),
    /// INDC strobe with the channel bus contents (Channel 11)
    Indc(u16),
    /// RST: return displays to their power-on state
    Reset,
    /// STBY line changed
    Standby(bool),
    /// KBD1: the computer wants the last key code on the bus
    KeyboardStrobe,
    /// RPRO: the computer is polling the PRO key
    Proceed,
    /// PARALM line changed; lights RESTART
    ParityAlarm(bool),
}

/// What the DSKY does in response to an event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    /// Commands for the peripheral controllers, in order
    pub commands: Vec<PeripheralCommand>,
    /// Value to drive onto the channel bus, if the event asked for one
    pub bus: Option<ChannelRegister>,
}

impl Reaction {
    fn commands(commands: Vec<PeripheralCommand>) -> Self {
        Self { commands, bus: None }
    }

    fn command(command: Option<PeripheralCommand>) -> Self {
        Self::commands(command.into_iter().collect())
    }
}

/// Counters describing dispatched traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub events: usize,
    pub frames: usize,
    pub rejected_frames: usize,
    pub skipped_frames: usize,
    pub commands: usize,
}

/// Owner of all DSKY state, fed one event at a time
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: ProtocolConfig,
    display: DisplayDecoder,
    channel11: IndicatorTracker,
    dsky_lamps: IndicatorTracker,
    keyboard: Keyboard,
    /// Last packed indicator word sent, when words are enabled
    indicator_word: u16,
    stats: DispatchStats,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}

impl Dispatcher {
    /// Create a dispatcher with power-on state
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            display: DisplayDecoder::new(config.sign_precedence),
            channel11: IndicatorTracker::new(IndicatorMap::CHANNEL_11),
            dsky_lamps: IndicatorTracker::new(IndicatorMap::CHANNEL_163),
            keyboard: Keyboard::new(),
            indicator_word: 0,
            stats: DispatchStats::default(),
            config,
        }
    }

    /// Apply a control-line event
    pub fn handle_event(&mut self, event: ControlLineEvent) -> Reaction {
        self.stats.events += 1;
        log::trace!("Control line event: {:?}", event);

        let mut reaction = match event {
            ControlLineEvent::Disp(bus) => {
                self.display.set_value(bus);
                Reaction::commands(self.display.decode())
            }
            ControlLineEvent::Indc(bus) => Reaction::commands(self.channel11.set_word(bus)),
            ControlLineEvent::Reset => Reaction::commands(self.reset()),
            ControlLineEvent::Standby(on) => {
                Reaction::command(self.channel11.set_lamp(Indicator::Stby, on))
            }
            ControlLineEvent::ParityAlarm(on) => {
                Reaction::command(self.channel11.set_lamp(Indicator::Restart, on))
            }
            ControlLineEvent::KeyboardStrobe => Reaction {
                commands: Vec::new(),
                bus: Some(*self.keyboard.channel15()),
            },
            ControlLineEvent::Proceed => {
                // Inverse logic: bit 14 is high unless PRO was pressed
                let mut register = ChannelRegister::new();
                register.set(Bit::of(14), !self.keyboard.take_proceed());
                Reaction { commands: Vec::new(), bus: Some(register) }
            }
        };

        self.push_indicator_word(&mut reaction.commands);
        self.stats.commands += reaction.commands.len();
        reaction
    }

    /// Apply a frame decoded from the simulator socket
    pub fn handle_frame(&mut self, frame: ChannelFrame) -> Vec<PeripheralCommand> {
        if !self.config.should_process_channel(frame.channel) {
            self.stats.rejected_frames += 1;
            log::trace!("Rejected {}", frame);
            return Vec::new();
        }
        self.stats.frames += 1;

        let mut commands = match frame.channel {
            CHANNEL_DISPLAY => {
                if frame.data == 0 && self.config.skip_zero_display {
                    self.stats.skipped_frames += 1;
                    return Vec::new();
                }
                log::debug!("Received {}", frame);
                self.display.apply(&ChannelRegister::from_value(frame.data))
            }
            CHANNEL_INDICATORS => {
                log::debug!("Received {}", frame);
                self.channel11.set_word(frame.data)
            }
            CHANNEL_DSKY_LAMPS => {
                log::debug!("Received {}", frame);
                self.dsky_lamps.set_word(frame.data)
            }
            _ => {
                log::debug!("No handler for {}", frame);
                Vec::new()
            }
        };

        self.push_indicator_word(&mut commands);
        self.stats.commands += commands.len();
        commands
    }

    /// Packed state of every panel lamp, whichever source drives it
    pub fn lamp_word(&self) -> u16 {
        self.channel11.lamp_word() | self.dsky_lamps.lamp_word() | self.display.lamp_word()
    }

    /// Append one combined indicator word if the lit lamps changed
    fn push_indicator_word(&mut self, commands: &mut Vec<PeripheralCommand>) {
        if !self.config.indicator_words {
            return;
        }
        let word = self.lamp_word();
        if word != self.indicator_word {
            self.indicator_word = word;
            commands.push(PeripheralCommand::IndicatorWord { word });
        }
    }

    /// Accept a byte from the keyboard controller
    pub fn handle_key(&mut self, byte: u8) -> Result<KeyEvent> {
        self.keyboard.accept(byte)
    }

    /// Reset every tracker; yields one reset per controller
    pub fn reset(&mut self) -> Vec<PeripheralCommand> {
        let display = self.display.reset();
        let indicators = self.channel11.reset();
        self.dsky_lamps.reset();
        self.keyboard.reset();
        self.indicator_word = 0;
        vec![display, indicators]
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn display(&self) -> &DisplayDecoder {
        &self.display
    }

    pub fn channel11(&self) -> &IndicatorTracker {
        &self.channel11
    }

    pub fn dsky_lamps(&self) -> &IndicatorTracker {
        &self.dsky_lamps
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}

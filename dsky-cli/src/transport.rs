//! Peripheral controller links
//!
//! Each controller is reached through a byte link: a device node in normal
//! operation, or a trace sink on stdout for dry runs. A role with no link is inert:
//! its commands are dropped and the gap is warned about once.

use crate::config::PeripheralsConfig;
use chrono::{SecondsFormat, Utc};
use dsky_protocol::{CommandEncoder, PeripheralCommand, PeripheralRole};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Transport failures
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("No {0} controller link is configured")]
    Unavailable(PeripheralRole),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type LinkResult<T> = std::result::Result<T, LinkError>;

/// Somewhere encoded controller commands can be written
pub trait PeripheralLink: Send {
    fn send(&mut self, command: &PeripheralCommand) -> LinkResult<()>;
}

/// A controller reached through a device node (serial port or pipe)
pub struct DeviceLink {
    path: PathBuf,
    file: File,
    pause: Duration,
}

impl DeviceLink {
    /// Open the device for writing
    pub fn open(path: &Path, pause: Duration) -> LinkResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| LinkError::Io { path: path.to_path_buf(), source })?;
        log::info!("Opened controller link {:?}", path);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            pause,
        })
    }
}

impl PeripheralLink for DeviceLink {
    fn send(&mut self, command: &PeripheralCommand) -> LinkResult<()> {
        let bytes = CommandEncoder::encode(command);
        self.file
            .write_all(&bytes)
            .and_then(|_| self.file.flush())
            .map_err(|source| LinkError::Io { path: self.path.clone(), source })?;
        log::trace!("{:?} <- {:?}", self.path, String::from_utf8_lossy(&bytes));

        // Controllers drop bytes that arrive while they are still updating
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
        }
        Ok(())
    }
}

/// One traced command, as printed with `--json`
#[derive(Debug, Serialize)]
pub struct TraceRecord<'a> {
    pub timestamp: String,
    pub role: PeripheralRole,
    pub command: &'a PeripheralCommand,
    pub bytes: String,
}

impl<'a> TraceRecord<'a> {
    pub fn new(command: &'a PeripheralCommand) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            role: command.role(),
            command,
            bytes: String::from_utf8_lossy(&CommandEncoder::encode(command)).into_owned(),
        }
    }
}

/// Writes every command to an output stream instead of a controller
pub struct TraceLink<W: Write + Send> {
    out: W,
    json: bool,
}

impl TraceLink<io::Stdout> {
    pub fn stdout(json: bool) -> Self {
        Self::new(io::stdout(), json)
    }
}

impl<W: Write + Send> TraceLink<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }
}

impl<W: Write + Send> PeripheralLink for TraceLink<W> {
    fn send(&mut self, command: &PeripheralCommand) -> LinkResult<()> {
        let result = if self.json {
            let line = serde_json::to_string(&TraceRecord::new(command))
                .map_err(io::Error::from);
            line.and_then(|line| writeln!(self.out, "{}", line))
        } else {
            writeln!(
                self.out,
                "{:<10} {:<28} {}",
                command.role().identity(),
                command.to_string(),
                String::from_utf8_lossy(&CommandEncoder::encode(command))
            )
        };

        result.map_err(|source| LinkError::Io { path: PathBuf::from("<trace>"), source })
    }
}

/// Routes commands to the link for their controller role
#[derive(Default)]
pub struct Peripherals {
    display: Option<Box<dyn PeripheralLink>>,
    indicators: Option<Box<dyn PeripheralLink>>,
    warned: Vec<PeripheralRole>,
    sent: usize,
    dropped: usize,
}

impl Peripherals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open device links for every configured output controller
    ///
    /// A controller that cannot be opened is logged and left inert.
    pub fn open(config: &PeripheralsConfig) -> Self {
        let mut peripherals = Self::new();
        for role in [PeripheralRole::Display, PeripheralRole::Indicators] {
            let Some(path) = config.path(role) else {
                continue;
            };
            match DeviceLink::open(path, config.write_pause()) {
                Ok(link) => peripherals.set_link(role, Box::new(link)),
                Err(e) => log::error!("{} controller unavailable: {}", role, e),
            }
        }
        peripherals
    }

    /// Send every command to a single trace link
    pub fn trace(json: bool) -> Self {
        Self::new()
            .with_link(PeripheralRole::Display, Box::new(TraceLink::stdout(json)))
            .with_link(PeripheralRole::Indicators, Box::new(TraceLink::stdout(json)))
    }

    /// Builder method: attach a link for a role
    pub fn with_link(mut self, role: PeripheralRole, link: Box<dyn PeripheralLink>) -> Self {
        self.set_link(role, link);
        self
    }

    pub fn set_link(&mut self, role: PeripheralRole, link: Box<dyn PeripheralLink>) {
        match role {
            PeripheralRole::Display => self.display = Some(link),
            PeripheralRole::Indicators => self.indicators = Some(link),
            PeripheralRole::Keyboard => log::warn!("Keyboard controller takes no commands"),
        }
    }

    fn link(&mut self, role: PeripheralRole) -> Option<&mut Box<dyn PeripheralLink>> {
        match role {
            PeripheralRole::Display => self.display.as_mut(),
            PeripheralRole::Indicators => self.indicators.as_mut(),
            PeripheralRole::Keyboard => None,
        }
    }

    /// Send one command to its controller
    pub fn send(&mut self, command: &PeripheralCommand) -> LinkResult<()> {
        let role = command.role();
        let Some(link) = self.link(role) else {
            self.dropped += 1;
            if !self.warned.contains(&role) {
                self.warned.push(role);
                log::warn!("{}; its commands are dropped", LinkError::Unavailable(role));
            }
            return Ok(());
        };

        link.send(command)?;
        self.sent += 1;
        Ok(())
    }

    /// Send commands in order, stopping at the first I/O failure
    pub fn send_all<'a, I>(&mut self, commands: I) -> LinkResult<()>
    where
        I: IntoIterator<Item = &'a PeripheralCommand>,
    {
        for command in commands {
            self.send(command)?;
        }
        Ok(())
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Read side of the keyboard controller
pub struct KeyboardLink {
    path: PathBuf,
    file: File,
}

impl KeyboardLink {
    pub fn open(path: &Path) -> LinkResult<Self> {
        let file = File::open(path)
            .map_err(|source| LinkError::Io { path: path.to_path_buf(), source })?;
        log::info!("Opened keyboard link {:?}", path);
        Ok(Self { path: path.to_path_buf(), file })
    }

    /// Block until at least one byte arrives; an empty result means end of stream
    pub fn read(&mut self, buffer: &mut [u8]) -> LinkResult<usize> {
        self.file
            .read(buffer)
            .map_err(|source| LinkError::Io { path: self.path.clone(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsky_protocol::{Digit, DisplayField, Indicator};
    use std::sync::{Arc, Mutex};

    /// Test link that records encoded bytes
    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Vec<u8>>>>);

    impl PeripheralLink for Recorder {
        fn send(&mut self, command: &PeripheralCommand) -> LinkResult<()> {
            self.0.lock().unwrap().push(CommandEncoder::encode(command));
            Ok(())
        }
    }

    fn md1_eight() -> PeripheralCommand {
        PeripheralCommand::Digit { field: DisplayField::Md1, digit: Digit::Decimal(8) }
    }

    #[test]
    fn test_routing_by_role() {
        let display = Recorder::default();
        let indicators = Recorder::default();
        let mut peripherals = Peripherals::new()
            .with_link(PeripheralRole::Display, Box::new(display.clone()))
            .with_link(PeripheralRole::Indicators, Box::new(indicators.clone()));

        let lamp = PeripheralCommand::Lamp { indicator: Indicator::OprErr, lit: true };
        peripherals.send_all(&[md1_eight(), lamp]).unwrap();

        assert_eq!(*display.0.lock().unwrap(), vec![b"3 8".to_vec()]);
        assert_eq!(indicators.0.lock().unwrap().len(), 1);
        assert_eq!(peripherals.sent(), 2);
    }

    #[test]
    fn test_missing_link_is_inert() {
        let mut peripherals = Peripherals::new();
        assert!(peripherals.send(&md1_eight()).is_ok());
        assert!(peripherals.send(&md1_eight()).is_ok());
        assert_eq!(peripherals.dropped(), 2);
        assert_eq!(peripherals.warned, vec![PeripheralRole::Display]);
    }

    #[test]
    fn test_device_link_writes_encoded_bytes() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut link = DeviceLink::open(file.path(), Duration::ZERO).unwrap();

        link.send(&md1_eight()).unwrap();
        link.send(&PeripheralCommand::CompActy { lit: true }).unwrap();

        let written = std::fs::read(file.path()).unwrap();
        assert_eq!(written, b"3 827 1");
    }

    #[test]
    fn test_device_link_open_failure() {
        let result = DeviceLink::open(Path::new("/nonexistent/ttyDSKY"), Duration::ZERO);
        assert!(matches!(result, Err(LinkError::Io { .. })));
    }

    #[test]
    fn test_trace_link_text_and_json() {
        let mut buffer = Vec::new();
        TraceLink::new(&mut buffer, false).send(&md1_eight()).unwrap();
        let line = String::from_utf8(buffer).unwrap();
        assert!(line.starts_with("Display"));
        assert!(line.trim_end().ends_with("3 8"));

        let mut buffer = Vec::new();
        TraceLink::new(&mut buffer, true).send(&md1_eight()).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["role"], "display");
        assert_eq!(value["command"]["kind"], "digit");
        assert_eq!(value["bytes"], "3 8");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}

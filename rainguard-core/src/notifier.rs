use anyhow::{Context, Result};
use std::io::Write;
use std::time::Duration;
use tracing::{error, info};

/// Baud rate expected by the irrigation controller firmware.
pub const BAUD_RATE: u32 = 115_200;

/// Bound on a single serial write; a wedged controller cannot stall a tick.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Wire command understood by the controller. The two-field `KEY:VALUE`
/// grammar with a trailing newline is fixed by the firmware.
pub const fn command(will_rain: bool) -> &'static str {
    if will_rain { "RAIN:1\n" } else { "RAIN:0\n" }
}

/// Byte transport to the irrigation controller.
///
/// Release is tied to drop; implementations hold the underlying channel
/// exclusively for their lifetime.
pub trait ControllerLink: Send {
    fn send(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    /// Human-readable identifier for logs, e.g. the device path.
    fn describe(&self) -> String;
}

/// Serial-port transport at the fixed controller baud rate.
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
    device: String,
}

impl SerialLink {
    pub fn open(device: &str) -> Result<Self> {
        let port = serialport::new(device, BAUD_RATE)
            .timeout(WRITE_TIMEOUT)
            .open()
            .with_context(|| format!("Failed to open serial port {device}"))?;

        info!(device, baud = BAUD_RATE, "connected to irrigation controller");

        Ok(Self { port, device: device.to_string() })
    }
}

impl ControllerLink for SerialLink {
    fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn describe(&self) -> String {
        self.device.clone()
    }
}

/// How a notification left the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Written to the controller link.
    Sent,
    /// No link configured; the command was only logged.
    Simulated,
    /// Link write failed; logged and swallowed, no retry within the tick.
    Failed(String),
}

/// Encodes rain decisions as controller commands and pushes them down the
/// link, or logs them in simulation mode when no controller is attached.
pub struct Notifier {
    link: Option<Box<dyn ControllerLink>>,
}

impl Notifier {
    pub fn with_link(link: Box<dyn ControllerLink>) -> Self {
        Self { link: Some(link) }
    }

    /// Simulation mode: commands are logged, nothing is transmitted.
    pub fn disconnected() -> Self {
        Self { link: None }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// A failed write never propagates; the controller being unplugged must
    /// not take the monitor down with it.
    pub fn notify(&mut self, will_rain: bool) -> Dispatch {
        let command = command(will_rain);

        match self.link.as_mut() {
            Some(link) => match link.send(command.as_bytes()) {
                Ok(()) => {
                    info!(command = command.trim_end(), "command sent to controller");
                    Dispatch::Sent
                }
                Err(e) => {
                    error!(
                        command = command.trim_end(),
                        error = %e,
                        "failed to send command to controller"
                    );
                    Dispatch::Failed(e.to_string())
                }
            },
            None => {
                info!(command = command.trim_end(), "simulated controller transmission");
                Dispatch::Simulated
            }
        }
    }

    /// Release the link. Idempotent; the underlying channel closes at most
    /// once.
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            info!(device = link.describe(), "controller link closed");
            drop(link);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct RecordingLink {
        written: Arc<Mutex<Vec<u8>>>,
        closes: Arc<AtomicUsize>,
    }

    impl ControllerLink for RecordingLink {
        fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }

        fn describe(&self) -> String {
            "test-link".to_string()
        }
    }

    impl Drop for RecordingLink {
        fn drop(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct BrokenLink;

    impl ControllerLink for BrokenLink {
        fn send(&mut self, _bytes: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "controller unplugged"))
        }

        fn describe(&self) -> String {
            "broken-link".to_string()
        }
    }

    fn recording_notifier() -> (Notifier, Arc<Mutex<Vec<u8>>>, Arc<AtomicUsize>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let closes = Arc::new(AtomicUsize::new(0));
        let link = RecordingLink { written: Arc::clone(&written), closes: Arc::clone(&closes) };
        (Notifier::with_link(Box::new(link)), written, closes)
    }

    #[test]
    fn command_grammar_is_fixed() {
        assert_eq!(command(true), "RAIN:1\n");
        assert_eq!(command(false), "RAIN:0\n");
    }

    #[test]
    fn connected_notifier_writes_exact_bytes() {
        let (mut notifier, written, _closes) = recording_notifier();

        assert_eq!(notifier.notify(true), Dispatch::Sent);
        assert_eq!(written.lock().unwrap().as_slice(), b"RAIN:1\n");

        written.lock().unwrap().clear();
        assert_eq!(notifier.notify(false), Dispatch::Sent);
        assert_eq!(written.lock().unwrap().as_slice(), b"RAIN:0\n");
    }

    #[test]
    fn disconnected_notifier_simulates() {
        let mut notifier = Notifier::disconnected();
        assert!(!notifier.is_connected());
        assert_eq!(notifier.notify(true), Dispatch::Simulated);
    }

    #[test]
    fn write_failure_is_swallowed() {
        let mut notifier = Notifier::with_link(Box::new(BrokenLink));

        match notifier.notify(true) {
            Dispatch::Failed(reason) => assert!(reason.contains("controller unplugged")),
            other => panic!("expected Failed, got {other:?}"),
        }

        // The link stays open; the next tick gets another chance.
        assert!(notifier.is_connected());
    }

    #[test]
    fn close_releases_link_exactly_once() {
        let (mut notifier, _written, closes) = recording_notifier();

        notifier.close();
        notifier.close();

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!notifier.is_connected());
        assert_eq!(notifier.notify(false), Dispatch::Simulated);
    }
}

//! Transport trait for line-oriented glove input
//!
//! This module provides a common trait for everything the acquisition worker
//! can read frames from: a serial character device, a capture file, an
//! in-memory replay, or the synthetic glove used for testing.

use crate::config::AcquisitionConfig;
use crate::error::{GestureError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Unified interface for line sources
///
/// Implementations must be `Send` so the transport can move into the worker
/// thread. A transport may be opened again after it was closed; each open
/// starts a new session.
pub trait Transport: Send {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// Open the underlying source
    fn open(&mut self) -> Result<()>;

    /// Close the source; must not block
    fn close(&mut self);

    /// Whether the source is open
    fn is_open(&self) -> bool;

    /// Read the next line without its terminator
    ///
    /// Returns `Ok(None)` when no complete line is available yet. Any error
    /// ends the session.
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// Default wait for a device line before control returns to the worker
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Default longest accepted device line in bytes
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// Lines buffered between the reader thread and the worker
const DEVICE_LINE_BUFFER: usize = 64;

/// Item handed from the reader thread to the transport
#[derive(Debug)]
enum DeviceLine {
    Line(String),
    /// A line longer than the limit, discarded up to its terminator
    Overlong(usize),
}

/// Reads newline-delimited text from a device node or capture file
///
/// On Linux a serial adapter (`/dev/ttyUSB0`, `/dev/ttyACM0`) can be read as a
/// plain file once its line settings are configured. The blocking reads run
/// on a dedicated reader thread; [`Transport::read_line`] waits at most the
/// read timeout, so a silent device never keeps the worker from its
/// commands. End of file terminates the session.
///
/// Closing drops the receiving end. A reader blocked on a silent device
/// exits once the device produces data or is closed by its writer.
#[derive(Debug)]
pub struct DeviceTransport {
    path: PathBuf,
    lines: Option<Receiver<Result<DeviceLine>>>,
    read_timeout: Duration,
    max_line_len: usize,
    lines_read: u64,
}

impl DeviceTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            lines_read: 0,
        }
    }

    /// Transport for `path` using the timeout and line limit from `config`
    pub fn from_config(path: impl Into<PathBuf>, config: &AcquisitionConfig) -> Self {
        Self::new(path)
            .with_read_timeout(Duration::from_millis(config.read_timeout_ms))
            .with_max_line_len(config.max_line_len)
    }

    /// Longest wait in [`Transport::read_line`] before it returns `Ok(None)`
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Lines longer than `limit` bytes are discarded
    pub fn with_max_line_len(mut self, limit: usize) -> Self {
        self.max_line_len = limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines read since the last open, including discarded overlong ones
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

impl Transport for DeviceTransport {
    fn describe(&self) -> String {
        format!("device {}", self.path.display())
    }

    fn open(&mut self) -> Result<()> {
        self.close();
        std::fs::metadata(&self.path).map_err(|e| {
            GestureError::Transport(format!("Failed to open {}: {}", self.path.display(), e))
        })?;

        // Opening a FIFO or tty can block, so it happens on the reader thread
        let (tx, rx) = bounded(DEVICE_LINE_BUFFER);
        let path = self.path.clone();
        let limit = self.max_line_len;
        std::thread::Builder::new()
            .name("gesture-device-reader".to_string())
            .spawn(move || run_reader(&path, limit, &tx))?;

        self.lines = Some(rx);
        self.lines_read = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.lines = None;
    }

    fn is_open(&self) -> bool {
        self.lines.is_some()
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let lines = self
            .lines
            .as_ref()
            .ok_or_else(|| GestureError::Transport("Transport is not open".to_string()))?;

        match lines.recv_timeout(self.read_timeout) {
            Ok(Ok(DeviceLine::Line(line))) => {
                self.lines_read += 1;
                Ok(Some(line))
            }
            Ok(Ok(DeviceLine::Overlong(length))) => {
                self.lines_read += 1;
                Err(GestureError::LineTooLong {
                    length,
                    limit: self.max_line_len,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(GestureError::Transport(format!(
                "Reader for {} stopped",
                self.path.display()
            ))),
        }
    }
}

/// Reader thread body: forward lines until end of stream, an error, or until
/// the transport drops the receiver
fn run_reader(path: &Path, limit: usize, tx: &Sender<Result<DeviceLine>>) {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            let _ = tx.send(Err(GestureError::Transport(format!(
                "Failed to open {}: {}",
                path.display(),
                e
            ))));
            return;
        }
    };
    let mut reader = BufReader::new(file);

    loop {
        let item = match read_bounded_line(&mut reader, limit) {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(GestureError::Transport(format!(
                "End of stream on {}",
                path.display()
            ))),
            Err(e) => Err(GestureError::Transport(format!(
                "Read from {} failed: {}",
                path.display(),
                e
            ))),
        };
        let last = item.is_err();
        if tx.send(item).is_err() || last {
            return;
        }
    }
}

/// Read one line of at most `limit` bytes
///
/// Returns `Ok(None)` at end of stream. A longer line is consumed up to and
/// including its terminator and reported as [`DeviceLine::Overlong`], so the
/// next call starts on a fresh line.
fn read_bounded_line<R: BufRead>(
    reader: &mut R,
    limit: usize,
) -> io::Result<Option<DeviceLine>> {
    let mut buffer = Vec::with_capacity(128);
    let n = reader
        .by_ref()
        .take(limit as u64 + 1)
        .read_until(b'\n', &mut buffer)?;
    if n == 0 {
        return Ok(None);
    }
    if buffer.last() == Some(&b'\n') || buffer.len() <= limit {
        let line = String::from_utf8_lossy(&buffer);
        return Ok(Some(DeviceLine::Line(
            line.trim_end_matches(&['\r', '\n'][..]).to_string(),
        )));
    }

    let mut discarded = buffer.len();
    loop {
        buffer.clear();
        let n = reader
            .by_ref()
            .take(limit as u64 + 1)
            .read_until(b'\n', &mut buffer)?;
        discarded += n;
        if n == 0 || buffer.last() == Some(&b'\n') {
            return Ok(Some(DeviceLine::Overlong(discarded)));
        }
    }
}

/// Replays a fixed list of lines, optionally paced
///
/// Used for tests, benchmarks and re-running captured sessions. Reaching the
/// end of the list terminates the session; reopening starts from the top.
#[derive(Debug, Clone)]
pub struct ReplayTransport {
    lines: Vec<String>,
    cursor: usize,
    open: bool,
    pacing: Option<Duration>,
    next_due: Option<Instant>,
}

impl ReplayTransport {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            cursor: 0,
            open: false,
            pacing: None,
            next_due: None,
        }
    }

    /// Deliver at most one line per `interval`
    pub fn with_pacing(mut self, interval: Duration) -> Self {
        self.pacing = Some(interval);
        self
    }

    /// Lines not yet delivered
    pub fn remaining(&self) -> usize {
        self.lines.len() - self.cursor
    }
}

impl Transport for ReplayTransport {
    fn describe(&self) -> String {
        format!("replay of {} lines", self.lines.len())
    }

    fn open(&mut self) -> Result<()> {
        self.cursor = 0;
        self.open = true;
        self.next_due = None;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if !self.open {
            return Err(GestureError::Transport("Transport is not open".to_string()));
        }

        if let (Some(interval), Some(due)) = (self.pacing, self.next_due) {
            if Instant::now() < due {
                return Ok(None);
            }
            self.next_due = Some(due + interval);
        } else if let Some(interval) = self.pacing {
            self.next_due = Some(Instant::now() + interval);
        }

        match self.lines.get(self.cursor) {
            Some(line) => {
                self.cursor += 1;
                Ok(Some(line.clone()))
            }
            None => Err(GestureError::Transport("Replay exhausted".to_string())),
        }
    }
}

//! Session controller
//!
//! A `Session` owns everything one serial connection needs: the three
//! lifecycle flags, the sample store, the log-file handle, the reader
//! thread, and the chart task. Consumers watch the event feed for
//! received lines and status notices; nothing here ever touches a
//! display directly.

use crate::chart::{self, ChartConfig, ChartTask, ChartView};
use crate::data::{classify, Sample, SampleStore};
use crate::port::{BaudRate, LineRead, SerialLineSource};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Feed entries produced by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A line received from the device, with its arrival stamp.
    Line { stamp: String, text: String },
    /// Lifecycle notice.
    Info(String),
    /// Something went wrong but the session carries on.
    Warn(String),
}

/// State shared with the reader thread.
struct Shared {
    connected: AtomicBool,
    logging: AtomicBool,
    graphing: AtomicBool,
    store: Arc<SampleStore>,
    log_file: Mutex<Option<File>>,
}

pub struct Session {
    shared: Arc<Shared>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    reader: Option<JoinHandle<()>>,
    chart_task: Option<ChartTask>,
    chart_config: ChartConfig,
}

impl Session {
    pub fn new(chart_config: ChartConfig) -> Session {
        let (events_tx, events_rx) = unbounded();
        Session {
            shared: Arc::new(Shared {
                connected: AtomicBool::new(false),
                logging: AtomicBool::new(false),
                graphing: AtomicBool::new(false),
                store: Arc::new(SampleStore::default()),
                log_file: Mutex::new(None),
            }),
            events_tx,
            events_rx,
            reader: None,
            chart_task: None,
            chart_config,
        }
    }

    /// The feed of received lines and notices. The receiver can be
    /// cloned and handed to whatever is displaying the session.
    pub fn events(&self) -> Receiver<Event> {
        self.events_rx.clone()
    }

    pub fn store(&self) -> Arc<SampleStore> {
        Arc::clone(&self.shared.store)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    pub fn is_logging(&self) -> bool {
        self.shared.logging.load(Ordering::SeqCst)
    }

    pub fn is_graphing(&self) -> bool {
        self.shared.graphing.load(Ordering::SeqCst)
    }

    /// Open the serial port and start the read loop. On failure no state
    /// changes; the caller surfaces the error to its feed.
    pub fn connect(&mut self, port_name: &str, baud: BaudRate) -> Result<(), ConnectError> {
        if self.is_connected() {
            return Err(ConnectError::AlreadyConnected);
        }
        let source = SerialLineSource::open(port_name, baud)?;
        self.spawn_reader(source);
        self.info(format!("Connected to {} at {} baud", port_name, baud));
        Ok(())
    }

    /// Start the read loop over an already-open source. This is the
    /// seam the serial transport plugs into; tests plug in scripted
    /// sources the same way.
    pub fn connect_source<S: LineRead + 'static>(
        &mut self,
        source: S,
    ) -> Result<(), ConnectError> {
        if self.is_connected() {
            return Err(ConnectError::AlreadyConnected);
        }
        self.spawn_reader(source);
        Ok(())
    }

    fn spawn_reader<S: LineRead + 'static>(&mut self, source: S) {
        let shared = Arc::clone(&self.shared);
        let events = self.events_tx.clone();
        shared.connected.store(true, Ordering::SeqCst);
        let handle = thread::Builder::new()
            .name("line-reader".to_string())
            .spawn(move || read_loop(source, shared, events))
            .expect("failed to spawn reader thread");
        self.reader = Some(handle);
    }

    /// Ask the read loop to wind down and wait for it. The loop checks
    /// the flag between reads, so this returns within one read-timeout
    /// interval. Idempotent.
    pub fn disconnect(&mut self) {
        let was_connected = self.shared.connected.swap(false, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        if was_connected {
            self.info("Disconnected".to_string());
        }
    }

    /// Open `path` fresh and start mirroring received lines into it,
    /// each prefixed with its arrival stamp and flushed immediately.
    pub fn start_logging<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        *self.shared.log_file.lock().unwrap() = Some(file);
        self.shared.logging.store(true, Ordering::SeqCst);
        self.info("Logging started".to_string());
        Ok(())
    }

    pub fn stop_logging(&mut self) {
        self.shared.logging.store(false, Ordering::SeqCst);
        if self.shared.log_file.lock().unwrap().take().is_some() {
            self.info("Logging stopped".to_string());
        }
    }

    /// Clear the store and start a fresh graphing session on the
    /// configured view range and cadence.
    pub fn start_graph(&mut self) {
        // A stale task from a graph session that was never stopped
        // cancels without an artifact.
        self.chart_task = None;
        self.shared.store.clear();
        self.chart_task = Some(ChartTask::spawn(
            Arc::clone(&self.shared.store),
            &self.chart_config,
        ));
        self.shared.graphing.store(true, Ordering::SeqCst);
        self.info("Graph started (waiting for data...)".to_string());
    }

    /// Stop the chart task and persist the final view as a PNG named
    /// after the stop time. A render failure degrades to a warning on
    /// the feed rather than an error.
    pub fn stop_graph(&mut self) -> Option<PathBuf> {
        self.shared.graphing.store(false, Ordering::SeqCst);
        let task = self.chart_task.take()?;
        let view = task.stop();
        self.info("Graph stopped".to_string());
        let path = self
            .chart_config
            .out_dir
            .join(chart::artifact_name(chrono::Local::now()));
        let snapshot = self.shared.store.snapshot();
        match chart::save_chart(&snapshot, &view, self.chart_config.size, &path) {
            Ok(()) => {
                self.info(format!("Chart saved to {}", path.display()));
                Some(path)
            }
            Err(e) => {
                self.warn(format!("Failed to save chart: {}", e));
                None
            }
        }
    }

    /// Current chart state, while graphing.
    pub fn chart_view(&self) -> Option<ChartView> {
        self.chart_task.as_ref().map(|t| t.view())
    }

    pub fn zoom_in(&self) {
        if let Some(task) = &self.chart_task {
            task.zoom_in();
        }
    }

    pub fn zoom_out(&self) {
        if let Some(task) = &self.chart_task {
            task.zoom_out();
        }
    }

    fn info(&self, msg: String) {
        let _ = self.events_tx.send(Event::Info(msg));
    }

    fn warn(&self, msg: String) {
        let _ = self.events_tx.send(Event::Warn(msg));
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new(ChartConfig::default())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.connected.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        // ChartTask cancels itself on drop; the log handle closes with
        // the shared state.
        self.chart_task = None;
    }
}

/// Possible errors when opening a session connection.
#[derive(Debug)]
pub enum ConnectError {
    /// A read loop is already running; disconnect first.
    AlreadyConnected,
    /// The serial port could not be opened.
    Open(serialport::Error),
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectError::AlreadyConnected => write!(f, "already connected"),
            ConnectError::Open(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConnectError {}

impl From<serialport::Error> for ConnectError {
    fn from(e: serialport::Error) -> ConnectError {
        ConnectError::Open(e)
    }
}

/// The background read loop. Runs until the connected flag clears or
/// the source faults; a fault ends the stream silently, leaving the
/// flag cleared for consumers to notice.
fn read_loop<S: LineRead>(mut source: S, shared: Arc<Shared>, events: Sender<Event>) {
    while shared.connected.load(Ordering::SeqCst) {
        match source.read_line() {
            Ok(Some(line)) => {
                let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
                let _ = events.send(Event::Line {
                    stamp: stamp.clone(),
                    text: line.clone(),
                });
                if shared.logging.load(Ordering::SeqCst) {
                    let mut guard = shared.log_file.lock().unwrap();
                    if let Some(file) = guard.as_mut() {
                        // Flush per line: a killed session keeps the
                        // tail of its log.
                        let _ = writeln!(file, "[{}] {}", stamp, line);
                        let _ = file.flush();
                    }
                }
                if shared.graphing.load(Ordering::SeqCst) {
                    match classify(&line) {
                        Some(reading) => shared.store.append(Sample {
                            timestamp: stamp,
                            temperature: reading.temperature,
                            humidity: reading.humidity,
                        }),
                        None => {
                            let _ = events.send(Event::Warn(format!("Invalid format: {}", line)));
                        }
                    }
                }
            }
            Ok(None) => continue,
            Err(_) => break,
        }
    }
    shared.connected.store(false, Ordering::SeqCst);
}

//! src/ingest/reader.rs
//!
//! Background thread that owns the sensor connection.
//!
//! Each iteration: check the stop flag, (re)connect if needed, do one read
//! bounded by the port timeout, reassemble lines, validate them and push the
//! accepted frames onto the queue. Faults are classified, logged and reported to
//! the observer; none of them stops the loop.

use std::io::{self, ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::frame::validate;
use super::lines::{LineAssembler, RawLine};
use super::link::{CommandWriter, Connect, Link};
use super::queue::FrameProducer;
use super::stats::ReaderObserver;
use crate::error::LinkError;

/// Longest line kept by the assembler; sensor frames are far shorter.
pub const MAX_LINE: usize = 64;

/// Longest single sleep, so the stop flag is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(20);

/// How the loop reacts to a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// Keep the connection, back off, try again.
    Transient,
    /// Drop the connection, back off, reopen.
    Disconnect,
}

/// Failure of a connect or read attempt.
#[derive(Error, Debug)]
pub enum ReadFault {
    #[error("connect failed: {0}")]
    Connect(#[from] LinkError),
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

impl ReadFault {
    pub fn kind(&self) -> FaultKind {
        match self {
            ReadFault::Connect(_) => FaultKind::Disconnect,
            ReadFault::Io(e) => match e.kind() {
                ErrorKind::BrokenPipe
                | ErrorKind::NotConnected
                | ErrorKind::ConnectionAborted
                | ErrorKind::ConnectionReset
                | ErrorKind::UnexpectedEof
                | ErrorKind::NotFound
                | ErrorKind::PermissionDenied => FaultKind::Disconnect,
                _ => FaultKind::Transient,
            },
        }
    }
}

/// A completed line that could not be decoded. Only that line is lost.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineFault {
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
    #[error("line exceeded {0} bytes")]
    Oversized(usize),
}

/// Loop pacing.
#[derive(Clone, Copy, Debug)]
pub struct ReaderTiming {
    /// Delay between iterations.
    pub poll_interval: Duration,
    /// Delay after a fault.
    pub backoff: Duration,
}

impl Default for ReaderTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            backoff: Duration::from_millis(500),
        }
    }
}

/// Result of one loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Number of frames pushed this iteration (zero on a read timeout).
    Delivered(usize),
    Faulted(FaultKind),
}

pub struct SerialReader<C: Connect> {
    connector: C,
    link: Option<Box<dyn Read + Send>>,
    assembler: LineAssembler,
    producer: FrameProducer,
    writer: CommandWriter,
    observer: Box<dyn ReaderObserver>,
    timing: ReaderTiming,
    buf: Vec<u8>,
}

impl<C: Connect> SerialReader<C> {
    pub fn new(
        connector: C,
        producer: FrameProducer,
        writer: CommandWriter,
        observer: Box<dyn ReaderObserver>,
        timing: ReaderTiming,
    ) -> Self {
        Self {
            connector,
            link: None,
            assembler: LineAssembler::new(MAX_LINE),
            producer,
            writer,
            observer,
            timing,
            buf: vec![0u8; 256],
        }
    }

    /// Run one iteration and handle whatever fault it produced.
    pub fn tick(&mut self) -> Tick {
        match self.step() {
            Ok(n) => Tick::Delivered(n),
            Err(fault) => {
                let kind = fault.kind();
                warn!(error = %fault, ?kind, "Serial reader fault");
                self.observer.read_fault(&fault);
                if kind == FaultKind::Disconnect {
                    self.detach();
                }
                Tick::Faulted(kind)
            }
        }
    }

    /// Run until `stop` is set.
    pub fn run(mut self, stop: &AtomicBool) {
        info!("Serial reader started");
        while !stop.load(Ordering::Relaxed) {
            let delay = match self.tick() {
                Tick::Delivered(_) => self.timing.poll_interval,
                Tick::Faulted(_) => self.timing.backoff,
            };
            pause(stop, delay);
        }
        self.detach();
        info!("Serial reader exiting");
    }

    fn step(&mut self) -> Result<usize, ReadFault> {
        if self.link.is_none() {
            let link = self.connector.connect()?;
            self.attach(link);
        }
        let Some(reader) = self.link.as_mut() else {
            return Ok(0);
        };

        let n = match reader.read(&mut self.buf) {
            Ok(0) => return Err(io::Error::from(ErrorKind::UnexpectedEof).into()),
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut delivered = 0;
        for raw in self.assembler.push_chunk(&self.buf[..n]) {
            let bytes = match raw {
                RawLine::Line(bytes) => bytes,
                RawLine::Oversized(len) => {
                    self.observer.line_fault(&LineFault::Oversized(len));
                    continue;
                }
            };
            let Ok(text) = std::str::from_utf8(&bytes) else {
                warn!(len = bytes.len(), "Dropping non-UTF8 line");
                self.observer.line_fault(&LineFault::InvalidUtf8);
                continue;
            };
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            match validate(line) {
                Some(frame) => {
                    self.observer.frame_accepted(&frame);
                    self.producer.push(frame);
                    delivered += 1;
                }
                None => {
                    debug!(line, "Rejected malformed frame");
                    self.observer.frame_rejected(line);
                }
            }
        }
        Ok(delivered)
    }

    fn attach(&mut self, link: Link) {
        info!(link = %link.description, "Sensor link up");
        self.observer.connected(&link.description);
        self.writer.install(link.writer);
        self.assembler.reset();
        self.link = Some(link.reader);
    }

    fn detach(&mut self) {
        if self.link.take().is_some() {
            info!("Sensor link down");
            self.observer.disconnected();
        }
        self.writer.clear();
        self.assembler.reset();
    }
}

impl<C: Connect + 'static> SerialReader<C> {
    /// Move the reader onto its own thread.
    pub fn spawn(self) -> io::Result<ReaderHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let thread = thread::Builder::new()
            .name("serial-reader".into())
            .spawn(move || self.run(&flag))?;
        Ok(ReaderHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Sleep for `total`, waking early once `stop` is set.
fn pause(stop: &AtomicBool, total: Duration) {
    let mut left = total;
    while !left.is_zero() && !stop.load(Ordering::Relaxed) {
        let slice = left.min(SLEEP_SLICE);
        thread::sleep(slice);
        left -= slice;
    }
}

/// Owner of the reader thread. Dropping it stops and joins the thread.
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Ask the thread to stop and wait for it.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Serial reader thread panicked");
            }
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::frame::SensorFrame;
    use crate::ingest::link::tests::SharedSink;
    use crate::ingest::queue::{FrameConsumer, FrameQueue};
    use crate::ingest::stats::ReaderStats;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Instant;
    use tracing_test::traced_test;

    enum Step {
        Data(&'static [u8]),
        Fail(ErrorKind),
    }

    type Script = Arc<Mutex<VecDeque<Step>>>;

    /// Port that plays back a shared script and then times out forever.
    struct ScriptedPort {
        script: Script,
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Step::Data(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(bytes);
                    Ok(bytes.len())
                }
                Some(Step::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
                None => {
                    thread::sleep(Duration::from_millis(1));
                    Err(ErrorKind::TimedOut.into())
                }
            }
        }
    }

    struct ScriptedConnect {
        script: Script,
        refuse_first: usize,
        connects: usize,
        sink: SharedSink,
    }

    impl ScriptedConnect {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                script: Arc::new(Mutex::new(steps.into())),
                refuse_first: 0,
                connects: 0,
                sink: SharedSink::default(),
            }
        }
    }

    impl Connect for ScriptedConnect {
        fn connect(&mut self) -> Result<Link, LinkError> {
            self.connects += 1;
            if self.connects <= self.refuse_first {
                return Err(io::Error::new(ErrorKind::NotFound, "no such device").into());
            }
            Ok(Link {
                reader: Box::new(ScriptedPort {
                    script: self.script.clone(),
                }),
                writer: Some(Box::new(self.sink.clone())),
                description: "scripted".into(),
            })
        }
    }

    fn fast() -> ReaderTiming {
        ReaderTiming {
            poll_interval: Duration::from_millis(1),
            backoff: Duration::from_millis(1),
        }
    }

    fn reader(
        connect: ScriptedConnect,
    ) -> (
        SerialReader<ScriptedConnect>,
        FrameConsumer,
        Arc<ReaderStats>,
        CommandWriter,
    ) {
        let (producer, consumer) = FrameQueue::unbounded();
        let stats = ReaderStats::new();
        let writer = CommandWriter::new();
        let reader = SerialReader::new(
            connect,
            producer,
            writer.clone(),
            Box::new(stats.clone()),
            fast(),
        );
        (reader, consumer, stats, writer)
    }

    fn texts(frames: Vec<SensorFrame>) -> Vec<String> {
        frames.into_iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn delivers_valid_frames_and_drops_malformed() {
        let connect = ScriptedConnect::new(vec![Step::Data(
            b"013,5cm\r\n13,5cm\r\ngarbage\r\n014,0cm\r\n",
        )]);
        let (mut reader, consumer, stats, _) = reader(connect);

        assert_eq!(reader.tick(), Tick::Delivered(2));
        assert_eq!(texts(consumer.drain_up_to(10)), vec!["013,5cm", "014,0cm"]);
        let snap = stats.snapshot();
        assert_eq!(snap.frames_accepted, 2);
        assert_eq!(snap.frames_rejected, 2);
        assert!(snap.connected);
    }

    #[traced_test]
    #[test]
    fn transient_read_failure_keeps_the_loop_alive() {
        let connect = ScriptedConnect::new(vec![
            Step::Data(b"013,5cm\n"),
            Step::Fail(ErrorKind::Other),
            Step::Data(b"014,2cm\n"),
        ]);
        let (mut reader, consumer, stats, writer) = reader(connect);

        assert_eq!(reader.tick(), Tick::Delivered(1));
        assert_eq!(reader.tick(), Tick::Faulted(FaultKind::Transient));
        assert!(writer.is_connected());
        assert_eq!(reader.tick(), Tick::Delivered(1));

        assert_eq!(texts(consumer.drain_up_to(10)), vec!["013,5cm", "014,2cm"]);
        assert_eq!(stats.snapshot().read_faults, 1);
        assert_eq!(stats.snapshot().connects, 1);
        assert!(logs_contain("Serial reader fault"));
    }

    #[test]
    fn disconnect_drops_link_and_reconnects() {
        let connect = ScriptedConnect::new(vec![
            Step::Data(b"013,"),
            Step::Fail(ErrorKind::BrokenPipe),
            Step::Data(b"5cm\n015,0cm\n"),
        ]);
        let (mut reader, consumer, stats, writer) = reader(connect);

        assert_eq!(reader.tick(), Tick::Delivered(0));
        assert_eq!(reader.tick(), Tick::Faulted(FaultKind::Disconnect));
        assert!(!writer.is_connected());
        assert!(!stats.snapshot().connected);

        // The partial "013," is discarded with the old link.
        assert_eq!(reader.tick(), Tick::Delivered(1));
        assert_eq!(texts(consumer.drain_up_to(10)), vec!["015,0cm"]);
        assert_eq!(stats.snapshot().connects, 2);
        assert!(writer.is_connected());
    }

    #[test]
    fn connect_failures_are_retried() {
        let mut connect = ScriptedConnect::new(vec![Step::Data(b"010,0cm\n")]);
        connect.refuse_first = 2;
        let (mut reader, consumer, stats, _) = reader(connect);

        assert_eq!(reader.tick(), Tick::Faulted(FaultKind::Disconnect));
        assert_eq!(reader.tick(), Tick::Faulted(FaultKind::Disconnect));
        assert_eq!(reader.tick(), Tick::Delivered(1));
        assert_eq!(consumer.drain_up_to(10).len(), 1);
        assert_eq!(stats.snapshot().read_faults, 2);
    }

    #[test]
    fn timeout_is_an_idle_iteration() {
        let (mut reader, consumer, stats, _) = reader(ScriptedConnect::new(vec![]));
        assert_eq!(reader.tick(), Tick::Delivered(0));
        assert!(consumer.pop().is_none());
        assert_eq!(stats.snapshot().read_faults, 0);
    }

    #[test]
    fn invalid_utf8_line_is_counted_and_skipped() {
        let connect = ScriptedConnect::new(vec![Step::Data(b"\xff\xfe\n012,0cm\n")]);
        let (mut reader, consumer, stats, _) = reader(connect);
        assert_eq!(reader.tick(), Tick::Delivered(1));
        assert_eq!(consumer.drain_up_to(10).len(), 1);
        assert_eq!(stats.snapshot().line_faults, 1);
    }

    #[test]
    fn writes_go_to_the_current_link() {
        let connect = ScriptedConnect::new(vec![]);
        let sink = connect.sink.clone();
        let (mut reader, _consumer, _, writer) = reader(connect);
        reader.tick();
        writer.send(b'4').unwrap();
        assert_eq!(*sink.0.lock().unwrap(), b"4".to_vec());
    }

    #[test]
    fn spawned_reader_survives_faults_and_stops_promptly() {
        let connect = ScriptedConnect::new(vec![
            Step::Fail(ErrorKind::Other),
            Step::Data(b"011,1cm\n"),
        ]);
        let (reader, consumer, _, _) = reader(connect);
        let mut handle = reader.spawn().unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut got = Vec::new();
        while got.is_empty() && Instant::now() < deadline {
            got.extend(consumer.drain_up_to(10));
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(texts(got), vec!["011,1cm"]);
        assert!(handle.is_running());

        let start = Instant::now();
        handle.stop();
        assert!(!handle.is_running());
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}

//! src/ingest/stats.rs
//!
//! Observer hooks for the reader thread and the default counting observer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::frame::SensorFrame;
use super::reader::{LineFault, ReadFault};

/// Callbacks fired by the reader thread. All methods default to no-ops.
pub trait ReaderObserver: Send {
    fn connected(&self, _description: &str) {}
    fn disconnected(&self) {}
    fn frame_accepted(&self, _frame: &SensorFrame) {}
    fn frame_rejected(&self, _line: &str) {}
    fn line_fault(&self, _fault: &LineFault) {}
    fn read_fault(&self, _fault: &ReadFault) {}
}

impl<T: ReaderObserver + Sync> ReaderObserver for Arc<T> {
    fn connected(&self, description: &str) {
        (**self).connected(description)
    }
    fn disconnected(&self) {
        (**self).disconnected()
    }
    fn frame_accepted(&self, frame: &SensorFrame) {
        (**self).frame_accepted(frame)
    }
    fn frame_rejected(&self, line: &str) {
        (**self).frame_rejected(line)
    }
    fn line_fault(&self, fault: &LineFault) {
        (**self).line_fault(fault)
    }
    fn read_fault(&self, fault: &ReadFault) {
        (**self).read_fault(fault)
    }
}

/// Lock-free counters shared between the reader thread and the UI.
#[derive(Debug, Default)]
pub struct ReaderStats {
    connected: AtomicBool,
    connects: AtomicU64,
    frames_accepted: AtomicU64,
    frames_rejected: AtomicU64,
    line_faults: AtomicU64,
    read_faults: AtomicU64,
    link: Mutex<Option<String>>,
    last_fault: Mutex<Option<String>>,
}

/// Point-in-time copy of [`ReaderStats`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsSnapshot {
    pub connected: bool,
    pub connects: u64,
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    pub line_faults: u64,
    pub read_faults: u64,
    pub link: Option<String>,
    pub last_fault: Option<String>,
}

impl ReaderStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connected: self.connected.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            frames_accepted: self.frames_accepted.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            line_faults: self.line_faults.load(Ordering::Relaxed),
            read_faults: self.read_faults.load(Ordering::Relaxed),
            link: self.link.lock().ok().and_then(|l| l.clone()),
            last_fault: self.last_fault.lock().ok().and_then(|f| f.clone()),
        }
    }

    fn set_last_fault(&self, text: String) {
        if let Ok(mut last) = self.last_fault.lock() {
            *last = Some(text);
        }
    }
}

impl ReaderObserver for ReaderStats {
    fn connected(&self, description: &str) {
        self.connected.store(true, Ordering::Relaxed);
        self.connects.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut link) = self.link.lock() {
            *link = Some(description.to_string());
        }
    }

    fn disconnected(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }

    fn frame_accepted(&self, _frame: &SensorFrame) {
        self.frames_accepted.fetch_add(1, Ordering::Relaxed);
    }

    fn frame_rejected(&self, _line: &str) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn line_fault(&self, fault: &LineFault) {
        self.line_faults.fetch_add(1, Ordering::Relaxed);
        self.set_last_fault(fault.to_string());
    }

    fn read_fault(&self, fault: &ReadFault) {
        self.read_faults.fetch_add(1, Ordering::Relaxed);
        self.set_last_fault(fault.to_string());
    }
}

//! src/ingest.rs
//!
//! Serial ingest pipeline: frame validation, line reassembly, the reader
//! thread and the frame queue it feeds.

pub mod frame;
pub mod lines;
pub mod link;
pub mod queue;
pub mod reader;
pub mod simulate;
pub mod stats;

pub use frame::SensorFrame;
pub use link::{CommandWriter, Connect, SerialConnect};
pub use queue::{FrameConsumer, FrameQueue};
pub use reader::{ReaderHandle, ReaderTiming, SerialReader};
pub use simulate::SimulatedConnect;
pub use stats::{ReaderStats, StatsSnapshot};

//! src/ingest/queue.rs
//!
//! FIFO handoff of validated frames from the reader thread to the render loop.
//!
//! Neither side ever blocks: `push` always succeeds (a bounded queue drops its
//! oldest frame to make room) and the consumer only takes what is already there.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use tracing::debug;

use super::frame::SensorFrame;

/// Constructors for the producer/consumer pair.
pub struct FrameQueue;

impl FrameQueue {
    /// Queue without a capacity limit.
    pub fn unbounded() -> (FrameProducer, FrameConsumer) {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self::pair(tx, rx, false)
    }

    /// Queue holding at most `capacity` frames; the oldest is evicted when full.
    pub fn bounded(capacity: usize) -> (FrameProducer, FrameConsumer) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        Self::pair(tx, rx, true)
    }

    /// `capacity == 0` means unbounded.
    pub fn with_capacity(capacity: usize) -> (FrameProducer, FrameConsumer) {
        if capacity == 0 {
            Self::unbounded()
        } else {
            Self::bounded(capacity)
        }
    }

    fn pair(
        tx: Sender<SensorFrame>,
        rx: Receiver<SensorFrame>,
        bounded: bool,
    ) -> (FrameProducer, FrameConsumer) {
        let dropped = Arc::new(AtomicU64::new(0));
        let producer = FrameProducer {
            tx,
            evict: bounded.then(|| rx.clone()),
            dropped: dropped.clone(),
        };
        let consumer = FrameConsumer { rx, dropped };
        (producer, consumer)
    }
}

/// Producer side, owned by the reader thread.
pub struct FrameProducer {
    tx: Sender<SensorFrame>,
    /// Second receiver used only to evict the oldest frame of a full bounded queue.
    evict: Option<Receiver<SensorFrame>>,
    dropped: Arc<AtomicU64>,
}

impl FrameProducer {
    /// Enqueue a frame. Never blocks. Frames pushed after the consumer is gone
    /// are discarded.
    pub fn push(&self, frame: SensorFrame) {
        let mut frame = frame;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return,
                Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(back)) => {
                    frame = back;
                    if let Some(evict) = &self.evict {
                        if evict.try_recv().is_ok() {
                            self.dropped.fetch_add(1, Ordering::Relaxed);
                            debug!("Frame queue full, dropped oldest frame");
                        }
                    }
                }
            }
        }
    }
}

/// Consumer side, owned by the render loop.
pub struct FrameConsumer {
    rx: Receiver<SensorFrame>,
    dropped: Arc<AtomicU64>,
}

impl FrameConsumer {
    /// Next frame if one is available right now.
    #[cfg(test)]
    pub fn pop(&self) -> Option<SensorFrame> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Up to `max` frames that are available right now, oldest first.
    pub fn drain_up_to(&self, max: usize) -> Vec<SensorFrame> {
        self.rx.try_iter().take(max).collect()
    }

    /// Frames waiting to be drained.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Frames evicted by a full bounded queue since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::frame::validate;
    use std::time::{Duration, Instant};

    fn frame(s: &str) -> SensorFrame {
        validate(s).unwrap()
    }

    #[test]
    fn drain_on_empty_queue_returns_immediately() {
        let (_producer, consumer) = FrameQueue::unbounded();
        let start = Instant::now();
        assert!(consumer.drain_up_to(16).is_empty());
        assert!(consumer.pop().is_none());
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn delivers_in_push_order() {
        let (producer, consumer) = FrameQueue::unbounded();
        for s in ["005,0cm", "006,2cm", "004,9cm", "006,2cm"] {
            producer.push(frame(s));
        }
        let got: Vec<String> = consumer
            .drain_up_to(10)
            .iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(got, vec!["005,0cm", "006,2cm", "004,9cm", "006,2cm"]);
    }

    #[test]
    fn drain_respects_limit_and_keeps_the_rest() {
        let (producer, consumer) = FrameQueue::unbounded();
        for s in ["001,0cm", "002,0cm", "003,0cm"] {
            producer.push(frame(s));
        }
        assert_eq!(consumer.drain_up_to(2).len(), 2);
        assert_eq!(consumer.len(), 1);
        assert_eq!(consumer.pop(), Some(frame("003,0cm")));
    }

    #[test]
    fn bounded_queue_drops_oldest() {
        let (producer, consumer) = FrameQueue::bounded(2);
        for s in ["001,0cm", "002,0cm", "003,0cm", "004,0cm"] {
            producer.push(frame(s));
        }
        assert_eq!(
            consumer.drain_up_to(10),
            vec![frame("003,0cm"), frame("004,0cm")]
        );
        assert_eq!(consumer.dropped(), 2);
    }

    #[test]
    fn push_after_consumer_dropped_does_not_block() {
        let (producer, consumer) = FrameQueue::bounded(1);
        drop(consumer);
        producer.push(frame("001,0cm"));
        producer.push(frame("002,0cm"));
    }

    #[test]
    fn works_across_threads() {
        let (producer, consumer) = FrameQueue::unbounded();
        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                producer.push(frame(&format!("{:03},0cm", i)));
            }
        });
        handle.join().unwrap();
        let got = consumer.drain_up_to(1000);
        assert_eq!(got.len(), 100);
        assert_eq!(got[42], frame("042,0cm"));
    }
}

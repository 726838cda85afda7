//! src/ingest/lines.rs
//!
//! Reassembles newline-terminated raw frames from arbitrary read chunks.

use tracing::{trace, warn};

/// Outcome of one completed line.
#[derive(Debug, PartialEq, Eq)]
pub enum RawLine {
    /// A complete line with the terminator (and any `\r`) removed.
    Line(Vec<u8>),
    /// A line longer than the configured limit; its bytes were discarded.
    Oversized(usize),
}

/// Buffers partial reads until a `\n` arrives.
pub struct LineAssembler {
    pending: Vec<u8>,
    max_line: usize,
    /// Set while skipping the tail of an oversized line.
    discarding: bool,
}

impl LineAssembler {
    pub fn new(max_line: usize) -> Self {
        Self {
            pending: Vec::with_capacity(max_line.min(256)),
            max_line,
            discarding: false,
        }
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop any partially received line, e.g. after the link was lost.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }

    /// Feed one chunk and return every line it completed, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<RawLine> {
        trace!(chunk_len = chunk.len(), "Pushing chunk into LineAssembler");
        let mut lines = Vec::new();

        for &b in chunk {
            if b == b'\n' {
                if self.discarding {
                    self.discarding = false;
                    self.pending.clear();
                    continue;
                }
                let mut line = std::mem::take(&mut self.pending);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                lines.push(RawLine::Line(line));
                continue;
            }

            if self.discarding {
                continue;
            }
            self.pending.push(b);
            if self.pending.len() > self.max_line {
                warn!(
                    pending_len = self.pending.len(),
                    max_line = self.max_line,
                    "Dropping oversized line"
                );
                lines.push(RawLine::Oversized(self.pending.len()));
                self.pending.clear();
                self.discarding = true;
            }
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn line(s: &str) -> RawLine {
        RawLine::Line(s.as_bytes().to_vec())
    }

    #[test]
    fn splits_crlf_lines() {
        let mut asm = LineAssembler::new(32);
        let lines = asm.push_chunk(b"013,5cm\r\n014,0cm\n");
        assert_eq!(lines, vec![line("013,5cm"), line("014,0cm")]);
        assert_eq!(asm.pending_len(), 0);
    }

    #[test]
    fn joins_frames_split_across_reads() {
        let mut asm = LineAssembler::new(32);
        assert!(asm.push_chunk(b"01").is_empty());
        assert!(asm.push_chunk(b"3,5").is_empty());
        assert_eq!(asm.push_chunk(b"cm\r\n01"), vec![line("013,5cm")]);
        assert_eq!(asm.pending_len(), 2);
    }

    #[test]
    fn keeps_empty_lines_for_the_caller() {
        let mut asm = LineAssembler::new(32);
        assert_eq!(asm.push_chunk(b"\r\n"), vec![line("")]);
    }

    #[traced_test]
    #[test]
    fn drops_oversized_line_until_next_terminator() {
        let mut asm = LineAssembler::new(8);
        let lines = asm.push_chunk(b"0123456789abc\n013,5cm\n");
        assert_eq!(lines, vec![RawLine::Oversized(9), line("013,5cm")]);
        assert!(logs_contain("Dropping oversized line"));
    }

    #[test]
    fn reset_discards_partial_line() {
        let mut asm = LineAssembler::new(32);
        asm.push_chunk(b"013,");
        asm.reset();
        assert_eq!(asm.push_chunk(b"014,0cm\n"), vec![line("014,0cm")]);
    }
}

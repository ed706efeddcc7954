//! Pending-event buffer
//!
//! FIFO of decoded records, both kernel-delivered and synthesized, charged
//! against a fixed byte capacity as if they were still framed in one raw
//! buffer. The fill level only resets once every record has been consumed.

use crate::error::WatchError;
use std::collections::VecDeque;
use treewatch_core::{Event, RecordError, RecordReader};

/// Fixed-capacity queue of pending events
#[derive(Debug)]
pub struct EventBuffer {
    events: VecDeque<Event>,
    fill: usize,
    capacity: usize,
}

impl EventBuffer {
    /// Create an empty buffer of `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            fill: 0,
            capacity,
        }
    }

    /// Capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes charged since the buffer was last empty
    pub fn fill(&self) -> usize {
        self.fill
    }

    /// Number of unconsumed records
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if every record has been consumed
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append a synthesized record
    ///
    /// Fails without queuing anything if the framed record does not fit.
    pub fn push(&mut self, event: Event) -> Result<(), WatchError> {
        let needed = self.fill + event.framed_len();
        if needed > self.capacity {
            return Err(WatchError::BufferOverflow {
                capacity: self.capacity,
                needed,
            });
        }

        self.fill = needed;
        self.events.push_back(event);
        Ok(())
    }

    /// Decode a batch of raw kernel bytes and queue every record
    ///
    /// A truncated record rejects the whole batch.
    pub fn extend_from_bytes(&mut self, bytes: &[u8]) -> Result<usize, RecordError> {
        let decoded = RecordReader::new(bytes).collect::<Result<Vec<_>, _>>()?;
        let count = decoded.len();

        self.fill += bytes.len();
        self.events.extend(decoded);
        Ok(count)
    }

    /// Take the oldest record
    pub fn pop(&mut self) -> Option<Event> {
        let event = self.events.pop_front();
        if self.events.is_empty() {
            self.fill = 0;
        }
        event
    }
}

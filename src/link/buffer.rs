use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

/// A single raw line observed on the serial link.
#[derive(Debug, Clone)]
pub struct LineRecord {
    /// When the complete line was read off the wire.
    pub observed_at: Instant,
    /// Decoded, trimmed text.
    pub text: String,
}

impl LineRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            observed_at: Instant::now(),
            text: text.into(),
        }
    }
}

/// Bounded ring of recent lines from the robot.
///
/// The robot emits unframed lines carrying no request IDs, so this
/// buffer is the only record of what it said and when. Once full, the
/// oldest line is evicted for each new one.
#[derive(Clone)]
pub struct LineBuffer {
    capacity: usize,
    records: Arc<RwLock<VecDeque<LineRecord>>>,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn push(&self, record: LineRecord) {
        let mut records = self.records.write();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<LineRecord> {
        let records = self.records.read();
        records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// One command/response exchange, as served by the log endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRecord {
    #[serde(rename = "cmd")]
    pub command: String,
    pub response: String,
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

/// Rolling record of commands sent and the replies attributed to them.
///
/// Purely observational: reply matching happens against the line
/// buffer, never against this log. Timeouts are recorded too, with the
/// sentinel text the gateway uses for them.
#[derive(Clone)]
pub struct CommandHistory {
    capacity: usize,
    records: Arc<RwLock<VecDeque<ExchangeRecord>>>,
}

impl CommandHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn record(&self, command: &str, response: &str) {
        let record = ExchangeRecord {
            command: command.to_string(),
            response: response.to_string(),
            recorded_at: Utc::now(),
        };

        let mut records = self.records.write();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<ExchangeRecord> {
        let records = self.records.read();
        records.iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

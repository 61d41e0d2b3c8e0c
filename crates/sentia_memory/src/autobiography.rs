use sentia_core::SignalMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// One entry of lived history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutobiographicalEvent {
    /// Agent cycle at which the entry was written.
    pub step: u64,
    pub description: String,
    pub chemicals: SignalMap,
    pub identity: SignalMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Bounded in-memory log, oldest entries dropped first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutobiographicalMemory {
    capacity: usize,
    events: VecDeque<AutobiographicalEvent>,
}

impl Default for AutobiographicalMemory {
    fn default() -> Self {
        Self::new(500)
    }
}

impl AutobiographicalMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn record_event(&mut self, event: AutobiographicalEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &AutobiographicalEvent> {
        self.events.iter().skip(self.events.len().saturating_sub(n))
    }

    pub fn all(&self) -> impl Iterator<Item = &AutobiographicalEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

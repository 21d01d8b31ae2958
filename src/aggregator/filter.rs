//! Thread head filtering.
//!
//! A thread's canonical block is the first one whose head symbol is the
//! thread-entry symbol. With filtering on, every later block for the same
//! thread, and every block headed by anything else, is dropped whole.

use crate::parser::schema::ThreadKey;
use log::debug;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ThreadHeadFilter {
    enabled: bool,
    entry_symbol: String,
    seen: HashSet<ThreadKey>,
}

impl ThreadHeadFilter {
    pub fn new(enabled: bool, entry_symbol: impl Into<String>) -> Self {
        Self {
            enabled,
            entry_symbol: entry_symbol.into(),
            seen: HashSet::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a block for `thread` headed by `head_symbol` may be emitted
    pub fn admits(&self, thread: &ThreadKey, head_symbol: &str) -> bool {
        if !self.enabled {
            return true;
        }
        if self.seen.contains(thread) {
            debug!("Dropping repeated block for thread {:?}", thread);
            return false;
        }
        if !head_symbol.contains(&self.entry_symbol) {
            debug!("Dropping block for {:?} headed by '{}'", thread, head_symbol);
            return false;
        }
        true
    }

    /// Record that a thread's canonical block has been taken
    pub fn record(&mut self, thread: ThreadKey) {
        if self.enabled {
            self.seen.insert(thread);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tid: &str) -> ThreadKey {
        ThreadKey {
            command: "GameThread".to_string(),
            pid: "100".to_string(),
            tid: tid.to_string(),
        }
    }

    #[test]
    fn test_disabled_admits_everything() {
        let mut filter = ThreadHeadFilter::new(false, "__start_thread");
        filter.record(key("1"));
        assert!(filter.admits(&key("1"), "anything"));
    }

    #[test]
    fn test_only_first_entry_block_admitted() {
        let mut filter = ThreadHeadFilter::new(true, "__start_thread");
        assert!(!filter.admits(&key("1"), "Tick"));
        assert!(filter.admits(&key("1"), "__start_thread"));
        filter.record(key("1"));
        assert!(!filter.admits(&key("1"), "__start_thread"));
        assert!(filter.admits(&key("2"), "__start_thread"));
    }
}

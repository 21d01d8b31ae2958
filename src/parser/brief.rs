//! Brief-mode reader.
//!
//! Without tree detail every table row is a single frame observation.
//! Contiguous rows of one thread are chained, in order, into a synthetic
//! call stack weighted by the first row's Children%.

use super::schema::{TableRow, ThreadKey};
use crate::aggregator::filter::ThreadHeadFilter;
use crate::aggregator::stack_builder::StackAccumulator;
use log::{debug, warn};

/// A run of contiguous rows belonging to one thread
#[derive(Debug, Clone, PartialEq)]
pub struct BriefBlock {
    pub thread: ThreadKey,
    pub command: String,
    pub symbols: Vec<String>,
    /// Children% of the block's first row
    pub block_pct: f64,
    /// Set when the report marked this block's detail as skipped
    pub skipped: bool,
}

impl BriefBlock {
    fn start(row: &TableRow) -> Self {
        let symbols = if row.symbol.is_empty() {
            Vec::new()
        } else {
            vec![row.symbol.clone()]
        };
        Self {
            thread: row.thread_key(),
            command: row.command.clone(),
            symbols,
            block_pct: row.children_pct,
            skipped: false,
        }
    }

    /// First symbol of the chain
    pub fn head_symbol(&self) -> &str {
        self.symbols.first().map_or("", String::as_str)
    }

    /// `[command] + symbols`
    pub fn frames(&self) -> Vec<String> {
        std::iter::once(self.command.clone())
            .chain(self.symbols.iter().cloned())
            .collect()
    }
}

/// Groups rows into blocks as they stream past
#[derive(Debug, Default)]
pub struct BriefCollector {
    current: Option<BriefBlock>,
}

impl BriefCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a row; returns the previous block when the thread changes
    pub fn observe(&mut self, row: &TableRow) -> Option<BriefBlock> {
        if let Some(block) = self.current.as_mut() {
            if block.thread == row.thread_key() {
                let repeated = block.symbols.last().is_some_and(|s| *s == row.symbol);
                if !row.symbol.is_empty() && !repeated {
                    block.symbols.push(row.symbol.clone());
                }
                return None;
            }
        }
        self.current.replace(BriefBlock::start(row))
    }

    /// Mark the open block as skipped
    pub fn mark_skipped(&mut self) {
        if let Some(block) = self.current.as_mut() {
            block.skipped = true;
        }
    }

    /// Take the open block at end of input
    pub fn finish(&mut self) -> Option<BriefBlock> {
        self.current.take()
    }
}

/// Emit a finished block into the accumulator
///
/// Skipped blocks are dropped before the thread head filter is consulted.
/// Returns whether a stack was recorded.
pub fn flush_block(
    block: BriefBlock,
    filter: &mut ThreadHeadFilter,
    acc: &mut StackAccumulator,
    event_total: f64,
) -> bool {
    if block.symbols.is_empty() {
        if block.block_pct > 0.0 {
            warn!("Block for {:?} carries {:.2}% but no frames", block.thread, block.block_pct);
        }
        return false;
    }
    if block.skipped {
        debug!("Block for {:?} was skipped in brief mode", block.thread);
        return false;
    }
    if !filter.admits(&block.thread, block.head_symbol()) {
        return false;
    }

    let count = event_total * (block.block_pct / 100.0);
    let recorded = acc.add(&block.frames(), count);
    if !recorded {
        debug!("Block for {:?} carries no weight", block.thread);
    }
    filter.record(block.thread);
    recorded
}

//! Accumulate weighted call paths into a folded stack map.
//!
//! Folded stacks are the input format for flamegraph generation.
//! Format: "outer;inner;innermost count"
//!
//! Example: "GameThread;__start_thread;Tick 1000"
//! This means: GameThread entered __start_thread which called Tick,
//! accounting for 1000 events.

use crate::parser::schema::WeightedStack;
use indexmap::IndexMap;
use log::debug;

/// A single folded stack entry
///
/// **Public** - used by flamegraph and output writers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string
    pub stack: String,

    /// Absolute event count for this stack
    pub weight: u64,
}

impl CollapsedStack {
    /// Create a new collapsed stack
    pub fn new(stack: String, weight: u64) -> Self {
        Self { stack, weight }
    }

    /// Render as a folded line
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight)
    }
}

/// Merges weighted stacks by their serialized path
///
/// **Public** - fed by both report readers
///
/// Counts for an identical path are summed, never overwritten. Frame order
/// is reversed before the path is used as a key when `reverse` is set.
#[derive(Debug, Clone, Default)]
pub struct StackAccumulator {
    reverse: bool,
    stacks: IndexMap<String, f64>,
}

impl StackAccumulator {
    pub fn new(reverse: bool) -> Self {
        Self {
            reverse,
            stacks: IndexMap::new(),
        }
    }

    /// Add one path; non-positive counts are dropped
    ///
    /// Returns whether the count was recorded.
    pub fn add(&mut self, frames: &[String], count: f64) -> bool {
        if count <= 0.0 || frames.is_empty() {
            return false;
        }
        let key = if self.reverse {
            frames.iter().rev().map(String::as_str).collect::<Vec<_>>().join(";")
        } else {
            frames.join(";")
        };
        *self.stacks.entry(key).or_insert(0.0) += count;
        true
    }

    pub fn add_stack(&mut self, stack: &WeightedStack) -> bool {
        self.add(&stack.frames, stack.count)
    }

    pub fn extend<'a, I>(&mut self, stacks: I)
    where
        I: IntoIterator<Item = &'a WeightedStack>,
    {
        for stack in stacks {
            self.add_stack(stack);
        }
    }

    /// Accumulated counts before rounding
    pub fn raw(&self) -> &IndexMap<String, f64> {
        &self.stacks
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Round every count half to even; entries that round to zero are excluded
    pub fn finish(self) -> StackMap {
        let before = self.stacks.len();
        let entries: IndexMap<String, u64> = self
            .stacks
            .into_iter()
            .filter_map(|(stack, count)| {
                let rounded = count.round_ties_even();
                (rounded >= 1.0).then_some((stack, rounded as u64))
            })
            .collect();
        debug!(
            "Rounded {} accumulated stacks, kept {}",
            before,
            entries.len()
        );
        StackMap { entries }
    }
}

/// Final path-to-count map, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackMap {
    entries: IndexMap<String, u64>,
}

impl StackMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a path's count, keeping its first-seen position
    pub fn insert(&mut self, stack: impl Into<String>, count: u64) {
        if count == 0 {
            return;
        }
        *self.entries.entry(stack.into()).or_insert(0) += count;
    }

    pub fn get(&self, stack: &str) -> Option<u64> {
        self.entries.get(stack).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.entries.values().sum()
    }

    /// Same map with each path's frame order reversed
    pub fn reversed(&self) -> StackMap {
        let mut out = StackMap::new();
        for (stack, count) in self.iter() {
            let flipped: Vec<&str> = stack.split(';').rev().collect();
            out.insert(flipped.join(";"), count);
        }
        out
    }

    /// Entries sorted by weight descending, ties in first-seen order
    pub fn to_collapsed_stacks(&self) -> Vec<CollapsedStack> {
        let mut stacks: Vec<CollapsedStack> = self
            .iter()
            .map(|(stack, weight)| CollapsedStack::new(stack.to_string(), weight))
            .collect();
        stacks.sort_by(|a, b| b.weight.cmp(&a.weight));
        stacks
    }
}

impl FromIterator<(String, u64)> for StackMap {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        let mut map = StackMap::new();
        for (stack, count) in iter {
            map.insert(stack, count);
        }
        map
    }
}

//! Aggregation of parsed call paths into folded stacks and metrics.
//!
//! This module turns weighted call paths into:
//! - A folded stack map (for flamegraph generation)
//! - Thread head filtering and root-sum equalization
//! - Hot path analysis and thread explanations

pub mod equalize;
pub mod filter;
pub mod metrics;
pub mod stack_builder;

// Re-export main types and functions
pub use equalize::equalize_root_sum;
pub use filter::ThreadHeadFilter;
pub use metrics::{
    calculate_distribution, calculate_hot_paths, explain_thread, find_thread_head_pct,
    StackDistribution, ThreadExplanation,
};
pub use stack_builder::{CollapsedStack, StackAccumulator, StackMap};

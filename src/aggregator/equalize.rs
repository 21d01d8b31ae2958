//! Root-sum equalization.
//!
//! Percentage chains printed with two decimals drift: the leaves under a
//! root rarely add back up to the root's own share. Equalization rescales
//! the leaves so they do, keeping their relative weights.

use crate::parser::schema::WeightedStack;
use log::debug;

/// Scale `stacks` so their counts sum to `declared`
///
/// Returns the factor applied, or `None` when either sum is not positive.
pub fn equalize_root_sum(stacks: &mut [WeightedStack], declared: f64) -> Option<f64> {
    let actual: f64 = stacks.iter().map(|s| s.count).sum();
    if actual <= 0.0 || declared <= 0.0 {
        return None;
    }

    let factor = declared / actual;
    for stack in stacks.iter_mut() {
        stack.count *= factor;
    }
    debug!(
        "Equalized {} leaves: {:.2} -> {:.2} (x{:.4})",
        stacks.len(),
        actual,
        declared,
        factor
    );
    Some(factor)
}

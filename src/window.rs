// src/window.rs

/// Block numbers to inspect, newest first: `head, head - 1, ...` for at most
/// `count` blocks, stopping at genesis.
pub fn recent_block_numbers(head: u64, count: u64) -> Vec<u64> {
    if count == 0 {
        return Vec::new();
    }
    let oldest = head.saturating_sub(count - 1);
    (oldest..=head).rev().collect()
}

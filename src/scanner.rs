// src/scanner.rs
use alloy::primitives::U256;
use tracing::warn;

use crate::amount::Amount;
use crate::models::Block;

/// Transaction with the largest magnitude seen in a set of blocks.
/// `Default` is the empty result: no parties, zero value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LargestChange {
    pub from: Option<String>,
    pub to: Option<String>,
    pub magnitude: U256,
}

/// Walk every transaction once and keep the strictly largest magnitude.
///
/// On a tie the transaction from the newer block wins, and within one block
/// the earlier position wins, so the answer does not depend on the order the
/// blocks were fetched in. Values that do not parse are skipped.
pub fn find_largest_change(blocks: &[Block]) -> LargestChange {
    let mut largest = LargestChange::default();
    let mut winner_block: Option<u64> = None;

    for block in blocks {
        for tx in &block.transactions {
            let amount: Amount = match tx.value.parse() {
                Ok(amount) => amount,
                Err(e) => {
                    warn!("Skipping transaction in block {}: {}", block.number, e);
                    continue;
                }
            };

            let magnitude = amount.abs();
            let newer_tie = winner_block.is_some_and(|winner| {
                magnitude == largest.magnitude && block.number > winner
            });
            if magnitude > largest.magnitude || newer_tie {
                largest = LargestChange {
                    from: Some(tx.from.clone()),
                    to: tx.to.clone(),
                    magnitude,
                };
                winner_block = Some(block.number);
            }
        }
    }

    largest
}

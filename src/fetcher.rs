// src/fetcher.rs
use futures_util::{stream, StreamExt};
use tracing::{error, info};

use crate::models::Block;
use crate::rpc::{BlockClient, FetchError};

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Blocks that arrived plus the numbers that did not, with the reason.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub blocks: Vec<Block>,
    pub failures: Vec<(u64, FetchError)>,
}

/// Fetch every block in `numbers`, at most `concurrency` requests in flight.
/// A failed block is logged and recorded; it never stops the others.
/// `blocks` comes back in completion order.
pub async fn fetch_blocks(
    client: &BlockClient,
    numbers: &[u64],
    concurrency: usize,
) -> FetchReport {
    let outcomes: Vec<(u64, Result<Block, FetchError>)> = stream::iter(numbers.iter().copied())
        .map(move |number| async move { (number, client.fetch_block(number).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = FetchReport::default();
    for (number, outcome) in outcomes {
        match outcome {
            Ok(block) => report.blocks.push(block),
            Err(e) => {
                error!("Error on block {}: {}", number, e);
                report.failures.push((number, e));
            }
        }
    }

    info!(
        "Fetched {}/{} blocks ({} failed)",
        report.blocks.len(),
        numbers.len(),
        report.failures.len()
    );
    report
}

// src/service.rs
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::amount::format_ether;
use crate::config::Config;
use crate::fetcher::fetch_blocks;
use crate::models::RecentBalanceChange;
use crate::retry::RetryPolicy;
use crate::rpc::{BlockClient, EtherscanTransport, FetchError};
use crate::scanner::find_largest_change;
use crate::window::recent_block_numbers;

/// What went wrong inside a query. Logged, never shown to API callers.
#[derive(Debug, thiserror::Error)]
pub enum QueryFailure {
    #[error("could not resolve the chain head")]
    Head(#[from] FetchError),
}

/// The single error the query surfaces.
#[derive(Debug, thiserror::Error)]
#[error("query failed")]
pub struct QueryFailed(#[source] pub QueryFailure);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub number_of_blocks: u64,
    pub concurrency: usize,
}

impl From<&Config> for ServiceSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            number_of_blocks: cfg.number_of_blocks,
            concurrency: cfg.fetch_concurrency,
        }
    }
}

#[derive(Clone)]
pub struct BalanceChangeService {
    client: BlockClient,
    settings: ServiceSettings,
}

impl BalanceChangeService {
    pub fn new(client: BlockClient, settings: ServiceSettings) -> Self {
        Self { client, settings }
    }

    /// Service talking to the configured Etherscan endpoint.
    pub fn from_config(cfg: &Config) -> eyre::Result<Self> {
        let transport = EtherscanTransport::new(&cfg.api_url, &cfg.api_key, cfg.http_timeout)?;
        let client = BlockClient::new(Arc::new(transport), RetryPolicy::default());
        Ok(Self::new(client, ServiceSettings::from(cfg)))
    }

    pub async fn largest_recent_balance_change(&self) -> Result<RecentBalanceChange, QueryFailed> {
        info!("Searching largest balance change");

        self.run().await.map_err(|failure| {
            error!("Largest balance change query failed: {} ({:?})", failure, failure);
            QueryFailed(failure)
        })
    }

    async fn run(&self) -> Result<RecentBalanceChange, QueryFailure> {
        let head = self.client.fetch_head_number().await?;
        debug!("Latest block id: {}", head);

        let window = recent_block_numbers(head, self.settings.number_of_blocks);
        if let (Some(newest), Some(oldest)) = (window.first(), window.last()) {
            debug!("Handling blocks from {} to {}", oldest, newest);
        }

        let report = fetch_blocks(&self.client, &window, self.settings.concurrency).await;
        if !window.is_empty() && report.blocks.is_empty() {
            error!(
                "None of the {} blocks could be fetched, answering with the zero result",
                window.len()
            );
        }

        let largest = find_largest_change(&report.blocks);
        let balance_change = format_ether(largest.magnitude);
        let sender = largest.from.unwrap_or_default();
        let receiver = largest.to.unwrap_or_default();

        info!(
            "Largest balance change: {} ETH. Sender: {}, receiver: {}",
            balance_change, sender, receiver
        );

        Ok(RecentBalanceChange {
            sender,
            receiver,
            balance_change,
        })
    }
}

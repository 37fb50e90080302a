use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::errors::CoreError;
use crate::models::rate::RateQuote;
use crate::providers::ProviderRegistry;
use crate::storage::rate_store::RateStore;

/// How the updater should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSchedule {
    /// One update cycle, then return.
    OneTime,
    /// Update forever on a fixed interval (plain sleeps, no drift
    /// correction).
    Every(Duration),
}

/// Counts reported by one update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateReport {
    /// Pairs committed to the cache.
    pub updated: usize,
    /// Sources that failed this cycle.
    pub failed_adapters: usize,
}

/// Periodically pulls quotes from every configured source and commits
/// the merged batch to the rate store.
///
/// One source failing never aborts the others; its failure is logged
/// and counted. When every source fails, the previous cache is left
/// untouched and the cycle ends with a warning, not an error.
pub struct UpdateService {
    providers: Arc<ProviderRegistry>,
    store: RateStore,
}

impl UpdateService {
    pub fn new(providers: Arc<ProviderRegistry>, store: RateStore) -> Self {
        Self { providers, store }
    }

    /// One update cycle: query each source in order, merge successes
    /// (later sources overwrite earlier ones for the same pair), commit
    /// the batch.
    pub async fn run_update(&self) -> Result<UpdateReport, CoreError> {
        info!("Starting rates update");

        let mut merged: HashMap<String, RateQuote> = HashMap::new();
        let mut failed_adapters = 0;

        for provider in self.providers.iter() {
            debug!(provider = provider.name(), "Fetching rates");
            match provider.fetch_rates().await {
                Ok(batch) => {
                    info!(
                        provider = provider.name(),
                        count = batch.len(),
                        "Fetch succeeded"
                    );
                    merged.extend(batch);
                }
                Err(e) => {
                    error!(provider = provider.name(), error = %e, "Fetch failed");
                    failed_adapters += 1;
                }
            }
        }

        if merged.is_empty() {
            warn!(failed_adapters, "No rates fetched; cache left untouched");
            return Ok(UpdateReport {
                updated: 0,
                failed_adapters,
            });
        }

        let quotes: Vec<RateQuote> = merged.into_values().collect();
        self.store.put_batch(&quotes)?;

        let report = UpdateReport {
            updated: quotes.len(),
            failed_adapters,
        };
        if failed_adapters > 0 {
            warn!(
                updated = report.updated,
                failed_adapters, "Update completed with source failures"
            );
        } else {
            info!(updated = report.updated, "Update successful");
        }
        Ok(report)
    }

    /// Run on the given schedule. `OneTime` performs a single cycle;
    /// `Every` loops until the process is stopped.
    pub async fn run(&self, schedule: UpdateSchedule) -> Result<(), CoreError> {
        loop {
            self.run_update().await?;
            match schedule {
                UpdateSchedule::OneTime => return Ok(()),
                UpdateSchedule::Every(interval) => tokio::time::sleep(interval).await,
            }
        }
    }
}

use std::time::Duration;

use config::shared::ReconcilerConfig;

use crate::concurrency::poller::Poller;
use crate::error::ReconcileResult;
use crate::types::Region;

/// Everything a reconciliation pass needs besides the desired state.
///
/// Built once per process and shared by every pass; the store is the only component holding
/// remote state.
#[derive(Debug, Clone)]
pub struct ReconcileContext<S> {
    store: S,
    master_region: Region,
    table_status_poller: Poller,
    tags_poller: Poller,
    propagation_delay: Duration,
}

impl<S> ReconcileContext<S> {
    /// Validates `config` and builds a context around `store`.
    pub fn new(store: S, config: &ReconcilerConfig) -> ReconcileResult<Self> {
        config.validate()?;

        Ok(Self {
            store,
            master_region: Region::new(config.master_region.clone()),
            table_status_poller: Poller::from_config(&config.table_status_wait),
            tags_poller: Poller::from_config(&config.tags_visible_wait),
            propagation_delay: config.propagation_delay(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Region the reconciler runs in. Its table is the master copy.
    pub fn master_region(&self) -> &Region {
        &self.master_region
    }

    pub fn table_status_poller(&self) -> &Poller {
        &self.table_status_poller
    }

    pub fn tags_poller(&self) -> &Poller {
        &self.tags_poller
    }

    pub fn propagation_delay(&self) -> Duration {
        self.propagation_delay
    }
}

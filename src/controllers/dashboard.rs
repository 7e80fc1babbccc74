//! Dashboard page: farmer and product counters.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blockchain::provider::InjectedWallet;
use crate::blockchain::types::MarketResult;
use crate::controllers::notify::Notifier;
use crate::controllers::{discard, Outcome};
use crate::session::SessionContext;

const CONTROLLER: &str = "dashboard";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub farmers: U256,
    pub products: U256,
}

pub struct DashboardController<W: InjectedWallet> {
    session: Arc<SessionContext<W>>,
    notifier: Notifier,
    counts: DashboardCounts,
}

impl<W: InjectedWallet> DashboardController<W> {
    pub fn new(session: Arc<SessionContext<W>>, notifier: Notifier) -> Self {
        Self {
            session,
            notifier,
            counts: DashboardCounts::default(),
        }
    }

    pub fn counts(&self) -> DashboardCounts {
        self.counts
    }

    /// Read both counters. Does nothing while disconnected.
    pub async fn fetch_counts(&mut self) -> Outcome {
        let Some((ticket, contract)) = self.session.bound() else {
            return Outcome::NotConnected;
        };

        let result: MarketResult<DashboardCounts> = async {
            let farmers = contract.get_farmer_count().await?;
            let products = contract.get_product_count().await?;
            Ok(DashboardCounts { farmers, products })
        }
        .await;

        if !self.session.is_current(&ticket) {
            discard(CONTROLLER);
            return Outcome::Stale;
        }

        match result {
            Ok(counts) => {
                self.counts = counts;
                Outcome::Applied
            }
            Err(e) => {
                self.notifier.failure(&e, "Failed to load counts.");
                Outcome::Failed
            }
        }
    }
}

//! Admin page: farmer registration and lookup.

use alloy::primitives::Address;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::blockchain::provider::InjectedWallet;
use crate::blockchain::types::{FarmerDetails, MarketError};
use crate::controllers::notify::Notifier;
use crate::controllers::{discard, settle, Outcome, Settled};
use crate::session::SessionContext;

const CONTROLLER: &str = "admin";

pub struct AdminController<W: InjectedWallet> {
    session: Arc<SessionContext<W>>,
    notifier: Notifier,
    farmer_details: Option<FarmerDetails>,
}

impl<W: InjectedWallet> AdminController<W> {
    pub fn new(session: Arc<SessionContext<W>>, notifier: Notifier) -> Self {
        Self {
            session,
            notifier,
            farmer_details: None,
        }
    }

    /// Details from the last successful lookup.
    pub fn farmer_details(&self) -> Option<&FarmerDetails> {
        self.farmer_details.as_ref()
    }

    /// Register the connected account as a farmer named `name`.
    #[instrument(skip_all, fields(action_id = %Uuid::new_v4()))]
    pub async fn register_farmer(&mut self, name: &str) -> Outcome {
        let name = name.trim();
        if name.is_empty() {
            let err = MarketError::InvalidInput("farmer name must not be empty".to_string());
            self.notifier.failure(&err, "Failed to register farmer.");
            return Outcome::Failed;
        }

        let Some((ticket, contract)) = self.session.bound() else {
            self.notifier.failure(&MarketError::NotConnected, "");
            return Outcome::NotConnected;
        };

        let submitted = contract.register_farmer(name).await;
        match settle(&self.session, &ticket, CONTROLLER, submitted).await {
            Settled::Included(block_number) => {
                tracing::debug!(block_number, "Farmer registration included");
                self.notifier.success("Farmer registered successfully!");
                Outcome::Applied
            }
            Settled::Stale => Outcome::Stale,
            Settled::Failed(e) => {
                self.notifier.failure(&e, "Failed to register farmer.");
                Outcome::Failed
            }
        }
    }

    /// Look up a farmer by address.
    pub async fn get_farmer_details(&mut self, farmer: &str) -> Outcome {
        let farmer: Address = match farmer.trim().parse() {
            Ok(address) => address,
            Err(e) => {
                let err = MarketError::InvalidInput(format!("invalid farmer address: {e}"));
                self.notifier.failure(&err, "Failed to get farmer details.");
                return Outcome::Failed;
            }
        };

        let Some((ticket, contract)) = self.session.bound() else {
            self.notifier.failure(&MarketError::NotConnected, "");
            return Outcome::NotConnected;
        };

        let result = contract.get_farmer_details(farmer).await;
        if !self.session.is_current(&ticket) {
            discard(CONTROLLER);
            return Outcome::Stale;
        }

        match result {
            Ok(details) => {
                self.farmer_details = Some(details);
                Outcome::Applied
            }
            Err(e) => {
                self.notifier.failure(&e, "Failed to get farmer details.");
                Outcome::Failed
            }
        }
    }
}

//! Products page: listing, adding, updating and purchasing products.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::blockchain::binding::{BoundContract, PendingWrite};
use crate::blockchain::provider::InjectedWallet;
use crate::blockchain::signer::ContractSigner;
use crate::blockchain::types::{MarketError, MarketResult, Product};
use crate::blockchain::units::{from_fixed_point, parse_quantity, to_fixed_point};
use crate::controllers::notify::Notifier;
use crate::controllers::{discard, settle, Outcome, Settled};
use crate::session::{SessionContext, SessionTicket};

const CONTROLLER: &str = "products";

/// Units bought per purchase.
pub const PURCHASE_QUANTITY: u64 = 1;

/// New product form, as entered by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductForm {
    pub name: String,
    /// Decimal price in ETH, e.g. "1.5".
    pub price: String,
    pub quantity: String,
    pub ipfs_hash: String,
}

/// Product update form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub id: String,
    pub price: String,
    pub quantity: String,
    pub ipfs_hash: String,
}

/// A product as displayed, with its price formatted back to ETH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListing {
    pub id: U256,
    pub name: String,
    pub price: String,
    pub quantity: U256,
    pub ipfs_hash: String,
    pub farmer: Address,
}

impl From<Product> for ProductListing {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: from_fixed_point(product.price),
            quantity: product.quantity,
            ipfs_hash: product.ipfs_hash,
            farmer: product.farmer,
        }
    }
}

/// Product count, then each product by its 1-based id.
async fn fetch_products<S: ContractSigner>(
    contract: &BoundContract<S>,
) -> MarketResult<Vec<ProductListing>> {
    let count = contract.get_product_count().await?;
    let count: u64 = count.try_into().map_err(|_| {
        MarketError::RemoteCallFailed(format!("product count {count} out of range"))
    })?;

    let mut listings = Vec::with_capacity(count.min(1024) as usize);
    for id in 1..=count {
        let product = contract.get_product(U256::from(id)).await?;
        listings.push(ProductListing::from(product));
    }
    Ok(listings)
}

pub struct ProductsController<W: InjectedWallet> {
    session: Arc<SessionContext<W>>,
    notifier: Notifier,
    products: Vec<ProductListing>,
}

impl<W: InjectedWallet> ProductsController<W> {
    pub fn new(session: Arc<SessionContext<W>>, notifier: Notifier) -> Self {
        Self {
            session,
            notifier,
            products: Vec::new(),
        }
    }

    pub fn products(&self) -> &[ProductListing] {
        &self.products
    }

    /// Reload the full product list. Does nothing while disconnected.
    pub async fn load_products(&mut self) -> Outcome {
        let Some((ticket, contract)) = self.session.bound() else {
            return Outcome::NotConnected;
        };

        let result = fetch_products(&contract).await;
        if !self.session.is_current(&ticket) {
            discard(CONTROLLER);
            return Outcome::Stale;
        }

        match result {
            Ok(listings) => {
                tracing::debug!(count = listings.len(), "Products loaded");
                self.products = listings;
                Outcome::Applied
            }
            Err(e) => {
                self.notifier.failure(&e, "Failed to load products.");
                Outcome::Failed
            }
        }
    }

    #[instrument(skip_all, fields(action_id = %Uuid::new_v4(), name = %form.name))]
    pub async fn add_product(&mut self, form: &ProductForm) -> Outcome {
        let parsed = to_fixed_point(&form.price)
            .and_then(|price| Ok((price, parse_quantity("quantity", &form.quantity)?)));
        let (price, quantity) = match parsed {
            Ok(values) => values,
            Err(e) => return self.fail(&e, "Failed to add product."),
        };

        let Some((ticket, contract)) = self.session.bound() else {
            return self.not_connected();
        };

        let submitted = contract
            .add_product(&form.name, price, quantity, &form.ipfs_hash)
            .await;
        self.finish(&ticket, submitted, "Product added successfully!", "Failed to add product.")
            .await
    }

    #[instrument(skip_all, fields(action_id = %Uuid::new_v4(), id = %form.id))]
    pub async fn update_product(&mut self, form: &ProductUpdate) -> Outcome {
        let parsed = parse_quantity("product id", &form.id).and_then(|id| {
            Ok((
                id,
                to_fixed_point(&form.price)?,
                parse_quantity("quantity", &form.quantity)?,
            ))
        });
        let (id, price, quantity) = match parsed {
            Ok(values) => values,
            Err(e) => return self.fail(&e, "Failed to update product."),
        };

        let Some((ticket, contract)) = self.session.bound() else {
            return self.not_connected();
        };

        let submitted = contract
            .update_product(id, price, quantity, &form.ipfs_hash)
            .await;
        self.finish(
            &ticket,
            submitted,
            "Product updated successfully!",
            "Failed to update product.",
        )
        .await
    }

    /// Buy one unit of product `id`, paying `price` (decimal ETH).
    #[instrument(skip_all, fields(action_id = %Uuid::new_v4(), id = %id))]
    pub async fn purchase_product(&mut self, id: &str, price: &str) -> Outcome {
        let parsed = parse_quantity("product id", id)
            .and_then(|id| Ok((id, to_fixed_point(price)?)));
        let (id, value) = match parsed {
            Ok(values) => values,
            Err(e) => return self.fail(&e, "Failed to purchase product."),
        };

        let Some((ticket, contract)) = self.session.bound() else {
            return self.not_connected();
        };

        let submitted = contract
            .purchase_product(id, U256::from(PURCHASE_QUANTITY), value)
            .await;
        self.finish(
            &ticket,
            submitted,
            "Product purchased successfully!",
            "Failed to purchase product.",
        )
        .await
    }

    /// Settle a write and refresh the list on inclusion.
    ///
    /// `Applied` reports the write. A refresh that fails or goes stale afterwards
    /// leaves the previous list in place and reports through its own notification.
    async fn finish(
        &mut self,
        ticket: &SessionTicket,
        submitted: MarketResult<PendingWrite<W::Signer>>,
        success: &str,
        failure: &str,
    ) -> Outcome {
        match settle(&self.session, ticket, CONTROLLER, submitted).await {
            Settled::Included(block_number) => {
                self.notifier.success(success);
                let refresh = self.load_products().await;
                if refresh != Outcome::Applied {
                    tracing::warn!(
                        block_number,
                        ?refresh,
                        "Write included but refresh did not apply"
                    );
                }
                Outcome::Applied
            }
            Settled::Stale => Outcome::Stale,
            Settled::Failed(e) => self.fail(&e, failure),
        }
    }

    fn fail(&self, err: &MarketError, summary: &str) -> Outcome {
        self.notifier.failure(err, summary);
        Outcome::Failed
    }

    fn not_connected(&self) -> Outcome {
        self.notifier.failure(&MarketError::NotConnected, "");
        Outcome::NotConnected
    }
}

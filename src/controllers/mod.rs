//! Page controllers: the admin, products and dashboard actions.
//!
//! # Responsibilities
//! - Validate form input before any network call
//! - Read the current contract handle from the session per action
//! - Wait for inclusion, then refresh display state
//! - Discard results when the session changed while a call was in flight
//! - Turn every failure into a notification; never retry
//!
//! # Data Flow
//! ```text
//! form input → validation → SessionContext::bound() → read / write + wait
//!     → stale check → display state + Notification
//! ```

pub mod admin;
pub mod dashboard;
pub mod notify;
pub mod products;

pub use admin::AdminController;
pub use dashboard::{DashboardController, DashboardCounts};
pub use notify::{Level, Notification, Notifier};
pub use products::{ProductForm, ProductListing, ProductUpdate, ProductsController};

use crate::blockchain::binding::PendingWrite;
use crate::blockchain::provider::InjectedWallet;
use crate::blockchain::types::{MarketError, MarketResult};
use crate::observability::metrics;
use crate::session::{SessionContext, SessionTicket};

/// What a controller action did to its display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Result applied to display state. For writes this means the write was
    /// included; the follow-up refresh reports its own failures.
    Applied,
    /// Session changed while the call was in flight; result discarded.
    Stale,
    /// Validation or remote failure; display state unchanged.
    Failed,
    /// No wallet connected; nothing was issued.
    NotConnected,
}

/// Resolution of a submitted write.
pub(crate) enum Settled {
    Included(u64),
    Stale,
    Failed(MarketError),
}

/// Wait for a submitted write, then check the session still belongs to the issuer.
///
/// The staleness check runs before the outcome is looked at, so a write that fails
/// after a disconnect is discarded like one that succeeds.
pub(crate) async fn settle<W: InjectedWallet>(
    session: &SessionContext<W>,
    ticket: &SessionTicket,
    controller: &'static str,
    submitted: MarketResult<PendingWrite<W::Signer>>,
) -> Settled {
    let result = match submitted {
        Ok(pending) => pending.wait().await,
        Err(e) => Err(e),
    };

    if !session.is_current(ticket) {
        discard(controller);
        return Settled::Stale;
    }

    match result {
        Ok(block_number) => Settled::Included(block_number),
        Err(e) => Settled::Failed(e),
    }
}

/// Record a result dropped by the stale-session guard.
pub(crate) fn discard(controller: &'static str) {
    metrics::record_stale_response(controller);
    tracing::info!(controller, "Session changed while call was in flight, discarding result");
}

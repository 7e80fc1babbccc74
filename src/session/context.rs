//! Session context shared by all controllers.

use alloy::primitives::Address;
use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::blockchain::binding::{BindingFactory, BoundContract};
use crate::blockchain::provider::{InjectedWallet, ProviderBridge};
use crate::blockchain::types::MarketResult;
use crate::observability::metrics;
use crate::session::state::{Connection, Session, SessionTicket};

/// Owns the wallet bridge, the binding factory and the current session.
///
/// The session is only ever replaced as a whole, so readers always see either the
/// previous or the next complete snapshot.
pub struct SessionContext<W: InjectedWallet> {
    bridge: ProviderBridge<W>,
    factory: BindingFactory,
    current: ArcSwap<Session<W::Signer>>,
}

impl<W: InjectedWallet> SessionContext<W> {
    /// Create a context with an empty session.
    pub fn new(bridge: ProviderBridge<W>, factory: BindingFactory) -> Self {
        Self {
            bridge,
            factory,
            current: ArcSwap::from_pointee(Session::Disconnected),
        }
    }

    /// The current session snapshot.
    pub fn snapshot(&self) -> Arc<Session<W::Signer>> {
        self.current.load_full()
    }

    /// The current contract handle together with the ticket it was issued under.
    ///
    /// Controllers call this per action and never keep the handle across actions.
    pub fn bound(&self) -> Option<(SessionTicket, BoundContract<W::Signer>)> {
        let session = self.current.load();
        let contract = session.contract()?.clone();
        Some((SessionTicket::of(&**session), contract))
    }

    /// Capture the current account for a later stale-response check.
    pub fn ticket(&self) -> SessionTicket {
        SessionTicket::of(&**self.current.load())
    }

    /// Whether a call issued under `ticket` may still apply its result.
    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        ticket.matches(&**self.current.load())
    }

    /// Restore a session from an account grant made earlier. Never prompts.
    ///
    /// Leaves the session untouched when nothing has been granted.
    pub async fn initialize_from_existing_grant(&self) -> MarketResult<Option<Address>> {
        let accounts = self.bridge.detect_accounts().await;
        let Some(account) = accounts.first().copied() else {
            tracing::debug!("No previously granted accounts");
            return Ok(None);
        };

        self.bind(account).await?;
        metrics::record_session_transition("restore");
        tracing::info!(account = %account, "Session restored from existing grant");
        Ok(Some(account))
    }

    /// Ask the wallet for access and bind the granted account.
    ///
    /// On any failure the previous session is kept.
    pub async fn connect(&self) -> MarketResult<Address> {
        let account = match self.bridge.request_connection().await {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!(error = %e, "Wallet connection failed");
                return Err(e);
            }
        };

        self.bind(account).await?;
        metrics::record_session_transition("connect");
        tracing::info!(account = %account, "Wallet connected");
        Ok(account)
    }

    /// Drop the session. In-flight calls keep running; their results are discarded
    /// by the stale-response check.
    pub fn disconnect(&self) {
        let previous = self.current.swap(Arc::new(Session::Disconnected));
        metrics::record_session_transition("disconnect");
        if let Some(account) = previous.account() {
            tracing::info!(account = %account, "Wallet disconnected");
        }
    }

    async fn bind(&self, account: Address) -> MarketResult<()> {
        self.bridge
            .ensure_chain(self.factory.deployment().chain_id())
            .await?;
        let signer = self.bridge.signer_for(account).await?;
        let contract = self.factory.bind(signer.clone())?;
        self.current
            .store(Arc::new(Session::Connected(Connection::new(account, signer, contract))));
        Ok(())
    }
}

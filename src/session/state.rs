//! Immutable session snapshots.

use alloy::primitives::Address;

use crate::blockchain::binding::BoundContract;

/// A fully bound connection: account, its signer and the contract handle.
#[derive(Debug, Clone)]
pub struct Connection<S> {
    account: Address,
    signer: S,
    contract: BoundContract<S>,
}

impl<S> Connection<S> {
    pub(crate) fn new(account: Address, signer: S, contract: BoundContract<S>) -> Self {
        Self {
            account,
            signer,
            contract,
        }
    }
}

/// Wallet session as seen by controllers.
///
/// A session is either empty or fully bound, so `connected`, a non-empty account
/// and a contract handle always agree.
#[derive(Debug, Clone)]
pub enum Session<S> {
    Disconnected,
    Connected(Connection<S>),
}

impl<S> Default for Session<S> {
    fn default() -> Self {
        Session::Disconnected
    }
}

impl<S> Session<S> {
    pub fn is_connected(&self) -> bool {
        matches!(self, Session::Connected(_))
    }

    pub fn account(&self) -> Option<Address> {
        match self {
            Session::Connected(c) => Some(c.account),
            Session::Disconnected => None,
        }
    }

    pub fn signer(&self) -> Option<&S> {
        match self {
            Session::Connected(c) => Some(&c.signer),
            Session::Disconnected => None,
        }
    }

    pub fn contract(&self) -> Option<&BoundContract<S>> {
        match self {
            Session::Connected(c) => Some(&c.contract),
            Session::Disconnected => None,
        }
    }

    /// Account formatted for display, e.g. `0xf39F...2266`.
    pub fn short_account(&self) -> Option<String> {
        self.account().map(|account| {
            let full = account.to_string();
            format!("{}...{}", &full[..6], &full[full.len() - 4..])
        })
    }
}

/// The account captured when a call was issued.
///
/// Compared against the session when the call resolves; a different account means
/// the result belongs to a session that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    account: Option<Address>,
}

impl SessionTicket {
    pub fn of<S>(session: &Session<S>) -> Self {
        Self {
            account: session.account(),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    /// Whether `session` still belongs to the account this ticket was issued for.
    pub fn matches<S>(&self, session: &Session<S>) -> bool {
        self.account == session.account()
    }
}

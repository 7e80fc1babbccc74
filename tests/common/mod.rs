//! Shared utilities for integration tests: an in-memory marketplace contract and
//! a wallet that hands out signers against it.

#![allow(dead_code)]

use alloy::primitives::{address, Address, Bytes, TxHash, U256};
use alloy::sol_types::{SolInterface, SolValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};

use farmxchange::blockchain::binding::IFarmXchange::IFarmXchangeCalls;
use farmxchange::blockchain::types::{ConfirmationStatus, ContractCall};
use farmxchange::blockchain::{
    BindingFactory, ContractSigner, Deployment, InjectedWallet, MarketError, MarketResult,
    ProviderBridge,
};
use farmxchange::controllers::{Notification, Notifier};
use farmxchange::SessionContext;

pub const CHAIN_ID: u64 = 31337;
pub const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const ALICE: Address = address!("abcd000000000000000000000000000000001234");
pub const BOB: Address = address!("b0b0000000000000000000000000000000000b0b");

/// One ether in wei.
pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub name: String,
    pub price: U256,
    pub quantity: U256,
    pub ipfs_hash: String,
    pub farmer: Address,
}

/// A write as the contract saw it.
#[derive(Debug, Clone)]
pub struct SubmittedWrite {
    pub from: Address,
    pub method: &'static str,
    pub value: U256,
    pub price: Option<U256>,
    pub quantity: Option<U256>,
}

#[derive(Default)]
struct MarketState {
    farmers: Vec<(Address, String)>,
    products: Vec<ProductRecord>,
    calls: Vec<&'static str>,
    submitted: Vec<SubmittedWrite>,
    receipts: HashMap<TxHash, (u64, bool)>,
    block: u64,
}

/// In-memory stand-in for the deployed marketplace.
#[derive(Default)]
pub struct MockMarket {
    state: Mutex<MarketState>,
    inclusion_gate: Option<Arc<Semaphore>>,
    fail_reads: AtomicBool,
    reject_writes: AtomicBool,
}

impl MockMarket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Market whose inclusion waits block until the returned semaphore gets permits.
    pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let market = Self {
            inclusion_gate: Some(gate.clone()),
            ..Self::default()
        };
        (Arc::new(market), gate)
    }

    pub fn seed_farmer(&self, farmer: Address, name: &str) {
        self.state
            .lock()
            .unwrap()
            .farmers
            .push((farmer, name.to_string()));
    }

    pub fn seed_product(&self, record: ProductRecord) {
        self.state.lock().unwrap().products.push(record);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Method names of every call and submission, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn submitted(&self) -> Vec<SubmittedWrite> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn submitted_count(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }

    pub fn products(&self) -> Vec<ProductRecord> {
        self.state.lock().unwrap().products.clone()
    }

    fn handle_call(&self, input: &[u8]) -> MarketResult<Bytes> {
        let decoded = IFarmXchangeCalls::abi_decode(input)
            .map_err(|e| MarketError::RemoteCallFailed(format!("bad calldata: {e}")))?;
        let mut state = self.state.lock().unwrap();

        let (method, output) = match decoded {
            IFarmXchangeCalls::getFarmerCount(_) => (
                "getFarmerCount",
                U256::from(state.farmers.len()).abi_encode(),
            ),
            IFarmXchangeCalls::getProductCount(_) => (
                "getProductCount",
                U256::from(state.products.len()).abi_encode(),
            ),
            IFarmXchangeCalls::getProduct(call) => {
                let index = usize::try_from(call.id).unwrap_or(usize::MAX);
                let record = index
                    .checked_sub(1)
                    .and_then(|i| state.products.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        MarketError::RemoteCallFailed("execution reverted: no such product".into())
                    })?;
                (
                    "getProduct",
                    (
                        record.name,
                        record.price,
                        record.quantity,
                        record.ipfs_hash,
                        record.farmer,
                    )
                        .abi_encode_params(),
                )
            }
            IFarmXchangeCalls::getFarmerDetails(call) => {
                let details = state
                    .farmers
                    .iter()
                    .find(|(address, _)| *address == call.farmer)
                    .map(|(_, name)| (name.clone(), true))
                    .unwrap_or((String::new(), false));
                ("getFarmerDetails", details.abi_encode_params())
            }
            _ => {
                return Err(MarketError::RemoteCallFailed(
                    "state-changing method called as a read".into(),
                ))
            }
        };

        state.calls.push(method);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(MarketError::RemoteCallFailed("connection dropped".into()));
        }
        Ok(Bytes::from(output))
    }

    fn handle_send(&self, from: Address, call: &ContractCall) -> MarketResult<TxHash> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(MarketError::UserRejected);
        }

        let decoded = IFarmXchangeCalls::abi_decode(&call.input)
            .map_err(|e| MarketError::RemoteCallFailed(format!("bad calldata: {e}")))?;
        let mut state = self.state.lock().unwrap();

        let mut write = SubmittedWrite {
            from,
            method: "",
            value: call.value,
            price: None,
            quantity: None,
        };
        let success = match decoded {
            IFarmXchangeCalls::registerFarmer(c) => {
                write.method = "registerFarmer";
                let known = state.farmers.iter().any(|(address, _)| *address == from);
                if !known {
                    state.farmers.push((from, c.name));
                }
                !known
            }
            IFarmXchangeCalls::addProduct(c) => {
                write.method = "addProduct";
                write.price = Some(c.price);
                write.quantity = Some(c.quantity);
                state.products.push(ProductRecord {
                    name: c.name,
                    price: c.price,
                    quantity: c.quantity,
                    ipfs_hash: c.ipfsHash,
                    farmer: from,
                });
                true
            }
            IFarmXchangeCalls::updateProduct(c) => {
                write.method = "updateProduct";
                write.price = Some(c.price);
                write.quantity = Some(c.quantity);
                let index = usize::try_from(c.id).unwrap_or(usize::MAX);
                match index.checked_sub(1).and_then(|i| state.products.get_mut(i)) {
                    Some(product) if product.farmer == from => {
                        product.price = c.price;
                        product.quantity = c.quantity;
                        product.ipfs_hash = c.ipfsHash;
                        true
                    }
                    _ => false,
                }
            }
            IFarmXchangeCalls::purchaseProduct(c) => {
                write.method = "purchaseProduct";
                write.quantity = Some(c.quantity);
                let index = usize::try_from(c.id).unwrap_or(usize::MAX);
                match index.checked_sub(1).and_then(|i| state.products.get_mut(i)) {
                    Some(product)
                        if product.quantity >= c.quantity
                            && call.value == product.price * c.quantity =>
                    {
                        product.quantity -= c.quantity;
                        true
                    }
                    _ => false,
                }
            }
            _ => {
                return Err(MarketError::RemoteCallFailed(
                    "read-only method submitted as a transaction".into(),
                ))
            }
        };

        state.calls.push(write.method);
        state.submitted.push(write);
        state.block += 1;
        let nonce = state.submitted.len() as u64;
        let tx_hash = TxHash::left_padding_from(&nonce.to_be_bytes());
        let block = state.block;
        state.receipts.insert(tx_hash, (block, success));
        Ok(tx_hash)
    }

    fn receipt(&self, tx_hash: TxHash) -> MarketResult<ConfirmationStatus> {
        let state = self.state.lock().unwrap();
        match state.receipts.get(&tx_hash) {
            Some((block_number, true)) => Ok(ConfirmationStatus::Confirmed {
                block_number: *block_number,
            }),
            Some((_, false)) => Ok(ConfirmationStatus::Reverted(format!(
                "transaction {tx_hash} reverted"
            ))),
            None => Err(MarketError::RemoteCallFailed("unknown transaction".into())),
        }
    }
}

#[derive(Clone)]
pub struct MockSigner {
    account: Address,
    market: Arc<MockMarket>,
}

impl std::fmt::Debug for MockSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSigner")
            .field("account", &self.account)
            .finish()
    }
}

impl ContractSigner for MockSigner {
    fn address(&self) -> Address {
        self.account
    }

    async fn call(&self, call: ContractCall) -> MarketResult<Bytes> {
        tokio::task::yield_now().await;
        self.market.handle_call(&call.input)
    }

    async fn send(&self, call: ContractCall) -> MarketResult<TxHash> {
        tokio::task::yield_now().await;
        self.market.handle_send(self.account, &call)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> MarketResult<ConfirmationStatus> {
        if let Some(gate) = &self.market.inclusion_gate {
            gate.acquire()
                .await
                .map_err(|_| MarketError::RemoteCallFailed("gate closed".into()))?
                .forget();
        }
        self.market.receipt(tx_hash)
    }
}

/// How the wallet answers a connection prompt.
#[derive(Debug, Clone, Copy)]
pub enum Prompt {
    Approve(Address),
    Reject,
}

pub struct MockWallet {
    market: Arc<MockMarket>,
    granted: Mutex<Vec<Address>>,
    prompt: Mutex<Prompt>,
    prompts: AtomicUsize,
    chain_id: AtomicU64,
}

impl MockWallet {
    /// Wallet with no grants that approves `ALICE` when prompted.
    pub fn new(market: Arc<MockMarket>) -> Self {
        Self {
            market,
            granted: Mutex::new(Vec::new()),
            prompt: Mutex::new(Prompt::Approve(ALICE)),
            prompts: AtomicUsize::new(0),
            chain_id: AtomicU64::new(CHAIN_ID),
        }
    }

    pub fn with_grant(self, account: Address) -> Self {
        self.granted.lock().unwrap().push(account);
        self
    }

    /// Move the wallet to another network.
    pub fn set_chain(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    pub fn set_prompt(&self, prompt: Prompt) {
        *self.prompt.lock().unwrap() = prompt;
    }

    /// Number of times the user was prompted.
    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    fn answer_prompt(&self) -> MarketResult<Vec<Address>> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let prompt = *self.prompt.lock().unwrap();
        match prompt {
            Prompt::Approve(account) => {
                let mut granted = self.granted.lock().unwrap();
                granted.retain(|a| *a != account);
                granted.insert(0, account);
                Ok(granted.clone())
            }
            Prompt::Reject => Err(MarketError::UserRejected),
        }
    }
}

impl InjectedWallet for MockWallet {
    type Signer = MockSigner;

    async fn accounts(&self) -> MarketResult<Vec<Address>> {
        Ok(self.granted.lock().unwrap().clone())
    }

    async fn request_accounts(&self) -> MarketResult<Vec<Address>> {
        tokio::task::yield_now().await;
        self.answer_prompt()
    }

    async fn signer(&self, account: Address) -> MarketResult<MockSigner> {
        Ok(MockSigner {
            account,
            market: self.market.clone(),
        })
    }

    async fn chain_id(&self) -> MarketResult<u64> {
        Ok(self.chain_id.load(Ordering::SeqCst))
    }
}

/// Wallet handle shared between the test and the session.
pub struct SharedWallet(pub Arc<MockWallet>);

impl InjectedWallet for SharedWallet {
    type Signer = MockSigner;

    async fn accounts(&self) -> MarketResult<Vec<Address>> {
        self.0.accounts().await
    }

    async fn request_accounts(&self) -> MarketResult<Vec<Address>> {
        self.0.request_accounts().await
    }

    async fn signer(&self, account: Address) -> MarketResult<MockSigner> {
        self.0.signer(account).await
    }

    async fn chain_id(&self) -> MarketResult<u64> {
        self.0.chain_id().await
    }
}

pub fn factory() -> BindingFactory {
    BindingFactory::new(Deployment::new(CONTRACT, CHAIN_ID))
}

/// Session over `wallet`; the wallet stays reachable for prompt control.
pub fn session_with(wallet: Arc<MockWallet>) -> Arc<SessionContext<SharedWallet>> {
    Arc::new(SessionContext::new(
        ProviderBridge::new(Some(SharedWallet(wallet))),
        factory(),
    ))
}

/// Session with no wallet installed.
pub fn session_without_wallet() -> Arc<SessionContext<SharedWallet>> {
    Arc::new(SessionContext::new(ProviderBridge::unavailable(), factory()))
}

/// Drain every notification sent so far.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut notes = Vec::new();
    while let Ok(note) = rx.try_recv() {
        notes.push(note);
    }
    notes
}

pub fn notifier() -> (Notifier, mpsc::UnboundedReceiver<Notification>) {
    Notifier::channel()
}

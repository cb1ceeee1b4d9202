use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
    address::AccountAddress,
    error::Error,
    types::{CommittedTx, ModuleId, Resource, TransactionRequest, TxHash, TxStatus},
    LedgerClient,
};

const COIN_STORE: &str = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";
const POOL_RESOURCE: &str = "DonationPool";

/// An in-process ledger that executes the donation module's two entry functions.
///
/// Cloning shares the underlying state, so a wallet and a ledger client can observe the same
/// chain. Faults can be switched on to simulate an unreachable node or transactions that never
/// leave the mempool.
#[derive(Clone, Debug)]
pub struct MemoryLedger {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    module: ModuleId,
    pools: HashMap<AccountAddress, u64>,
    balances: HashMap<AccountAddress, u64>,
    transactions: HashMap<TxHash, TxStatus>,
    held: Vec<(TxHash, AccountAddress, TransactionRequest)>,
    version: u64,
    faults: Faults,
    resource_queries: usize,
    transaction_queries: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct Faults {
    resources_unavailable: bool,
    transactions_unavailable: bool,
    hold_pending: bool,
}

impl MemoryLedger {
    pub fn new(module: ModuleId) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                module,
                pools: HashMap::new(),
                balances: HashMap::new(),
                transactions: HashMap::new(),
                held: vec![],
                version: 0,
                faults: Faults::default(),
                resource_queries: 0,
                transaction_queries: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn module(&self) -> ModuleId {
        self.state().module.clone()
    }

    /// Mints `amount` base units into `address`.
    pub fn fund(&self, address: AccountAddress, amount: u64) {
        let mut state = self.state();
        let balance = state.balances.entry(address).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn balance(&self, address: &AccountAddress) -> u64 {
        self.state().balances.get(address).copied().unwrap_or_default()
    }

    pub fn pool_total(&self, address: &AccountAddress) -> Option<u64> {
        self.state().pools.get(address).copied()
    }

    /// Makes resource reads fail as if the node were unreachable.
    pub fn set_resources_unavailable(&self, unavailable: bool) {
        self.state().faults.resources_unavailable = unavailable;
    }

    /// Makes transaction lookups fail as if the node were unreachable.
    pub fn set_transactions_unavailable(&self, unavailable: bool) {
        self.state().faults.transactions_unavailable = unavailable;
    }

    /// While set, submitted transactions stay pending until [`MemoryLedger::release_pending`].
    pub fn hold_pending(&self, hold: bool) {
        self.state().faults.hold_pending = hold;
    }

    /// Executes every held transaction in submission order.
    pub fn release_pending(&self) {
        let mut state = self.state();
        let held = std::mem::take(&mut state.held);
        for (hash, sender, request) in held {
            let committed = state.execute(hash.clone(), &sender, &request);
            state.transactions.insert(hash, TxStatus::Committed(committed));
        }
    }

    /// Number of resource reads served so far.
    pub fn resource_queries(&self) -> usize {
        self.state().resource_queries
    }

    /// Number of transaction lookups served so far.
    pub fn transaction_queries(&self) -> usize {
        self.state().transaction_queries
    }

    /// Accepts a transaction signed by `sender`. It is executed immediately unless pending
    /// transactions are being held.
    pub fn submit(&self, sender: &AccountAddress, request: &TransactionRequest) -> TxHash {
        let mut state = self.state();
        state.version += 1;

        let mut hasher = Sha256::new();
        hasher.update(sender.as_bytes());
        hasher.update(state.version.to_be_bytes());
        hasher.update(request.function.to_string().as_bytes());
        let hash = TxHash::new(format!("0x{}", hex::encode(hasher.finalize())));

        if state.faults.hold_pending {
            debug!("Holding tx {} in mempool", hash);
            state.transactions.insert(hash.clone(), TxStatus::Pending);
            state.held.push((hash.clone(), *sender, request.clone()));
        } else {
            let committed = state.execute(hash.clone(), sender, request);
            state.transactions.insert(hash.clone(), TxStatus::Committed(committed));
        }

        hash
    }
}

impl State {
    fn execute(
        &mut self,
        hash: TxHash,
        sender: &AccountAddress,
        request: &TransactionRequest,
    ) -> CommittedTx {
        let result = if request.function.module != self.module {
            Err("LINKER_ERROR".to_string())
        } else {
            match request.function.name.as_str() {
                "init_donation_pool" => self.init_donation_pool(sender, &request.arguments),
                "donate" => self.donate(sender, &request.arguments),
                _ => Err("LINKER_ERROR".to_string()),
            }
        };

        let (success, vm_status) = match result {
            Ok(()) => (true, "Executed successfully".to_string()),
            Err(status) => (false, status),
        };
        debug!("Executed {} from {}: {}", request.function, sender, vm_status);

        CommittedTx {
            hash,
            version: Some(self.version),
            success,
            vm_status,
        }
    }

    fn init_donation_pool(
        &mut self,
        sender: &AccountAddress,
        arguments: &[String],
    ) -> Result<(), String> {
        if !arguments.is_empty() {
            return Err("NUMBER_OF_ARGUMENTS_MISMATCH".to_string());
        }
        if self.pools.contains_key(sender) {
            return Err("RESOURCE_ALREADY_EXISTS".to_string());
        }
        self.pools.insert(*sender, 0);
        Ok(())
    }

    fn donate(&mut self, sender: &AccountAddress, arguments: &[String]) -> Result<(), String> {
        let [institution, amount] = arguments else {
            return Err("NUMBER_OF_ARGUMENTS_MISMATCH".to_string());
        };
        let institution: AccountAddress = institution
            .parse()
            .map_err(|_| "FAILED_TO_DESERIALIZE_ARGUMENT".to_string())?;
        let amount: u64 = amount
            .parse()
            .map_err(|_| "FAILED_TO_DESERIALIZE_ARGUMENT".to_string())?;

        let total = *self
            .pools
            .get(&institution)
            .ok_or_else(|| "MISSING_DATA".to_string())?;
        let balance = self.balances.get(sender).copied().unwrap_or_default();
        if balance < amount {
            return Err("Move abort in 0x1::coin: EINSUFFICIENT_BALANCE(0x10006)".to_string());
        }
        let total = total
            .checked_add(amount)
            .ok_or_else(|| "ARITHMETIC_ERROR".to_string())?;

        self.balances.insert(*sender, balance - amount);
        let received = self.balances.entry(institution).or_default();
        *received = received.saturating_add(amount);
        self.pools.insert(institution, total);
        Ok(())
    }

    fn resources(&self, address: &AccountAddress) -> Vec<Resource> {
        let mut resources = vec![];
        if let Some(balance) = self.balances.get(address) {
            resources.push(Resource {
                type_tag: COIN_STORE.to_string(),
                data: json!({ "coin": { "value": balance.to_string() } }),
            });
        }
        if let Some(total) = self.pools.get(address) {
            resources.push(Resource {
                type_tag: self.module.struct_tag(POOL_RESOURCE).to_string(),
                data: json!({ "total_donations": total.to_string() }),
            });
        }
        resources
    }
}

#[async_trait::async_trait]
impl LedgerClient for MemoryLedger {
    async fn account_resources(&self, address: &AccountAddress) -> Result<Vec<Resource>, Error> {
        let mut state = self.state();
        state.resource_queries += 1;
        if state.faults.resources_unavailable {
            return Err(Error::Unavailable("connection refused".to_string()));
        }
        Ok(state.resources(address))
    }

    async fn transaction_by_hash(&self, hash: &TxHash) -> Result<TxStatus, Error> {
        let mut state = self.state();
        state.transaction_queries += 1;
        if state.faults.transactions_unavailable {
            return Err(Error::Unavailable("connection refused".to_string()));
        }
        Ok(state
            .transactions
            .get(hash)
            .cloned()
            .unwrap_or(TxStatus::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn module() -> ModuleId {
        "0xc506346580e6d8b7f72d61f77af400ef015e484c22ed6ab27b1ea93d33812d01::AlumniDonation"
            .parse()
            .unwrap()
    }

    fn address(s: &str) -> AccountAddress {
        s.parse().unwrap()
    }

    fn donate(module: &ModuleId, to: &AccountAddress, amount: u64) -> TransactionRequest {
        TransactionRequest::new(
            module.function("donate"),
            vec![to.to_string(), amount.to_string()],
        )
    }

    async fn committed(ledger: &MemoryLedger, hash: &TxHash) -> CommittedTx {
        ledger
            .wait_for_transaction(hash, Duration::from_millis(10))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn init_then_donate() {
        let ledger = MemoryLedger::new(module());
        let institution = address("0xa");
        let donor = address("0xb");
        ledger.fund(donor, 500);

        let init = TransactionRequest::new(module().function("init_donation_pool"), vec![]);
        let hash = ledger.submit(&institution, &init);
        assert!(committed(&ledger, &hash).await.success);

        let hash = ledger.submit(&donor, &donate(&module(), &institution, 200));
        assert!(committed(&ledger, &hash).await.success);

        assert_eq!(ledger.pool_total(&institution), Some(200));
        assert_eq!(ledger.balance(&donor), 300);

        let resources = ledger.account_resources(&institution).await.unwrap();
        let pool = resources
            .iter()
            .find(|r| r.is(&module().struct_tag("DonationPool")))
            .unwrap();
        assert_eq!(pool.data["total_donations"], "200");
    }

    #[tokio::test]
    async fn second_init_is_rejected() {
        let ledger = MemoryLedger::new(module());
        let institution = address("0xa");
        let init = TransactionRequest::new(module().function("init_donation_pool"), vec![]);

        ledger.submit(&institution, &init);
        let hash = ledger.submit(&institution, &init);

        let tx = committed(&ledger, &hash).await;
        assert!(!tx.success);
        assert_eq!(tx.vm_status, "RESOURCE_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn donate_without_funds_is_rejected() {
        let ledger = MemoryLedger::new(module());
        let institution = address("0xa");
        let init = TransactionRequest::new(module().function("init_donation_pool"), vec![]);
        ledger.submit(&institution, &init);

        let hash = ledger.submit(&address("0xb"), &donate(&module(), &institution, 1));
        let tx = committed(&ledger, &hash).await;
        assert!(!tx.success);
        assert!(tx.vm_status.contains("EINSUFFICIENT_BALANCE"));
        assert_eq!(ledger.pool_total(&institution), Some(0));
    }

    #[tokio::test]
    async fn donate_to_missing_pool_is_rejected() {
        let ledger = MemoryLedger::new(module());
        let donor = address("0xb");
        ledger.fund(donor, 10);

        let hash = ledger.submit(&donor, &donate(&module(), &address("0xa"), 1));
        assert_eq!(committed(&ledger, &hash).await.vm_status, "MISSING_DATA");
        assert_eq!(ledger.balance(&donor), 10);
    }

    #[tokio::test]
    async fn held_transactions_stay_pending() {
        let ledger = MemoryLedger::new(module());
        ledger.hold_pending(true);

        let init = TransactionRequest::new(module().function("init_donation_pool"), vec![]);
        let hash = ledger.submit(&address("0xa"), &init);
        assert_eq!(
            ledger.transaction_by_hash(&hash).await.unwrap(),
            TxStatus::Pending
        );

        ledger.release_pending();
        assert!(committed(&ledger, &hash).await.success);
    }

    #[tokio::test]
    async fn unknown_account_has_no_resources() {
        let ledger = MemoryLedger::new(module());
        assert!(ledger
            .account_resources(&address("0x1234"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn faults_surface_as_unavailable() {
        let ledger = MemoryLedger::new(module());
        ledger.set_resources_unavailable(true);
        ledger.set_transactions_unavailable(true);

        assert!(matches!(
            ledger.account_resources(&address("0x1")).await,
            Err(Error::Unavailable(_))
        ));
        assert!(matches!(
            ledger.transaction_by_hash(&TxHash::new("0x0")).await,
            Err(Error::Unavailable(_))
        ));
        assert_eq!(ledger.resource_queries(), 1);
        assert_eq!(ledger.transaction_queries(), 1);
    }
}

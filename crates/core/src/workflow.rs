//! The donation workflow state machine.
//!
//! ```text
//! Idle → BuildingRequest → AwaitingSignature → Submitted → Confirming → Reconciling → Succeeded
//!              │                  │                             │
//!              └──────────────────┴─────────────────────────────┴──→ Failed
//! ```
//!
//! Every run ends back in `Idle`. The two suspension points, waiting for the signing agent and
//! waiting for the ledger, are each bounded by a timeout.

use std::{collections::HashMap, time::Duration};

use donation_ledger_client::{AccountAddress, LedgerClient, ModuleId, TransactionRequest, TxHash};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    amount::{format_base_units, DonationAmount, DISPLAY_UNIT},
    error::{Error, Stage},
    feedback::{Feedback, FeedbackSink},
    pool::{parse_address, PoolStatus, PoolStatusService},
    signing::{Availability, SigningSession, SigningSessionProvider},
};

pub const INIT_FUNCTION: &str = "init_donation_pool";
pub const DONATE_FUNCTION: &str = "donate";

/// A user-initiated action, with the raw form input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Create the donation pool under the connected account.
    InitPool,
    /// Send `amount` display units to the pool under `institution`.
    Donate { institution: String, amount: String },
}

impl Action {
    fn failure_prefix(&self) -> &'static str {
        match self {
            Action::InitPool => "Failed to initialize donation pool",
            Action::Donate { .. } => "Failed to make donation",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    BuildingRequest,
    AwaitingSignature,
    Submitted(TxHash),
    Confirming(TxHash),
    Reconciling,
    Succeeded,
    Failed(Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Upper bound for the signing agent to connect or to approve a transaction.
    pub signing: Duration,
    /// Upper bound for the ledger to confirm a submitted transaction.
    pub confirmation: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            signing: Duration::from_secs(120),
            confirmation: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Result of the post-confirmation status refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Refresh {
    Updated(PoolStatus),
    /// The transaction is confirmed but the pool could not be re-read.
    Failed(Error),
}

/// A successfully confirmed action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmed {
    pub hash: TxHash,
    pub version: Option<u64>,
    /// The pool the transaction touched.
    pub pool: AccountAddress,
    pub refresh: Refresh,
}

/// Drives init and donate actions from form input to a reconciled pool status.
///
/// Collaborators are injected: `P` provides signing sessions, `L` observes the ledger, `S`
/// serves pool status and `F` receives feedback. One engine runs one action at a time (`run`
/// takes `&mut self`); the ledger stays the only source of truth for pool state.
pub struct WorkflowEngine<P: SigningSessionProvider, L, S, F> {
    provider: P,
    session: Option<P::Session>,
    ledger: L,
    pool_status: S,
    sink: F,
    module: ModuleId,
    timeouts: Timeouts,
    state: WorkflowState,
    trace: Vec<WorkflowState>,
    pools: HashMap<AccountAddress, PoolStatus>,
}

impl<P, L, S, F> WorkflowEngine<P, L, S, F>
where
    P: SigningSessionProvider,
    L: LedgerClient,
    S: PoolStatusService,
    F: FeedbackSink,
{
    pub fn new(provider: P, ledger: L, pool_status: S, sink: F, module: ModuleId) -> Self {
        Self {
            provider,
            session: None,
            ledger,
            pool_status,
            sink,
            module,
            timeouts: Timeouts::default(),
            state: WorkflowState::Idle,
            trace: vec![],
            pools: HashMap::new(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// States visited by the most recent `run`, ending with `Idle`.
    pub fn trace(&self) -> &[WorkflowState] {
        &self.trace
    }

    /// Account of the connected signing session, if any.
    pub fn account(&self) -> Option<AccountAddress> {
        self.session.as_ref().map(|s| *s.account())
    }

    /// Last pool status read from the ledger for `address`.
    pub fn pool(&self, address: &AccountAddress) -> Option<PoolStatus> {
        self.pools.get(address).copied()
    }

    /// Connects to the signing agent and reads the connected account's own pool.
    ///
    /// A failure to read the pool is reported to the sink but does not fail the connection.
    pub async fn connect(&mut self) -> Result<AccountAddress, Error> {
        let result = self.open_session().await;
        let account = match result {
            Ok(account) => account,
            Err(e) => {
                self.sink
                    .emit(Feedback::error(format!("Failed to connect wallet: {e}")));
                return Err(e);
            }
        };
        self.sink.emit(Feedback::success("Wallet connected successfully!"));

        if let Err(e) = self.refresh(&account).await {
            self.sink.emit(Feedback::error(format!(
                "Could not check the pool status of {account}: {e}"
            )));
        }
        Ok(account)
    }

    async fn open_session(&mut self) -> Result<AccountAddress, Error> {
        if self.provider.availability() == Availability::Unavailable {
            return Err(Error::AgentUnavailable(
                "signing agent not found; install a wallet agent and configure it".to_string(),
            ));
        }

        let session = timeout(self.timeouts.signing, self.provider.connect())
            .await
            .map_err(|_| Error::Timeout(Stage::Connecting))??;

        let account = *session.account();
        info!("Connected account {}", account);
        self.session = Some(session);
        Ok(account)
    }

    /// Re-reads the pool under `address` and records it as the latest known state.
    pub async fn refresh(&mut self, address: &AccountAddress) -> Result<PoolStatus, Error> {
        let status = self.pool_status.pool_status(&address.to_string()).await?;
        self.pools.insert(*address, status);
        Ok(status)
    }

    /// Runs `action` to completion. The engine is back in `Idle` when this returns, whatever the
    /// outcome.
    pub async fn run(&mut self, action: Action) -> Result<Confirmed, Error> {
        self.trace.clear();

        let result = self.drive(&action).await;
        match &result {
            Ok(confirmed) => {
                self.enter(WorkflowState::Succeeded);
                self.report_success(&action, confirmed);
            }
            Err(e) => {
                warn!("{:?} failed ({}): {}", action, e.category(), e);
                self.enter(WorkflowState::Failed(e.clone()));
                self.sink.emit(Feedback::error(format!(
                    "{}: {}",
                    action.failure_prefix(),
                    e
                )));
            }
        }

        self.enter(WorkflowState::Idle);
        result
    }

    async fn drive(&mut self, action: &Action) -> Result<Confirmed, Error> {
        self.enter(WorkflowState::BuildingRequest);
        let account = self.account().ok_or(Error::NoSession)?;
        let (request, pool) = build_request(&self.module, action, account)?;

        self.enter(WorkflowState::AwaitingSignature);
        self.sink.emit(Feedback::info(match action {
            Action::InitPool => "Initializing donation pool...",
            Action::Donate { .. } => "Processing donation...",
        }));
        let session = self.session.as_ref().ok_or(Error::NoSession)?;
        let hash = timeout(self.timeouts.signing, session.submit(&request))
            .await
            .map_err(|_| Error::Timeout(Stage::AwaitingSignature))??;

        self.enter(WorkflowState::Submitted(hash.clone()));
        self.sink
            .emit(Feedback::info(format!("Transaction {hash} submitted.")));

        self.enter(WorkflowState::Confirming(hash.clone()));
        self.sink.emit(Feedback::info(format!(
            "Waiting for ledger confirmation of {hash}..."
        )));
        let tx = timeout(
            self.timeouts.confirmation,
            self.ledger
                .wait_for_transaction(&hash, self.timeouts.poll_interval),
        )
        .await
        .map_err(|_| Error::Timeout(Stage::Confirming))??;

        if !tx.success {
            return Err(Error::TransactionFailed {
                hash,
                vm_status: tx.vm_status,
            });
        }

        self.enter(WorkflowState::Reconciling);
        debug!("Transaction {} confirmed, refreshing pool {}", hash, pool);
        self.sink.emit(Feedback::info("Refreshing pool status..."));
        let refresh = match self.refresh(&pool).await {
            Ok(status) => Refresh::Updated(status),
            Err(e) => Refresh::Failed(e),
        };

        Ok(Confirmed {
            hash,
            version: tx.version,
            pool,
            refresh,
        })
    }

    fn report_success(&self, action: &Action, confirmed: &Confirmed) {
        self.sink.emit(Feedback::success(match action {
            Action::InitPool => "Donation pool initialized successfully!".to_string(),
            Action::Donate { amount, .. } => format!(
                "Successfully donated {} {} to the institution!",
                amount.trim(),
                DISPLAY_UNIT
            ),
        }));

        match &confirmed.refresh {
            Refresh::Updated(status) => self.sink.emit(Feedback::info(format!(
                "Pool {}: {}",
                confirmed.pool,
                describe(status)
            ))),
            Refresh::Failed(e) => self.sink.emit(Feedback::error(format!(
                "Transaction confirmed, but refreshing the pool status of {} failed; \
                 the totals shown may be stale: {}",
                confirmed.pool, e
            ))),
        }
    }

    fn enter(&mut self, state: WorkflowState) {
        debug!("Workflow: {:?} → {:?}", self.state, state);
        self.trace.push(state.clone());
        self.state = state;
    }
}

/// Builds the transaction for `action`, validating form input. Returns the request together with
/// the address of the pool it affects.
pub fn build_request(
    module: &ModuleId,
    action: &Action,
    account: AccountAddress,
) -> Result<(TransactionRequest, AccountAddress), Error> {
    match action {
        Action::InitPool => Ok((
            TransactionRequest::new(module.function(INIT_FUNCTION), vec![]),
            account,
        )),
        Action::Donate {
            institution,
            amount,
        } => {
            let institution = parse_address(institution.trim())?;
            let amount: DonationAmount = amount.parse()?;
            Ok((
                TransactionRequest::new(
                    module.function(DONATE_FUNCTION),
                    vec![institution.to_string(), amount.base_units().to_string()],
                ),
                institution,
            ))
        }
    }
}

/// One-line summary of a pool, in display units.
pub fn describe(status: &PoolStatus) -> String {
    if status.initialized {
        format!(
            "total donations {} {}",
            format_base_units(status.total_donations),
            DISPLAY_UNIT
        )
    } else {
        "donation pool not initialized".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> ModuleId {
        "0x2a::AlumniDonation".parse().unwrap()
    }

    fn account() -> AccountAddress {
        "0xa11ce".parse().unwrap()
    }

    #[test]
    fn init_request_targets_own_account() {
        let (request, pool) = build_request(&module(), &Action::InitPool, account()).unwrap();
        assert_eq!(request.function.to_string(), format!("{}::init_donation_pool", module()));
        assert!(request.arguments.is_empty());
        assert!(request.type_arguments.is_empty());
        assert_eq!(pool, account());
    }

    #[test]
    fn donate_request_encodes_base_units_as_string() {
        let action = Action::Donate {
            institution: " 0xb0b ".to_string(),
            amount: "2.5".to_string(),
        };
        let (request, pool) = build_request(&module(), &action, account()).unwrap();
        let institution: AccountAddress = "0xb0b".parse().unwrap();

        assert_eq!(request.function.name, "donate");
        assert_eq!(
            request.arguments,
            vec![institution.to_string(), "250000000".to_string()]
        );
        assert_eq!(pool, institution);
    }

    #[test]
    fn donate_validates_address_before_amount() {
        let action = Action::Donate {
            institution: String::new(),
            amount: "abc".to_string(),
        };
        assert_eq!(
            build_request(&module(), &action, account()),
            Err(Error::InvalidAddress(String::new()))
        );
    }

    #[test]
    fn describe_pool() {
        assert_eq!(
            describe(&PoolStatus {
                initialized: true,
                total_donations: 250_000_000
            }),
            "total donations 2.5 APT"
        );
        assert_eq!(
            describe(&PoolStatus::UNINITIALIZED),
            "donation pool not initialized"
        );
    }
}

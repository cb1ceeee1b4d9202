use std::time::Duration;

use donation_core::{
    feedback::Category,
    signing::memory::{Approval, MemoryWallet},
    Action, ChannelSink, Error, Feedback, PoolGateway, PoolStatus, Refresh, Stage, Timeouts,
    WorkflowEngine, WorkflowState,
};
use donation_ledger_client::{AccountAddress, MemoryLedger, ModuleId};
use tokio::sync::mpsc::UnboundedReceiver;

type Engine = WorkflowEngine<MemoryWallet, MemoryLedger, PoolGateway<MemoryLedger>, ChannelSink>;

const APT: u64 = 100_000_000;

fn module() -> ModuleId {
    "0x2a::AlumniDonation".parse().unwrap()
}

fn alice() -> AccountAddress {
    "0xa11ce".parse().unwrap()
}

fn bob() -> AccountAddress {
    "0xb0b".parse().unwrap()
}

fn engine(ledger: &MemoryLedger, wallet: MemoryWallet) -> (Engine, UnboundedReceiver<Feedback>) {
    let (sink, rx) = ChannelSink::new();
    let engine = WorkflowEngine::new(
        wallet,
        ledger.clone(),
        PoolGateway::new(ledger.clone(), module()),
        sink,
        module(),
    )
    .with_timeouts(Timeouts {
        signing: Duration::from_secs(5),
        confirmation: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    });
    (engine, rx)
}

async fn connected(
    ledger: &MemoryLedger,
    account: AccountAddress,
) -> (Engine, UnboundedReceiver<Feedback>) {
    let (mut engine, rx) = engine(ledger, MemoryWallet::new(ledger.clone(), account));
    engine.connect().await.unwrap();
    (engine, rx)
}

fn donate(institution: &AccountAddress, amount: &str) -> Action {
    Action::Donate {
        institution: institution.to_string(),
        amount: amount.to_string(),
    }
}

fn drain(rx: &mut UnboundedReceiver<Feedback>) -> Vec<Feedback> {
    let mut out = vec![];
    while let Ok(feedback) = rx.try_recv() {
        out.push(feedback);
    }
    out
}

#[tokio::test]
async fn connect_reads_own_pool() {
    let ledger = MemoryLedger::new(module());
    let (engine, mut rx) = connected(&ledger, alice()).await;

    assert_eq!(engine.account(), Some(alice()));
    assert_eq!(engine.pool(&alice()), Some(PoolStatus::UNINITIALIZED));
    assert_eq!(
        drain(&mut rx),
        vec![Feedback::success("Wallet connected successfully!")]
    );
}

#[tokio::test]
async fn connect_without_wallet() {
    let ledger = MemoryLedger::new(module());
    let wallet = MemoryWallet::new(ledger.clone(), alice()).unavailable();
    let (mut engine, mut rx) = engine(&ledger, wallet);

    assert!(matches!(engine.connect().await, Err(Error::AgentUnavailable(_))));
    assert_eq!(engine.account(), None);
    assert_eq!(ledger.resource_queries(), 0);
    assert_eq!(drain(&mut rx)[0].category, Category::Error);
}

#[tokio::test]
async fn connect_rejected_by_user() {
    let ledger = MemoryLedger::new(module());
    let wallet = MemoryWallet::new(ledger.clone(), alice())
        .on_connect(Approval::Reject("User rejected the request".to_string()));
    let (mut engine, _rx) = engine(&ledger, wallet);

    assert_eq!(
        engine.connect().await,
        Err(Error::SessionRejected("User rejected the request".to_string()))
    );
    assert_eq!(engine.account(), None);
}

#[tokio::test(start_paused = true)]
async fn connect_times_out() {
    let ledger = MemoryLedger::new(module());
    let wallet = MemoryWallet::new(ledger.clone(), alice()).on_connect(Approval::Never);
    let (mut engine, _rx) = engine(&ledger, wallet);

    assert_eq!(engine.connect().await, Err(Error::Timeout(Stage::Connecting)));
}

#[tokio::test]
async fn init_pool_walks_every_state() {
    let ledger = MemoryLedger::new(module());
    let (mut engine, mut rx) = connected(&ledger, alice()).await;
    drain(&mut rx);

    let confirmed = engine.run(Action::InitPool).await.unwrap();
    let hash = confirmed.hash.clone();

    assert_eq!(confirmed.pool, alice());
    assert_eq!(
        confirmed.refresh,
        Refresh::Updated(PoolStatus { initialized: true, total_donations: 0 })
    );
    assert_eq!(
        engine.trace(),
        &[
            WorkflowState::BuildingRequest,
            WorkflowState::AwaitingSignature,
            WorkflowState::Submitted(hash.clone()),
            WorkflowState::Confirming(hash),
            WorkflowState::Reconciling,
            WorkflowState::Succeeded,
            WorkflowState::Idle,
        ]
    );
    assert_eq!(engine.state(), &WorkflowState::Idle);
    assert_eq!(ledger.pool_total(&alice()), Some(0));

    let feedback = drain(&mut rx);
    assert_eq!(feedback[0], Feedback::info("Initializing donation pool..."));
    assert_eq!(
        feedback[1..4],
        [
            Feedback::info(format!("Transaction {} submitted.", confirmed.hash)),
            Feedback::info(format!("Waiting for ledger confirmation of {}...", confirmed.hash)),
            Feedback::info("Refreshing pool status..."),
        ]
    );
    assert!(feedback.contains(&Feedback::success("Donation pool initialized successfully!")));
    assert!(feedback.iter().all(|f| f.category != Category::Error));
}

#[tokio::test]
async fn donations_accumulate() {
    let ledger = MemoryLedger::new(module());
    ledger.fund(bob(), 10 * APT);
    let (mut institution, _) = connected(&ledger, alice()).await;
    institution.run(Action::InitPool).await.unwrap();

    let (mut donor, mut rx) = connected(&ledger, bob()).await;
    drain(&mut rx);

    let first = donor.run(donate(&alice(), "1.5")).await.unwrap();
    assert_eq!(
        first.refresh,
        Refresh::Updated(PoolStatus { initialized: true, total_donations: 150_000_000 })
    );
    let second = donor.run(donate(&alice(), "2.5")).await.unwrap();
    assert_eq!(
        second.refresh,
        Refresh::Updated(PoolStatus { initialized: true, total_donations: 400_000_000 })
    );

    assert_eq!(donor.pool(&alice()).map(|p| p.total_donations), Some(4 * APT));
    assert_eq!(ledger.balance(&bob()), 6 * APT);
    assert!(drain(&mut rx).contains(&Feedback::success(
        "Successfully donated 2.5 APT to the institution!"
    )));
}

#[tokio::test]
async fn invalid_amounts_never_reach_the_network() {
    let ledger = MemoryLedger::new(module());
    let wallet = MemoryWallet::new(ledger.clone(), bob());
    let (mut engine, _rx) = engine(&ledger, wallet.clone());
    engine.connect().await.unwrap();
    let resource_queries = ledger.resource_queries();

    for amount in ["0", "-3", "abc", ""] {
        let result = engine.run(donate(&alice(), amount)).await;
        assert_eq!(result, Err(Error::InvalidAmount(amount.to_string())));
        assert_eq!(engine.state(), &WorkflowState::Idle);
    }

    assert_eq!(wallet.submissions(), 0);
    assert_eq!(ledger.resource_queries(), resource_queries);
    assert_eq!(ledger.transaction_queries(), 0);
}

#[tokio::test]
async fn empty_institution_is_invalid() {
    let ledger = MemoryLedger::new(module());
    let (mut engine, _rx) = connected(&ledger, bob()).await;

    let result = engine
        .run(Action::Donate { institution: String::new(), amount: "1".to_string() })
        .await;

    assert_eq!(result, Err(Error::InvalidAddress(String::new())));
    assert_eq!(ledger.transaction_queries(), 0);
}

#[tokio::test]
async fn actions_need_a_session() {
    let ledger = MemoryLedger::new(module());
    let (mut engine, mut rx) = engine(&ledger, MemoryWallet::new(ledger.clone(), alice()));

    assert_eq!(engine.run(Action::InitPool).await, Err(Error::NoSession));
    assert_eq!(
        engine.trace(),
        &[
            WorkflowState::BuildingRequest,
            WorkflowState::Failed(Error::NoSession),
            WorkflowState::Idle,
        ]
    );
    let feedback = drain(&mut rx);
    assert_eq!(feedback.len(), 1);
    assert!(feedback[0].message.starts_with("Failed to initialize donation pool"));
}

#[tokio::test]
async fn signing_rejection_skips_the_ledger() {
    let ledger = MemoryLedger::new(module());
    let wallet = MemoryWallet::new(ledger.clone(), alice())
        .on_submit(Approval::Reject("User rejected the request".to_string()));
    let (mut engine, mut rx) = engine(&ledger, wallet.clone());
    engine.connect().await.unwrap();
    drain(&mut rx);
    let resource_queries = ledger.resource_queries();

    let result = engine.run(Action::InitPool).await;

    assert_eq!(result, Err(Error::SigningRejected("User rejected the request".to_string())));
    assert_eq!(wallet.submissions(), 0);
    assert_eq!(ledger.transaction_queries(), 0);
    assert_eq!(ledger.resource_queries(), resource_queries);
    assert_eq!(ledger.pool_total(&alice()), None);

    let feedback = drain(&mut rx);
    let last = feedback.last().unwrap();
    assert_eq!(last.category, Category::Error);
    assert!(last.message.contains("User rejected the request"));
}

#[tokio::test]
async fn agent_failure_is_a_signing_error() {
    let ledger = MemoryLedger::new(module());
    let wallet = MemoryWallet::new(ledger.clone(), alice())
        .on_submit(Approval::Fail("insufficient gas".to_string()));
    let (mut engine, _rx) = engine(&ledger, wallet);
    engine.connect().await.unwrap();

    assert_eq!(
        engine.run(Action::InitPool).await,
        Err(Error::SigningError("insufficient gas".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn signing_times_out() {
    let ledger = MemoryLedger::new(module());
    let wallet = MemoryWallet::new(ledger.clone(), alice()).on_submit(Approval::Never);
    let (mut engine, _rx) = engine(&ledger, wallet);
    engine.connect().await.unwrap();

    assert_eq!(
        engine.run(Action::InitPool).await,
        Err(Error::Timeout(Stage::AwaitingSignature))
    );
    assert_eq!(engine.state(), &WorkflowState::Idle);
}

#[tokio::test(start_paused = true)]
async fn confirmation_times_out() {
    let ledger = MemoryLedger::new(module());
    let (mut engine, _rx) = connected(&ledger, alice()).await;
    ledger.hold_pending(true);

    assert_eq!(
        engine.run(Action::InitPool).await,
        Err(Error::Timeout(Stage::Confirming))
    );
    assert!(ledger.transaction_queries() > 1);
    assert!(matches!(
        engine.trace()[engine.trace().len() - 2],
        WorkflowState::Failed(Error::Timeout(Stage::Confirming))
    ));
}

#[tokio::test]
async fn unreachable_node_during_confirmation() {
    let ledger = MemoryLedger::new(module());
    let (mut engine, _rx) = connected(&ledger, alice()).await;
    ledger.set_transactions_unavailable(true);

    assert!(matches!(
        engine.run(Action::InitPool).await,
        Err(Error::LedgerUnavailable(_))
    ));
}

#[tokio::test]
async fn second_init_is_rejected_on_chain() {
    let ledger = MemoryLedger::new(module());
    let (mut engine, _rx) = connected(&ledger, alice()).await;
    engine.run(Action::InitPool).await.unwrap();

    let Err(Error::TransactionFailed { vm_status, .. }) = engine.run(Action::InitPool).await else {
        panic!("expected an on-chain failure");
    };
    assert_eq!(vm_status, "RESOURCE_ALREADY_EXISTS");
    assert_eq!(ledger.pool_total(&alice()), Some(0));
}

#[tokio::test]
async fn donation_to_missing_pool_fails_on_chain() {
    let ledger = MemoryLedger::new(module());
    ledger.fund(bob(), APT);
    let (mut engine, _rx) = connected(&ledger, bob()).await;

    let result = engine.run(donate(&alice(), "0.5")).await;

    assert!(matches!(result, Err(Error::TransactionFailed { .. })));
    assert_eq!(ledger.balance(&bob()), APT);
}

#[tokio::test]
async fn insufficient_balance_fails_on_chain() {
    let ledger = MemoryLedger::new(module());
    let (mut institution, _) = connected(&ledger, alice()).await;
    institution.run(Action::InitPool).await.unwrap();
    let (mut donor, _) = connected(&ledger, bob()).await;

    let Err(Error::TransactionFailed { vm_status, .. }) = donor.run(donate(&alice(), "1")).await else {
        panic!("expected an on-chain failure");
    };
    assert!(vm_status.contains("EINSUFFICIENT_BALANCE"));
    assert_eq!(ledger.pool_total(&alice()), Some(0));
}

#[tokio::test]
async fn refresh_failure_is_reported_separately() {
    let ledger = MemoryLedger::new(module());
    let (mut engine, mut rx) = connected(&ledger, alice()).await;
    drain(&mut rx);
    ledger.set_resources_unavailable(true);

    let confirmed = engine.run(Action::InitPool).await.unwrap();

    assert!(matches!(confirmed.refresh, Refresh::Failed(Error::LedgerUnavailable(_))));
    assert_eq!(ledger.pool_total(&alice()), Some(0));
    // the stale view from connect is kept
    assert_eq!(engine.pool(&alice()), Some(PoolStatus::UNINITIALIZED));

    let feedback = drain(&mut rx);
    assert!(feedback.contains(&Feedback::success("Donation pool initialized successfully!")));
    assert_eq!(feedback.last().map(|f| f.category), Some(Category::Error));
}

mod common;

use alloy::primitives::U256;
use common::{ether, ledger, FakeChain, TARGET};
use core_logic::{RetryError, RetryPolicy};
use pharos_bot::{Amount, OperationExecutor};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

const ME: alloy::primitives::Address =
    alloy::primitives::address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");

#[tokio::test(start_paused = true)]
async fn test_always_failing_operation_is_attempted_four_times() {
    let executor = OperationExecutor::new(RetryPolicy::exponential(3, 1000), false, 0.0);
    let attempts = AtomicU32::new(0);

    let start = tokio::time::Instant::now();
    let result: Result<(), _> = executor
        .execute("Wrap 1", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("execution reverted")) }
        })
        .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    // 2s + 4s + 8s between the four attempts
    assert_eq!(start.elapsed(), Duration::from_secs(14));
    match result {
        Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 4),
        other => panic!("expected exhaustion, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test(start_paused = true)]
async fn test_ledger_operation_recovers_after_failed_submissions() {
    let executor = OperationExecutor::new(RetryPolicy::exponential(3, 1000), false, 0.0);
    let chain = FakeChain::new(ME, ether(1), U256::ZERO);
    chain.fail_next(2);
    let client = ledger(&chain);
    let amount: Amount = "0.000001234".parse().unwrap();

    let outcome = executor
        .execute("Transfer 1", || client.transfer(TARGET, &amount))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(chain.state.lock().unwrap().submit_attempts, 3);
    assert_eq!(chain.calls().len(), 1);
}

#[tokio::test]
async fn test_insufficient_funds_is_not_retried() {
    let executor = OperationExecutor::new(RetryPolicy::exponential(3, 1000), false, 0.0);
    let chain = FakeChain::new(ME, U256::from(1u64), U256::ZERO);
    let client = ledger(&chain);
    let amount: Amount = "0.5".parse().unwrap();

    let outcome = executor
        .execute("Wrap 1", || client.wrap_deposit(&amount))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(chain.state.lock().unwrap().submit_attempts, 0);
}

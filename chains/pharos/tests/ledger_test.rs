mod common;

use alloy::primitives::U256;
use common::{ether, ledger, FakeChain, TARGET, WPHRS};
use pharos_bot::{Amount, LedgerCall};

const ME: alloy::primitives::Address =
    alloy::primitives::address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");

fn amount(s: &str) -> Amount {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_transfer_sends_exact_value() {
    let chain = FakeChain::new(ME, ether(1), U256::ZERO);
    let outcome = ledger(&chain)
        .transfer(TARGET, &amount("0.000001234"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.amount.as_deref().unwrap().starts_with("0.000001234"));
    assert!(outcome.tx_hash.is_some());
    assert_eq!(
        chain.calls(),
        vec![LedgerCall::Transfer {
            to: TARGET,
            value: U256::from(1_234_000_000_000u64),
        }]
    );
}

#[tokio::test]
async fn test_transfer_insufficient_funds_submits_nothing() {
    // Just below value + fee buffer
    let native = U256::from(1_234_000_000_000u64 + 100_000_000_000u64 - 1);
    let chain = FakeChain::new(ME, native, U256::ZERO);

    let outcome = ledger(&chain)
        .transfer(TARGET, &amount("0.000001234"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert!(outcome.message.starts_with("Insufficient funds"));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_transfer_all_keeps_fee_buffer() {
    let chain = FakeChain::new(ME, ether(1), U256::ZERO);
    ledger(&chain).transfer(TARGET, &Amount::All).await.unwrap();

    assert_eq!(
        chain.calls(),
        vec![LedgerCall::Transfer {
            to: TARGET,
            value: ether(1) - U256::from(100_000_000_000u64),
        }]
    );
}

#[tokio::test]
async fn test_wrap_deposits_into_token() {
    let chain = FakeChain::new(ME, ether(1), U256::ZERO);
    let outcome = ledger(&chain).wrap_deposit(&amount("0.000005342")).await.unwrap();

    assert!(outcome.success);
    let value = U256::from(5_342_000_000_000u64);
    assert_eq!(chain.calls(), vec![LedgerCall::Deposit { token: WPHRS, value }]);
    assert_eq!(chain.state.lock().unwrap().wrapped, value);
}

#[tokio::test]
async fn test_submit_failure_propagates() {
    let chain = FakeChain::new(ME, ether(1), U256::ZERO);
    chain.fail_next(1);

    let result = ledger(&chain).wrap_deposit(&amount("0.01")).await;
    assert!(result.is_err());
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_unwrap_zero_balance_is_nothing_to_unwrap() {
    let chain = FakeChain::new(ME, ether(1), U256::ZERO);
    let outcome = ledger(&chain)
        .unwrap_withdraw(0, 10, &amount("0.000004321"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Nothing to unwrap");
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_unwrap_last_iteration_takes_full_balance() {
    let wrapped = U256::from(10_000_000_000_000u64);
    let chain = FakeChain::new(ME, ether(1), wrapped);
    chain.set_allowance(U256::MAX);

    // U = 10: index 9 is the last iteration
    ledger(&chain)
        .unwrap_withdraw(9, 10, &amount("0.000004321"))
        .await
        .unwrap();

    assert_eq!(
        chain.calls(),
        vec![LedgerCall::Withdraw {
            token: WPHRS,
            amount: wrapped,
        }]
    );
    assert!(chain.state.lock().unwrap().wrapped.is_zero());
}

#[tokio::test]
async fn test_unwrap_earlier_iteration_uses_requested_amount() {
    let chain = FakeChain::new(ME, ether(1), U256::from(10_000_000_000_000u64));
    chain.set_allowance(U256::MAX);

    ledger(&chain)
        .unwrap_withdraw(3, 10, &amount("0.000004321"))
        .await
        .unwrap();

    assert_eq!(
        chain.calls(),
        vec![LedgerCall::Withdraw {
            token: WPHRS,
            amount: U256::from(4_321_000_000_000u64),
        }]
    );
}

#[tokio::test]
async fn test_unwrap_clamps_to_balance() {
    let chain = FakeChain::new(ME, ether(1), U256::from(1000u64));
    chain.set_allowance(U256::MAX);

    let outcome = ledger(&chain)
        .unwrap_withdraw(0, 10, &amount("0.000004321"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(
        chain.calls(),
        vec![LedgerCall::Withdraw {
            token: WPHRS,
            amount: U256::from(1000u64),
        }]
    );
}

#[tokio::test]
async fn test_unwrap_approves_when_allowance_low() {
    let chain = FakeChain::new(ME, ether(1), U256::from(5000u64));

    ledger(&chain)
        .unwrap_withdraw(0, 1, &amount("0.000004321"))
        .await
        .unwrap();

    assert_eq!(
        chain.calls(),
        vec![
            LedgerCall::Approve {
                token: WPHRS,
                spender: WPHRS,
                amount: U256::MAX,
            },
            LedgerCall::Withdraw {
                token: WPHRS,
                amount: U256::from(5000u64),
            },
        ]
    );
}

#[tokio::test]
async fn test_balances_reads_both_assets() {
    let chain = FakeChain::new(ME, ether(2), U256::from(7u64));
    let balances = ledger(&chain).balances().await.unwrap();

    assert_eq!(balances.native, ether(2));
    assert_eq!(balances.wrapped, U256::from(7u64));
    assert!(balances.native_formatted().starts_with("2."));
}

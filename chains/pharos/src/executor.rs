//! Retry wrapper around single ledger operations, plus amount randomization.

use crate::amount::{Amount, DecimalAmount};
use core_logic::{with_retry, RetryError, RetryPolicy};
use rand::Rng;
use std::future::Future;
use tracing::error;

/// Wraps one operation with the bounded exponential retry policy.
///
/// A failed operation is never fatal to the wallet run: the terminal
/// [`RetryError`] is handed back and the caller decides how to proceed.
#[derive(Debug, Clone)]
pub struct OperationExecutor {
    policy: RetryPolicy,
    randomize: bool,
    variation: f64,
}

impl OperationExecutor {
    pub fn new(policy: RetryPolicy, randomize: bool, variation: f64) -> Self {
        Self {
            policy,
            randomize,
            variation,
        }
    }

    pub async fn execute<T, F, Fut>(
        &self,
        name: &str,
        thunk: F,
    ) -> Result<T, RetryError<anyhow::Error>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        with_retry(&self.policy, name, thunk).await.inspect_err(|e| {
            error!("{} FAILED after {} retries: {:#}", name, self.policy.max_retries, e.last_error())
        })
    }

    /// Randomize `base` per the configured variation, or return it as-is
    /// when randomization is disabled.
    pub fn amount(&self, base: &Amount) -> Amount {
        if !self.randomize {
            return *base;
        }
        randomized_amount(base, self.variation)
    }
}

pub fn randomized_amount(base: &Amount, variance: f64) -> Amount {
    randomized_amount_with(base, variance, &mut rand::thread_rng())
}

/// Scale `base` by a factor drawn from `[1 - variance, 1 + variance]`,
/// keeping the number of fractional digits of the literal.
///
/// The `all` sentinel passes through untouched.
pub fn randomized_amount_with<R: Rng + ?Sized>(base: &Amount, variance: f64, rng: &mut R) -> Amount {
    match base {
        Amount::All => Amount::All,
        Amount::Exact(d) => Amount::Exact(scale_decimal(d, variance, rng)),
    }
}

fn scale_decimal<R: Rng + ?Sized>(base: &DecimalAmount, variance: f64, rng: &mut R) -> DecimalAmount {
    let variance = variance.abs();
    if variance == 0.0 || base.units() == 0 {
        return *base;
    }

    let units = base.units() as f64;
    let lo = (units * (1.0 - variance)).max(0.0).ceil();
    let hi = (units * (1.0 + variance)).floor();
    if lo > hi {
        return *base;
    }

    let factor = rng.gen_range((1.0 - variance)..=(1.0 + variance));
    let scaled = (units * factor).round().clamp(lo, hi);
    base.with_units(scaled as u128)
}

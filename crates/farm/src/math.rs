//! Fixed-Point Reward Math.
//!
//! Checked `u64` arithmetic and the two reward-per-share formulas used by the rollup engine. All
//! reward-per-share quantities are scaled by an explicit accuracy factor.

use crate::errors::FarmPanic;

/// Safe addition of two u64 values.
pub fn add(a: u64, b: u64) -> Result<u64, FarmPanic> {
    a.checked_add(b).ok_or(FarmPanic::ArithmeticOverflow)
}

/// Safe subtraction of two u64 values.
pub fn sub(a: u64, b: u64) -> Result<u64, FarmPanic> {
    a.checked_sub(b).ok_or(FarmPanic::Underflow)
}

/// Safe multiplication of two u64 values.
pub fn mul(a: u64, b: u64) -> Result<u64, FarmPanic> {
    a.checked_mul(b).ok_or(FarmPanic::ArithmeticOverflow)
}

/// Safe division of two u64 values.
pub fn div(a: u64, b: u64) -> Result<u64, FarmPanic> {
    a.checked_div(b).ok_or(FarmPanic::DivisionByZero)
}

/// Computes the reward-per-share increase for `blocks_elapsed` blocks.
///
/// Returns `blocks_elapsed * reward_per_block * acc_scale / total_staked`.
pub fn accrue(
    reward_per_block: u64,
    blocks_elapsed: u64,
    total_staked: u64,
    acc_scale: u64,
) -> Result<u64, FarmPanic> {
    let reward = mul(blocks_elapsed, reward_per_block)?;
    div(mul(reward, acc_scale)?, total_staked)
}

/// Computes the reward owed to a stake of `balance` between two accumulator readings.
///
/// Returns `(acc_end - acc_start) * balance / acc_scale`.
pub fn settle(acc_end: u64, acc_start: u64, balance: u64, acc_scale: u64) -> Result<u64, FarmPanic> {
    let acc_for_user = sub(acc_end, acc_start)?;
    div(mul(acc_for_user, balance)?, acc_scale)
}

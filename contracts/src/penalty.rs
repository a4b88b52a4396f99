//! Fixed-point math for the farm and the vault.
//!
//! - Linear penalty decay for early withdrawal
//! - Referral commission sizing
//! - Collateral valuation against an oracle price
//!
//! Every function uses checked arithmetic and reports overflow as
//! `PhoenixError::ArithmeticError` instead of wrapping.

use odra::casper_types::U256;
use crate::errors::PhoenixError;
use crate::types::{WithdrawalQuote, BPS_SCALE, PRICE_SCALE};

/// Result type for protocol math
pub type MathResult<T> = Result<T, PhoenixError>;

/// Penalty owed when withdrawing `principal` after `elapsed` of a `duration` lock.
///
/// penalty = principal * max_penalty_bps * (duration - elapsed) / (duration * BPS_SCALE)
///
/// Decays linearly from `principal * max_penalty_bps` at `elapsed = 0`
/// to zero at `elapsed >= duration`.
pub fn early_withdrawal_penalty(
    principal: U256,
    elapsed: u64,
    duration: u64,
    max_penalty_bps: u32,
) -> MathResult<U256> {
    if elapsed >= duration || principal.is_zero() || max_penalty_bps == 0 {
        return Ok(U256::zero());
    }
    if max_penalty_bps > BPS_SCALE {
        return Err(PhoenixError::InvalidConfig);
    }

    let remaining = duration - elapsed;
    let numerator = principal
        .checked_mul(U256::from(max_penalty_bps))
        .and_then(|v| v.checked_mul(U256::from(remaining)))
        .ok_or(PhoenixError::ArithmeticError)?;
    let denominator = U256::from(duration)
        .checked_mul(U256::from(BPS_SCALE))
        .ok_or(PhoenixError::ArithmeticError)?;

    numerator
        .checked_div(denominator)
        .ok_or(PhoenixError::ArithmeticError)
}

/// Split a principal into the returned amount and the penalty.
///
/// `amount_returned + penalty == principal` always holds.
pub fn quote_withdrawal(
    principal: U256,
    elapsed: u64,
    duration: u64,
    max_penalty_bps: u32,
) -> MathResult<WithdrawalQuote> {
    let penalty = early_withdrawal_penalty(principal, elapsed, duration, max_penalty_bps)?;
    let amount_returned = principal
        .checked_sub(penalty)
        .ok_or(PhoenixError::ArithmeticError)?;

    Ok(WithdrawalQuote {
        amount_returned,
        penalty,
    })
}

/// Commission earned by a referrer on a referee's locked amount.
pub fn referral_commission(amount: U256, commission_bps: u32) -> MathResult<U256> {
    apply_bps(amount, commission_bps)
}

/// Pegged tokens mintable for `collateral` at `price` (1e18 scale) and `ratio_bps`.
///
/// minted = collateral * price * ratio_bps / (PRICE_SCALE * BPS_SCALE)
pub fn mintable_amount(collateral: U256, price: U256, ratio_bps: u32) -> MathResult<U256> {
    if ratio_bps == 0 || ratio_bps > BPS_SCALE {
        return Err(PhoenixError::InvalidConfig);
    }

    let value = collateral
        .checked_mul(price)
        .ok_or(PhoenixError::ArithmeticError)?
        / U256::from(PRICE_SCALE);

    apply_bps(value, ratio_bps)
}

/// Share of `encumbered` collateral released when `redeemed` of `minted` is repaid.
pub fn pro_rata_release(encumbered: U256, redeemed: U256, minted: U256) -> MathResult<U256> {
    if minted.is_zero() || redeemed > minted {
        return Err(PhoenixError::InsufficientBalance);
    }
    if redeemed == minted {
        return Ok(encumbered);
    }

    encumbered
        .checked_mul(redeemed)
        .ok_or(PhoenixError::ArithmeticError)?
        .checked_div(minted)
        .ok_or(PhoenixError::ArithmeticError)
}

/// Deviation of `price` from the 1.0 peg in basis points.
pub fn peg_deviation_bps(price: U256) -> MathResult<U256> {
    let peg = U256::from(PRICE_SCALE);
    let diff = if price > peg { price - peg } else { peg - price };

    diff.checked_mul(U256::from(BPS_SCALE))
        .ok_or(PhoenixError::ArithmeticError)
        .map(|v| v / peg)
}

fn apply_bps(amount: U256, bps: u32) -> MathResult<U256> {
    amount
        .checked_mul(U256::from(bps))
        .map(|v| v / U256::from(BPS_SCALE))
        .ok_or(PhoenixError::ArithmeticError)
}

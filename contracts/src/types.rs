//! Common types used across the Phoenix protocol.

use odra::prelude::*;
use odra::casper_types::U256;

/// Fixed-point scale for prices and token amounts (1e18)
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u32 = 10_000;

/// One day in seconds
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Minimum age of a referee's qualifying lock before commission is released (3 days)
pub const ANTI_FARMING_DELAY: u64 = 3 * SECONDS_PER_DAY;

/// Latest oracle observation
#[odra::odra_type]
#[derive(Copy)]
pub struct PriceSample {
    /// USD per collateral unit, scaled by 1e18
    pub price: U256,
    /// Observation time in seconds
    pub timestamp: u64,
}

/// Per-account collateral accounting held by the vault
#[odra::odra_type]
#[derive(Default)]
pub struct CollateralPosition {
    /// Collateral held in custody for the account
    pub collateral: U256,
    /// Portion of `collateral` currently backing minted tokens
    pub encumbered: U256,
    /// Outstanding pegged tokens minted against this position
    pub minted: U256,
}

impl CollateralPosition {
    /// Collateral that is not backing any minted tokens.
    pub fn free_collateral(&self) -> U256 {
        self.collateral.saturating_sub(self.encumbered)
    }
}

/// Active time lock of an account in the farm
#[odra::odra_type]
#[derive(Default)]
pub struct LockPosition {
    /// Locked principal
    pub amount: U256,
    /// Lock start in seconds
    pub start: u64,
    /// Committed duration in seconds
    pub duration: u64,
}

impl LockPosition {
    pub fn is_active(&self) -> bool {
        !self.amount.is_zero()
    }

    /// Timestamp at which the lock can be withdrawn without penalty.
    pub fn unlock_time(&self) -> u64 {
        self.start.saturating_add(self.duration)
    }
}

/// Lifecycle of a referral commission
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum ReferralStatus {
    #[default]
    Pending,
    Released,
}

/// Commission owed to a referrer for a single referee
#[odra::odra_type]
pub struct ReferralRecord {
    /// Accrued commission not yet paid
    pub commission: U256,
    /// Time of the referee's first qualifying lock
    pub qualifying_timestamp: u64,
    /// Largest principal the referee has had locked; commission accrues only above it
    pub principal_high_water: U256,
    /// Pending until paid exactly once
    pub status: ReferralStatus,
}

/// Key into a referrer's list of referees
#[odra::odra_type]
#[derive(Copy)]
pub struct RefereeIndex {
    /// Referrer address
    pub referrer: Address,
    /// 0-based position in the referrer's list
    pub index: u32,
}

/// What happens to the forfeited part of an early withdrawal
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum PenaltyPolicy {
    /// Remove the penalty from circulation
    #[default]
    Burn,
    /// Send the penalty to the configured treasury
    Treasury,
}

/// Preview of a withdrawal at a given time
#[odra::odra_type]
#[derive(Copy)]
pub struct WithdrawalQuote {
    /// Amount the account would receive
    pub amount_returned: U256,
    /// Amount forfeited
    pub penalty: U256,
}

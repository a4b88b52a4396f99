//! Farm Contract
//!
//! Entry point for users of the protocol:
//! - Mint USDS against collateral through the vault
//! - Lock USDS for a committed duration
//! - Withdraw at any time, paying a linearly decaying penalty when early
//! - Referral commissions, released only after an anti-farming delay
//!
//! ## Lock lifecycle
//!
//! Unlocked -> Locked on the first `lock`. Locking again while Locked tops up
//! the position: principal is summed, the start resets to now, and the
//! committed duration becomes `max(requested, remaining)` so a top-up can
//! never bring the unlock time forward. `withdraw` always succeeds for an
//! active lock and returns the account to Unlocked.
//!
//! ## Referrals
//!
//! An account's referrer is bound on its first interaction with the farm and
//! is immutable afterwards. The first lock by a referee opens a pending
//! record for the pair. Until `anti_farming_delay` has passed, commission
//! accrues only on locked principal above the referee's previous high-water
//! mark, so withdrawing and relocking the same tokens earns nothing. The
//! commission is paid out of the reserve exactly once, no earlier than
//! `anti_farming_delay` after that first lock.
//!
//! Referees are indexed in the order their records open. Payouts walk that
//! index from a per-referrer cursor, at most `MAX_COMMISSIONS_PER_CALL`
//! records per call, and stop at the first record that is not yet due or
//! that the reserve cannot cover.

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs, runtime_args};
use odra::{CallDef, ContractRef};
use crate::access_control::AccessControl;
use crate::clock::now_secs;
use crate::errors::PhoenixError;
use crate::interfaces::Cep18TokenContractRef;
use crate::penalty::{quote_withdrawal, referral_commission};
use crate::types::{
    LockPosition, PenaltyPolicy, RefereeIndex, ReferralRecord, ReferralStatus, WithdrawalQuote,
    ANTI_FARMING_DELAY, BPS_SCALE, SECONDS_PER_DAY,
};

/// Shortest allowed lock (1 day)
const DEFAULT_MIN_LOCK_DURATION: u64 = SECONDS_PER_DAY;
/// Longest allowed lock (365 days)
const DEFAULT_MAX_LOCK_DURATION: u64 = 365 * SECONDS_PER_DAY;
/// Penalty for withdrawing right after locking (30%)
const DEFAULT_MAX_PENALTY_BPS: u32 = 3000;
/// Referrer's share of the referee's locked amount (5%)
const DEFAULT_REFERRAL_COMMISSION_BPS: u32 = 500;
/// Upper bound on referral records visited by one `process_my_commissions` call
pub const MAX_COMMISSIONS_PER_CALL: u32 = 32;

/// Farm configuration
#[odra::odra_type]
pub struct FarmConfig {
    /// Lower tier bound for lock durations, in seconds
    pub min_lock_duration: u64,
    /// Upper tier bound for lock durations, in seconds
    pub max_lock_duration: u64,
    /// Penalty at `elapsed = 0`, in bps of the principal
    pub max_penalty_bps: u32,
    /// Commission in bps of each lock made by a referee
    pub referral_commission_bps: u32,
    /// Minimum age of a referral before its commission is released
    pub anti_farming_delay: u64,
    /// Destination of early-withdrawal penalties
    pub penalty_policy: PenaltyPolicy,
    /// Receives penalties under `PenaltyPolicy::Treasury`
    pub treasury: Option<Address>,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            min_lock_duration: DEFAULT_MIN_LOCK_DURATION,
            max_lock_duration: DEFAULT_MAX_LOCK_DURATION,
            max_penalty_bps: DEFAULT_MAX_PENALTY_BPS,
            referral_commission_bps: DEFAULT_REFERRAL_COMMISSION_BPS,
            anti_farming_delay: ANTI_FARMING_DELAY,
            penalty_policy: PenaltyPolicy::Burn,
            treasury: None,
        }
    }
}

impl FarmConfig {
    /// Whether the parameters are internally consistent.
    pub fn is_valid(&self) -> bool {
        let durations_ok = self.min_lock_duration > 0
            && self.min_lock_duration <= self.max_lock_duration;
        let rates_ok = self.max_penalty_bps <= BPS_SCALE
            && self.referral_commission_bps <= BPS_SCALE;
        let treasury_ok = match self.penalty_policy {
            PenaltyPolicy::Burn => true,
            PenaltyPolicy::Treasury => self.treasury.is_some(),
        };
        durations_ok && rates_ok && treasury_ok && self.anti_farming_delay > 0
    }

    pub fn is_allowed_duration(&self, duration: u64) -> bool {
        duration >= self.min_lock_duration && duration <= self.max_lock_duration
    }
}

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct Locked {
        pub account: Address,
        pub amount: U256,
        pub duration: u64,
    }

    #[odra::event]
    pub struct Withdrawn {
        pub account: Address,
        pub amount_returned: U256,
        pub penalty: U256,
    }

    #[odra::event]
    pub struct CommissionReleased {
        pub referrer: Address,
        pub referee: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct ReferrerBound {
        pub account: Address,
        pub referrer: Address,
    }

    #[odra::event]
    pub struct CommissionsFunded {
        pub from: Address,
        pub amount: U256,
    }
}

/// Farm Contract
#[odra::module(events = [
    events::Locked,
    events::Withdrawn,
    events::CommissionReleased,
    events::ReferrerBound,
    events::CommissionsFunded
])]
pub struct Farm {
    /// USDS token contract
    pegged_token: Var<Address>,
    /// Collateral vault contract
    vault: Var<Address>,
    /// Farm configuration
    config: Var<FarmConfig>,
    /// Active lock per account
    users: Mapping<Address, LockPosition>,
    /// Whether the account has ever called mint or lock
    interacted: Mapping<Address, bool>,
    /// Referrer bound on first interaction
    referrers: Mapping<Address, Address>,
    /// (referrer, referee) -> commission record
    referrals: Mapping<(Address, Address), ReferralRecord>,
    /// Referees of each referrer, for enumeration
    referees: Mapping<RefereeIndex, Address>,
    /// Number of referees per referrer
    referee_count: Mapping<Address, u32>,
    /// First referee index of each referrer not yet released
    commission_cursor: Mapping<Address, u32>,
    /// Principal currently locked across all accounts
    total_locked: Var<U256>,
    /// USDS held for commission payouts
    commission_reserve: Var<U256>,
    /// Role table
    access: SubModule<AccessControl>,
}

#[odra::module]
impl Farm {
    /// Initialize the farm
    pub fn init(&mut self, pegged_token: Address, vault: Address, admin: Address) {
        self.pegged_token.set(pegged_token);
        self.vault.set(vault);
        self.config.set(FarmConfig::default());
        self.total_locked.set(U256::zero());
        self.commission_reserve.set(U256::zero());
        self.access.init(admin);
    }

    // ========== Minting ==========

    /// Deposit `collateral_amount` into the vault and mint USDS to the caller.
    ///
    /// `referrer` is recorded only on the caller's first interaction.
    /// The caller must have approved the farm on the collateral token; the
    /// farm pulls the collateral and forwards it to the vault.
    pub fn mint(&mut self, collateral_amount: U256, referrer: Option<Address>) -> U256 {
        if collateral_amount.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }
        let caller = self.env().caller();
        self.record_interaction(caller, referrer);

        let vault = self.vault_address();
        let farm = self.env().self_address();
        let mut collateral =
            Cep18TokenContractRef::new(self.env(), self.collateral_token_address(vault));
        collateral.transfer_from(caller, farm, collateral_amount);
        collateral.approve(vault, collateral_amount);

        let deposit_args = runtime_args! {
            "account" => caller,
            "amount" => collateral_amount,
        };
        self.env()
            .call_contract::<()>(vault, CallDef::new("deposit", true, deposit_args));

        let mint_args = runtime_args! {
            "account" => caller,
            "collateral_amount" => collateral_amount,
        };
        self.env()
            .call_contract::<U256>(vault, CallDef::new("mint_against", true, mint_args))
    }

    /// Burn `pegged_amount` of the caller's USDS and free the backing collateral.
    ///
    /// Returns the collateral released, withdrawable from the vault.
    pub fn redeem(&mut self, pegged_amount: U256) -> U256 {
        let caller = self.env().caller();
        let args = runtime_args! {
            "account" => caller,
            "pegged_amount" => pegged_amount,
        };
        self.env()
            .call_contract::<U256>(self.vault_address(), CallDef::new("redeem", true, args))
    }

    // ========== Locking ==========

    /// Lock `amount` of USDS for `duration` seconds.
    ///
    /// The caller must have approved the farm on the USDS token. The `Locked`
    /// event carries the committed duration after any top-up merge.
    pub fn lock(&mut self, amount: U256, duration: u64) {
        if amount.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }
        let config = self.get_config();
        if !config.is_allowed_duration(duration) {
            self.env().revert(PhoenixError::InvalidDuration);
        }

        let caller = self.env().caller();
        let now = now_secs(&self.env());
        self.record_interaction(caller, None);

        let mut position = self.users(caller);
        let committed = if position.is_active() {
            duration.max(position.unlock_time().saturating_sub(now))
        } else {
            duration
        };
        position.amount = self.checked_add(position.amount, amount);
        position.start = now;
        position.duration = committed;
        let locked_principal = position.amount;
        self.users.set(&caller, position);

        let total_locked = self.get_total_locked();
        let new_total_locked = self.checked_add(total_locked, amount);
        self.total_locked.set(new_total_locked);

        self.accrue_referral(caller, locked_principal, now, &config);

        self.token_transfer_from(caller, self.env().self_address(), amount);

        self.env().emit_event(events::Locked {
            account: caller,
            amount,
            duration: committed,
        });
    }

    /// Close the caller's lock, paying the early-withdrawal penalty if any.
    ///
    /// Returns the amount sent back to the caller.
    pub fn withdraw(&mut self) -> U256 {
        let caller = self.env().caller();
        let position = self.users(caller);
        if !position.is_active() {
            self.env().revert(PhoenixError::NoActiveLock);
        }

        let config = self.get_config();
        let quote = self.quote_position(&position, &config);

        self.users.set(&caller, LockPosition::default());
        let total_locked = self.get_total_locked();
        self.total_locked.set(total_locked.saturating_sub(position.amount));

        if !quote.amount_returned.is_zero() {
            self.token_transfer(caller, quote.amount_returned);
        }
        if !quote.penalty.is_zero() {
            self.dispose_penalty(quote.penalty, &config);
        }

        self.env().emit_event(events::Withdrawn {
            account: caller,
            amount_returned: quote.amount_returned,
            penalty: quote.penalty,
        });

        quote.amount_returned
    }

    /// What `account` would receive and forfeit by withdrawing now
    pub fn quote_withdrawal(&self, account: Address) -> WithdrawalQuote {
        let position = self.users(account);
        if !position.is_active() {
            return WithdrawalQuote {
                amount_returned: U256::zero(),
                penalty: U256::zero(),
            };
        }
        self.quote_position(&position, &self.get_config())
    }

    // ========== Referral Commissions ==========

    /// Pay out the commissions of `referrer` that have passed the anti-farming delay.
    ///
    /// Walks at most `MAX_COMMISSIONS_PER_CALL` records from the referrer's
    /// cursor and stops early at a record that is too young or that the
    /// reserve cannot cover, so calling early, repeatedly or while the reserve
    /// is short is a no-op. Returns the total paid by this call.
    pub fn process_my_commissions(&mut self, referrer: Address) -> U256 {
        let config = self.get_config();
        let now = now_secs(&self.env());
        let mut cursor = self.commission_cursor(referrer);
        let end = self
            .referee_count(referrer)
            .min(cursor.saturating_add(MAX_COMMISSIONS_PER_CALL));
        let mut released_total = U256::zero();

        while cursor < end {
            let index = RefereeIndex { referrer, index: cursor };
            let referee = match self.referees.get(&index) {
                Some(r) => r,
                None => break,
            };
            let mut record = match self.referrals.get(&(referrer, referee)) {
                Some(r) => r,
                None => break,
            };

            if record.status == ReferralStatus::Pending {
                // Records open in time order: nothing behind a young one is due
                if now.saturating_sub(record.qualifying_timestamp) < config.anti_farming_delay {
                    break;
                }
                let reserve = self.get_commission_reserve();
                if reserve < record.commission {
                    break;
                }
                self.commission_reserve.set(reserve - record.commission);

                let amount = record.commission;
                record.status = ReferralStatus::Released;
                self.referrals.set(&(referrer, referee), record);

                if !amount.is_zero() {
                    self.token_transfer(referrer, amount);
                }
                released_total = self.checked_add(released_total, amount);

                self.env().emit_event(events::CommissionReleased {
                    referrer,
                    referee,
                    amount,
                });
            }
            cursor += 1;
        }

        self.commission_cursor.set(&referrer, cursor);
        released_total
    }

    /// Add USDS from the caller to the commission reserve.
    ///
    /// The caller must have approved the farm on the USDS token.
    pub fn fund_commissions(&mut self, amount: U256) {
        if amount.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }
        let caller = self.env().caller();

        let reserve = self.get_commission_reserve();
        let new_reserve = self.checked_add(reserve, amount);
        self.commission_reserve.set(new_reserve);

        self.token_transfer_from(caller, self.env().self_address(), amount);

        self.env().emit_event(events::CommissionsFunded {
            from: caller,
            amount,
        });
    }

    // ========== View Functions ==========

    /// Lock position of an account (zeroed when unlocked)
    pub fn users(&self, account: Address) -> LockPosition {
        self.users.get(&account).unwrap_or_default()
    }

    pub fn referrer_of(&self, account: Address) -> Option<Address> {
        self.referrers.get(&account)
    }

    pub fn get_referral(&self, referrer: Address, referee: Address) -> Option<ReferralRecord> {
        self.referrals.get(&(referrer, referee))
    }

    pub fn referee_count(&self, referrer: Address) -> u32 {
        self.referee_count.get(&referrer).unwrap_or(0)
    }

    /// Index of the first referee of `referrer` whose commission is unpaid
    pub fn commission_cursor(&self, referrer: Address) -> u32 {
        self.commission_cursor.get(&referrer).unwrap_or(0)
    }

    pub fn get_config(&self) -> FarmConfig {
        self.config.get().unwrap_or_default()
    }

    pub fn get_total_locked(&self) -> U256 {
        self.total_locked.get().unwrap_or(U256::zero())
    }

    pub fn get_commission_reserve(&self) -> U256 {
        self.commission_reserve.get().unwrap_or(U256::zero())
    }

    // ========== Admin Functions ==========

    /// Replace the farm configuration (admin only)
    pub fn set_config(&mut self, config: FarmConfig) {
        self.access.require_admin();
        if !config.is_valid() {
            self.env().revert(PhoenixError::InvalidConfig);
        }
        self.config.set(config);
    }

    /// Choose where penalties go (admin only)
    pub fn set_penalty_policy(&mut self, policy: PenaltyPolicy, treasury: Option<Address>) {
        self.access.require_admin();
        let mut config = self.get_config();
        config.penalty_policy = policy;
        config.treasury = treasury;
        if !config.is_valid() {
            self.env().revert(PhoenixError::InvalidConfig);
        }
        self.config.set(config);
    }

    pub fn grant_role(&mut self, role_id: u8, account: Address) {
        self.access.grant_role(role_id, account);
    }

    pub fn revoke_role(&mut self, role_id: u8, account: Address) {
        self.access.revoke_role(role_id, account);
    }

    pub fn renounce_role(&mut self, role_id: u8) {
        self.access.renounce_role(role_id);
    }

    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.access.has_role(role_id, account)
    }

    // ========== Internal Functions ==========

    /// Bind the referrer on the first interaction; later calls never rebind.
    fn record_interaction(&mut self, account: Address, referrer: Option<Address>) {
        if self.interacted.get(&account).unwrap_or(false) {
            return;
        }
        self.interacted.set(&account, true);

        if let Some(referrer) = referrer {
            if referrer == account {
                self.env().revert(PhoenixError::InvalidReferrer);
            }
            self.referrers.set(&account, referrer);
            self.env().emit_event(events::ReferrerBound { account, referrer });
        }
    }

    /// Accrue commission on the referee's locked principal above its high-water mark.
    fn accrue_referral(
        &mut self,
        referee: Address,
        locked_principal: U256,
        now: u64,
        config: &FarmConfig,
    ) {
        let referrer = match self.referrers.get(&referee) {
            Some(r) => r,
            None => return,
        };

        let mut record = match self.referrals.get(&(referrer, referee)) {
            Some(r) => r,
            None => {
                let index = self.referee_count(referrer);
                self.referees.set(&RefereeIndex { referrer, index }, referee);
                self.referee_count.set(&referrer, index.saturating_add(1));
                ReferralRecord {
                    commission: U256::zero(),
                    qualifying_timestamp: now,
                    principal_high_water: U256::zero(),
                    status: ReferralStatus::Pending,
                }
            }
        };

        let window_open =
            now.saturating_sub(record.qualifying_timestamp) < config.anti_farming_delay;
        if record.status != ReferralStatus::Pending
            || !window_open
            || locked_principal <= record.principal_high_water
        {
            self.referrals.set(&(referrer, referee), record);
            return;
        }

        let increase = locked_principal - record.principal_high_water;
        let commission = match referral_commission(increase, config.referral_commission_bps) {
            Ok(v) => v,
            Err(e) => self.env().revert(e),
        };
        record.commission = self.checked_add(record.commission, commission);
        record.principal_high_water = locked_principal;
        self.referrals.set(&(referrer, referee), record);
    }

    fn quote_position(&self, position: &LockPosition, config: &FarmConfig) -> WithdrawalQuote {
        let elapsed = now_secs(&self.env()).saturating_sub(position.start);
        match quote_withdrawal(position.amount, elapsed, position.duration, config.max_penalty_bps) {
            Ok(q) => q,
            Err(e) => self.env().revert(e),
        }
    }

    fn dispose_penalty(&mut self, penalty: U256, config: &FarmConfig) {
        match (config.penalty_policy, config.treasury) {
            (PenaltyPolicy::Treasury, Some(treasury)) => self.token_transfer(treasury, penalty),
            (PenaltyPolicy::Treasury, None) => self.env().revert(PhoenixError::InvalidConfig),
            (PenaltyPolicy::Burn, _) => {
                let args = runtime_args! {
                    "from" => self.env().self_address(),
                    "amount" => penalty,
                };
                self.env()
                    .call_contract::<()>(self.pegged_token_address(), CallDef::new("burn", true, args));
            }
        }
    }

    fn token_transfer(&self, recipient: Address, amount: U256) {
        let args = runtime_args! {
            "recipient" => recipient,
            "amount" => amount,
        };
        self.env()
            .call_contract::<bool>(self.pegged_token_address(), CallDef::new("transfer", true, args));
    }

    fn token_transfer_from(&self, owner: Address, recipient: Address, amount: U256) {
        let args = runtime_args! {
            "owner" => owner,
            "recipient" => recipient,
            "amount" => amount,
        };
        self.env()
            .call_contract::<bool>(self.pegged_token_address(), CallDef::new("transfer_from", true, args));
    }

    fn pegged_token_address(&self) -> Address {
        match self.pegged_token.get() {
            Some(addr) => addr,
            None => self.env().revert(PhoenixError::InvalidConfig),
        }
    }

    fn collateral_token_address(&self, vault: Address) -> Address {
        let call_def = CallDef::new("get_collateral_token", false, RuntimeArgs::new());
        match self.env().call_contract::<Option<Address>>(vault, call_def) {
            Some(addr) => addr,
            None => self.env().revert(PhoenixError::InvalidConfig),
        }
    }

    fn vault_address(&self) -> Address {
        match self.vault.get() {
            Some(addr) => addr,
            None => self.env().revert(PhoenixError::InvalidConfig),
        }
    }

    fn checked_add(&self, a: U256, b: U256) -> U256 {
        match a.checked_add(b) {
            Some(v) => v,
            None => self.env().revert(PhoenixError::ArithmeticError),
        }
    }
}

//! Collateral Vault Contract
//!
//! Custodies the collateral token and keeps per-account collateral accounting.
//! Minting against collateral is restricted to the registered farm and sized by
//! the oracle manager's validated price, so every pegged token in circulation
//! is traceable to collateral locked here.
//!
//! ## Pause policy
//!
//! While paused, `deposit` and `mint_against` revert with `Paused`.
//! `redeem` and `withdraw_collateral` stay open so user funds are never trapped.

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs, runtime_args};
use odra::{CallDef, ContractRef};
use crate::access_control::{AccessControl, ROLE_PAUSER};
use crate::errors::PhoenixError;
use crate::interfaces::Cep18TokenContractRef;
use crate::penalty::{mintable_amount, pro_rata_release};
use crate::types::{CollateralPosition, BPS_SCALE};

/// Vault configuration
#[odra::odra_type]
pub struct VaultConfig {
    /// Share of collateral value that can be minted, in bps (<= 10000)
    pub collateral_ratio_bps: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            collateral_ratio_bps: BPS_SCALE,
        }
    }
}

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct Deposited {
        pub account: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct MintedAgainst {
        pub account: Address,
        pub collateral: U256,
        pub price: U256,
        pub minted: U256,
    }

    #[odra::event]
    pub struct Redeemed {
        pub account: Address,
        pub burned: U256,
        pub collateral_released: U256,
    }

    #[odra::event]
    pub struct CollateralWithdrawn {
        pub account: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct Paused {
        pub by: Address,
    }

    #[odra::event]
    pub struct Unpaused {
        pub by: Address,
    }

    #[odra::event]
    pub struct FarmAddressSet {
        pub farm: Address,
    }
}

/// Collateral Vault Contract
#[odra::module(events = [
    events::Deposited,
    events::MintedAgainst,
    events::Redeemed,
    events::CollateralWithdrawn,
    events::Paused,
    events::Unpaused,
    events::FarmAddressSet
])]
pub struct CollateralVault {
    /// Collateral CEP-18 token
    collateral_token: Var<Address>,
    /// Pegged token minted against collateral
    pegged_token: Var<Address>,
    /// Oracle manager providing the collateral price
    oracle: Var<Address>,
    /// The only contract allowed to mint and redeem
    farm: Var<Option<Address>>,
    /// Per-account collateral accounting
    positions: Mapping<Address, CollateralPosition>,
    /// Sum of all custodied collateral
    total_collateral: Var<U256>,
    /// Sum of all outstanding minted amounts
    total_minted: Var<U256>,
    /// Emergency pause flag
    paused: Var<bool>,
    /// Vault configuration
    config: Var<VaultConfig>,
    /// Role table
    access: SubModule<AccessControl>,
}

#[odra::module]
impl CollateralVault {
    /// Initialize the vault
    pub fn init(
        &mut self,
        collateral_token: Address,
        pegged_token: Address,
        oracle: Address,
        admin: Address,
    ) {
        self.collateral_token.set(collateral_token);
        self.pegged_token.set(pegged_token);
        self.oracle.set(oracle);
        self.farm.set(None);
        self.total_collateral.set(U256::zero());
        self.total_minted.set(U256::zero());
        self.paused.set(false);
        self.config.set(VaultConfig::default());
        self.access.init(admin);
    }

    // ========== Collateral Functions ==========

    /// Credit `amount` of collateral to `account` and pull it into custody.
    ///
    /// Callable by the account itself, paying from its own balance, or by the
    /// farm on its behalf, paying from the farm's balance. The payer must have
    /// approved the vault on the collateral token.
    pub fn deposit(&mut self, account: Address, amount: U256) {
        self.require_not_paused();
        let caller = self.env().caller();
        let from_farm = Some(caller) == self.get_farm();
        if caller != account && !from_farm {
            self.env().revert(PhoenixError::Unauthorized);
        }
        if amount.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }

        let mut position = self.get_position(account);
        position.collateral = self.checked_add(position.collateral, amount);
        self.positions.set(&account, position);

        let total = self.get_total_collateral();
        let new_total = self.checked_add(total, amount);
        self.total_collateral.set(new_total);

        let payer = if from_farm { caller } else { account };
        let vault = self.env().self_address();
        let mut token = Cep18TokenContractRef::new(self.env(), self.collateral_token_address());
        token.transfer_from(payer, vault, amount);

        self.env().emit_event(events::Deposited { account, amount });
    }

    /// Mint pegged tokens to `account` against its free collateral (farm only).
    ///
    /// Returns the minted amount.
    pub fn mint_against(&mut self, account: Address, collateral_amount: U256) -> U256 {
        self.require_farm();
        self.require_not_paused();
        if collateral_amount.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }

        let mut position = self.get_position(account);
        if position.free_collateral() < collateral_amount {
            self.env().revert(PhoenixError::InsufficientBalance);
        }

        let price = self.validated_price();
        let minted = match mintable_amount(collateral_amount, price, self.get_config().collateral_ratio_bps) {
            Ok(v) => v,
            Err(e) => self.env().revert(e),
        };
        if minted.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }

        position.encumbered = self.checked_add(position.encumbered, collateral_amount);
        position.minted = self.checked_add(position.minted, minted);
        self.positions.set(&account, position);

        let total_minted = self.get_total_minted();
        let new_total_minted = self.checked_add(total_minted, minted);
        self.total_minted.set(new_total_minted);

        let mint_args = runtime_args! {
            "to" => account,
            "amount" => minted,
        };
        let mint_call = CallDef::new("mint", true, mint_args);
        self.env().call_contract::<()>(self.pegged_token_address(), mint_call);

        self.env().emit_event(events::MintedAgainst {
            account,
            collateral: collateral_amount,
            price,
            minted,
        });

        minted
    }

    /// Burn `pegged_amount` from `account` and free the matching collateral (farm only).
    ///
    /// Available while paused. Returns the collateral released.
    pub fn redeem(&mut self, account: Address, pegged_amount: U256) -> U256 {
        self.require_farm();
        if pegged_amount.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }

        let mut position = self.get_position(account);
        let released = match pro_rata_release(position.encumbered, pegged_amount, position.minted) {
            Ok(v) => v,
            Err(e) => self.env().revert(e),
        };

        position.encumbered = position.encumbered - released;
        position.minted = position.minted - pegged_amount;
        self.positions.set(&account, position);

        let total_minted = self.get_total_minted();
        self.total_minted.set(total_minted.saturating_sub(pegged_amount));

        let burn_args = runtime_args! {
            "from" => account,
            "amount" => pegged_amount,
        };
        let burn_call = CallDef::new("burn", true, burn_args);
        self.env().call_contract::<()>(self.pegged_token_address(), burn_call);

        self.env().emit_event(events::Redeemed {
            account,
            burned: pegged_amount,
            collateral_released: released,
        });

        released
    }

    /// Return free collateral to the caller. Available while paused.
    pub fn withdraw_collateral(&mut self, amount: U256) {
        let caller = self.env().caller();
        if amount.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }

        let mut position = self.get_position(caller);
        if position.free_collateral() < amount {
            self.env().revert(PhoenixError::InsufficientBalance);
        }
        position.collateral = position.collateral - amount;
        self.positions.set(&caller, position);

        let total = self.get_total_collateral();
        self.total_collateral.set(total.saturating_sub(amount));

        let mut token = Cep18TokenContractRef::new(self.env(), self.collateral_token_address());
        token.transfer(caller, amount);

        self.env().emit_event(events::CollateralWithdrawn {
            account: caller,
            amount,
        });
    }

    // ========== Pause Functions ==========

    /// Pause deposits and minting (pauser or admin)
    pub fn pause(&mut self) {
        self.access.require_role_or_admin(ROLE_PAUSER);
        if self.is_paused() {
            return;
        }
        self.paused.set(true);
        self.env().emit_event(events::Paused {
            by: self.env().caller(),
        });
    }

    /// Resume deposits and minting (pauser or admin)
    pub fn unpause(&mut self) {
        self.access.require_role_or_admin(ROLE_PAUSER);
        if !self.is_paused() {
            return;
        }
        self.paused.set(false);
        self.env().emit_event(events::Unpaused {
            by: self.env().caller(),
        });
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    // ========== Admin Functions ==========

    /// Bind the farm allowed to mint and redeem (admin only)
    pub fn set_farm_address(&mut self, farm: Address) {
        self.access.require_admin();
        self.farm.set(Some(farm));
        self.env().emit_event(events::FarmAddressSet { farm });
    }

    /// Update the collateralization ratio (admin only)
    pub fn set_collateral_ratio(&mut self, collateral_ratio_bps: u32) {
        self.access.require_admin();
        if collateral_ratio_bps == 0 || collateral_ratio_bps > BPS_SCALE {
            self.env().revert(PhoenixError::InvalidConfig);
        }
        self.config.set(VaultConfig { collateral_ratio_bps });
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

    // ========== View Functions ==========

    /// Collateral position of an account (zeroed if none)
    pub fn get_position(&self, account: Address) -> CollateralPosition {
        self.positions.get(&account).unwrap_or_default()
    }

    /// Pegged tokens that `collateral_amount` would mint at the current price
    pub fn max_mintable(&self, collateral_amount: U256) -> U256 {
        let price = self.validated_price();
        match mintable_amount(collateral_amount, price, self.get_config().collateral_ratio_bps) {
            Ok(v) => v,
            Err(e) => self.env().revert(e),
        }
    }

    /// Collateral token balance actually held by the vault
    pub fn get_custody_balance(&self) -> U256 {
        let token = Cep18TokenContractRef::new(self.env(), self.collateral_token_address());
        token.balance_of(self.env().self_address())
    }

    pub fn get_config(&self) -> VaultConfig {
        self.config.get().unwrap_or_default()
    }

    pub fn get_farm(&self) -> Option<Address> {
        self.farm.get().flatten()
    }

    pub fn get_oracle(&self) -> Option<Address> {
        self.oracle.get()
    }

    pub fn get_pegged_token(&self) -> Option<Address> {
        self.pegged_token.get()
    }

    pub fn get_collateral_token(&self) -> Option<Address> {
        self.collateral_token.get()
    }

    pub fn get_total_collateral(&self) -> U256 {
        self.total_collateral.get().unwrap_or(U256::zero())
    }

    pub fn get_total_minted(&self) -> U256 {
        self.total_minted.get().unwrap_or(U256::zero())
    }

    // ========== Internal Functions ==========

    fn validated_price(&self) -> U256 {
        let oracle = match self.oracle.get() {
            Some(addr) => addr,
            None => self.env().revert(PhoenixError::InvalidConfig),
        };
        let call_def = CallDef::new("get_validated_price", false, RuntimeArgs::new());
        self.env().call_contract::<U256>(oracle, call_def)
    }

    fn require_farm(&self) {
        if Some(self.env().caller()) != self.get_farm() {
            self.env().revert(PhoenixError::Unauthorized);
        }
    }

    fn require_not_paused(&self) {
        if self.is_paused() {
            self.env().revert(PhoenixError::Paused);
        }
    }

    fn pegged_token_address(&self) -> Address {
        match self.pegged_token.get() {
            Some(addr) => addr,
            None => self.env().revert(PhoenixError::InvalidConfig),
        }
    }

    fn collateral_token_address(&self) -> Address {
        match self.collateral_token.get() {
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

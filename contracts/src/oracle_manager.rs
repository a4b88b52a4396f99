//! Oracle Manager Contract
//!
//! Holds the single latest collateral price sample relayed by a keeper from
//! the external USDT/USD feed. Implements:
//! - Keeper-only, strictly monotonic price updates
//! - Freshness validation on read (stale samples are rejected, never served)
//! - Depeg circuit breaker that pauses the collateral vault
//!
//! Only the latest sample is kept; there is no price history.

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs};
use odra::CallDef;
use crate::access_control::{AccessControl, ROLE_KEEPER};
use crate::clock::now_secs;
use crate::errors::PhoenixError;
use crate::penalty::peg_deviation_bps;
use crate::types::PriceSample;

/// Default maximum sample age in seconds (1 hour)
const DEFAULT_STALENESS_BOUND_SECONDS: u64 = 3600;

/// Default depeg threshold in basis points (3%)
const DEFAULT_DEPEG_THRESHOLD_BPS: u32 = 300;

/// Oracle configuration
#[odra::odra_type]
pub struct OracleConfig {
    /// Maximum sample age in seconds before it is considered stale
    pub staleness_bound_seconds: u64,
    /// Deviation from the 1.0 peg (bps) that trips the circuit breaker
    pub depeg_threshold_bps: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            staleness_bound_seconds: DEFAULT_STALENESS_BOUND_SECONDS,
            depeg_threshold_bps: DEFAULT_DEPEG_THRESHOLD_BPS,
        }
    }
}

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct PriceUpdated {
        pub price: U256,
        pub timestamp: u64,
    }

    #[odra::event]
    pub struct DepegDetected {
        pub price: U256,
        pub deviation_bps: U256,
    }
}

/// Oracle Manager Contract
#[odra::module(events = [events::PriceUpdated, events::DepegDetected])]
pub struct OracleManager {
    /// Latest accepted sample
    sample: Var<PriceSample>,
    /// Collateral vault paused by the circuit breaker
    vault: Var<Option<Address>>,
    /// Oracle configuration
    config: Var<OracleConfig>,
    /// Role table
    access: SubModule<AccessControl>,
}

#[odra::module]
impl OracleManager {
    /// Initialize the oracle manager
    pub fn init(&mut self, vault: Option<Address>, admin: Address) {
        self.vault.set(vault);
        self.config.set(OracleConfig::default());
        self.access.init(admin);
    }

    // ========== Price Query Functions ==========

    /// Latest price if it is fresh, otherwise revert with `StalePrice`
    pub fn get_validated_price(&self) -> U256 {
        self.validated_sample().price
    }

    /// Latest sample regardless of freshness
    pub fn get_latest_sample(&self) -> Option<PriceSample> {
        self.sample.get()
    }

    /// Whether the stored sample is older than the staleness bound
    pub fn is_stale(&self) -> bool {
        match self.sample.get() {
            Some(sample) => self.sample_age(&sample) > self.get_config().staleness_bound_seconds,
            None => true,
        }
    }

    // ========== Price Update Functions ==========

    /// Store a new sample (keeper only)
    pub fn update_price(&mut self, new_price: U256, timestamp: u64) {
        self.access.require_role(ROLE_KEEPER);

        if new_price.is_zero() {
            self.env().revert(PhoenixError::InvalidAmount);
        }

        // Samples must move forward and never run ahead of the block clock
        if timestamp > now_secs(&self.env()) {
            self.env().revert(PhoenixError::NonMonotonicUpdate);
        }
        if let Some(previous) = self.sample.get() {
            if timestamp <= previous.timestamp {
                self.env().revert(PhoenixError::NonMonotonicUpdate);
            }
        }

        self.sample.set(PriceSample {
            price: new_price,
            timestamp,
        });

        self.env().emit_event(events::PriceUpdated {
            price: new_price,
            timestamp,
        });
    }

    // ========== Circuit Breaker ==========

    /// Pause the vault when the validated price has left the peg (keeper only).
    ///
    /// Returns `true` if this call paused the vault.
    pub fn check_peg(&mut self) -> bool {
        self.access.require_role(ROLE_KEEPER);

        let sample = self.validated_sample();
        let deviation_bps = match peg_deviation_bps(sample.price) {
            Ok(v) => v,
            Err(e) => self.env().revert(e),
        };
        if deviation_bps <= U256::from(self.get_config().depeg_threshold_bps) {
            return false;
        }

        let vault = match self.vault.get().flatten() {
            Some(v) => v,
            None => self.env().revert(PhoenixError::InvalidConfig),
        };

        let is_paused: bool = self
            .env()
            .call_contract(vault, CallDef::new("is_paused", false, RuntimeArgs::new()));
        if is_paused {
            return false;
        }

        self.env()
            .call_contract::<()>(vault, CallDef::new("pause", true, RuntimeArgs::new()));

        self.env().emit_event(events::DepegDetected {
            price: sample.price,
            deviation_bps,
        });
        true
    }

    // ========== Configuration Functions ==========

    /// Get oracle configuration
    pub fn get_config(&self) -> OracleConfig {
        self.config.get().unwrap_or_default()
    }

    /// Update oracle configuration (admin only)
    pub fn set_config(&mut self, config: OracleConfig) {
        self.access.require_admin();
        if config.staleness_bound_seconds == 0 || config.depeg_threshold_bps == 0 {
            self.env().revert(PhoenixError::InvalidConfig);
        }
        self.config.set(config);
    }

    /// Set the vault guarded by the circuit breaker (admin only)
    pub fn set_vault(&mut self, vault: Address) {
        self.access.require_admin();
        self.vault.set(Some(vault));
    }

    /// Get vault address
    pub fn get_vault(&self) -> Option<Address> {
        self.vault.get().flatten()
    }

    // ========== Role Management ==========

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

    fn validated_sample(&self) -> PriceSample {
        let sample = match self.sample.get() {
            Some(s) => s,
            None => self.env().revert(PhoenixError::StalePrice),
        };

        if self.sample_age(&sample) > self.get_config().staleness_bound_seconds {
            self.env().revert(PhoenixError::StalePrice);
        }
        sample
    }

    fn sample_age(&self, sample: &PriceSample) -> u64 {
        now_secs(&self.env()).saturating_sub(sample.timestamp)
    }
}

//! Phoenix Protocol Contracts
//!
//! Collateral-backed stablecoin (USDS) with a lock-and-earn farm on Casper.
//!
//! ## Architecture
//!
//! - **PeggedToken (USDS)**: Capped CEP-18 token with role-gated mint/burn
//! - **OracleManager**: Keeper-fed collateral price with freshness checks and a depeg circuit breaker
//! - **CollateralVault**: Custodies collateral and mints USDS against it at the oracle price
//! - **Farm**: Minting entry point, timed USDS locks with early-withdrawal penalties, referral commissions
//!
//! ## Roles
//!
//! A single role table per contract (see [`access_control`]). The vault holds
//! MINTER and BURNER on the token, the farm holds BURNER, the oracle manager
//! holds PAUSER on the vault and keepers hold KEEPER on the oracle manager.
//!
//! ## Circuit Breaker
//!
//! When the validated price deviates from the peg by more than the configured
//! threshold, `OracleManager::check_peg` pauses the vault:
//! - Blocked: deposit, mint
//! - Allowed: redeem, withdraw collateral, lock, withdraw from the farm

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod clock;
pub mod penalty;
pub mod interfaces;
pub mod access_control;

// Contract modules
pub mod pegged_token;
pub mod oracle_manager;
pub mod collateral_vault;
pub mod farm;

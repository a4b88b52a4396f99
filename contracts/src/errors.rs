//! Protocol error definitions.

use odra::prelude::*;

/// Phoenix protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PhoenixError {
    // Oracle errors (1xx)
    StalePrice = 100,
    NonMonotonicUpdate = 101,

    // Access control errors (2xx)
    Unauthorized = 200,
    LastAdmin = 201,

    // Vault errors (3xx)
    Paused = 300,

    // Input errors (4xx)
    InvalidAmount = 400,
    InvalidDuration = 401,
    InvalidReferrer = 402,
    InvalidConfig = 403,

    // Ledger errors (5xx)
    CapExceeded = 500,
    InsufficientBalance = 501,
    InsufficientAllowance = 502,

    // Farm errors (6xx)
    NoActiveLock = 600,

    // Math errors (9xx)
    ArithmeticError = 900,
}

impl PhoenixError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Oracle
            PhoenixError::StalePrice => "Oracle price is stale or missing",
            PhoenixError::NonMonotonicUpdate => "Oracle update timestamp is not increasing",

            // Access control
            PhoenixError::Unauthorized => "Unauthorized: caller lacks the required role",
            PhoenixError::LastAdmin => "Cannot remove the last admin",

            // Vault
            PhoenixError::Paused => "Operation blocked: vault is paused",

            // Input
            PhoenixError::InvalidAmount => "Amount must be greater than zero",
            PhoenixError::InvalidDuration => "Lock duration outside allowed tiers",
            PhoenixError::InvalidReferrer => "Referrer cannot be the caller",
            PhoenixError::InvalidConfig => "Invalid configuration parameter",

            // Ledger
            PhoenixError::CapExceeded => "Mint would exceed the supply cap",
            PhoenixError::InsufficientBalance => "Insufficient balance",
            PhoenixError::InsufficientAllowance => "Insufficient allowance",

            // Farm
            PhoenixError::NoActiveLock => "Account has no active lock",

            // Math
            PhoenixError::ArithmeticError => "Arithmetic overflow or underflow",
        }
    }
}

impl core::fmt::Display for PhoenixError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<PhoenixError> for OdraError {
    fn from(error: PhoenixError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}

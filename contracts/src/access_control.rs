//! Access Control
//!
//! Role table embedded into every protocol contract as a submodule.
//! Each contract keeps its own `(role, account) -> bool` table and checks it
//! at entry:
//! - Admin role (grants/revokes all roles, rebinds addresses, tunes parameters)
//! - Minter role (PeggedToken mint, held by the vault)
//! - Burner role (PeggedToken burn, held by the vault and the farm)
//! - Pauser role (vault pause/unpause, held by the oracle manager)
//! - Keeper role (oracle price updates, held by the automation bot)
//!
//! The last admin of a contract can never be revoked or renounced.

use odra::prelude::*;
use crate::errors::PhoenixError;

/// Role constants (u8 for efficient storage)
pub const ROLE_ADMIN: u8 = 0;
pub const ROLE_MINTER: u8 = 1;
pub const ROLE_BURNER: u8 = 2;
pub const ROLE_PAUSER: u8 = 3;
pub const ROLE_KEEPER: u8 = 4;

/// Number of defined roles
pub const ROLE_COUNT: u8 = 5;

/// Role table
#[odra::module]
pub struct AccessControl {
    /// Role assignments: (role, account) -> bool
    roles: Mapping<(u8, Address), bool>,
    /// Number of accounts with each role
    role_count: Mapping<u8, u32>,
}

#[odra::module]
impl AccessControl {
    /// Grant the admin role to the initial admin
    pub fn init(&mut self, initial_admin: Address) {
        self.set_role_internal(ROLE_ADMIN, initial_admin, true);
    }

    // ========== Role Queries ==========

    /// Check if account has a specific role
    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.roles.get(&(role_id, account)).unwrap_or(false)
    }

    /// Check if caller has a specific role
    pub fn caller_has_role(&self, role_id: u8) -> bool {
        self.has_role(role_id, self.env().caller())
    }

    /// Get the number of accounts with a role
    pub fn get_role_member_count(&self, role_id: u8) -> u32 {
        self.role_count.get(&role_id).unwrap_or(0)
    }

    // ========== Role Management ==========

    /// Grant a role to an account (admin only)
    pub fn grant_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        if role_id >= ROLE_COUNT {
            self.env().revert(PhoenixError::InvalidConfig);
        }
        self.set_role_internal(role_id, account, true);
    }

    /// Revoke a role from an account (admin only)
    pub fn revoke_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        self.remove_role(role_id, account);
    }

    /// Caller gives up one of its own roles
    pub fn renounce_role(&mut self, role_id: u8) {
        let caller = self.env().caller();
        self.remove_role(role_id, caller);
    }

    // ========== Guards ==========

    /// Revert if caller doesn't have the specified role
    pub fn require_role(&self, role_id: u8) {
        if !self.caller_has_role(role_id) {
            self.env().revert(PhoenixError::Unauthorized);
        }
    }

    /// Revert if caller doesn't have admin role
    pub fn require_admin(&self) {
        self.require_role(ROLE_ADMIN);
    }

    /// Revert unless caller holds `role_id` or is admin
    pub fn require_role_or_admin(&self, role_id: u8) {
        if !self.caller_has_role(role_id) && !self.caller_has_role(ROLE_ADMIN) {
            self.env().revert(PhoenixError::Unauthorized);
        }
    }

    // ========== Internal ==========

    fn remove_role(&mut self, role_id: u8, account: Address) {
        if !self.has_role(role_id, account) {
            return;
        }

        if role_id == ROLE_ADMIN && self.get_role_member_count(ROLE_ADMIN) <= 1 {
            self.env().revert(PhoenixError::LastAdmin);
        }

        self.set_role_internal(role_id, account, false);
    }

    fn set_role_internal(&mut self, role_id: u8, account: Address, value: bool) {
        let had_role = self.has_role(role_id, account);
        if had_role == value {
            return;
        }

        self.roles.set(&(role_id, account), value);

        let current_count = self.get_role_member_count(role_id);
        if value {
            self.role_count.set(&role_id, current_count.saturating_add(1));
        } else {
            self.role_count.set(&role_id, current_count.saturating_sub(1));
        }
    }
}

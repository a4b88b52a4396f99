//! External contract interfaces.
//!
//! The collateral asset (USDT on the target network) is a third-party CEP-18
//! token; the farm and the vault talk to it through this interface.

use odra::prelude::*;
use odra::casper_types::U256;

/// CEP-18 token interface for cross-contract calls
#[odra::external_contract]
pub trait Cep18Token {
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool;
    fn approve(&mut self, spender: Address, amount: U256) -> bool;
    fn balance_of(&self, account: Address) -> U256;
}

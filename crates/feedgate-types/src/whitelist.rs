//! Membership oracle contract

use crate::address::Address;

/// Set-membership check consulted before every feed read
///
/// How members are admitted is up to the implementation.
pub trait Whitelist: Send + Sync {
    /// Identity of this whitelist
    fn address(&self) -> Address;

    /// Whether `account` may read feed data
    fn is_whitelisted(&self, account: &Address) -> bool;
}

//! Ledger boundary between the authorization core and the balance store.
//!
//! The core moves funds only through [`Ledger::credit`] and [`Ledger::debit`];
//! it never assumes a storage technology. [`MemoryLedger`] is the in-process
//! implementation used by the server and the tests.

use std::collections::BTreeMap;

use alloy_primitives::Address;

use crate::amount::TokenAmount;

/// Failures reported by a [`Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A debit would drive the balance negative. Debits are rejected, never clamped.
    #[error("insufficient balance for {account}: have {balance}, need {required}")]
    InsufficientBalance {
        /// Debited account.
        account: Address,
        /// Balance before the debit.
        balance: TokenAmount,
        /// Requested debit.
        required: TokenAmount,
    },
    /// A credit would overflow the balance.
    #[error("balance overflow")]
    Overflow,
    /// Storage-level failure.
    #[error("{0}")]
    Backend(String),
}

/// External balance store.
pub trait Ledger {
    /// Current balance of `account`.
    fn balance_of(&self, account: Address) -> TokenAmount;

    /// Adds `amount` to `account`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] or a backend failure.
    fn credit(&mut self, account: Address, amount: TokenAmount) -> Result<(), LedgerError>;

    /// Removes `amount` from `account`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if the balance is too low.
    fn debit(&mut self, account: Address, amount: TokenAmount) -> Result<(), LedgerError>;
}

impl<L: Ledger + ?Sized> Ledger for Box<L> {
    fn balance_of(&self, account: Address) -> TokenAmount {
        (**self).balance_of(account)
    }

    fn credit(&mut self, account: Address, amount: TokenAmount) -> Result<(), LedgerError> {
        (**self).credit(account, amount)
    }

    fn debit(&mut self, account: Address, amount: TokenAmount) -> Result<(), LedgerError> {
        (**self).debit(account, amount)
    }
}

/// Moves `amount` from `from` to `to` as one unit.
///
/// If the credit leg fails after a successful debit, the debit is reversed
/// before the error is returned.
///
/// # Errors
///
/// Propagates the failing leg's [`LedgerError`].
pub fn transfer<L: Ledger + ?Sized>(
    ledger: &mut L,
    from: Address,
    to: Address,
    amount: TokenAmount,
) -> Result<(), LedgerError> {
    ledger.debit(from, amount)?;
    if let Err(e) = ledger.credit(to, amount) {
        ledger.credit(from, amount)?;
        return Err(e);
    }
    Ok(())
}

/// In-memory ledger keyed by account.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: BTreeMap<Address, TokenAmount>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger seeded with the given balances.
    #[must_use]
    pub fn with_balances(balances: impl IntoIterator<Item = (Address, TokenAmount)>) -> Self {
        Self {
            balances: balances
                .into_iter()
                .filter(|(_, amount)| !amount.is_zero())
                .collect(),
        }
    }
}

impl Ledger for MemoryLedger {
    fn balance_of(&self, account: Address) -> TokenAmount {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn credit(&mut self, account: Address, amount: TokenAmount) -> Result<(), LedgerError> {
        let balance = self.balance_of(account);
        let updated = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        if !updated.is_zero() {
            self.balances.insert(account, updated);
        }
        Ok(())
    }

    fn debit(&mut self, account: Address, amount: TokenAmount) -> Result<(), LedgerError> {
        let balance = self.balance_of(account);
        let updated = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account,
                balance,
                required: amount,
            })?;
        if updated.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, updated);
        }
        Ok(())
    }
}

//! Unordered nonce bitmaps for permit replay protection.
//!
//! Nonces are 256-bit values. Nonce `n` of an owner lives in word `n >> 8`
//! at bit position `n & 0xff`; each word is a 256-bit bitmap. Bits are only
//! ever set, never cleared, so a consumed nonce stays consumed forever.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::error::TreasuryError;

/// Number of nonces tracked by one bitmap word.
pub const WORD_BITS: usize = 256;

/// Position of a nonce inside an owner's bitmap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonceSlot {
    /// Word index (`nonce >> 8`).
    pub word: U256,
    /// Bit position inside the word (`nonce & 0xff`).
    pub bit: u8,
}

impl NonceSlot {
    /// Splits a nonce into its word index and bit position.
    #[must_use]
    pub fn of(nonce: U256) -> Self {
        Self {
            word: nonce >> 8usize,
            bit: nonce.byte(0),
        }
    }

    /// Reassembles the nonce this slot represents.
    #[must_use]
    pub fn nonce(&self) -> U256 {
        (self.word << 8usize) | U256::from(self.bit)
    }

    fn mask(&self) -> U256 {
        U256::from(1u8) << usize::from(self.bit)
    }
}

/// Per-owner nonce bitmaps.
///
/// Mutating methods take `&mut self`, so a check-and-set can never be
/// interleaved with another writer: callers sharing a registry across threads
/// must wrap it (or the state object owning it) in a lock.
#[derive(Debug, Clone, Default)]
pub struct NonceRegistry {
    words: BTreeMap<(Address, U256), U256>,
}

impl NonceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bitmap stored for `(owner, word)`; unused words read as zero.
    #[must_use]
    pub fn bitmap(&self, owner: Address, word: U256) -> U256 {
        self.words.get(&(owner, word)).copied().unwrap_or_default()
    }

    /// Returns `true` if `owner` has already consumed `nonce`.
    #[must_use]
    pub fn is_used(&self, owner: Address, nonce: U256) -> bool {
        let slot = NonceSlot::of(nonce);
        self.bitmap(owner, slot.word) & slot.mask() != U256::ZERO
    }

    /// Consumes `nonce` for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::NonceAlreadyUsed`] if the bit is already set;
    /// the registry is left unchanged in that case.
    pub fn consume(&mut self, owner: Address, nonce: U256) -> Result<(), TreasuryError> {
        let slot = NonceSlot::of(nonce);
        let word = self.words.entry((owner, slot.word)).or_default();
        let mask = slot.mask();
        if *word & mask != U256::ZERO {
            return Err(TreasuryError::NonceAlreadyUsed { owner, nonce });
        }
        *word |= mask;
        Ok(())
    }

    /// Marks every nonce selected by `mask` in `word` as used and returns the
    /// resulting bitmap. Already-used bits are unaffected.
    pub fn invalidate(&mut self, owner: Address, word: U256, mask: U256) -> U256 {
        if mask == U256::ZERO {
            return self.bitmap(owner, word);
        }
        let bits = self.words.entry((owner, word)).or_default();
        *bits |= mask;
        *bits
    }

    /// Returns the lowest unused nonce in `word`.
    ///
    /// Advisory only: callers use it to pick the nonce of their next permit.
    /// Consumption correctness never depends on it.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::NoAvailableNonce`] when all 256 nonces of the
    /// word are used; the caller should move on to the next word index.
    pub fn next_unused_nonce(&self, owner: Address, word: U256) -> Result<U256, TreasuryError> {
        let bits = self.bitmap(owner, word);
        (0..WORD_BITS)
            .find(|&bit| !bits.bit(bit))
            .map(|bit| (word << 8usize) | U256::from(bit))
            .ok_or(TreasuryError::NoAvailableNonce { owner, word })
    }
}

//! In-memory active chain.
//!
//! Useful for unit tests and for the gateway, which is fed block hashes
//! over HTTP. Heights are dense: the block at height `h` is stored at
//! index `h`.

use crate::types::BlockHash;

use super::ActiveChain;

/// In-memory implementation of [`ActiveChain`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryActiveChain {
    hashes: Vec<BlockHash>,
}

impl InMemoryActiveChain {
    /// Creates a new, empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chain from block hashes ordered by height, genesis first.
    pub fn from_hashes(hashes: Vec<BlockHash>) -> Self {
        Self { hashes }
    }

    /// Appends a block on top of the tip and returns its height.
    pub fn push(&mut self, hash: BlockHash) -> u64 {
        self.hashes.push(hash);
        (self.hashes.len() - 1) as u64
    }

    /// Disconnects blocks above `height`, as a reorganization would.
    pub fn truncate_above(&mut self, height: u64) {
        let keep = usize::try_from(height)
            .ok()
            .and_then(|h| h.checked_add(1))
            .unwrap_or(usize::MAX);
        self.hashes.truncate(keep);
    }

    /// Returns the number of blocks on the chain.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Returns `true` if no blocks are stored.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl ActiveChain for InMemoryActiveChain {
    fn height(&self) -> Option<u64> {
        self.hashes.len().checked_sub(1).map(|h| h as u64)
    }

    fn block_hash_at(&self, height: u64) -> Option<BlockHash> {
        let idx = usize::try_from(height).ok()?;
        self.hashes.get(idx).copied()
    }
}

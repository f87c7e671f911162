//! Read-only view of the mainchain's active chain.
//!
//! Proof verification only ever needs one thing from the chain: the hash
//! of the block at a given height. The interface is intentionally that
//! small so node implementations can back it with whatever block index
//! they maintain.

pub mod mem;

pub use mem::InMemoryActiveChain;

use crate::types::BlockHash;

/// Height-indexed access to the active chain.
pub trait ActiveChain {
    /// Height of the current tip, if the chain is non-empty.
    fn height(&self) -> Option<u64>;

    /// Hash of the block at `height`, if that height is on the active chain.
    fn block_hash_at(&self, height: u64) -> Option<BlockHash>;
}

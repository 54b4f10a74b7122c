//! Reentrancy guard for state-mutating pool operations.

use anchor_lang::prelude::*;

use crate::errors::PoolError;

/// Set for the duration of one mutating call. Always clear at rest.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReentrancyGuard {
    entered: bool,
}

impl ReentrancyGuard {
    pub fn enter(&mut self) -> Result<()> {
        require!(!self.entered, PoolError::ReentrantCall);
        self.entered = true;
        Ok(())
    }

    pub fn exit(&mut self) {
        self.entered = false;
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

// SPDX-License-Identifier: MIT
//! Scope tags controlling instance sharing and materialization timing.

/// Lifetime and sharing policy of a produced instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// At most one successful construction; memoized after the first.
    Shared,
    /// Constructed fresh on every resolve call; never memoized.
    PerCall,
    /// Like `Shared`, but materialized during bring-up rather than lazily.
    EagerShared,
}

impl Scope {
    /// Whether instances of this scope are memoized after first construction.
    pub fn is_memoized(self) -> bool {
        matches!(self, Scope::Shared | Scope::EagerShared)
    }

    /// Whether the orchestrator must resolve this descriptor during bring-up,
    /// ahead of any caller demanding it lazily.
    pub fn is_eager(self) -> bool {
        matches!(self, Scope::EagerShared)
    }
}

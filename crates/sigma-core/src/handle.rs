//! Typed indices into an [`ExprArena`](crate::ExprArena).
//!
//! Expressions, symbols and registered functions are all addressed by 32-bit
//! indices. The newtypes keep them from being mixed up. Expression handles
//! also carry the id of their arena.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifier of an [`ExprArena`](crate::ExprArena), unique within the
/// process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u32);

impl ArenaId {
    /// Allocates an id no other arena has.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A handle to an expression node.
///
/// Handles are cheap to copy. Because the arena hash-conses its nodes, two
/// handles from the same arena are equal exactly when the expressions they
/// point to are structurally identical. A handle remembers its arena, so
/// another arena never mistakes it for one of its own.
///
/// Handles are ordered by creation; simplification uses this order to put
/// sums and products into a canonical form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprHandle {
    arena: ArenaId,
    index: u32,
}

impl ExprHandle {
    pub(crate) const fn new(arena: ArenaId, index: u32) -> Self {
        Self { arena, index }
    }

    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the arena the handle was created in.
    #[must_use]
    pub const fn arena(self) -> ArenaId {
        self.arena
    }
}

impl fmt::Debug for ExprHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self.index)
    }
}

impl fmt::Display for ExprHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Identifier of an interned variable name.
///
/// Symbol ids are handed out in interning order and never reused, so they
/// double as a stable ordering for measurement tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Creates a symbol id from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Identifier of a unary function in the arena's function registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(u32);

impl FunctionId {
    /// Creates a function id from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

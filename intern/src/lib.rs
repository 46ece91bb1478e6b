//! A generic value interner.
//!
//! Interned values are deduplicated in an insertion-ordered pool and handed
//! back as small copyable [`Symbol`](struct.Symbol.html) handles. Two symbols
//! obtained from the same interner compare equal iff the values they intern
//! compare equal, which makes symbol comparison a cheap substitute for value
//! comparison.

#![warn(rust_2018_idioms)]

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Index;

use indexmap::IndexSet;
use rustc_hash::FxHasher;

type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// A handle to a value interned in an [`Interner`](struct.Interner.html).
pub struct Symbol<T: ?Sized> {
    idx: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized> Symbol<T> {
    fn new(idx: usize) -> Self {
        Self {
            idx: idx as u32,
            marker: PhantomData,
        }
    }
}

// The traits below are implemented by hand: deriving them would constrain `T` itself, and symbols
// are plain indices no matter what they point to.

impl<T: ?Sized> Clone for Symbol<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Symbol<T> {}

impl<T: ?Sized> PartialEq for Symbol<T> {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}

impl<T: ?Sized> Eq for Symbol<T> {}

impl<T: ?Sized> Hash for Symbol<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.idx.hash(state)
    }
}

impl<T: ?Sized> fmt::Debug for Symbol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.idx)
    }
}

/// An insertion-ordered pool of deduplicated values.
pub struct Interner<T: ToOwned + ?Sized> {
    pool: FxIndexSet<T::Owned>,
}

impl<T: ToOwned + ?Sized> Interner<T>
where
    T: Hash + Eq,
    T::Owned: Hash + Eq,
{
    pub fn new() -> Self {
        Self {
            pool: FxIndexSet::default(),
        }
    }

    /// Interns `val`, returning its symbol.
    ///
    /// If an equal value has already been interned, the existing symbol is
    /// returned and no new storage is allocated.
    pub fn intern(&mut self, val: &T) -> Symbol<T> {
        let idx = match self.pool.get_full(val) {
            Some((idx, _)) => idx,
            None => self.pool.insert_full(val.to_owned()).0,
        };

        Symbol::new(idx)
    }

    /// Resolves a symbol back to the interned value.
    ///
    /// Returns `None` if `sym` did not originate from this interner.
    pub fn resolve(&self, sym: Symbol<T>) -> Option<&T> {
        self.pool.get_index(sym.idx as usize).map(|val| val.borrow())
    }
}

impl<T: ToOwned + ?Sized> Default for Interner<T>
where
    T: Hash + Eq,
    T::Owned: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ToOwned + ?Sized> Index<Symbol<T>> for Interner<T>
where
    T: Hash + Eq,
    T::Owned: Hash + Eq,
{
    type Output = T;

    fn index(&self, sym: Symbol<T>) -> &T {
        self.resolve(sym).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup() {
        let mut interner: Interner<[u8]> = Interner::new();

        let a = interner.intern(b"atom");
        let b = interner.intern(b"other");
        let c = interner.intern(b"atom");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(&interner[a], b"atom");
        assert_eq!(&interner[b], b"other");
    }

    #[test]
    fn non_utf8_bytes() {
        let mut interner: Interner<[u8]> = Interner::new();

        let sym = interner.intern(&[0xff, 0x00, 0x41][..]);
        assert_eq!(&interner[sym], &[0xff, 0x00, 0x41]);
    }
}

//! Typed indices into fixed configuration tables
//!
//! An [`Idx<T>`] can only be obtained from [`Table<T>::index`], which checks
//! the raw value against the table size once. Lookups with it need no further
//! bounds checks at the call sites.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops;

use crate::error::{ComError, ComResult};

/// Validated index into a `Table<T>`
pub struct Idx<T> {
    raw: u16,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    fn new(raw: u16) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn raw(self) -> u16 {
        self.raw
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.raw)
    }
}

impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Idx<T> {}

impl<T> Hash for Idx<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({})", self.raw)
    }
}

/// Immutable, build-time sized table
#[derive(Debug, Clone)]
pub struct Table<T> {
    items: Box<[T]>,
}

impl<T> Table<T> {
    /// Build a table; `kind` names it in the error when it exceeds the
    /// 16-bit handle space.
    pub fn from_vec(kind: &'static str, items: Vec<T>) -> ComResult<Self> {
        if items.len() > usize::from(u16::MAX) {
            return Err(ComError::TableTooLarge {
                table: kind,
                len: items.len(),
            });
        }
        Ok(Self {
            items: items.into_boxed_slice(),
        })
    }

    /// Checked conversion of a raw handle
    pub fn index(&self, raw: u16) -> Option<Idx<T>> {
        (usize::from(raw) < self.items.len()).then(|| Idx::new(raw))
    }

    pub fn get(&self, idx: Idx<T>) -> &T {
        &self.items[idx.as_usize()]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of entries as a handle limit
    pub fn limit(&self) -> u16 {
        // from_vec keeps len within u16
        self.items.len() as u16
    }

    pub fn iter(&self) -> impl Iterator<Item = (Idx<T>, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (Idx::new(i as u16), item))
    }

    pub fn indices(&self) -> impl Iterator<Item = Idx<T>> + '_ {
        (0..self.limit()).map(Idx::new)
    }

    /// First entry matching `pred`
    pub fn position(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Idx<T>> {
        self.items
            .iter()
            .position(|item| pred(item))
            .map(|i| Idx::new(i as u16))
    }
}

impl<T> ops::Index<Idx<T>> for Table<T> {
    type Output = T;

    fn index(&self, idx: Idx<T>) -> &T {
        self.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_index() {
        let table = Table::from_vec("names", vec!["a", "b", "c"]).unwrap();
        let idx = table.index(2).unwrap();
        assert_eq!(table[idx], "c");
        assert_eq!(idx.raw(), 2);
        assert!(table.index(3).is_none());
        assert_eq!(table.limit(), 3);
    }

    #[test]
    fn test_iter_and_position() {
        let table = Table::from_vec("names", vec!["a", "b"]).unwrap();
        let collected: Vec<(u16, &str)> = table.iter().map(|(i, v)| (i.raw(), *v)).collect();
        assert_eq!(collected, vec![(0, "a"), (1, "b")]);
        assert_eq!(table.position(|v| *v == "b").map(Idx::raw), Some(1));
        assert_eq!(table.indices().count(), 2);
    }

    #[test]
    fn test_table_too_large() {
        let err = Table::from_vec("big", vec![0u8; 70_000]).unwrap_err();
        assert!(matches!(err, ComError::TableTooLarge { table: "big", .. }));
    }
}

//! Header table entries and the size accounting HPACK applies to them.

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

/// Per-entry overhead mandated by RFC 7541 §4.1. It approximates the memory
/// an implementation spends on bookkeeping for each stored field.
pub const ENTRY_OVERHEAD: usize = 32;

/// Returns the size of a (name, value) pair, as HPACK counts it against the
/// dynamic table's capacity.
#[inline]
pub fn entry_size(name: &[u8], value: &[u8]) -> usize {
    name.len() + value.len() + ENTRY_OVERHEAD
}

/// A header field owned by the dynamic table.
///
/// Entries never change once created: they're pushed when a field is
/// indexed and dropped when they're evicted.
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
    name: Vec<u8>,
    value: Vec<u8>,
}

impl Entry {
    pub fn new(name: Vec<u8>, value: Vec<u8>) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// `len(name) + len(value) + ENTRY_OVERHEAD`
    pub fn size(&self) -> usize {
        entry_size(&self.name, &self.value)
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("name", &String::from_utf8_lossy(&self.name))
            .field("value", &String::from_utf8_lossy(&self.value))
            .finish()
    }
}

/// A (name, value) key that can be looked up in a map without allocating.
///
/// Both the static table (keyed by borrowed slices) and the dynamic table
/// (keyed by owned vectors) borrow their keys as `dyn FieldKey`, so a lookup
/// with a pair of `&[u8]` never has to build an owned key.
pub(crate) trait FieldKey {
    fn key(&self) -> (&[u8], &[u8]);
}

impl FieldKey for (Vec<u8>, Vec<u8>) {
    fn key(&self) -> (&[u8], &[u8]) {
        (&self.0, &self.1)
    }
}

impl FieldKey for (&[u8], &[u8]) {
    fn key(&self) -> (&[u8], &[u8]) {
        (self.0, self.1)
    }
}

// Must hash exactly like the tuples do: each component as a `[u8]`, in order.
impl Hash for dyn FieldKey + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (name, value) = self.key();
        name.hash(state);
        value.hash(state);
    }
}

impl PartialEq for dyn FieldKey + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for dyn FieldKey + '_ {}

impl<'a> Borrow<dyn FieldKey + 'a> for (Vec<u8>, Vec<u8>) {
    fn borrow(&self) -> &(dyn FieldKey + 'a) {
        self
    }
}

impl<'a, 'b: 'a> Borrow<dyn FieldKey + 'a> for (&'b [u8], &'b [u8]) {
    fn borrow(&self) -> &(dyn FieldKey + 'a) {
        self
    }
}

//! The HPACK header table: the indexed store of header fields that HTTP/2
//! encoders and decoders keep in sync, so that a field seen before can be
//! sent as a small integer instead of a literal.
//!
//! The table has two tiers sharing one index space (RFC 7541 §2.3.3):
//!
//! - the static table, positions `1..=61`, identical everywhere and shared
//!   by every [HeaderTable] in the process;
//! - the dynamic table, positions `62..`, starting with the most recently
//!   inserted entry.
//!
//! # Example
//!
//! ```rust
//! use hpack_table::HeaderTable;
//! let mut table = HeaderTable::new();
//!
//! // static entries are found first
//! assert_eq!(table.get_by_name_and_value(b":method", b"GET"), Some(2));
//!
//! table.try_add_entry(b"x-request-id".to_vec(), b"1234".to_vec());
//! assert_eq!(table.get_by_name_and_value(b"x-request-id", b"1234"), Some(62));
//! assert_eq!(
//!     table.get_from_table(62).unwrap(),
//!     (&b"x-request-id"[..], &b"1234"[..])
//! );
//! ```
//!
//! The crate does no encoding: integer and Huffman coding, and header block
//! parsing, are the codec's business.

use tracing::debug;

mod dynamic_table;
mod entry;
mod error;
mod static_table;

pub use dynamic_table::DynamicTable;
pub use entry::{entry_size, Entry, ENTRY_OVERHEAD};
pub use error::TableError;
pub use static_table::{static_table, StaticTable, STATIC_TABLE};

/// The initial value of `SETTINGS_HEADER_TABLE_SIZE` in HTTP/2.
pub const DEFAULT_HEADER_TABLE_SIZE: usize = 4096;

/// The header table of one side of one connection.
///
/// Combines the (shared, read-only) static table with a dynamic table that
/// this instance owns. The table is not synchronized: the codec that owns it
/// is expected to make all calls from one place.
pub struct HeaderTable<'a> {
    static_table: &'a StaticTable<'a>,
    dynamic_table: DynamicTable,
}

impl Default for HeaderTable<'_> {
    fn default() -> HeaderTable<'static> {
        HeaderTable::with_settings_bound(DEFAULT_HEADER_TABLE_SIZE)
    }
}

impl HeaderTable<'static> {
    /// Creates a table over the process-wide static table, with a capacity
    /// of [DEFAULT_HEADER_TABLE_SIZE].
    pub fn new() -> HeaderTable<'static> {
        Default::default()
    }

    /// Creates a table over the process-wide static table, with both the
    /// settings bound and the capacity set to `settings_bound`.
    pub fn with_settings_bound(settings_bound: usize) -> HeaderTable<'static> {
        HeaderTable::with_static_table(static_table(), settings_bound)
    }
}

impl<'a> HeaderTable<'a> {
    /// Creates a table with the given static tier.
    ///
    /// Note: peers only agree on indices if `static_table` is built over the
    ///       list defined in RFC 7541, Appendix A.
    pub fn with_static_table(static_table: &'a StaticTable<'a>, settings_bound: usize) -> Self {
        HeaderTable {
            static_table,
            dynamic_table: DynamicTable::new(settings_bound),
        }
    }

    /// Returns the index of a header whose name is `name`: the lowest static
    /// one if any, otherwise the most recently inserted dynamic one.
    pub fn get_by_name(&self, name: &[u8]) -> Option<usize> {
        self.static_table.lookup_by_name(name).or_else(|| {
            self.dynamic_table
                .lookup_by_name(name)
                .map(|id| self.to_index(id))
        })
    }

    /// Returns the index of a header matching both `name` and `value`,
    /// preferring the static table.
    pub fn get_by_name_and_value(&self, name: &[u8], value: &[u8]) -> Option<usize> {
        self.static_table
            .lookup_by_name_value(name, value)
            .or_else(|| {
                self.dynamic_table
                    .lookup_by_name_value(name, value)
                    .map(|id| self.to_index(id))
            })
    }

    fn to_index(&self, insertion_id: u64) -> usize {
        self.dynamic_table.relative_index(insertion_id) + self.static_table.len()
    }

    /// Gets the header (name, value) pair with the given index from the table.
    ///
    /// In this context, the "table" references the definition of the table
    /// where the static table is concatenated with the dynamic table and is
    /// 1-indexed.
    pub fn get_from_table(&self, index: usize) -> Result<(&[u8], &[u8]), TableError> {
        if let Some(field) = self.static_table.get(index) {
            return Ok(field);
        }
        if index == 0 {
            return Err(TableError::IndexOutOfBounds(index));
        }

        self.dynamic_table
            .get(index - self.static_table.len() - 1)
            .map(|entry| (entry.name(), entry.value()))
            .ok_or(TableError::IndexOutOfBounds(index))
    }

    /// Adds a header to the dynamic table, evicting old ones to make room.
    ///
    /// Returns `None` if the header is larger than the table's maximum size,
    /// in which case the dynamic table is left empty (RFC 7541 §4.4). This
    /// is not an error: the field simply can't be indexed.
    pub fn try_add_entry(&mut self, name: Vec<u8>, value: Vec<u8>) -> Option<&Entry> {
        self.dynamic_table.try_add(name, value)
    }

    /// Removes the `count` oldest dynamic entries.
    ///
    /// # Panics
    ///
    /// If there are fewer than `count` dynamic entries.
    pub fn evict(&mut self, count: usize) {
        self.dynamic_table.evict(count)
    }

    /// Returns how many of the oldest dynamic entries must be evicted to free
    /// `reclaim_size` octets.
    pub fn eviction_count_to_reclaim(&self, reclaim_size: usize) -> usize {
        self.dynamic_table.eviction_count_to_reclaim(reclaim_size)
    }

    /// Returns how many dynamic entries adding (`name`, `value`) would evict.
    pub fn eviction_count_for_entry(&self, name: &[u8], value: &[u8]) -> usize {
        self.dynamic_table.eviction_count_for_entry(name, value)
    }

    /// Returns the entries, oldest first, that adding (`name`, `value`)
    /// would evict.
    pub fn eviction_set(&self, name: &[u8], value: &[u8]) -> impl Iterator<Item = &Entry> + '_ {
        let count = self.eviction_count_for_entry(name, value);
        self.dynamic_table.iter().rev().take(count)
    }

    /// Sets the capacity of the dynamic table, evicting entries as needed.
    ///
    /// # Panics
    ///
    /// If `new_max_size` is above the settings bound. Use
    /// [HeaderTable::try_set_max_size] for sizes that come from the peer.
    pub fn set_max_size(&mut self, new_max_size: usize) {
        self.dynamic_table.set_max_size(new_max_size)
    }

    /// Like [HeaderTable::set_max_size], but reports a size above the
    /// settings bound as an error instead of panicking. That's the case of a
    /// dynamic table size update received from a peer.
    pub fn try_set_max_size(&mut self, new_max_size: usize) -> Result<(), TableError> {
        let bound = self.dynamic_table.settings_bound();
        if new_max_size > bound {
            return Err(TableError::MaxSizeExceedsBound {
                requested: new_max_size,
                bound,
            });
        }
        self.dynamic_table.set_max_size(new_max_size);
        Ok(())
    }

    /// Records an acknowledged `SETTINGS_HEADER_TABLE_SIZE` and moves the
    /// dynamic table's capacity to it, in either direction.
    ///
    /// The bound and the capacity stay two separate knobs: a connection can
    /// later shrink its working table with [HeaderTable::set_max_size]
    /// while still advertising the larger bound.
    pub fn set_settings_bound(&mut self, settings_bound: usize) {
        self.dynamic_table.set_settings_bound(settings_bound)
    }

    /// Current size of the dynamic table in octets.
    pub fn size(&self) -> usize {
        self.dynamic_table.size()
    }

    pub fn max_size(&self) -> usize {
        self.dynamic_table.max_size()
    }

    pub fn settings_bound(&self) -> usize {
        self.dynamic_table.settings_bound()
    }

    /// Number of live dynamic entries.
    pub fn len(&self) -> usize {
        self.dynamic_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dynamic_table.is_empty()
    }

    pub fn insertions_count(&self) -> u64 {
        self.dynamic_table.insertions_count()
    }

    pub fn static_entries(&self) -> &'a StaticTable<'a> {
        self.static_table
    }

    pub fn dynamic_entries(&self) -> &DynamicTable {
        &self.dynamic_table
    }

    /// Dumps the dynamic table, with the index of each entry, at debug
    /// level.
    pub fn debug_log_table_state(&self) {
        debug!(
            "Header table: {} entries, size {}/{} (settings bound {}), {} insertions",
            self.len(),
            self.size(),
            self.max_size(),
            self.settings_bound(),
            self.insertions_count()
        );
        for (i, entry) in self.dynamic_table.iter().enumerate() {
            debug!(
                "  [{}] {:?}: {:?} ({} octets)",
                i + 1 + self.static_table.len(),
                String::from_utf8_lossy(entry.name()),
                String::from_utf8_lossy(entry.value()),
                entry.size()
            );
        }
    }
}

impl std::fmt::Debug for HeaderTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderTable")
            .field("static_table", &self.static_table)
            .field("dynamic_table", &self.dynamic_table)
            .finish()
    }
}

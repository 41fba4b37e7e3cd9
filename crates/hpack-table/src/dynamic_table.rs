//! The dynamic tier of the header table.
//!
//! Entries live in a [VecDeque], newest at the front and oldest at the back,
//! so that insertion and eviction are both O(1). Each insertion gets an id
//! from an ever-increasing counter; the two lookup maps store these ids
//! rather than positions, which is what lets them survive pushes and pops
//! without being rewritten.
//!
//! The id of an entry is never stored alongside it: the oldest live entry's
//! id is always `insertions_count - entries.len()`, and ids grow by one
//! towards the front.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::entry::{entry_size, Entry, FieldKey};

/// A struct representing the dynamic table that needs to be maintained by the
/// coder.
///
/// The dynamic table contains a number of recently used headers. The size of
/// the table is constrained to a certain number of octets. If on insertion of
/// a new header into the table, the table would exceed the maximum size,
/// headers are evicted in a FIFO fashion until there is enough room for the
/// new header to be inserted. (Therefore, it is possible that though all
/// elements end up being evicted, there is still not enough space for the new
/// header: when the size of this individual header exceeds the maximum size of
/// the table.)
///
/// Two sizes bound the table: `settings_bound`, the last
/// `SETTINGS_HEADER_TABLE_SIZE` acknowledged for this side of the connection,
/// and `max_size`, the capacity actually in use, which HPACK lets the encoder
/// move anywhere at or below the bound.
pub struct DynamicTable {
    entries: VecDeque<Entry>,
    insertions_count: u64,
    size: usize,
    max_size: usize,
    settings_bound: usize,

    // insertion id of the newest live entry for each key
    by_name_value: HashMap<(Vec<u8>, Vec<u8>), u64>,
    by_name: HashMap<Vec<u8>, u64>,
}

impl DynamicTable {
    /// Creates an empty table whose capacity starts at `settings_bound`.
    pub fn new(settings_bound: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            insertions_count: 0,
            size: 0,
            max_size: settings_bound,
            settings_bound,
            by_name_value: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Returns the current size of the table in octets, as defined by RFC 7541
    /// (§4.1).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the maximum size of the table in octets.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn settings_bound(&self) -> usize {
        self.settings_bound
    }

    /// Returns the number of headers in the dynamic table.
    ///
    /// This is different than the size of the dynamic table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries ever added, evicted ones included.
    pub fn insertions_count(&self) -> u64 {
        self.insertions_count
    }

    /// Returns the entry at `relative` (0 is the most recently inserted one).
    pub fn get(&self, relative: usize) -> Option<&Entry> {
        self.entries.get(relative)
    }

    /// Iterates over live entries, newest first.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Insertion id of the newest live entry named `name`.
    pub fn lookup_by_name(&self, name: &[u8]) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    /// Insertion id of the newest live entry matching `name` and `value`.
    pub fn lookup_by_name_value(&self, name: &[u8], value: &[u8]) -> Option<u64> {
        self.by_name_value
            .get(&(name, value) as &dyn FieldKey)
            .copied()
    }

    /// Translates an insertion id into a 1-based position from the newest
    /// entry. The position of a given entry grows with every later insertion.
    pub fn relative_index(&self, insertion_id: u64) -> usize {
        debug_assert!(insertion_id >= self.oldest_insertion_id());
        debug_assert!(insertion_id < self.insertions_count);
        (self.insertions_count - insertion_id) as usize
    }

    fn oldest_insertion_id(&self) -> u64 {
        self.insertions_count - self.entries.len() as u64
    }

    /// Returns how many of the oldest entries must go to free up
    /// `reclaim_size` octets, or all of them if even that isn't enough.
    ///
    /// Only the entries that would be evicted are visited.
    pub fn eviction_count_to_reclaim(&self, mut reclaim_size: usize) -> usize {
        let mut count = 0;
        for entry in self.entries.iter().rev() {
            if reclaim_size == 0 {
                break;
            }
            reclaim_size -= reclaim_size.min(entry.size());
            count += 1;
        }
        count
    }

    /// Returns how many entries inserting (`name`, `value`) would evict.
    pub fn eviction_count_for_entry(&self, name: &[u8], value: &[u8]) -> usize {
        let available = self.max_size - self.size;
        let needed = entry_size(name, value);
        if needed <= available {
            0
        } else {
            self.eviction_count_to_reclaim(needed - available)
        }
    }

    /// Removes the `count` oldest entries.
    ///
    /// # Panics
    ///
    /// If `count` is greater than the number of live entries: the caller's
    /// bookkeeping no longer matches the table.
    pub fn evict(&mut self, count: usize) {
        assert!(
            count <= self.entries.len(),
            "evict count ({}) > live entries ({})",
            count,
            self.entries.len()
        );

        for _ in 0..count {
            let insertion_id = self.oldest_insertion_id();
            let Some(entry) = self.entries.pop_back() else {
                break;
            };
            self.size -= entry.size();

            // a newer duplicate may own the mapping by now, leave it alone
            let key = (entry.name(), entry.value());
            if self.by_name_value.get(&key as &dyn FieldKey) == Some(&insertion_id) {
                self.by_name_value.remove(&key as &dyn FieldKey);
            }
            if self.by_name.get(entry.name()) == Some(&insertion_id) {
                self.by_name.remove(entry.name());
            }

            trace!(
                "Evicted entry #{insertion_id} ({} octets), table size now {}",
                entry.size(),
                self.size
            );
        }
    }

    /// Adds a new header to the front of the table, evicting as many old
    /// ones as it takes to make room.
    ///
    /// Returns `None` when the header is bigger than the table's maximum
    /// size: per HPACK, the table is then left empty and nothing is added.
    pub fn try_add(&mut self, name: Vec<u8>, value: Vec<u8>) -> Option<&Entry> {
        self.evict(self.eviction_count_for_entry(&name, &value));

        let size = entry_size(&name, &value);
        if size > self.max_size - self.size {
            debug_assert!(self.entries.is_empty());
            trace!(
                "Header of {size} octets does not fit a table of {} octets",
                self.max_size
            );
            return None;
        }

        let insertion_id = self.insertions_count;
        self.insertions_count += 1;
        self.size += size;

        match self.by_name_value.get_mut(&(&name[..], &value[..]) as &dyn FieldKey) {
            Some(id) => {
                debug_assert!(*id < insertion_id);
                *id = insertion_id;
            }
            None => {
                self.by_name_value
                    .insert((name.clone(), value.clone()), insertion_id);
            }
        }
        match self.by_name.get_mut(&name[..]) {
            Some(id) => {
                debug_assert!(*id < insertion_id);
                *id = insertion_id;
            }
            None => {
                self.by_name.insert(name.clone(), insertion_id);
            }
        }

        trace!(
            "Added entry #{insertion_id} ({size} octets), table size now {}",
            self.size
        );
        self.entries.push_front(Entry::new(name, value));
        self.entries.front()
    }

    /// Sets the new maximum table size.
    ///
    /// If the current size of the table is larger than the new maximum size,
    /// existing headers are evicted in a FIFO fashion until the size drops
    /// below the new maximum.
    ///
    /// # Panics
    ///
    /// If `new_max_size` is greater than the settings bound.
    pub fn set_max_size(&mut self, new_max_size: usize) {
        assert!(
            new_max_size <= self.settings_bound,
            "new_max_size ({}) > settings_bound ({})",
            new_max_size,
            self.settings_bound
        );

        if new_max_size < self.size {
            self.evict(self.eviction_count_to_reclaim(self.size - new_max_size));
        }

        debug!(
            "Dynamic table max size changed from {} to {}",
            self.max_size, new_max_size
        );
        self.max_size = new_max_size;
    }

    /// Records a newly acknowledged `SETTINGS_HEADER_TABLE_SIZE`, and moves
    /// the table's capacity to it.
    pub fn set_settings_bound(&mut self, settings_bound: usize) {
        self.settings_bound = settings_bound;
        self.set_max_size(settings_bound);
    }

    /// Checks every structural invariant, panicking on the first broken one.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let sum: usize = self.entries.iter().map(Entry::size).sum();
        assert_eq!(self.size, sum, "size out of sync with entries");
        assert!(self.size <= self.max_size, "size above max_size");
        assert!(
            self.max_size <= self.settings_bound,
            "max_size above settings_bound"
        );

        // newest live id per key, recomputed from scratch
        let oldest = self.oldest_insertion_id();
        let mut by_name_value = HashMap::new();
        let mut by_name = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate().rev() {
            let id = oldest + (self.entries.len() - 1 - i) as u64;
            by_name_value.insert((entry.name().to_vec(), entry.value().to_vec()), id);
            by_name.insert(entry.name().to_vec(), id);
        }
        assert_eq!(self.by_name_value, by_name_value, "stale name+value index");
        assert_eq!(self.by_name, by_name, "stale name index");
    }
}

impl std::fmt::Debug for DynamicTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicTable")
            .field("size", &self.size)
            .field("max_size", &self.max_size)
            .field("settings_bound", &self.settings_bound)
            .field("insertions_count", &self.insertions_count)
            .field("entries", &self.entries)
            .finish()
    }
}

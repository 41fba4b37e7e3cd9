//! The static tier of the header table: a fixed list of header fields that
//! both peers know in advance (HPACK, Appendix A).

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::entry::FieldKey;

/// The static header table defined by RFC 7541, Appendix A.
pub static STATIC_TABLE: &[(&[u8], &[u8])] = &[
    (b":authority", b""),
    (b":method", b"GET"),
    (b":method", b"POST"),
    (b":path", b"/"),
    (b":path", b"/index.html"),
    (b":scheme", b"http"),
    (b":scheme", b"https"),
    (b":status", b"200"),
    (b":status", b"204"),
    (b":status", b"206"),
    (b":status", b"304"),
    (b":status", b"400"),
    (b":status", b"404"),
    (b":status", b"500"),
    (b"accept-charset", b""),
    (b"accept-encoding", b"gzip, deflate"),
    (b"accept-language", b""),
    (b"accept-ranges", b""),
    (b"accept", b""),
    (b"access-control-allow-origin", b""),
    (b"age", b""),
    (b"allow", b""),
    (b"authorization", b""),
    (b"cache-control", b""),
    (b"content-disposition", b""),
    (b"content-encoding", b""),
    (b"content-language", b""),
    (b"content-length", b""),
    (b"content-location", b""),
    (b"content-range", b""),
    (b"content-type", b""),
    (b"cookie", b""),
    (b"date", b""),
    (b"etag", b""),
    (b"expect", b""),
    (b"expires", b""),
    (b"from", b""),
    (b"host", b""),
    (b"if-match", b""),
    (b"if-modified-since", b""),
    (b"if-none-match", b""),
    (b"if-range", b""),
    (b"if-unmodified-since", b""),
    (b"last-modified", b""),
    (b"link", b""),
    (b"location", b""),
    (b"max-forwards", b""),
    (b"proxy-authenticate", b""),
    (b"proxy-authorization", b""),
    (b"range", b""),
    (b"referer", b""),
    (b"refresh", b""),
    (b"retry-after", b""),
    (b"server", b""),
    (b"set-cookie", b""),
    (b"strict-transport-security", b""),
    (b"transfer-encoding", b""),
    (b"user-agent", b""),
    (b"vary", b""),
    (b"via", b""),
    (b"www-authenticate", b""),
];

/// An immutable list of header fields plus the two maps used to find them.
///
/// Positions are 1-based, as they are on the wire.
pub struct StaticTable<'a> {
    entries: &'a [(&'a [u8], &'a [u8])],
    by_name_value: HashMap<(&'a [u8], &'a [u8]), usize>,
    by_name: HashMap<&'a [u8], usize>,
}

impl<'a> StaticTable<'a> {
    /// Builds the lookup maps over `entries`.
    ///
    /// Note: for encoded header blocks to be understood by a peer, `entries`
    ///       must be the list defined in RFC 7541, i.e.
    ///       [STATIC_TABLE].
    pub fn new(entries: &'a [(&'a [u8], &'a [u8])]) -> Self {
        let mut by_name_value = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());

        for (i, &(name, value)) in entries.iter().enumerate() {
            let position = i + 1;
            by_name_value.entry((name, value)).or_insert(position);
            // several entries share a name (`:method`, `:status`...): the
            // first one wins
            by_name.entry(name).or_insert(position);
        }

        Self {
            entries,
            by_name_value,
            by_name,
        }
    }

    /// Returns the position of the entry matching both `name` and `value`.
    pub fn lookup_by_name_value(&self, name: &[u8], value: &[u8]) -> Option<usize> {
        self.by_name_value
            .get(&(name, value) as &dyn FieldKey)
            .copied()
    }

    /// Returns the lowest position whose name is `name`.
    pub fn lookup_by_name(&self, name: &[u8]) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns the entry at 1-based `position`.
    pub fn get(&self, position: usize) -> Option<(&'a [u8], &'a [u8])> {
        position
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + '_ {
        self.entries.iter().copied()
    }
}

impl std::fmt::Debug for StaticTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTable")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Returns the process-wide static table, built over [STATIC_TABLE] the
/// first time it's asked for.
pub fn static_table() -> &'static StaticTable<'static> {
    static TABLE: OnceLock<StaticTable<'static>> = OnceLock::new();
    TABLE.get_or_init(|| StaticTable::new(STATIC_TABLE))
}

/// Represents the recoverable errors a header table can report.
///
/// Contract violations (evicting more entries than are live, raising the
/// capacity above the settings bound through [crate::HeaderTable::set_max_size])
/// are not errors: they panic.
#[derive(PartialEq, Copy, Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TableError {
    /// The index is 0, or points past the last entry of the dynamic table.
    #[error("Header index {0} out of bounds")]
    IndexOutOfBounds(usize),
    /// The dynamic table's size can never be allowed to exceed the bound
    /// acknowledged through `SETTINGS_HEADER_TABLE_SIZE`.
    #[error("Dynamic table size {requested} exceeds the settings bound {bound}")]
    MaxSizeExceedsBound { requested: usize, bound: usize },
}

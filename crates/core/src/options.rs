/// Window and size limits for the depth-bounded subtree queries.
///
/// Zero means "unset" for every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuerySubtreeOptions {
    /// Inclusive upper bound on `update_at`.
    pub before_update_at: i64,
    /// Inclusive lower bound on `update_at`.
    pub after_update_at: i64,
    pub limit: u64,
}

/// Window, size and order for a single block's history.
///
/// Zero means "unset" for the numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryBlockHistoryOptions {
    /// Exclusive upper bound on `update_at`.
    pub before_update_at: i64,
    /// Exclusive lower bound on `update_at`.
    pub after_update_at: i64,
    pub limit: u64,
    pub descending: bool,
}

impl QueryBlockHistoryOptions {
    /// The most recent history entry only.
    pub fn latest() -> Self {
        Self {
            limit: 1,
            descending: true,
            ..Default::default()
        }
    }
}

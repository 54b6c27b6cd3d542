use crate::dialect::DbType;

/// Settings fixed for the lifetime of an opened store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreConfig {
    pub db_type: DbType,
    /// Prepended to every table name (`focal_` gives `focal_blocks`).
    pub table_prefix: String,
}

impl StoreConfig {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: prefix.into(),
            ..Default::default()
        }
    }
}

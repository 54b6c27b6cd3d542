use boards_core::{BlockId, CoreError};
use boards_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("no history to undelete: {0}")]
    NothingToUndelete(BlockId),

    #[error("block is not deleted: {0}")]
    BlockStillLive(BlockId),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_not_found(),
            Self::NothingToUndelete(_) => true,
            _ => false,
        }
    }
}

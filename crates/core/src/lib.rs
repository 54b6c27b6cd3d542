pub mod block;
pub mod board;
pub mod clock;
pub mod error;
pub mod ids;
pub mod options;

pub use block::{Block, BlockPatch, BlockPatchBatch, Fields};
pub use board::{Board, BoardType};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;
pub use ids::*;
pub use options::{QueryBlockHistoryOptions, QuerySubtreeOptions};

pub mod fixture;

pub use fixture::{TestBoard, block};

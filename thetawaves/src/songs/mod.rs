//! Per-user song list, kept in the store rather than in process memory.

pub mod errors;
pub mod manager;

pub use errors::{SongError, SongResult};
pub use manager::{MAX_TITLE_LEN, SongManager};

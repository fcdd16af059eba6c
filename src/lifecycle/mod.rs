//! Process lifecycle: shutdown fan-out to background tasks.

pub mod shutdown;

pub use shutdown::Shutdown;

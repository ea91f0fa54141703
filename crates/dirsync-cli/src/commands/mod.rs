//! Command implementations for dirsync-cli

pub mod reset;
pub mod status;
pub mod sync;

pub use reset::run_reset;
pub use status::run_status;
pub use sync::run_sync;

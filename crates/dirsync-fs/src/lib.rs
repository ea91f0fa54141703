//! Filesystem primitives for dirsync
//!
//! Provides path rendering for logs, atomic state writes, and the
//! copy/delete/timestamp operations the mirroring engine is built on.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;
pub mod times;

pub use config::{ConfigFormat, ConfigStore};
pub use constants::DefaultPath;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::NormalizedPath;
pub use times::{EntryTimes, copy_times};

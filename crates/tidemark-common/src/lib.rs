pub mod error;

pub use error::{Error, Result};

/// Migration version. By convention a `YYYYMMDDHHMMSS` timestamp, but any
/// non-negative integer orders correctly. `0` means "nothing applied".
pub type Version = i64;

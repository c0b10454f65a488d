//! Common utilities and types shared across the scenario analyzer crates.

pub mod error;
pub mod io;
pub mod platform;
pub mod timestamp;

pub use error::{Error, Result};
pub use platform::Platform;
pub use timestamp::Timestamp;

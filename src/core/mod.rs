pub mod config;
pub mod error;
pub mod types;

pub use config::{FactionRoster, RoundConfig};
pub use error::{CaptureError, Result};

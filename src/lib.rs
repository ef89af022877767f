//! Periodic emitter of signed sensor readings
//!
//! Each cycle samples a [`Reading`], signs its 22-byte encoding with
//! RSA/SHA-256 and delivers `reading || signature` over a fresh TCP
//! connection.

pub mod config;
pub mod emitter;
pub mod error;
pub mod models;
pub mod protocol;
pub mod sensor;
pub mod signing;
pub mod transport;
pub mod utils;

pub use config::EmitterConfig;
pub use emitter::{CycleReport, Emitter, EmitterStats};
pub use error::{ClockError, ConfigError, CycleError, PacketError, SendError, SignError};
pub use models::{Reading, READING_LEN};

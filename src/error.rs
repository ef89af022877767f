//! Error types for the telemetry emitter

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration could not be loaded. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration key: {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot read config file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },
}

/// Key loading or signing failed.
#[derive(Error, Debug)]
pub enum SignError {
    #[error("private key not found at {path}: {source}")]
    KeyNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse private key at {path}: {source}")]
    KeyParse {
        path: PathBuf,
        #[source]
        source: openssl::error::ErrorStack,
    },

    #[error("signing failed: {0}")]
    Signing(#[from] openssl::error::ErrorStack),
}

/// Delivering a packet to the endpoint failed.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("write failed: {0}")]
    Write(#[from] io::Error),

    #[error("connection closed after {sent} of {total} bytes")]
    WriteZero { sent: usize, total: usize },

    #[error("write timed out after {sent} of {total} bytes")]
    WriteTimeout { sent: usize, total: usize },
}

/// The local wall clock cannot be expressed as a 14-digit timestamp.
#[derive(Error, Debug)]
#[error("local year {year} does not fit the YYYYMMDDHHMMSS timestamp")]
pub struct ClockError {
    pub year: i32,
}

/// Packet construction rejected its input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PacketError {
    #[error("signature is empty")]
    EmptySignature,

    #[error("signature of {0} bytes does not fit a u16 length prefix")]
    SignatureTooLong(usize),

    #[error("packet too short: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },
}

/// Failure of a single emission cycle.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("signing error: {0}")]
    Sign(#[from] SignError),

    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("send error: {0}")]
    Send(#[from] SendError),
}

impl CycleError {
    /// Whether the emission loop should stop instead of skipping the cycle.
    pub fn is_fatal(&self) -> bool {
        match self {
            CycleError::Clock(_)
            | CycleError::Sign(_)
            | CycleError::Packet(_)
            | CycleError::Send(_) => false,
        }
    }

    /// Whether this failure happened while opening the connection.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            CycleError::Send(SendError::Connect { .. } | SendError::ConnectTimeout { .. })
        )
    }
}

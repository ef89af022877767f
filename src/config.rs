use log::info;
use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::protocol::Framing;
use crate::signing::KeyPolicy;
use crate::transport::SendOptions;

/// Environment variable naming an optional key=value config file
pub const CONFIG_FILE_VAR: &str = "SENSOR_CONFIG";

const SENSOR_ID: &str = "sensor_id";
const SERVER_IP: &str = "server_ip";
const SERVER_PORT: &str = "server_port";
const PRIVATE_KEY_PATH: &str = "private_key_path";
const SEND_INTERVAL_SECS: &str = "send_interval_secs";
const CONNECT_TIMEOUT_SECS: &str = "connect_timeout_secs";
const WRITE_TIMEOUT_SECS: &str = "write_timeout_secs";
const PACKET_FRAMING: &str = "packet_framing";
const CACHE_KEY: &str = "cache_key";
const MAX_BACKOFF_SECS: &str = "max_backoff_secs";

const KEYS: [&str; 10] = [
    SENSOR_ID,
    SERVER_IP,
    SERVER_PORT,
    PRIVATE_KEY_PATH,
    SEND_INTERVAL_SECS,
    CONNECT_TIMEOUT_SECS,
    WRITE_TIMEOUT_SECS,
    PACKET_FRAMING,
    CACHE_KEY,
    MAX_BACKOFF_SECS,
];

const DEFAULT_PRIVATE_KEY_PATH: &str = "private.pem";
const DEFAULT_SEND_INTERVAL_SECS: u64 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct EmitterConfig {
    pub sensor_id: i16,
    pub server_ip: String,
    pub server_port: u16,
    pub private_key_path: PathBuf,
    pub send_interval: Duration,
    pub send_options: SendOptions,
    pub framing: Framing,
    pub key_policy: KeyPolicy,
    /// Cap on the extra delay after repeated connect failures, zero disables it
    pub max_backoff: Duration,
}

impl EmitterConfig {
    /// Load settings from `.env`, an optional config file and the environment
    ///
    /// The file named by `SENSOR_CONFIG` holds lower-case `key=value` lines.
    /// Upper-case environment variables (`SENSOR_ID`, `SERVER_IP`, ...)
    /// override file values.
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        let mut values = HashMap::new();

        if let Ok(path) = env::var(CONFIG_FILE_VAR) {
            info!("Reading configuration from {}", path);
            values.extend(read_config_file(Path::new(&path))?);
        }

        for key in KEYS {
            if let Ok(value) = env::var(key.to_ascii_uppercase()) {
                values.insert(key.to_string(), value);
            }
        }

        Self::from_pairs(values)
    }

    /// Build a config from raw key/value pairs, applying defaults
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_ascii_lowercase(), v.into()))
            .collect();

        let server_ip = require(&values, SERVER_IP)?.trim().to_string();
        if server_ip.is_empty() {
            return Err(invalid(SERVER_IP, &server_ip, "must not be empty"));
        }

        let server_port: u16 = parse(SERVER_PORT, require(&values, SERVER_PORT)?)?;
        if server_port == 0 {
            return Err(invalid(SERVER_PORT, "0", "must not be zero"));
        }

        let cache_key = match values.get(CACHE_KEY) {
            Some(value) => parse_bool(CACHE_KEY, value)?,
            None => false,
        };
        let key_policy = if cache_key {
            KeyPolicy::Cached
        } else {
            KeyPolicy::ReloadEachSign
        };

        Ok(EmitterConfig {
            sensor_id: parse(SENSOR_ID, require(&values, SENSOR_ID)?)?,
            server_ip,
            server_port,
            private_key_path: values
                .get(PRIVATE_KEY_PATH)
                .map(|p| PathBuf::from(p.trim()))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PRIVATE_KEY_PATH)),
            send_interval: seconds(&values, SEND_INTERVAL_SECS, DEFAULT_SEND_INTERVAL_SECS)?,
            send_options: SendOptions {
                connect_timeout: seconds(
                    &values,
                    CONNECT_TIMEOUT_SECS,
                    DEFAULT_CONNECT_TIMEOUT_SECS,
                )?,
                write_timeout: seconds(&values, WRITE_TIMEOUT_SECS, DEFAULT_WRITE_TIMEOUT_SECS)?,
            },
            framing: match values.get(PACKET_FRAMING) {
                Some(value) => value
                    .parse()
                    .map_err(|reason| invalid(PACKET_FRAMING, value, reason))?,
                None => Framing::default(),
            },
            key_policy,
            max_backoff: match values.get(MAX_BACKOFF_SECS) {
                Some(value) => Duration::from_secs(parse(MAX_BACKOFF_SECS, value)?),
                None => Duration::ZERO,
            },
        })
    }

    /// `ip:port` of the receiving endpoint, for logs
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.server_ip, self.server_port)
    }
}

/// Read a plain `key=value` file (comments and quoting as in `.env` files)
pub fn read_config_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let file_error = |source| ConfigError::File {
        path: path.to_path_buf(),
        source,
    };

    dotenv::from_path_iter(path)
        .map_err(file_error)?
        .map(|item| item.map_err(file_error))
        .collect()
}

fn require<'a>(
    values: &'a HashMap<String, String>,
    key: &'static str,
) -> Result<&'a str, ConfigError> {
    values
        .get(key)
        .map(String::as_str)
        .ok_or(ConfigError::Missing(key))
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, value, e))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

/// Positive whole seconds, or `default` when unset
fn seconds(
    values: &HashMap<String, String>,
    key: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = match values.get(key) {
        Some(value) => parse(key, value)?,
        None => default,
    };
    if secs == 0 {
        return Err(invalid(key, "0", "must be at least 1 second"));
    }
    Ok(Duration::from_secs(secs))
}

fn invalid(key: &'static str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

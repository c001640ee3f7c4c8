use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    /// Root of per-user storage (`<data_dir>/users/...`)
    pub data_dir: PathBuf,
    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
    /// Locale used when the sender has no language code
    pub locale_default: String,
    /// Storage operations slower than this are logged
    pub slow_op_threshold: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN").ok_or_else(|| "BOT_TOKEN must be set".to_string())?;
        let slow_op_ms = match get("SLOW_OP_THRESHOLD_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| format!("SLOW_OP_THRESHOLD_MS must be a valid number, got '{}'", raw))?,
            None => 200,
        };

        Ok(Self {
            bot_token,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|| "info".to_string()),
            locale_default: get("LOCALE_DEFAULT").unwrap_or_else(|| "en".to_string()),
            slow_op_threshold: Duration::from_millis(slow_op_ms),
        })
    }
}

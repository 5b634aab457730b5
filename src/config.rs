use std::{fs::read_to_string, path::Path, str::FromStr};

use anyhow::{Result, anyhow};
use serde::Deserialize;
use service::ApplyOptions;

/// Verbosity of the logger installed by [`Log::init`].
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [
            ("error", Self::Error),
            ("warn", Self::Warn),
            ("info", Self::Info),
            ("debug", Self::Debug),
            ("trace", Self::Trace),
        ]
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|(_, level)| level)
        .ok_or_else(|| anyhow!("unknown log level: {value}"))
    }
}

impl LogLevel {
    pub fn as_level(&self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Log {
    #[serde(default)]
    pub level: LogLevel,
}

impl Log {
    ///
    /// Install the process wide logger at the configured level.
    ///
    /// Meant to be called once by the application hosting the elements,
    /// a second call fails because a logger is already set.
    ///
    pub fn init(&self) -> Result<()> {
        simple_logger::init_with_level(self.level.as_level())?;
        Ok(())
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    ///
    /// timestamp element options
    ///
    /// `ntp-offset` is the number of seconds between the NTP epoch and the
    /// zero of the stream running time.  For a live source whose running
    /// time starts at the unix epoch this is 2208988800.
    ///
    #[serde(default)]
    pub apply: ApplyOptions,
    #[serde(default)]
    pub log: Log,
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(serde_json5::from_str(value)?)
    }
}

impl Config {
    ///
    /// Load configure from a JSON5 file.
    ///
    /// Every option has a default, an empty object gives the default
    /// configuration.
    ///
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_to_string(path)?.parse()
    }
}

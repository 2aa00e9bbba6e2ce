//! Logging setup for the server binary.
//!
//! Logs always go to stderr (stdout carries the MCP protocol). `LOG_LEVEL` and
//! `LOG_FORMAT` pick the default level and the line format, `VECTRA_LOG_FILE`
//! adds an append-only file sink. `RUST_LOG` still overrides the level filter.

use std::env;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::vectra::error::VectraApiError;

const VALID_LEVELS: &str = "DEBUG, INFO, WARNING, ERROR, CRITICAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

impl FromStr for LogFormat {
    type Err = VectraApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(VectraApiError::ConfigurationError(format!(
                "Invalid log format: {}. Valid formats: json, text",
                other
            ))),
        }
    }
}

fn parse_level(raw: &str) -> Result<Level, VectraApiError> {
    match raw.trim().to_uppercase().as_str() {
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARNING" | "WARN" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        other => Err(VectraApiError::ConfigurationError(format!(
            "Invalid log level: {}. Valid levels: {}",
            other, VALID_LEVELS
        ))),
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Extra sink; stderr output is kept either way.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, VectraApiError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, VectraApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let level = match set("LOG_LEVEL") {
            Some(raw) => parse_level(&raw)?,
            None => Level::INFO,
        };
        let format = match set("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };
        let file = set("VECTRA_LOG_FILE").map(PathBuf::from);

        Ok(Self {
            level,
            format,
            file,
        })
    }

    /// `--debug` forces the default level down to DEBUG.
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.level = Level::DEBUG;
        }
        self
    }

    fn open_file(&self) -> std::io::Result<Option<Mutex<File>>> {
        let Some(path) = &self.file else {
            return Ok(None);
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Some(Mutex::new(file)))
    }

    /// Installs the global subscriber.
    pub fn init(&self) -> std::io::Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()));
        let file = self.open_file()?;

        let registry = tracing_subscriber::registry().with(env_filter);
        match self.format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(file.map(|f| fmt::layer().json().with_ansi(false).with_writer(f)))
                .init(),
            LogFormat::Text => registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(file.map(|f| fmt::layer().with_ansi(false).with_writer(f)))
                .init(),
        }
        Ok(())
    }
}

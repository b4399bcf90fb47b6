//! CLI error types with miette diagnostics.
//!
//! Only startup failures surface here. Per-battery scrape failures never
//! stop the exporter.

use std::net::SocketAddr;

use miette::Diagnostic;
use thiserror::Error;

use sonnenbat_config::ConfigError;
use sonnenbat_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const BIND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("{variable} must be set")]
    #[diagnostic(
        code(sonnenbat::no_addresses),
        help(
            "Set {variable} to a comma-separated list of batteries,\n\
             e.g. {variable}=192.168.1.100,192.168.1.101\n\
             or add [[sources]] tables to the file passed with --config."
        )
    )]
    MissingAddresses { variable: &'static str },

    #[error("No valid batteries configured")]
    #[diagnostic(
        code(sonnenbat::no_sources),
        help("Every configured entry was empty. Check for stray commas in the address and token lists.")
    )]
    NoSources,

    #[error("Number of addresses ({addresses}) must match number of tokens ({tokens})")]
    #[diagnostic(
        code(sonnenbat::length_mismatch),
        help("SONNENBATTERIE_TOKENS needs one entry per address in SONNENBATTERIE_IPS.")
    )]
    LengthMismatch { addresses: usize, tokens: usize },

    #[error("Battery name '{name}' is used more than once")]
    #[diagnostic(
        code(sonnenbat::duplicate_name),
        help("Give every battery a unique name with SONNENBATTERIE_NAMES.")
    )]
    DuplicateName { name: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sonnenbat::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(sonnenbat::no_config), help("Check the path given with --config or SONNENBAT_CONFIG."))]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(sonnenbat::config))]
    Config(Box<figment::Error>),

    #[error("Failed to set up the HTTP client: {message}")]
    #[diagnostic(code(sonnenbat::client))]
    Client { message: String },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(sonnenbat::bind_failed),
        help("Is another process using the port? Pick another with --port or EXPORTER_PORT.")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingAddresses { .. }
            | Self::NoSources
            | Self::LengthMismatch { .. }
            | Self::DuplicateName { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::CONFIG,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Bind { .. } => exit_code::BIND,
            Self::Client { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── Library error mapping ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingAddresses { variable } => Self::MissingAddresses { variable },
            ConfigError::NoSources => Self::NoSources,
            ConfigError::LengthMismatch { addresses, tokens } => {
                Self::LengthMismatch { addresses, tokens }
            }
            ConfigError::DuplicateName { name } => Self::DuplicateName { name },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::MissingFile { path } => Self::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Figment(err) => Self::Config(err),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoSources => Self::NoSources,
            CoreError::DuplicateSource { name } => Self::DuplicateName { name },
            CoreError::Client(err) => Self::Client {
                message: err.to_string(),
            },
        }
    }
}

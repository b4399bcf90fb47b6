// ── Core error types ──
//
// Startup-time failures only. Per-source scrape failures are data
// (`SourceFailure`), never a `CoreError`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No battery sources configured")]
    NoSources,

    #[error("Duplicate source name '{name}'")]
    DuplicateSource { name: String },

    #[error("Failed to set up HTTP client: {0}")]
    Client(#[from] sonnenbat_api::Error),
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a run.
///
/// Per-row and per-line malformations never surface here; only whole-stream
/// failures do.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read lookup table {}", .path.display())]
    LookupTable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read flow log {}", .path.display())]
    FlowLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report {}", .path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write generated flow log {}", .path.display())]
    Generate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

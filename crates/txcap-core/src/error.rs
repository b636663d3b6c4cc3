//! Unified error type for the txcap pipeline
//!
//! Every fatal condition of a run maps onto one [`TxcapError`] variant. The
//! variants follow the two fatal classes the pipeline distinguishes:
//!
//! - **missing input**: a required table, column, identifier or coordinate
//!   is absent. The message names exactly what was not found.
//! - **missing capability**: a geometry or fetch capability that the run
//!   needs was not compiled in or cannot handle the input.
//!
//! Recoverable data-quality problems never become errors; they are recorded
//! in [`crate::diagnostics::Diagnostics`] instead.
//!
//! # Example
//!
//! ```
//! use txcap_core::{TxcapError, TxcapResult};
//!
//! fn require(found: &[&str]) -> TxcapResult<()> {
//!     let missing: Vec<String> = ["bus", "branch"]
//!         .iter()
//!         .filter(|name| !found.contains(name))
//!         .map(|name| name.to_string())
//!         .collect();
//!     if missing.is_empty() {
//!         Ok(())
//!     } else {
//!         Err(TxcapError::MissingInput { dir: "grid".into(), missing })
//!     }
//! }
//!
//! assert!(require(&["bus"]).is_err());
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TxcapError {
    /// Required base tables not found in the grid directory
    #[error("missing required input in {dir}: {}", .missing.join(", "))]
    MissingInput { dir: String, missing: Vec<String> },

    /// Required columns not resolvable under any accepted alias
    #[error("{table} missing required columns: {}", .columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    /// County layer without a GEOID and without STATEFP+COUNTYFP
    #[error("missing identifier: {0}")]
    MissingIdentifier(String),

    /// Substation table without latitude/longitude
    #[error("missing coordinates: {0}")]
    MissingCoordinates(String),

    /// A capability the run needs is not available in this build
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// County layer in a coordinate reference that cannot be joined against lon/lat
    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// Table format not readable by this build
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Caller options that cannot be interpreted
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// I/O errors (file access, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Remote fetch failures (never retried)
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using TxcapError.
pub type TxcapResult<T> = Result<T, TxcapError>;

impl From<anyhow::Error> for TxcapError {
    fn from(err: anyhow::Error) -> Self {
        TxcapError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for TxcapError {
    fn from(err: serde_json::Error) -> Self {
        TxcapError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_names_tables() {
        let err = TxcapError::MissingInput {
            dir: "/data/base_grid".into(),
            missing: vec!["sub".into(), "bus2sub".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("missing required input"));
        assert!(msg.contains("sub, bus2sub"));
    }

    #[test]
    fn test_missing_columns_names_columns() {
        let err = TxcapError::MissingColumns {
            table: "branch".into(),
            columns: vec!["x".into()],
        };
        assert_eq!(err.to_string(), "branch missing required columns: x");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TxcapError = io_err.into();
        assert!(matches!(err, TxcapError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> TxcapResult<()> {
            Err(TxcapError::CapabilityUnavailable("remote county fetch".into()))
        }

        fn outer() -> TxcapResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}

//! Custom error types for the application.
//!
//! This module defines the primary error type, `IonifyError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the distinct failure classes of the pipeline,
//! from I/O and configuration issues to report-generation problems.
//!
//! ## Error Hierarchy
//!
//! `IonifyError` is an enum that consolidates various error sources:
//!
//! - **`Config`**: Wraps errors from the `config` crate, typically related to
//!   file parsing or format issues in the settings file.
//! - **`Io`**: Wraps standard `std::io::Error`, covering file and directory
//!   access issues outside of document writing.
//! - **`LogFormat`**: A well-formed record line carried a non-numeric value in
//!   a numeric position, or records appeared before any header line. Short or
//!   garbage lines are *not* errors; the parser drops them silently.
//! - **`UnresolvedConfiguration`**: The three configuration signals did not
//!   match any known system. Surfaced to the user as a selection problem, not
//!   a crash.
//! - **`RulesUnavailable`**: No tolerance table exists for the requested
//!   system type / preset pair. Report generation aborts before any output.
//! - **`DocumentWrite`**: The destination document could not be written,
//!   usually because it is open in another application. Distinct from every
//!   other failure so callers can suggest closing the file.
//! - **`AssetMissing`**: A reference document resolved by filename convention
//!   does not exist. Narrow and user-facing; never aborts a report.
//! - **`Pdf`** / **`Image`**: Wrapped failures from the document and image
//!   decoding layers.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, IonifyError>;

#[derive(Error, Debug)]
pub enum IonifyError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed log data: {0}")]
    LogFormat(String),

    #[error("Unresolvable system configuration (ion gun: {ion_gun}, ISS: {iss}). Select correct system")]
    UnresolvedConfiguration { ion_gun: bool, iss: bool },

    #[error("No rules available for system '{system_type}' (preset '{preset}'): {reason}")]
    RulesUnavailable {
        system_type: String,
        preset: String,
        reason: String,
    },

    #[error("Cannot write to '{}'. The file may be open in another application. Please close it and try again", .path.display())]
    DocumentWrite { path: PathBuf },

    #[error("File not found: '{}'", .0.display())]
    AssetMissing(PathBuf),

    #[error("Document error: {0}")]
    Pdf(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<lopdf::Error> for IonifyError {
    fn from(value: lopdf::Error) -> Self {
        IonifyError::Pdf(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_write_message_suggests_closing_the_file() {
        let err = IonifyError::DocumentWrite {
            path: PathBuf::from("out/BestModeData_V3.pdf"),
        };
        let msg = err.to_string();
        assert!(msg.contains("BestModeData_V3.pdf"));
        assert!(msg.contains("open in another application"));
    }

    #[test]
    fn unresolved_configuration_names_the_signals() {
        let err = IonifyError::UnresolvedConfiguration {
            ion_gun: true,
            iss: true,
        };
        assert!(err.to_string().contains("Select correct system"));
    }

    #[test]
    fn io_errors_convert_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: IonifyError = io.into();
        assert!(matches!(err, IonifyError::Io(_)));
    }
}

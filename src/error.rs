//! Error taxonomy shared by the API client, printer, and configuration.
//!
//! Every fallible operation in the crate returns [`DeskError`]. Callers on the
//! polling path log and skip; callers on user-action paths log and, for
//! print/release failures, raise the error banner. Nothing here is allowed to
//! take the process down once it is running.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    /// Connection refused, DNS failure, timeout, or a broken body stream.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a status outside the expected range.
    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Printer missing, unreachable, or the write failed part-way.
    #[error("printer error: {0}")]
    Printer(String),

    /// Malformed or missing fields in an API response.
    #[error("invalid data: {0}")]
    Data(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DeskError {
    /// True for errors that originate in the transport or HTTP layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::HttpStatus { .. } | Self::NotFound(_)
        )
    }
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Printer(err.to_string())
    }
}

impl From<serialport::Error> for DeskError {
    fn from(err: serialport::Error) -> Self {
        Self::Printer(err.to_string())
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Data(err.to_string())
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for blobcli operations
#[derive(Debug, Error)]
pub enum BlobCliError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Transfer attempt failed: {0}")]
    TransientTransfer(String),

    #[error("Unable to upload file {} after {attempts} attempt(s): {last_error}", file.display())]
    UploadExhausted {
        file: PathBuf,
        attempts: u32,
        last_error: String,
    },

    #[error("Error while downloading file {file}: {cause}")]
    DownloadError { file: String, cause: String },

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl BlobCliError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn transient<S: Into<String>>(msg: S) -> Self {
        Self::TransientTransfer(msg.into())
    }

    pub fn upload_exhausted<P: Into<PathBuf>, S: Into<String>>(
        file: P,
        attempts: u32,
        last_error: S,
    ) -> Self {
        Self::UploadExhausted {
            file: file.into(),
            attempts,
            last_error: last_error.into(),
        }
    }

    pub fn download<F: Into<String>, S: Into<String>>(file: F, cause: S) -> Self {
        Self::DownloadError {
            file: file.into(),
            cause: cause.into(),
        }
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type alias for blobcli operations
pub type Result<T> = std::result::Result<T, BlobCliError>;

/// Convert Azure Core errors to BlobCliError
impl From<azure_core::Error> for BlobCliError {
    fn from(error: azure_core::Error) -> Self {
        Self::AzureApiError(error.to_string())
    }
}

/// Whether a failed upload attempt should be tried again.
///
/// Anything the storage service or the network could plausibly get right on a
/// second try is retried; credential, configuration and argument problems are not.
pub fn is_retryable_upload_error(error: &BlobCliError) -> bool {
    match error {
        BlobCliError::TransientTransfer(_)
        | BlobCliError::AzureApiError(_)
        | BlobCliError::NetworkError(_)
        | BlobCliError::IoError(_) => true,
        BlobCliError::ConfigError(_)
        | BlobCliError::AuthenticationError(_)
        | BlobCliError::InvalidArgument(_)
        | BlobCliError::UploadExhausted { .. }
        | BlobCliError::DownloadError { .. }
        | BlobCliError::JsonError(_)
        | BlobCliError::YamlError(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_exhausted_message() {
        let err = BlobCliError::upload_exhausted("/tmp/report.csv", 3, "503 Server Busy");
        assert_eq!(
            err.to_string(),
            "Unable to upload file /tmp/report.csv after 3 attempt(s): 503 Server Busy"
        );
    }

    #[test]
    fn test_is_retryable_upload_error() {
        assert!(is_retryable_upload_error(&BlobCliError::transient("reset")));
        assert!(is_retryable_upload_error(&BlobCliError::azure_api("500")));
        assert!(!is_retryable_upload_error(&BlobCliError::authentication(
            "bad key"
        )));
        assert!(!is_retryable_upload_error(&BlobCliError::config("no url")));
    }

    #[test]
    fn test_json_errors_convert_with_question_mark() {
        fn parse(input: &str) -> Result<u32> {
            Ok(serde_json::from_str(input)?)
        }

        let err = parse("not json").unwrap_err();
        assert!(matches!(err, BlobCliError::JsonError(_)));
        assert!(!is_retryable_upload_error(&err));
    }
}

use nickscan_types::WindowHandle;

use crate::services::RemoteError;

/// Why a detection did not produce (or fully export) a result.
///
/// Only the `Display` text reaches observers; [`DetectionError::kind`] keeps the
/// discriminant available to callers and tests.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("window {0} does not look like a player profile")]
    Validation(WindowHandle),

    #[error("could not extract the player nick: {0}")]
    Extraction(String),

    #[error("{service}: player '{nick}' not found")]
    NotFound { service: &'static str, nick: String },

    #[error("{service} request failed: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: RemoteError,
    },

    #[error("clipboard write failed: {0}")]
    Clipboard(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationFailure,
    ExtractionFailure,
    NotFound,
    NetworkError,
    ClipboardFailure,
}

impl DetectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DetectionError::Validation(_) => ErrorKind::ValidationFailure,
            DetectionError::Extraction(_) => ErrorKind::ExtractionFailure,
            DetectionError::NotFound { .. } => ErrorKind::NotFound,
            DetectionError::Network { .. } => ErrorKind::NetworkError,
            DetectionError::Clipboard(_) => ErrorKind::ClipboardFailure,
        }
    }

    pub(crate) fn remote(service: &'static str, nick: &str, error: RemoteError) -> Self {
        match error {
            RemoteError::NotFound(_) => DetectionError::NotFound {
                service,
                nick: nick.to_string(),
            },
            source => DetectionError::Network { service, source },
        }
    }
}

/// Failures acquiring or releasing the scoped OS resources
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("detector must be started from within a tokio runtime")]
    NoRuntime,

    #[error("failed to register hotkey '{combo}': {source}")]
    Hotkey {
        combo: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to subscribe to right-click events: {0}")]
    Subscription(#[source] anyhow::Error),

    #[error("failed to release {resource}: {source}")]
    Release {
        resource: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_not_found_keeps_its_kind() {
        let err = DetectionError::remote("stats", "Bob", RemoteError::NotFound("Bob".into()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "stats: player 'Bob' not found");
    }

    #[test]
    fn test_other_remote_errors_are_network() {
        let err = DetectionError::remote(
            "analysis",
            "Bob",
            RemoteError::Rejected {
                status: 500,
                message: "boom".into(),
            },
        );
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(err.to_string().contains("HTTP 500: boom"));
    }
}

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkErrorKind {
    Configuration,
    UnknownHost,
    Timeout,
    Connection,
    BadResponse,
    ResponseFormat,
    Authentication,
    IdentityVerification,
    Transfer,
    Cancelled,
    Io,
}

impl SdkErrorKind {
    /// Failures raised by the network layer before a payload was understood.
    pub fn is_transport(self) -> bool {
        matches!(
            self,
            SdkErrorKind::UnknownHost
                | SdkErrorKind::Timeout
                | SdkErrorKind::Connection
                | SdkErrorKind::BadResponse
        )
    }
}

#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct SdkError {
    pub kind: SdkErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl SdkError {
    pub fn new(kind: SdkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::Configuration, message)
    }

    pub fn unknown_host(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::UnknownHost, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::Timeout, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::Connection, message)
    }

    pub fn bad_response(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::BadResponse, message)
    }

    pub fn response_format(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::ResponseFormat, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::Authentication, message)
    }

    pub fn identity(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::IdentityVerification, message)
    }

    pub fn transfer(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::Transfer, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::Cancelled, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::Io, message)
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => SdkError::timeout(err.to_string()),
            _ => SdkError::io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::response_format(format!("Malformed response payload: {}", err))
    }
}

use std::fmt;
use thiserror::Error;

use crate::Endpoint;

pub type Result<T> = std::result::Result<T, RemoteError>;

/// Failure classification shared by every layer above the clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The remote could not be reached or timed out.
    TransportError,
    /// The remote answered with a non-success status and no structured error.
    RemoteRejected,
    /// The remote answered with a business-rule rejection.
    DomainRejected,
    /// A request or response body did not have the expected shape.
    MalformedPayload,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TransportError => "TransportError",
            ErrorKind::RemoteRejected => "RemoteRejected",
            ErrorKind::DomainRejected => "DomainRejected",
            ErrorKind::MalformedPayload => "MalformedPayload",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known business-rule rejections reported by the backing services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainCode {
    LoginExists,
    InvalidPassword,
    NoIdentity,
    Other,
}

impl DomainCode {
    /// Classify a raw remote message. Only the storage-level duplicate-key
    /// failure is rewritten (to `login already exists`); every other message
    /// is kept verbatim.
    pub fn classify(raw: &str) -> (Self, String) {
        let lowered = raw.to_ascii_lowercase();
        if raw.contains("ErrCodeConditionalCheckFailedException") {
            (DomainCode::LoginExists, "login already exists".to_string())
        } else if lowered.contains("invalid password") {
            (DomainCode::InvalidPassword, raw.to_string())
        } else if lowered.contains("no identity") {
            (DomainCode::NoIdentity, raw.to_string())
        } else {
            (DomainCode::Other, raw.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("{endpoint} client err: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} came back with a different statuscode: {status}")]
    Rejected {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    /// The remote's own message, carried as sent
    #[error("{message}")]
    Domain {
        endpoint: Endpoint,
        code: DomainCode,
        message: String,
    },

    #[error("can't unmarshall {endpoint} response: {source}")]
    Malformed {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("can't marshal {endpoint} request: {source}")]
    Encode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} response has no identifier")]
    MissingIdentifier { endpoint: Endpoint },

    #[error("{endpoint} requires an identifier")]
    EmptyIdentity { endpoint: Endpoint },
}

impl RemoteError {
    /// Build a domain rejection from the remote's own message.
    pub fn domain(endpoint: Endpoint, raw: &str) -> Self {
        let (code, message) = DomainCode::classify(raw);
        RemoteError::Domain {
            endpoint,
            code,
            message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteError::Transport { .. } => ErrorKind::TransportError,
            RemoteError::Rejected { .. } => ErrorKind::RemoteRejected,
            RemoteError::Domain { .. } => ErrorKind::DomainRejected,
            RemoteError::Malformed { .. }
            | RemoteError::Encode { .. }
            | RemoteError::MissingIdentifier { .. }
            | RemoteError::EmptyIdentity { .. } => ErrorKind::MalformedPayload,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            RemoteError::Transport { endpoint, .. }
            | RemoteError::Rejected { endpoint, .. }
            | RemoteError::Domain { endpoint, .. }
            | RemoteError::Malformed { endpoint, .. }
            | RemoteError::Encode { endpoint, .. }
            | RemoteError::MissingIdentifier { endpoint }
            | RemoteError::EmptyIdentity { endpoint } => *endpoint,
        }
    }

    pub fn domain_code(&self) -> Option<DomainCode> {
        match self {
            RemoteError::Domain { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Transport { source, .. } if source.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_duplicate_login() {
        let (code, message) = DomainCode::classify(
            "ConditionalCheckFailedException: ErrCodeConditionalCheckFailedException \
             the conditional request failed",
        );
        assert_eq!(code, DomainCode::LoginExists);
        assert_eq!(message, "login already exists");
    }

    #[test]
    fn test_classify_keeps_message_verbatim() {
        let (code, message) = DomainCode::classify("invalid password");
        assert_eq!(code, DomainCode::InvalidPassword);
        assert_eq!(message, "invalid password");

        let (code, message) = DomainCode::classify("no identity");
        assert_eq!(code, DomainCode::NoIdentity);
        assert_eq!(message, "no identity");

        let (code, message) = DomainCode::classify("quota exceeded");
        assert_eq!(code, DomainCode::Other);
        assert_eq!(message, "quota exceeded");

        let (code, message) = DomainCode::classify("grant already exists");
        assert_eq!(code, DomainCode::Other);
        assert_eq!(message, "grant already exists");
    }

    #[test]
    fn test_display_and_kind() {
        let err = RemoteError::domain(Endpoint::Login, "login response err: invalid password");
        assert_eq!(err.to_string(), "login response err: invalid password");
        assert_eq!(err.domain_code(), Some(DomainCode::InvalidPassword));

        let err = RemoteError::domain(Endpoint::Register, "ErrCodeConditionalCheckFailedException");
        assert_eq!(err.to_string(), "login already exists");
        assert_eq!(err.kind(), ErrorKind::DomainRejected);

        let err = RemoteError::Rejected {
            endpoint: Endpoint::CreatePermissions,
            status: 502,
            body: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "create permissions came back with a different statuscode: 502"
        );
        assert_eq!(err.kind(), ErrorKind::RemoteRejected);

        let err = RemoteError::EmptyIdentity { endpoint: Endpoint::Allowed };
        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
        assert_eq!(err.endpoint(), Endpoint::Allowed);
    }
}

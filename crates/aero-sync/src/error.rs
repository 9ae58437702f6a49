use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failure of a bridge operation. `operation` names the bridge call
/// (`fetch_team`, `show_overlay`, ...).
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{operation}: HTTP error: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: transport error: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: backend returned {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation}: malformed response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The backend answered 2xx without the requested resource.
    #[error("{operation}: backend reply carried no {resource}")]
    EmptyReply {
        operation: &'static str,
        resource: &'static str,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl BridgeError {
    /// The request never produced a response.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport { .. })
    }

    /// The backend answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// HTTP status, when the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend answered but the body held nothing usable.
    #[must_use]
    pub fn is_bad_reply(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::EmptyReply { .. })
    }

    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates() {
        let missing = BridgeError::Status {
            operation: "fetch_team",
            status: 404,
            body: "{\"detail\":\"Team not found\"}".into(),
        };
        assert!(missing.is_not_found());
        assert!(!missing.is_transport());
        assert_eq!(missing.status(), Some(404));

        let offline = BridgeError::transport("fetch_teams", "connection refused");
        assert!(offline.is_transport());
        assert_eq!(offline.status(), None);
        assert_eq!(
            offline.to_string(),
            "fetch_teams: transport error: connection refused"
        );

        let empty = BridgeError::EmptyReply {
            operation: "fetch_overlay_state",
            resource: "overlay state",
        };
        assert!(empty.is_bad_reply());
        assert!(!empty.is_transport());
        assert_eq!(empty.status(), None);
        assert_eq!(
            empty.to_string(),
            "fetch_overlay_state: backend reply carried no overlay state"
        );
    }
}

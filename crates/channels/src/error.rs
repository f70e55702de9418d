use std::error::Error as StdError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures while delivering a reply. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The reply was rejected before anything was sent.
    #[error("invalid reply: {reason}")]
    InvalidReply { reason: String },

    /// The gateway lacks credentials or settings it needs.
    #[error("gateway not configured: {what}")]
    NotConfigured { what: String },

    /// The platform answered with a non-success status.
    #[error("platform rejected reply ({status}): {body}")]
    Transport { status: u16, body: String },

    /// The request never got an answer (DNS, TLS, connection reset, ...).
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Webhook or payload JSON did not decode.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_reply(reason: impl std::fmt::Display) -> Self {
        Self::InvalidReply {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn not_configured(what: impl std::fmt::Display) -> Self {
        Self::NotConfigured {
            what: what.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Status code returned by the platform, if it answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_carries_status_and_body() {
        let err = Error::Transport {
            status: 400,
            body: "Invalid reply token".into(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.to_string(),
            "platform rejected reply (400): Invalid reply token"
        );
    }

    #[test]
    fn external_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = Error::external("LINE reply request", io);
        assert_eq!(err.status(), None);
        assert!(StdError::source(&err).is_some());
        assert_eq!(err.to_string(), "LINE reply request: reset");
    }
}

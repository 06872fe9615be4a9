use thiserror::Error;

/// Failures a report request can end in.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("caller could not be authenticated")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl ReportError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// HTTP-equivalent status for the failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden(_) => 403,
            Self::InvalidRequest(_) => 400,
            Self::Upstream(_) => 500,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidRequest(_) => 2,
            Self::Unauthenticated => 3,
            Self::Forbidden(_) => 4,
            Self::Upstream(_) => 5,
        }
    }
}

impl From<anyhow::Error> for ReportError {
    fn from(err: anyhow::Error) -> Self {
        // Keep the whole context chain so the upstream message reaches the caller.
        Self::Upstream(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_http_semantics() {
        assert_eq!(ReportError::Unauthenticated.status_code(), 401);
        assert_eq!(ReportError::forbidden("x").status_code(), 403);
        assert_eq!(ReportError::invalid("x").status_code(), 400);
        assert_eq!(ReportError::Upstream("x".into()).status_code(), 500);
    }

    #[test]
    fn upstream_message_is_passed_through() {
        let err: ReportError = anyhow::anyhow!("connection refused")
            .context("failed to fetch assignments")
            .into();
        let message = err.to_string();
        assert!(message.contains("failed to fetch assignments"));
        assert!(message.contains("connection refused"));
    }
}

//! Error taxonomy for the gateway core.
//!
//! Every variant here is one of the kinds named in the error-handling design:
//! transport-level failures are rejected before dispatch, tool-level
//! failures are carried through `tools/call` as `isError=true` content
//! (see [`crate::server::dispatcher`]).

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments: {field}: {message}")]
    InvalidArguments { field: String, message: String },

    #[error("Unknown tenant: {tenant}")]
    UnknownTenant { tenant: String },

    #[error("Tenant not configured: {tenant} ({missing})")]
    TenantNotConfigured { tenant: String, missing: String },

    #[error("Authentication failed ({status}): {body}")]
    AuthenticationFailure { status: u16, body: String },

    #[error("Permission denied (403): {body}")]
    UpstreamPermissionDenied { body: String },

    #[error("Resource not found (404): {body}")]
    UpstreamNotFound { body: String },

    #[error("Error executing {tool}: {status} {status_text} - {body}")]
    UpstreamFailure {
        tool: String,
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Upstream transport error: {message}")]
    UpstreamTransport { message: String },

    #[error("Request cancelled: {reason}")]
    RequestCancelled { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    pub fn invalid_arguments(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this is the single locally-recoverable condition (401 on a
    /// resource call). The upstream client absorbs this itself; it should
    /// never reach the dispatcher as `UpstreamAuthError` — by the time an
    /// error crosses that boundary it is already `AuthenticationFailure`.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            GatewayError::UnknownTool { .. }
                | GatewayError::InvalidArguments { .. }
                | GatewayError::UnknownTenant { .. }
                | GatewayError::TenantNotConfigured { .. }
        )
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::UpstreamTransport {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Internal {
            message: err.to_string(),
        }
    }
}

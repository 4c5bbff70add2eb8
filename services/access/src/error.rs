use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Broad failure category, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller input failed a precondition. Fix the input and retry.
    InvalidArgument,
    /// A uniqueness or referential invariant would be violated.
    Conflict,
    /// The referenced entity does not exist.
    NotFound,
    /// Persistence failure. Not the caller's fault.
    Internal,
}

/// Access service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AccessServiceError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("the slug cannot be longer than 60 characters")]
    SlugTooLong,
    #[error("invalid parameter")]
    InvalidId,
    #[error("permission ids cannot hold more than {0} entries")]
    TooManyPermissionIds(usize),
    #[error("missing data")]
    MissingData,
    #[error("role not found")]
    RoleNotFound,
    #[error("permission not found")]
    PermissionNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("role already exists")]
    RoleAlreadyExists,
    #[error("permission already exists")]
    PermissionAlreadyExists,
    #[error("e-mail already registered")]
    EmailAlreadyRegistered,
    #[error("role is still assigned to users")]
    RoleInUse,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccessServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::SlugTooLong => "SLUG_TOO_LONG",
            Self::InvalidId => "INVALID_ID",
            Self::TooManyPermissionIds(_) => "TOO_MANY_PERMISSION_IDS",
            Self::MissingData => "MISSING_DATA",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::PermissionNotFound => "PERMISSION_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::RoleAlreadyExists => "ROLE_ALREADY_EXISTS",
            Self::PermissionAlreadyExists => "PERMISSION_ALREADY_EXISTS",
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::RoleInUse => "ROLE_IN_USE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingField(_)
            | Self::SlugTooLong
            | Self::InvalidId
            | Self::TooManyPermissionIds(_)
            | Self::MissingData => ErrorCategory::InvalidArgument,
            Self::RoleNotFound | Self::PermissionNotFound | Self::UserNotFound => {
                ErrorCategory::NotFound
            }
            Self::RoleAlreadyExists
            | Self::PermissionAlreadyExists
            | Self::EmailAlreadyRegistered
            | Self::RoleInUse => ErrorCategory::Conflict,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl IntoResponse for AccessServiceError {
    fn into_response(self) -> Response {
        let status = match self.category() {
            ErrorCategory::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx are expected client errors; TraceLayer already records them.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

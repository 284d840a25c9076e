use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Envelope shared by every route: `{success, data}` or `{success, error}`.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Serialize)]
pub struct ApiError {
    /// Stable, machine-readable code (e.g. "BAD_REQUEST", "CONFIG_ERROR").
    pub code: &'static str,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

#[derive(Serialize)]
pub struct ApiErrorDetail {
    /// Request field the detail refers to, e.g. `query` or `chunks`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// What the client can do about it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiErrorDetail {
    pub fn field(path: &str, hint: impl Into<String>) -> Self {
        Self {
            path: Some(path.to_string()),
            hint: Some(hint.into()),
        }
    }

    pub fn hint(hint: impl Into<String>) -> Self {
        Self {
            path: None,
            hint: Some(hint.into()),
        }
    }
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(
        code: &'static str,
        message: impl Into<String>,
        details: Vec<ApiErrorDetail>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details,
            }),
        }
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }

    /// Success envelope with `200 OK`.
    pub fn ok(data: T) -> Response {
        Self::success(data).into_response_with_status(StatusCode::OK)
    }
}

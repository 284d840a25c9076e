use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Upper bound for a plain-text rejection body.
const MAX_REJECTION_BYTES: usize = 64 * 1024;

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_REJECTION_BYTES)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    for key in [
        "query",
        "useEnhancedSearch",
        "rerankingEnabled",
        "filename",
        "chunks",
    ] {
        if msg.contains(key) {
            return Some(key.to_string());
        }
    }
    None
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Rewrites axum's plain-text JSON body rejections (400/415/422) into the
/// error envelope. Responses that are already JSON pass through.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    if !matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::UNSUPPORTED_MEDIA_TYPE
    ) {
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }
    let original = String::from_utf8_lossy(&bytes);

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: if original.contains("expected a sequence") {
            Some("Expected an array for this field (e.g. [\"chunk 1\", \"chunk 2\"]).".into())
        } else if original.contains("expected a string") {
            Some("Expected a string for this field.".into())
        } else if original.contains("Content-Type") {
            Some("Send the body with `Content-Type: application/json`.".into())
        } else {
            None
        },
    };

    let code = match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        _ => "UNPROCESSABLE_ENTITY",
    };
    let envelope = ApiResponse::<()>::error(code, original.trim(), vec![detail]);

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}

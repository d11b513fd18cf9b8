//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// The number of body bytes to log at the `info` level before truncating.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and logged in full at the `debug` level. Password fields in JSON request
/// bodies are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    let is_json = headers
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        let display_text = redact_json_field(&body_text, "password");
        log_request(&headers, &display_text);
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace the string value of `field_name` in a JSON object body with
/// asterisks.
///
/// The body is scanned rather than parsed so that malformed JSON still gets
/// logged (redacted) instead of erroring out.
fn redact_json_field(body_text: &str, field_name: &str) -> String {
    let key = format!("\"{field_name}\"");
    let key_start = match body_text.find(&key) {
        Some(position) => position,
        None => return body_text.to_string(),
    };

    let after_key = &body_text[key_start + key.len()..];
    let colon_offset = match after_key.find(':') {
        Some(position) => position,
        None => return body_text.to_string(),
    };
    let after_colon = &after_key[colon_offset + 1..];

    let open_quote = match after_colon.find('"') {
        Some(position) => position,
        None => return body_text.to_string(),
    };
    let value_start = open_quote + 1;

    // Find the closing quote, skipping escaped quotes.
    let mut close_quote = None;
    let mut previous_was_backslash = false;
    for (i, c) in after_colon[value_start..].char_indices() {
        if c == '"' && !previous_was_backslash {
            close_quote = Some(value_start + i);
            break;
        }
        previous_was_backslash = c == '\\' && !previous_was_backslash;
    }
    let close_quote = match close_quote {
        Some(position) => position,
        None => return body_text.to_string(),
    };

    let value_absolute_start = key_start + key.len() + colon_offset + 1 + value_start;
    let value_absolute_end = key_start + key.len() + colon_offset + 1 + close_quote;

    format!(
        "{}********{}",
        &body_text[..value_absolute_start],
        &body_text[value_absolute_end..]
    )
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

/// Cut `text` off at the largest char boundary at or below `limit` bytes.
///
/// Slicing at the raw byte limit panics when a multi-byte character straddles
/// it, and request bodies are attacker-controlled.
fn truncate_on_char_boundary(text: &str, limit: usize) -> &str {
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            truncate_on_char_boundary(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            truncate_on_char_boundary(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}

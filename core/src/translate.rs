//! Terminal handler for failed mutations: turns an `ApiError` into a
//! user-facing error toast.

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::notify::{NotificationService, ToastKind};

pub const FALLBACK_MESSAGE: &str = "Something went wrong.";

/// Message to show for `err`.
///
/// Reads the JSON `detail` field of the response body: a string is used
/// as-is, a validation error list contributes its first `msg`. Anything
/// else yields [`FALLBACK_MESSAGE`].
pub fn error_message(err: &ApiError) -> String {
    err.body()
        .and_then(|body| serde_json::from_str::<Value>(body).ok())
        .and_then(|json| detail_message(json.get("detail")?))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(message) if !message.is_empty() => Some(message.clone()),
        Value::Array(errors) => errors
            .first()?
            .get("msg")?
            .as_str()
            .map(str::to_string),
        _ => None,
    }
}

pub fn handle_error(err: &ApiError, notifier: &dyn NotificationService) {
    debug!(error = %err, "request failed");
    notifier.show_toast("Error", &error_message(err), ToastKind::Error);
}

//! HTTP境界での失敗を `AnalysisError` に分類する
//!
//! ステータスコードを優先し、それ以外は本文の `error.status` を見る。

use super::wire::HttpFailure;
use menu_lens_common::AnalysisError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    status: Option<String>,
    message: Option<String>,
}

pub(crate) fn classify_failure(failure: HttpFailure) -> AnalysisError {
    match failure {
        HttpFailure::Transport(detail) => AnalysisError::NetworkOrUnknown(detail),
        HttpFailure::Status { status, body } => classify_status(status, &body),
    }
}

fn classify_status(status: u16, body: &str) -> AnalysisError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let detail = envelope
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("HTTP {}", status));

    match status {
        429 => return AnalysisError::RateLimited(detail),
        503 => return AnalysisError::ServiceOverloaded(detail),
        403 => return AnalysisError::PermissionDenied(detail),
        _ => {}
    }

    match envelope.as_ref().and_then(|e| e.error.status.as_deref()) {
        Some("RESOURCE_EXHAUSTED") => AnalysisError::RateLimited(detail),
        Some("UNAVAILABLE") => AnalysisError::ServiceOverloaded(detail),
        Some("PERMISSION_DENIED") => AnalysisError::PermissionDenied(detail),
        _ => AnalysisError::NetworkOrUnknown(detail),
    }
}

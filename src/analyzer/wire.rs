//! Gemini generateContent の送受信型
//!
//! メニュー解析と料理画像生成で共有する。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// generateContent リクエスト
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
}

/// generateContent レスポンス
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<ResponseContent>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseContent {
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    pub text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .as_deref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_deref())
            .unwrap_or(&[])
    }

    /// 最初の候補のテキストパートを連結
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }

    /// 最初の候補のインライン画像
    pub fn inline_data(&self) -> Option<&InlineData> {
        self.first_parts().iter().find_map(|p| p.inline_data.as_ref())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .as_deref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.as_deref())
    }
}

/// HTTP境界での失敗（分類前）
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HttpFailure {
    Status { status: u16, body: String },
    Transport(String),
}

/// HTTPクライアント（タイムアウト未指定ならクライアント既定のまま）
pub(crate) fn build_http_client(timeout_seconds: Option<u64>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().unwrap_or_else(|e| {
        log::warn!("Failed to build configured HTTP client, using defaults: {}", e);
        reqwest::Client::new()
    })
}

pub(crate) fn endpoint(api_base: &str, model: &str) -> String {
    format!("{}/models/{}:generateContent", api_base.trim_end_matches('/'), model)
}

/// generateContent を呼び出して本文を返す
///
/// APIキーはヘッダで渡し、ログにはURLと長さ・ステータスのみ出す。
pub(crate) async fn post_generate_content(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    request: &GenerateContentRequest,
) -> Result<String, HttpFailure> {
    log::info!("Gemini API request: {}", url);

    let response = http
        .post(url)
        .header("x-goog-api-key", api_key)
        .json(request)
        .send()
        .await
        .map_err(|e| {
            log::error!("Gemini API transport error: {}", e);
            HttpFailure::Transport(e.to_string())
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        log::error!("Failed to read Gemini API response body: {}", e);
        HttpFailure::Transport(e.to_string())
    })?;

    if !status.is_success() {
        log::error!(
            "Gemini API error (status {}), response body length: {} bytes",
            status,
            body.len()
        );
        return Err(HttpFailure::Status {
            status: status.as_u16(),
            body,
        });
    }

    log::debug!("Gemini API response body length: {} bytes", body.len());
    Ok(body)
}

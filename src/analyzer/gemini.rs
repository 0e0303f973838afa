//! Gemini によるメニュー解析クライアント

use super::classify::classify_failure;
use super::wire::{
    build_http_client, endpoint, post_generate_content, Content, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use super::MenuAnalyzer;
use crate::config::{Config, Credential};
use crate::normalizer::{CapturedImage, JPEG_MIME_TYPE};
use async_trait::async_trait;
use menu_lens_common::{
    parse_menu_response, response_schema, AnalysisError, MenuAnalysisResult, ANALYSIS_INSTRUCTION,
    SYSTEM_INSTRUCTION,
};

pub struct GeminiMenuClient {
    credential: Credential,
    http: reqwest::Client,
    api_base: String,
    model: String,
}

impl GeminiMenuClient {
    pub fn new(config: &Config) -> Self {
        Self {
            credential: Credential::from_option(&config.gemini_api_key),
            http: build_http_client(config.timeout_seconds),
            api_base: config.gemini_api_base.clone(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(image_base64: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: JPEG_MIME_TYPE.to_string(),
                            data: image_base64.to_string(),
                        },
                    },
                    Part::Text {
                        text: ANALYSIS_INSTRUCTION.to_string(),
                    },
                ],
            }],
            system_instruction: Some(Content {
                parts: vec![Part::Text {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema()),
                response_modalities: None,
            },
        }
    }

    /// Base64 JPEG を解析する
    ///
    /// APIキー未設定ならリクエストを送らずに失敗する。
    pub async fn analyze_base64(&self, image_base64: &str) -> Result<MenuAnalysisResult, AnalysisError> {
        let api_key = self.credential.key().ok_or_else(|| {
            log::error!("Gemini API key is not configured");
            AnalysisError::MissingCredential("GEMINI_API_KEY".into())
        })?;

        let url = endpoint(&self.api_base, &self.model);
        let request = Self::build_request(image_base64);
        log::debug!("Analyzing menu image ({} base64 chars) with {}", image_base64.len(), self.model);

        let body = post_generate_content(&self.http, &url, api_key, &request)
            .await
            .map_err(classify_failure)?;

        let response: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            log::debug!("Unexpected Gemini envelope: {}", body);
            AnalysisError::malformed(format!("レスポンス形式が不正: {}", e), body.clone())
        })?;

        let text = match response.text() {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                log::warn!(
                    "Gemini returned no text (finish reason: {})",
                    response.finish_reason().unwrap_or("unknown")
                );
                return Err(AnalysisError::EmptyResponse);
            }
        };

        parse_menu_response(&text).inspect_err(|e| {
            if let AnalysisError::MalformedOutput { raw, .. } = e {
                log::debug!("Raw analysis output: {}", raw);
            }
            log::error!("Failed to parse analysis output: {}", e);
        })
    }
}

#[async_trait]
impl MenuAnalyzer for GeminiMenuClient {
    async fn analyze(&self, image: &CapturedImage) -> Result<MenuAnalysisResult, AnalysisError> {
        self.analyze_base64(image.base64()).await
    }
}

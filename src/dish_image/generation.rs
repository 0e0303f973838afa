//! Gemini による料理画像の生成
//!
//! 利用者が選んだ1品だけを都度生成する。画像の代わりにテキストが返ったら
//! `GenerationDeclined`、何も返らなければ `NoImageCapability`。

use super::{DishImage, DishImageResolver, GeneratedImage, GenerationError};
use crate::analyzer::wire::{
    build_http_client, endpoint, post_generate_content, Content, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, HttpFailure, Part,
};
use crate::config::{Config, Credential, DishImageStrategy};
use async_trait::async_trait;
use menu_lens_common::{build_dish_image_prompt, Dish};

pub struct GeminiImageGenerator {
    credential: Credential,
    http: reqwest::Client,
    api_base: String,
    model: String,
}

impl GeminiImageGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            credential: Credential::from_option(&config.gemini_api_key),
            http: build_http_client(config.timeout_seconds),
            api_base: config.gemini_api_base.clone(),
            model: config.image_model.clone(),
        }
    }

    fn build_request(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: None,
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..Default::default()
            },
        }
    }

    /// プロンプトから画像を1枚生成する
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerationError> {
        let api_key = self.credential.key().ok_or(GenerationError::MissingCredential)?;

        let url = endpoint(&self.api_base, &self.model);
        let request = Self::build_request(prompt);

        let body = post_generate_content(&self.http, &url, api_key, &request)
            .await
            .map_err(|failure| match failure {
                HttpFailure::Status { status, .. } => GenerationError::Http { status },
                HttpFailure::Transport(detail) => GenerationError::Network(detail),
            })?;

        let response: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

        if let Some(inline) = response.inline_data() {
            let image = GeneratedImage {
                mime_type: inline.mime_type.clone(),
                data: inline.data.clone(),
            };
            // 表示・保存の前にデコードできることを確かめる
            let bytes = image.decode()?;
            if bytes.is_empty() {
                return Err(GenerationError::Malformed("画像データが空です".into()));
            }
            log::info!("Image generated ({}, {} bytes)", image.mime_type, bytes.len());
            return Ok(image);
        }

        match response.text() {
            Some(text) if !text.trim().is_empty() => {
                log::warn!("Image model returned text instead of an image");
                Err(GenerationError::GenerationDeclined(text.trim().to_string()))
            }
            _ => Err(GenerationError::NoImageCapability),
        }
    }
}

#[async_trait]
impl DishImageResolver for GeminiImageGenerator {
    fn strategy(&self) -> DishImageStrategy {
        DishImageStrategy::Generation
    }

    async fn resolve(&self, dish: &Dish) -> DishImage {
        let prompt = build_dish_image_prompt(dish);
        match self.generate(&prompt).await {
            Ok(image) => DishImage::Generated(image),
            Err(e) => {
                log::error!("Dish image generation failed: {}", e);
                DishImage::Failed(e.user_message())
            }
        }
    }
}

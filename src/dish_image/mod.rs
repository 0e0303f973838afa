//! 料理画像モジュール
//!
//! 抽出した料理に参考画像を付ける。方式は検索（実写真のURL）か生成（合成画像）の
//! どちらか一方で、設定 `dish_image_strategy` で選ぶ。失敗しても解析結果の表示は止めない。

mod generation;
mod search;

pub use generation::GeminiImageGenerator;
pub use search::GoogleImageSearch;

use crate::config::{Config, DishImageStrategy};
use async_trait::async_trait;
use base64::Engine as _;
use menu_lens_common::{Dish, CUISINE_SEARCH_TERM};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// 1品分の画像解決結果
#[derive(Debug, Clone, PartialEq)]
pub enum DishImage {
    /// 検索で見つかった画像URL
    Link(String),
    /// 生成された画像
    Generated(GeneratedImage),
    /// 画像なし（検索の失敗はすべてここ）
    Unavailable,
    /// 生成に失敗（その料理だけに表示する）
    Failed(String),
}

/// 生成画像（インラインのBase64データ）
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>, GenerationError> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| GenerationError::Malformed(format!("Base64デコード失敗: {}", e)))
    }

    fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }

    /// ディレクトリに保存して書き込んだパスを返す
    pub fn save(&self, dir: &Path, file_stem: &str) -> crate::error::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", file_stem, self.extension()));
        std::fs::write(&path, self.decode()?)?;
        log::info!("Generated image saved: {}", path.display());
        Ok(path)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("画像生成のAPIキーが設定されていません")]
    MissingCredential,

    /// モデルが画像の代わりにテキストを返した
    #[error("画像生成が断られました: {0}")]
    GenerationDeclined(String),

    #[error("画像が返されませんでした（モデルが画像出力に対応していない可能性）")]
    NoImageCapability,

    #[error("画像生成APIエラー (status {status})")]
    Http { status: u16 },

    #[error("画像生成の通信に失敗: {0}")]
    Network(String),

    #[error("画像生成の応答が不正: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// その料理の欄に出す短い文言
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::MissingCredential => "APIキー未設定のため画像を生成できません".into(),
            GenerationError::GenerationDeclined(_) => "この料理の画像は生成できませんでした".into(),
            GenerationError::NoImageCapability => "画像生成に対応していないモデルです".into(),
            GenerationError::Http { status: 429 } => "利用制限中です。少し待ってから再度お試しください".into(),
            GenerationError::Http { status } => format!("画像生成に失敗しました (HTTP {})", status),
            GenerationError::Network(_) | GenerationError::Malformed(_) => "画像生成に失敗しました".into(),
        }
    }
}

/// 料理画像の解決口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DishImageResolver: Send + Sync {
    fn strategy(&self) -> DishImageStrategy;

    /// 1品分を解決する（失敗は `Unavailable`/`Failed` に落とし、エラーにはしない）
    async fn resolve(&self, dish: &Dish) -> DishImage;
}

/// 設定された方式の解決口を作る
pub fn resolver_from_config(config: &Config) -> Arc<dyn DishImageResolver> {
    match config.dish_image_strategy {
        DishImageStrategy::Search => Arc::new(GoogleImageSearch::new(config)),
        DishImageStrategy::Generation => Arc::new(GeminiImageGenerator::new(config)),
    }
}

/// 常に使えるGoogle画像検索へのリンク
pub fn google_images_link(dish: &Dish) -> String {
    let query = format!("{} {} {}", dish.original_name, dish.translated_name, CUISINE_SEARCH_TERM);
    match reqwest::Url::parse_with_params("https://www.google.com/search", &[("q", query.as_str()), ("tbm", "isch")]) {
        Ok(url) => url.to_string(),
        Err(_) => "https://www.google.com/search?tbm=isch".to_string(),
    }
}

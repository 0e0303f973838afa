use crate::error::{MenuLensError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Gemini APIキーの環境変数（`API_KEY` も受け付ける）
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_API_KEY_ALIAS: &str = "API_KEY";
pub const ENV_SEARCH_API_KEY: &str = "GOOGLE_SEARCH_API_KEY";
pub const ENV_SEARCH_ENGINE_ID: &str = "GOOGLE_SEARCH_ENGINE_ID";

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SEARCH_API_BASE: &str = "https://www.googleapis.com";

/// 料理画像の取得方式（どちらか一方のみ有効）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DishImageStrategy {
    /// 画像検索APIで実写真のURLを取得（全料理、並行）
    #[default]
    Search,
    /// 画像生成APIで1品ずつ生成（指定時のみ）
    Generation,
}

impl std::fmt::Display for DishImageStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DishImageStrategy::Search => write!(f, "search"),
            DishImageStrategy::Generation => write!(f, "generation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 背面カメラのデバイス（例: /dev/video2）
    pub rear_device: Option<String>,
    /// 背面カメラが使えないときのデバイス
    pub fallback_device: String,
    /// 希望する横幅（高さは16:9で決める）
    pub ideal_width: u32,
    pub ffmpeg_path: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rear_device: None,
            fallback_device: "/dev/video0".into(),
            ideal_width: 1920,
            ffmpeg_path: "ffmpeg".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub model: String,
    pub image_model: String,
    pub gemini_api_base: String,
    pub search_api_base: String,
    pub max_image_edge: u32,
    /// JPEG品質 (1-100)
    pub jpeg_quality: u8,
    pub dish_image_strategy: DishImageStrategy,
    /// 検索クエリに含める店名
    pub establishment: Option<String>,
    /// 未設定ならHTTPクライアントの既定（タイムアウトなし）
    pub timeout_seconds: Option<u64>,
    pub camera: CameraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            search_api_key: None,
            search_engine_id: None,
            model: "gemini-2.5-flash".into(),
            image_model: "gemini-2.5-flash-image".into(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.into(),
            search_api_base: DEFAULT_SEARCH_API_BASE.into(),
            max_image_edge: 1024,
            jpeg_quality: 60,
            dish_image_strategy: DishImageStrategy::Search,
            establishment: None,
            timeout_seconds: None,
            camera: CameraConfig::default(),
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書きする
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env();
        Ok(config)
    }

    /// 設定ファイルの内容だけを読む
    ///
    /// `save` で書き戻す設定はこちらから作る（環境変数のキーをファイルに残さない）。
    pub fn load_file() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        log::info!("Config saved: {}", config_path.display());
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MenuLensError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("menu-lens").join("config.json"))
    }

    /// 環境変数を優先
    pub fn apply_env(&mut self) {
        if let Some(key) = env_value(ENV_GEMINI_API_KEY).or_else(|| env_value(ENV_GEMINI_API_KEY_ALIAS)) {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = env_value(ENV_SEARCH_API_KEY) {
            self.search_api_key = Some(key);
        }
        if let Some(id) = env_value(ENV_SEARCH_ENGINE_ID) {
            self.search_engine_id = Some(id);
        }
    }

    pub fn has_gemini_api_key(&self) -> bool {
        non_empty(&self.gemini_api_key).is_some()
    }

    pub fn has_search_credentials(&self) -> bool {
        non_empty(&self.search_api_key).is_some() && non_empty(&self.search_engine_id).is_some()
    }

    /// `--show` 用の表示
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("モデル", self.model.clone()),
            ("画像生成モデル", self.image_model.clone()),
            ("最大画像サイズ", format!("{}px", self.max_image_edge)),
            ("JPEG品質", format!("{}", self.jpeg_quality)),
            ("料理画像", self.dish_image_strategy.to_string()),
            ("Gemini APIキー", mask_secret(&self.gemini_api_key)),
            ("検索APIキー", mask_secret(&self.search_api_key)),
            ("検索エンジンID", self.search_engine_id.clone().unwrap_or_else(|| "未設定".into())),
            ("店名", self.establishment.clone().unwrap_or_else(|| "未設定".into())),
        ]
    }
}

/// クライアント生成時に確定する資格情報
///
/// 未設定かどうかはネットワークに出る前に同期的に判定できる。
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Configured(String),
    Unconfigured,
}

impl Credential {
    pub fn from_option(value: &Option<String>) -> Self {
        match non_empty(value) {
            Some(v) => Credential::Configured(v.to_string()),
            None => Credential::Unconfigured,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Credential::Configured(key) => Some(key),
            Credential::Unconfigured => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Credential::Configured(_))
    }
}

// キーはDebug出力にも出さない
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Configured(_) => write!(f, "Configured(***)"),
            Credential::Unconfigured => write!(f, "Unconfigured"),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 先頭4文字だけ残して伏せる
pub fn mask_secret(value: &Option<String>) -> String {
    match non_empty(value) {
        Some(v) => {
            let head: String = v.chars().take(4).collect();
            format!("設定済み ({}...)", head)
        }
        None => "未設定".into(),
    }
}

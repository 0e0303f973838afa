use crate::acquisition::CameraError;
use crate::dish_image::GenerationError;
use crate::normalizer::NormalizeError;
use menu_lens_common::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuLensError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("カメラエラー: {0}")]
    Camera(#[from] CameraError),

    #[error("画像処理エラー: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("解析エラー: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("画像生成エラー: {0}")]
    Generation(#[from] GenerationError),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<dialoguer::Error> for MenuLensError {
    fn from(e: dialoguer::Error) -> Self {
        MenuLensError::Prompt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MenuLensError>;

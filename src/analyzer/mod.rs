//! メニュー解析モジュール
//!
//! 正規化済み画像をマルチモーダルモデルに送り、構造化された料理一覧を得る。
//! 失敗はHTTP境界で一度だけ `AnalysisError` に分類する。

mod classify;
mod gemini;
pub(crate) mod wire;

pub use gemini::GeminiMenuClient;

use crate::normalizer::CapturedImage;
use async_trait::async_trait;
use menu_lens_common::{AnalysisError, MenuAnalysisResult};

/// メニュー解析の呼び出し口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuAnalyzer: Send + Sync {
    async fn analyze(&self, image: &CapturedImage) -> Result<MenuAnalysisResult, AnalysisError>;
}

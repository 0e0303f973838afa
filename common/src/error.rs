//! エラー型定義
//!
//! メニュー解析経路のエラー分類。`Display` は診断ログ用、
//! `user_message()` は画面に出す文言。

use thiserror::Error;

/// 解析失敗時の汎用メッセージ
pub const GENERIC_FAILURE_MESSAGE: &str =
    "メニューの解析に失敗しました。インターネット接続を確認するか、写真が鮮明か確認してください。";

/// メニュー解析エラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("credential not configured: {0}")]
    MissingCredential(String),

    #[error("rate limited by analysis service: {0}")]
    RateLimited(String),

    #[error("analysis service overloaded: {0}")]
    ServiceOverloaded(String),

    #[error("permission denied by analysis service: {0}")]
    PermissionDenied(String),

    #[error("analysis service returned an empty response")]
    EmptyResponse,

    /// `raw` は診断ログ専用（利用者には表示しない）
    #[error("malformed analysis output: {reason}")]
    MalformedOutput { reason: String, raw: String },

    #[error("network or unknown failure: {0}")]
    NetworkOrUnknown(String),
}

impl AnalysisError {
    /// 利用者向けメッセージ
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::MissingCredential(_) => {
                "設定エラー: APIキーが見つかりません。環境変数 GEMINI_API_KEY を設定するか、`menu-lens config --set-api-key` で設定してください。"
            }
            AnalysisError::RateLimited(_) => {
                "短時間に利用しすぎたようです。1分ほど待ってから再度お試しください。"
            }
            AnalysisError::ServiceOverloaded(_) => {
                "サーバーが混み合っています。少し待ってから再度お試しください。"
            }
            AnalysisError::PermissionDenied(_) => {
                "APIキーの権限エラーです。Google Cloud ConsoleでAPIキーの制限設定（リファラー・API制限）を確認してください。"
            }
            AnalysisError::EmptyResponse
            | AnalysisError::MalformedOutput { .. }
            | AnalysisError::NetworkOrUnknown(_) => GENERIC_FAILURE_MESSAGE,
        }
    }

    /// 時間をおいた再試行で解消し得るか
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::RateLimited(_)
                | AnalysisError::ServiceOverloaded(_)
                | AnalysisError::NetworkOrUnknown(_)
                | AnalysisError::EmptyResponse
                | AnalysisError::MalformedOutput { .. }
        )
    }

    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        AnalysisError::MalformedOutput {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, AnalysisError>;

//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use menu_lens::acquisition::{select_file, CameraError};
use menu_lens::error::MenuLensError;
use menu_lens::normalizer::{normalize_file, NormalizeError, NormalizeOptions};
use menu_lens::AnalysisError;
use menu_lens_common::GENERIC_FAILURE_MESSAGE;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないファイルを選択した場合
#[tokio::test]
async fn test_select_nonexistent_file() {
    let result = select_file(Path::new("/nonexistent/path/menu.jpg")).await;
    assert!(matches!(result, Err(MenuLensError::FileNotFound(_))));
}

/// 画像でないファイルは選択できるが正規化で失敗する
#[tokio::test]
async fn test_non_image_file_fails_at_normalization() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("menu.txt");
    std::fs::write(&path, "hello").unwrap();

    assert!(select_file(&path).await.is_ok());

    let err = normalize_file(&path, NormalizeOptions::default()).await.unwrap_err();
    assert!(matches!(err, NormalizeError::Decode(_)));
}

/// 分類ごとに利用者向けメッセージが異なる
#[test]
fn test_user_messages_are_distinct() {
    let messages = [
        AnalysisError::MissingCredential("GEMINI_API_KEY".into()).user_message(),
        AnalysisError::RateLimited("quota".into()).user_message(),
        AnalysisError::ServiceOverloaded("busy".into()).user_message(),
        AnalysisError::PermissionDenied("referrer".into()).user_message(),
        AnalysisError::NetworkOrUnknown("reset".into()).user_message(),
    ];

    for (i, a) in messages.iter().enumerate() {
        for b in &messages[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

/// 解析できなかった応答は汎用メッセージ
#[test]
fn test_malformed_and_empty_use_generic_message() {
    assert_eq!(AnalysisError::EmptyResponse.user_message(), GENERIC_FAILURE_MESSAGE);
    assert_eq!(
        AnalysisError::malformed("no braces", "Sorry, I cannot read this menu.").user_message(),
        GENERIC_FAILURE_MESSAGE
    );
}

/// 生の応答は利用者向けの文言にも Display にも出ない
#[test]
fn test_raw_output_is_not_displayed() {
    let err = AnalysisError::malformed("parse error", "SECRET RAW TEXT");
    assert!(!err.to_string().contains("SECRET RAW TEXT"));
    assert!(!err.user_message().contains("SECRET RAW TEXT"));
}

/// 権限エラーだけは再試行では直らない
#[test]
fn test_retryable_classification() {
    assert!(AnalysisError::RateLimited("q".into()).is_retryable());
    assert!(AnalysisError::ServiceOverloaded("b".into()).is_retryable());
    assert!(!AnalysisError::PermissionDenied("p".into()).is_retryable());
    assert!(!AnalysisError::MissingCredential("k".into()).is_retryable());
}

/// MenuLensErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        MenuLensError::Config("テスト設定エラー".to_string()),
        MenuLensError::FileNotFound("menu.jpg".to_string()),
        MenuLensError::Camera(CameraError::Closed),
        MenuLensError::Normalize(NormalizeError::Encode("失敗".to_string())),
        MenuLensError::Analysis(AnalysisError::EmptyResponse),
        MenuLensError::Prompt("中断".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 下位エラーからの変換
#[test]
fn test_error_from_conversions() {
    let err: MenuLensError = CameraError::CapabilityUnavailable {
        rear: "not found".into(),
        any: "busy".into(),
    }
    .into();
    assert!(err.to_string().contains("カメラ"));

    let err: MenuLensError = std::io::Error::new(std::io::ErrorKind::NotFound, "not found").into();
    assert!(matches!(err, MenuLensError::Io(_)));

    let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
    let err: MenuLensError = json_err.into();
    assert!(matches!(err, MenuLensError::JsonParse(_)));
}

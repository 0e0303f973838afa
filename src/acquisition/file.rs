use super::RawCapture;
use crate::error::{MenuLensError, Result};
use std::path::Path;

/// 利用者が選んだ画像ファイルを読み込む
///
/// 形式やサイズの検証はしない（デコードできなければ正規化で失敗する）。
pub async fn select_file(path: &Path) -> Result<RawCapture> {
    if !path.is_file() {
        return Err(MenuLensError::FileNotFound(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await?;
    log::info!("Selected file: {} ({} bytes)", path.display(), bytes.len());
    Ok(RawCapture::Encoded(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_select_missing_file() {
        let err = select_file(Path::new("/nonexistent/menu.jpg")).await.unwrap_err();
        assert!(matches!(err, MenuLensError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_select_directory_is_rejected() {
        let dir = tempdir().unwrap();
        let err = select_file(dir.path()).await.unwrap_err();
        assert!(matches!(err, MenuLensError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_select_any_file_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("menu.heic");
        std::fs::write(&path, b"opaque").unwrap();

        match select_file(&path).await.unwrap() {
            RawCapture::Encoded(bytes) => assert_eq!(bytes, b"opaque"),
            other => panic!("unexpected capture: {:?}", other),
        }
    }
}

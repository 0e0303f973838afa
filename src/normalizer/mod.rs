//! 画像正規化モジュール
//!
//! アップロード量を抑えるため、長辺を上限（既定1024px）まで縮小し、
//! 固定品質のJPEGに再エンコードしてBase64化する。拡大はしない。

mod orientation;

use crate::acquisition::RawCapture;
use crate::config::Config;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

pub use orientation::{apply_orientation, read_orientation};

/// 長辺の上限（px）
pub const MAX_EDGE: u32 = 1024;
/// JPEG品質（0.6 相当）
pub const JPEG_QUALITY: u8 = 60;
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("画像をデコードできません: {0}")]
    Decode(String),

    #[error("描画サーフェスを確保できません ({width}x{height})")]
    RenderSurfaceUnavailable { width: u32, height: u32 },

    #[error("JPEGエンコードに失敗: {0}")]
    Encode(String),
}

/// 正規化オプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub max_edge: u32,
    pub quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_edge: MAX_EDGE,
            quality: JPEG_QUALITY,
        }
    }
}

impl From<&Config> for NormalizeOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_edge: config.max_image_edge.max(1),
            quality: config.jpeg_quality.clamp(1, 100),
        }
    }
}

/// 送信用に正規化済みの画像
///
/// 解析リクエストが終わるまでの一時データ。
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    bytes: Vec<u8>,
    base64: String,
    width: u32,
    height: u32,
}

impl CapturedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// data URI 接頭辞を含まないBase64
    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME_TYPE
    }

    /// 接頭辞を付け直した data URI
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", JPEG_MIME_TYPE, self.base64)
    }
}

/// 縮小後のサイズを計算
///
/// 縦横比を保ったまま長辺を `max_edge` に合わせる。両辺とも `max_edge` 以下ならそのまま。
pub fn scaled_dimensions(width: u32, height: u32, max_edge: u32) -> Result<(u32, u32), NormalizeError> {
    if width == 0 || height == 0 || max_edge == 0 {
        return Err(NormalizeError::RenderSurfaceUnavailable { width, height });
    }

    let longer = width.max(height);
    if longer <= max_edge {
        return Ok((width, height));
    }

    let shorter = width.min(height) as u64;
    let scaled_shorter = ((shorter * max_edge as u64 + longer as u64 / 2) / longer as u64).max(1) as u32;

    if width >= height {
        Ok((max_edge, scaled_shorter))
    } else {
        Ok((scaled_shorter, max_edge))
    }
}

/// ビットマップを正規化
pub fn normalize(image: &DynamicImage, options: NormalizeOptions) -> Result<CapturedImage, NormalizeError> {
    let (width, height) = scaled_dimensions(image.width(), image.height(), options.max_edge)?;

    let resized = if (width, height) == (image.width(), image.height()) {
        image.to_rgb8()
    } else {
        image.resize_exact(width, height, FilterType::Triangle).to_rgb8()
    };

    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, options.quality);
        encoder
            .encode_image(&resized)
            .map_err(|e| NormalizeError::Encode(e.to_string()))?;
    }

    log::debug!(
        "Normalized image: {}x{} -> {}x{}, {} bytes",
        image.width(),
        image.height(),
        width,
        height,
        bytes.len()
    );

    let base64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(CapturedImage {
        bytes,
        base64,
        width,
        height,
    })
}

/// エンコード済み画像（ファイル内容）をデコードしてEXIFの向きを反映
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, NormalizeError> {
    let image = image::load_from_memory(bytes).map_err(|e| NormalizeError::Decode(e.to_string()))?;
    Ok(match read_orientation(bytes) {
        Some(orientation) => apply_orientation(image, orientation),
        None => image,
    })
}

/// 取得した画像を正規化（デコード・縮小はブロッキングスレッドで行う）
///
/// 呼び出し側がfutureを破棄した場合、結果は捨てられる。
pub async fn normalize_capture(capture: RawCapture, options: NormalizeOptions) -> Result<CapturedImage, NormalizeError> {
    tokio::task::spawn_blocking(move || match capture {
        RawCapture::Frame(frame) => normalize(&DynamicImage::ImageRgb8(frame), options),
        RawCapture::Encoded(bytes) => {
            let image = decode_bytes(&bytes)?;
            normalize(&image, options)
        }
    })
    .await
    .map_err(|e| NormalizeError::Encode(format!("正規化タスクが中断されました: {}", e)))?
}

/// ファイルから読み込んで正規化
pub async fn normalize_file(path: &Path, options: NormalizeOptions) -> Result<CapturedImage, NormalizeError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| NormalizeError::Decode(format!("{}: {}", path.display(), e)))?;
    normalize_capture(RawCapture::Encoded(bytes), options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 120, 40])))
    }

    #[test]
    fn test_scaled_dimensions_no_upscale() {
        assert_eq!(scaled_dimensions(640, 480, 1024).unwrap(), (640, 480));
        assert_eq!(scaled_dimensions(1024, 1024, 1024).unwrap(), (1024, 1024));
        assert_eq!(scaled_dimensions(1, 1024, 1024).unwrap(), (1, 1024));
    }

    #[test]
    fn test_scaled_dimensions_landscape() {
        assert_eq!(scaled_dimensions(2000, 1000, 1024).unwrap(), (1024, 512));
        assert_eq!(scaled_dimensions(4032, 3024, 1024).unwrap(), (1024, 768));
    }

    #[test]
    fn test_scaled_dimensions_portrait() {
        assert_eq!(scaled_dimensions(3024, 4032, 1024).unwrap(), (768, 1024));
        assert_eq!(scaled_dimensions(1000, 3000, 1024).unwrap(), (341, 1024));
    }

    #[test]
    fn test_scaled_dimensions_extreme_aspect_keeps_one_pixel() {
        assert_eq!(scaled_dimensions(10000, 2, 1024).unwrap(), (1024, 1));
    }

    #[test]
    fn test_scaled_dimensions_aspect_within_one_pixel() {
        for (w, h) in [(1999u32, 1333u32), (3000, 1777), (1025, 7), (5000, 4999)] {
            let (nw, nh) = scaled_dimensions(w, h, 1024).unwrap();
            assert_eq!(nw.max(nh), 1024);
            let expected_shorter = w.min(h) as f64 * 1024.0 / w.max(h) as f64;
            assert!((nw.min(nh) as f64 - expected_shorter).abs() <= 1.0);
        }
    }

    #[test]
    fn test_scaled_dimensions_zero_size() {
        let err = scaled_dimensions(0, 100, 1024).unwrap_err();
        assert!(matches!(err, NormalizeError::RenderSurfaceUnavailable { width: 0, height: 100 }));
    }

    #[test]
    fn test_normalize_downscales_and_encodes_jpeg() {
        let captured = normalize(&solid(2000, 1000), NormalizeOptions::default()).unwrap();
        assert_eq!((captured.width(), captured.height()), (1024, 512));

        // JPEG SOI マーカー
        assert_eq!(&captured.bytes()[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(captured.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 512));
    }

    #[test]
    fn test_base64_has_no_data_uri_prefix() {
        let captured = normalize(&solid(32, 16), NormalizeOptions::default()).unwrap();
        assert!(!captured.base64().starts_with("data:"));
        assert!(captured.data_url().starts_with("data:image/jpeg;base64,"));

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(captured.base64())
            .unwrap();
        assert_eq!(decoded, captured.bytes());
    }

    #[test]
    fn test_normalize_rgba_input() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(20, 10, image::Rgba([1, 2, 3, 128])));
        let captured = normalize(&rgba, NormalizeOptions::default()).unwrap();
        assert_eq!((captured.width(), captured.height()), (20, 10));
    }

    #[test]
    fn test_decode_bytes_garbage() {
        let err = decode_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, NormalizeError::Decode(_)));
    }

    #[test]
    fn test_options_from_config() {
        let config = Config {
            max_image_edge: 800,
            jpeg_quality: 0,
            ..Config::default()
        };
        let options = NormalizeOptions::from(&config);
        assert_eq!(options.max_edge, 800);
        assert_eq!(options.quality, 1);
    }

    #[tokio::test]
    async fn test_normalize_capture_frame() {
        let frame = RgbImage::from_pixel(1920, 1080, Rgb([10, 20, 30]));
        let captured = normalize_capture(RawCapture::Frame(frame), NormalizeOptions::default())
            .await
            .unwrap();
        assert_eq!((captured.width(), captured.height()), (1024, 576));
    }

    #[tokio::test]
    async fn test_normalize_file_missing() {
        let err = normalize_file(Path::new("/nonexistent/menu.jpg"), NormalizeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizeError::Decode(_)));
    }
}

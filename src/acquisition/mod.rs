//! 画像取得モジュール
//!
//! カメラ（背面カメラ優先、失敗時は任意の映像入力）またはファイル選択から画像を得る。
//!
//! カメラは排他的なOS資源なので、`CameraSession` が生きている間だけ保持し、
//! `close()` か `Drop` のどちらか一度だけで必ず解放する。

mod ffmpeg;
mod file;

pub use ffmpeg::FfmpegCamera;
pub use file::select_file;

use async_trait::async_trait;
use image::RgbImage;
use thiserror::Error;

/// 取得直後の画像（正規化前）
#[derive(Debug, Clone)]
pub enum RawCapture {
    /// カメラのフレーム（ネイティブ解像度）
    Frame(RgbImage),
    /// 選択されたファイルの中身（形式は問わない）
    Encoded(Vec<u8>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("カメラデバイスが見つかりません: {0}")]
    DeviceNotFound(String),

    #[error("カメラへのアクセスが許可されていません: {0}")]
    PermissionDenied(String),

    #[error("カメラを扱うバックエンドが利用できません: {0}")]
    BackendUnavailable(String),

    #[error("映像ストリームが終了しました: {0}")]
    StreamEnded(String),

    #[error("カメラが利用できません（背面: {rear} / その他: {any}）")]
    CapabilityUnavailable { rear: String, any: String },

    #[error("カメラは既に解放されています")]
    Closed,
}

/// ストリームの要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRequest {
    /// 背面カメラ（希望する横幅つき）
    Rear { ideal_width: u32 },
    /// 利用可能な任意の映像入力
    Any,
}

/// 開いている映像ストリーム
#[async_trait]
pub trait VideoStream: Send {
    /// フレームのネイティブ解像度
    fn dimensions(&self) -> (u32, u32);

    /// 現在のフレームを取り出す
    async fn grab_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// デバイスを解放する（全トラック停止）
    fn stop(&mut self);
}

/// 映像入力の提供元
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn open(&self, request: &StreamRequest) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// カメラ利用中のスコープ
pub struct CameraSession {
    stream: Option<Box<dyn VideoStream>>,
    label: &'static str,
}

impl CameraSession {
    fn new(stream: Box<dyn VideoStream>, label: &'static str) -> Self {
        log::info!("Camera opened ({}): {:?}", label, stream.dimensions());
        Self {
            stream: Some(stream),
            label,
        }
    }

    /// 背面カメラで開けたか
    pub fn is_rear(&self) -> bool {
        self.label == "rear"
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.stream.as_ref().map(|s| s.dimensions())
    }

    /// 現在のフレームをネイティブ解像度で取り込む
    pub async fn capture(&mut self) -> Result<RawCapture, CameraError> {
        let stream = self.stream.as_mut().ok_or(CameraError::Closed)?;
        let (width, height) = stream.dimensions();
        let frame = stream.grab_frame().await?;

        if frame.dimensions() != (width, height) {
            return Err(CameraError::StreamEnded(format!(
                "フレームサイズ不一致: {:?} != {:?}",
                frame.dimensions(),
                (width, height)
            )));
        }
        Ok(RawCapture::Frame(frame))
    }

    /// 明示的に解放する
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::info!("Camera released ({})", self.label);
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// 希望する撮影条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub ideal_width: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self { ideal_width: 1920 }
    }
}

/// カメラを開く
///
/// 背面カメラを試し、失敗したら任意の映像入力にフォールバックする。
/// 両方失敗したら `CapabilityUnavailable`（呼び出し側はファイル選択を案内する）。
pub async fn open_camera(
    source: &dyn VideoSource,
    constraints: CameraConstraints,
) -> Result<CameraSession, CameraError> {
    let rear_request = StreamRequest::Rear {
        ideal_width: constraints.ideal_width,
    };

    let rear_err = match source.open(&rear_request).await {
        Ok(stream) => return Ok(CameraSession::new(stream, "rear")),
        Err(e) => e,
    };
    log::warn!("Rear camera not available, falling back to any video input: {}", rear_err);

    match source.open(&StreamRequest::Any).await {
        Ok(stream) => Ok(CameraSession::new(stream, "any")),
        Err(any_err) => {
            log::error!("No video input available: {}", any_err);
            Err(CameraError::CapabilityUnavailable {
                rear: rear_err.to_string(),
                any: any_err.to_string(),
            })
        }
    }
}

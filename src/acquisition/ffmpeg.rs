//! ffmpeg 子プロセスによるカメラ入力（V4L2）
//!
//! rawvideo (rgb24) を標準出力に流させる。出力はデバイスが決めたネイティブ解像度のままで、
//! サイズは ffmpeg が stderr に出す出力ストリーム行から読む。
//! 標準出力は専用タスクが読み続け、最新フレームだけを watch チャネルに置く。

use super::{CameraError, StreamRequest, VideoSource, VideoStream};
use crate::config::CameraConfig;
use async_trait::async_trait;
use image::RgbImage;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 起動して出力サイズが分かるまで
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
/// 最初のフレームが届くまで
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(10);
/// `-video_size` に渡す横幅の上限（8K）
const MAX_HINT_WIDTH: u32 = 7680;

type LatestFrame = Option<Arc<RgbImage>>;

pub struct FfmpegCamera {
    program: String,
    rear_device: Option<String>,
    fallback_device: String,
}

impl FfmpegCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            program: config.ffmpeg_path.clone(),
            rear_device: config.rear_device.clone(),
            fallback_device: config.fallback_device.clone(),
        }
    }

    fn device_for(&self, request: &StreamRequest) -> Result<&str, CameraError> {
        let device = match request {
            StreamRequest::Rear { .. } => self
                .rear_device
                .as_deref()
                .ok_or_else(|| CameraError::DeviceNotFound("背面カメラが設定されていません".into()))?,
            StreamRequest::Any => self.fallback_device.as_str(),
        };

        if !Path::new(device).exists() {
            return Err(CameraError::DeviceNotFound(device.to_string()));
        }
        Ok(device)
    }

    /// ffmpeg の引数
    ///
    /// `size_hint` はドライバへの希望で、出力は拡大縮小しない。
    pub fn build_args(device: &str, size_hint: Option<(u32, u32)>) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-nostats".into(),
            "-loglevel".into(),
            "info".into(),
            "-f".into(),
            "v4l2".into(),
        ];
        if let Some((width, height)) = size_hint {
            args.push("-video_size".into());
            args.push(format!("{}x{}", width, height));
        }
        args.extend([
            "-i".into(),
            device.into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
            "-".into(),
        ]);
        args
    }
}

/// 要求に対する解像度の希望（背面は16:9、偶数に丸める。任意入力は指定なし）
pub(crate) fn size_hint(request: &StreamRequest) -> Option<(u32, u32)> {
    match request {
        StreamRequest::Rear { ideal_width } => {
            let width = (*ideal_width).clamp(2, MAX_HINT_WIDTH) & !1;
            let height = ((u64::from(width) * 9 / 16) as u32).max(2) & !1;
            Some((width, height))
        }
        StreamRequest::Any => None,
    }
}

/// `Stream #0:0: Video: rawvideo (RGB[24] / 0x18424752), rgb24, 640x480, ...` から解像度を取る
pub(crate) fn parse_stream_size(line: &str) -> Option<(u32, u32)> {
    if !line.contains("Stream #") || !line.contains("Video:") {
        return None;
    }
    line.split(|c: char| c == ',' || c.is_whitespace()).find_map(|token| {
        let (width, height) = token.split_once('x')?;
        let width: u32 = width.parse().ok()?;
        let height: u32 = height.parse().ok()?;
        (width > 0 && height > 0).then_some((width, height))
    })
}

/// 起動失敗時の stderr 最終行からエラーを決める
fn startup_failure(last_line: &str) -> CameraError {
    let detail = if last_line.is_empty() {
        "ffmpeg が出力前に終了しました".to_string()
    } else {
        last_line.to_string()
    };
    if last_line.contains("Permission denied") {
        CameraError::PermissionDenied(detail)
    } else if last_line.contains("No such file or directory") || last_line.contains("No such device") {
        CameraError::DeviceNotFound(detail)
    } else {
        CameraError::StreamEnded(detail)
    }
}

/// 出力ストリームの解像度が出るまで stderr を読む
async fn read_output_size<R>(lines: &mut Lines<R>) -> Result<(u32, u32), CameraError>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut in_output = false;
    let mut last_line = String::new();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                log::debug!("ffmpeg: {}", line);
                if line.starts_with("Output #") {
                    in_output = true;
                } else if in_output {
                    if let Some(size) = parse_stream_size(&line) {
                        return Ok(size);
                    }
                }
                if !line.trim().is_empty() {
                    last_line = line.trim().to_string();
                }
            }
            Ok(None) => return Err(startup_failure(&last_line)),
            Err(e) => return Err(CameraError::StreamEnded(e.to_string())),
        }
    }
}

/// 標準出力を読み続けて最新フレームを置く
fn spawn_frame_reader<R>(mut reader: R, width: u32, height: u32) -> (JoinHandle<()>, watch::Receiver<LatestFrame>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = watch::channel(None);
    let frame_len = width as usize * height as usize * 3;

    let handle = tokio::spawn(async move {
        loop {
            let mut buffer = vec![0u8; frame_len];
            if let Err(e) = reader.read_exact(&mut buffer).await {
                log::debug!("Camera frame reader stopped: {}", e);
                break;
            }
            let Some(frame) = RgbImage::from_raw(width, height, buffer) else {
                break;
            };
            tx.send_replace(Some(Arc::new(frame)));
        }
    });
    (handle, rx)
}

/// 届いている最新フレーム。まだなければ次の1枚を待つ
async fn latest_frame(frames: &mut watch::Receiver<LatestFrame>) -> Result<RgbImage, CameraError> {
    let ended = || CameraError::StreamEnded("フレームを読めません（デバイス使用中または権限なしの可能性）".into());

    loop {
        frames.has_changed().map_err(|_| ended())?;
        let latest = frames.borrow_and_update().clone();
        if let Some(frame) = latest {
            return Ok(frame.as_ref().clone());
        }
        frames.changed().await.map_err(|_| ended())?;
    }
}

#[async_trait]
impl VideoSource for FfmpegCamera {
    async fn open(&self, request: &StreamRequest) -> Result<Box<dyn VideoStream>, CameraError> {
        let device = self.device_for(request)?;
        let args = Self::build_args(device, size_hint(request));

        log::debug!("Spawning {} for {} (hint {:?})", self.program, device, size_hint(request));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => CameraError::PermissionDenied(e.to_string()),
                _ => CameraError::BackendUnavailable(format!("{}: {}", self.program, e)),
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(CameraError::BackendUnavailable("標準出力を取得できません".into()));
        };

        let mut log_lines = BufReader::new(stderr).lines();
        let (width, height) = match tokio::time::timeout(STARTUP_TIMEOUT, read_output_size(&mut log_lines)).await {
            Ok(Ok(size)) => size,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(CameraError::StreamEnded("カメラの起動がタイムアウトしました".into())),
        };
        log::debug!("Negotiated camera size: {}x{}", width, height);

        let log_drain = spawn_log_drain(log_lines);
        let (reader, frames) = spawn_frame_reader(stdout, width, height);

        let mut stream = FfmpegStream {
            child: Some(child),
            reader: Some(reader),
            log_drain: Some(log_drain),
            frames,
            width,
            height,
        };

        // 最初のフレームが届くまでは開けたとみなさない
        let first = tokio::time::timeout(FIRST_FRAME_TIMEOUT, latest_frame(&mut stream.frames)).await;
        match first {
            Ok(Ok(_)) => Ok(Box::new(stream)),
            Ok(Err(e)) => {
                stream.stop();
                Err(e)
            }
            Err(_) => {
                stream.stop();
                Err(CameraError::StreamEnded("最初のフレームが届きません".into()))
            }
        }
    }
}

fn spawn_log_drain(mut lines: Lines<BufReader<ChildStderr>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            log::debug!("ffmpeg: {}", line);
        }
    })
}

struct FfmpegStream {
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
    log_drain: Option<JoinHandle<()>>,
    frames: watch::Receiver<LatestFrame>,
    width: u32,
    height: u32,
}

#[async_trait]
impl VideoStream for FfmpegStream {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    async fn grab_frame(&mut self) -> Result<RgbImage, CameraError> {
        if self.child.is_none() {
            return Err(CameraError::Closed);
        }
        latest_frame(&mut self.frames).await
    }

    fn stop(&mut self) {
        for task in [self.reader.take(), self.log_drain.take()].into_iter().flatten() {
            task.abort();
        }
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                log::warn!("Failed to stop camera process: {}", e);
            }
        }
    }
}

//! 取得 → 正規化 → 解析 → 料理画像 の流れ
//!
//! 料理画像は解析結果の表示後に1品ずつ独立して解決する。検索方式は全品を並行に、
//! 生成方式は利用者が選んだ1品だけ。どちらも失敗しても結果画面は維持する。

use crate::acquisition::RawCapture;
use crate::analyzer::{GeminiMenuClient, MenuAnalyzer};
use crate::config::{Config, DishImageStrategy};
use crate::dish_image::{resolver_from_config, DishImage, DishImageResolver};
use crate::normalizer::{normalize_capture, NormalizeOptions};
use crate::view::{MenuApp, ViewTicket};
use menu_lens_common::Dish;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// 画像を読めなかったときの文言
pub const IMAGE_LOAD_FAILURE_MESSAGE: &str =
    "画像を読み込めませんでした。別の写真でお試しください。";

/// 届いた料理画像
#[derive(Debug, Clone, PartialEq)]
pub struct DishImageUpdate {
    pub ticket: ViewTicket,
    pub index: usize,
    pub image: DishImage,
}

pub struct MenuFlow {
    analyzer: Arc<dyn MenuAnalyzer>,
    resolver: Arc<dyn DishImageResolver>,
    options: NormalizeOptions,
}

impl MenuFlow {
    pub fn new(
        analyzer: Arc<dyn MenuAnalyzer>,
        resolver: Arc<dyn DishImageResolver>,
        options: NormalizeOptions,
    ) -> Self {
        Self {
            analyzer,
            resolver,
            options,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(GeminiMenuClient::new(config)),
            resolver_from_config(config),
            NormalizeOptions::from(config),
        )
    }

    pub fn strategy(&self) -> DishImageStrategy {
        self.resolver.strategy()
    }

    /// 取得した画像を正規化して解析し、状態に反映する
    ///
    /// 結果画面になれば料理画像用のチケットを返す。
    pub async fn process(&self, app: &mut MenuApp, capture: RawCapture) -> Option<ViewTicket> {
        if !app.begin_processing() {
            return None;
        }

        let image = match normalize_capture(capture, self.options).await {
            Ok(image) => image,
            Err(e) => {
                log::error!("Normalization failed: {}", e);
                app.fail(IMAGE_LOAD_FAILURE_MESSAGE);
                return None;
            }
        };
        log::info!(
            "Normalized image: {}x{} ({} bytes)",
            image.width(),
            image.height(),
            image.bytes().len()
        );

        let outcome = self.analyzer.analyze(&image).await;
        app.complete(outcome)
    }

    /// 全料理の画像を並行に解決する（検索方式）
    ///
    /// 届いた順に受信側へ流す。順序は保証しない。
    pub fn spawn_dish_images(&self, ticket: ViewTicket, dishes: &[Dish]) -> mpsc::UnboundedReceiver<DishImageUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();

        for (index, dish) in dishes.iter().cloned().enumerate() {
            let resolver = Arc::clone(&self.resolver);
            let tx = tx.clone();
            tokio::spawn(async move {
                let image = resolver.resolve(&dish).await;
                // 受信側が閉じていれば画面はもうない
                let _ = tx.send(DishImageUpdate { ticket, index, image });
            });
        }
        rx
    }

    /// 1品だけ画像を解決して反映する（生成方式）
    pub async fn resolve_one(&self, app: &mut MenuApp, ticket: ViewTicket, index: usize) -> Option<DishImage> {
        let dish = app.results()?.result.dishes.get(index)?.clone();
        let image = self.resolver.resolve(&dish).await;

        if app.attach_dish_image(ticket, index, image.clone()) {
            Some(image)
        } else {
            None
        }
    }
}

/// 届いた料理画像を状態に反映する
pub fn apply_update(app: &mut MenuApp, update: DishImageUpdate) -> bool {
    app.attach_dish_image(update.ticket, update.index, update.image)
}

/// 生成画像を保存する
///
/// 生成画像でなければ `None`。保存の失敗はその料理の文言にして返し、結果画面は止めない。
pub fn save_generated_image(image: &DishImage, dir: &Path, index: usize) -> Option<Result<PathBuf, String>> {
    let DishImage::Generated(generated) = image else {
        return None;
    };
    let saved = generated.save(dir, &format!("dish-{}", index + 1)).map_err(|e| {
        log::error!("Failed to save generated image for dish {}: {}", index + 1, e);
        "画像を保存できませんでした".to_string()
    });
    Some(saved)
}

//! 画面状態
//!
//! 待機 → 処理中 → 結果 / エラー の4状態。結果画面を離れたあとに届いた
//! 料理画像は、発行済みの `ViewTicket` の世代が古いので捨てる。

mod render;

pub use render::{render_app, render_dish, render_results};

use crate::dish_image::DishImage;
use menu_lens_common::{AnalysisError, MenuAnalysisResult};

/// 結果画面
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub result: MenuAnalysisResult,
    /// `result.dishes` と同じ並び
    pub images: Vec<Option<DishImage>>,
}

impl ResultsView {
    fn new(result: MenuAnalysisResult) -> Self {
        let images = vec![None; result.dishes.len()];
        Self { result, images }
    }

    pub fn image(&self, index: usize) -> Option<&DishImage> {
        self.images.get(index).and_then(Option::as_ref)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Idle,
    Processing,
    Results(ResultsView),
    /// 利用者に見せるメッセージを1つだけ持つ
    Error(String),
}

/// 結果画面の世代
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewTicket(u64);

#[derive(Debug)]
pub struct MenuApp {
    state: AppState,
    epoch: u64,
}

impl Default for MenuApp {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuApp {
    pub fn new() -> Self {
        Self {
            state: AppState::Idle,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn results(&self) -> Option<&ResultsView> {
        match &self.state {
            AppState::Results(view) => Some(view),
            _ => None,
        }
    }

    /// 撮影・選択された画像の処理を始める
    ///
    /// 待機中以外から呼ばれた場合は何もしない。
    pub fn begin_processing(&mut self) -> bool {
        if self.state != AppState::Idle {
            log::warn!("begin_processing ignored in state {:?}", self.state_name());
            return false;
        }
        self.state = AppState::Processing;
        true
    }

    /// 解析結果を反映する
    ///
    /// 失敗時は部分的な結果を出さず、エラー状態にする。
    /// 処理中でなければ（やり直し済みなど）結果を捨てて `None`。
    pub fn complete(&mut self, outcome: Result<MenuAnalysisResult, AnalysisError>) -> Option<ViewTicket> {
        if self.state != AppState::Processing {
            log::debug!("Discarding analysis outcome in state {}", self.state_name());
            return None;
        }

        match outcome {
            Ok(result) => {
                log::info!("Analysis complete: {} ({} dishes)", result.cuisine_type, result.dish_count());
                self.epoch += 1;
                self.state = AppState::Results(ResultsView::new(result));
                Some(ViewTicket(self.epoch))
            }
            Err(e) => {
                log::error!("Analysis failed: {}", e);
                self.state = AppState::Error(e.user_message().to_string());
                None
            }
        }
    }

    /// 処理前の失敗（カメラ・正規化など）をエラー状態にする
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = AppState::Error(message.into());
    }

    /// 料理画像を反映する
    ///
    /// 世代が古い、結果画面でない、範囲外のいずれかなら捨てて `false`。
    pub fn attach_dish_image(&mut self, ticket: ViewTicket, index: usize, image: DishImage) -> bool {
        if ticket.0 != self.epoch {
            log::debug!("Discarding stale dish image (index {})", index);
            return false;
        }
        let AppState::Results(view) = &mut self.state else {
            log::debug!("Discarding dish image outside results view (index {})", index);
            return false;
        };
        match view.images.get_mut(index) {
            Some(slot) => {
                *slot = Some(image);
                true
            }
            None => false,
        }
    }

    /// 待機状態に戻る（発行済みのチケットは無効になる）
    pub fn retry(&mut self) {
        self.epoch += 1;
        self.state = AppState::Idle;
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            AppState::Idle => "idle",
            AppState::Processing => "processing",
            AppState::Results(_) => "results",
            AppState::Error(_) => "error",
        }
    }
}

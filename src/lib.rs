//! Menu Lens
//!
//! メニュー写真を撮影し、AIで料理名の翻訳・説明・円換算を行う。
//! 取得 → 正規化 → 解析 → 料理画像 の順に処理する。

pub mod acquisition;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod dish_image;
pub mod error;
pub mod flow;
pub mod logging;
pub mod normalizer;
pub mod view;

pub use menu_lens_common::{AnalysisError, Dish, MenuAnalysisResult};

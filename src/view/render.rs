//! 端末表示

use super::{AppState, MenuApp, ResultsView};
use crate::dish_image::{google_images_link, DishImage};
use menu_lens_common::{format_yen, Dish};
use std::fmt::Write as _;

const RULE: &str = "────────────────────────────────────────";

/// 状態全体を文字列にする
pub fn render_app(app: &MenuApp) -> String {
    match app.state() {
        AppState::Idle => "メニューを撮影するか、画像ファイルを選んでください。\n".to_string(),
        AppState::Processing => "メニューを解析中...\n".to_string(),
        AppState::Results(view) => render_results(view),
        AppState::Error(message) => format!("エラー: {}\n", message),
    }
}

pub fn render_results(view: &ResultsView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "料理ジャンル: {}", view.result.cuisine_type);
    let _ = writeln!(out, "{} 個の料理が見つかりました", view.result.dish_count());

    for (index, dish) in view.result.dishes.iter().enumerate() {
        let _ = writeln!(out, "{}", RULE);
        out.push_str(&render_dish(index, dish, view.image(index)));
    }
    out
}

/// 1品分
pub fn render_dish(index: usize, dish: &Dish, image: Option<&DishImage>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}. {}", index + 1, dish.translated_name);
    let _ = writeln!(out, "   [{}]", dish.original_name);

    // 推定額が0なら価格ごと出さない
    if let Some(yen) = dish.display_yen() {
        match dish.printed_price() {
            Some(price) => {
                let _ = writeln!(out, "   {} ({})", format_yen(yen), price);
            }
            None => {
                let _ = writeln!(out, "   {}", format_yen(yen));
            }
        }
    }

    if !dish.description.is_empty() {
        let _ = writeln!(out, "   {}", dish.description);
    }
    if !dish.ingredients().is_empty() {
        let _ = writeln!(out, "   材料: {}", dish.ingredients().join("、"));
    }

    match image {
        Some(DishImage::Link(url)) => {
            let _ = writeln!(out, "   画像: {}", url);
        }
        Some(DishImage::Generated(generated)) => {
            let _ = writeln!(out, "   画像: 生成済み ({})", generated.mime_type);
        }
        Some(DishImage::Unavailable) => {
            let _ = writeln!(out, "   画像なし");
        }
        Some(DishImage::Failed(message)) => {
            let _ = writeln!(out, "   画像生成エラー: {}", message);
        }
        None => {}
    }
    let _ = writeln!(out, "   Google画像検索: {}", google_images_link(dish));
    out
}

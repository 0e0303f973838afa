//! プロンプト生成モジュール
//!
//! - SYSTEM_INSTRUCTION: 出力言語と翻訳・換算タスクを定めるシステム指示
//! - ANALYSIS_INSTRUCTION: 画像に添える短い指示
//! - response_schema: 構造化出力スキーマ
//! - build_search_query / build_dish_image_prompt: 料理画像取得用

use crate::types::Dish;
use serde_json::{json, Value};

/// システム指示（出力は日本語、円換算まで行う）
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful travel food guide for Japanese tourists. Analyze the menu image. Output strictly in Japanese.
1. Identify dishes, translate names to Japanese, and provide appetizing Japanese descriptions. Keep originalName exactly as printed on the menu.
2. Ensure the cuisine type is a standard Japanese term.
3. Extract the price for each dish as printed, including the currency symbol.
4. Identify the currency based on the menu context (country symbols, language) and convert the price to Japanese Yen (JPY) using an approximate current exchange rate.";

/// 画像に添える指示
pub const ANALYSIS_INSTRUCTION: &str = "Analyze this menu image. Extract the dishes. If the text is blurry or not a menu, try your best to identify food items. Output in JSON format.";

/// 画像検索クエリに付ける料理ジャンル語
pub const CUISINE_SEARCH_TERM: &str = "料理";

/// 構造化出力スキーマ（Gemini responseSchema 形式）
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "cuisineType": {
                "type": "STRING",
                "description": "The general cuisine type of the menu in Japanese (e.g., イタリア料理, タイ料理, 居酒屋). Do not use English."
            },
            "dishes": {
                "type": "ARRAY",
                "description": "List of identified dishes from the menu, in menu order.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "originalName": {
                            "type": "STRING",
                            "description": "The name of the dish as it appears on the menu (keep original language)."
                        },
                        "translatedName": {
                            "type": "STRING",
                            "description": "Natural Japanese translation of the dish name."
                        },
                        "description": {
                            "type": "STRING",
                            "description": "A short, appetizing description of the dish strictly in Japanese (approx 30-40 chars)."
                        },
                        "ingredients": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "List of main ingredients in Japanese."
                        },
                        "price": {
                            "type": "STRING",
                            "description": "The price string as found on the menu including symbol (e.g., '$15.00', '€12', '250 THB'). Return empty string if not found."
                        },
                        "estimatedYen": {
                            "type": "INTEGER",
                            "description": "Estimated price in Japanese Yen (JPY) based on the currency and an approximate current exchange rate. Return 0 if price is not found."
                        }
                    },
                    "required": ["originalName", "translatedName", "description", "price", "estimatedYen"]
                }
            }
        },
        "required": ["cuisineType", "dishes"]
    })
}

/// 画像検索クエリ
///
/// `原語名 訳名 [店名] 料理` の順に空白区切りで連結する。
pub fn build_search_query(dish: &Dish, establishment: Option<&str>) -> String {
    let mut terms: Vec<&str> = vec![dish.original_name.trim(), dish.translated_name.trim()];
    if let Some(name) = establishment.map(str::trim).filter(|n| !n.is_empty()) {
        terms.push(name);
    }
    terms.push(CUISINE_SEARCH_TERM);

    terms
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 料理写真生成プロンプト
pub fn build_dish_image_prompt(dish: &Dish) -> String {
    format!(
        "A delicious, professional food photography shot of: {} ({}). {} High resolution, appetizing lighting.",
        dish.original_name.trim(),
        dish.translated_name.trim(),
        dish.description.trim()
    )
}

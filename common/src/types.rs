//! メニュー解析結果の型定義
//!
//! - Dish: メニューから抽出した1品
//! - MenuAnalysisResult: 1枚のメニューの解析結果（料理はメニュー記載順）

use serde::{Deserialize, Serialize};

/// メニューから抽出した料理
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    /// メニューに印字された原文のままの料理名
    pub original_name: String,

    pub translated_name: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,

    /// 通貨記号付きの価格文字列（記載なしは空文字）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// 円換算の概算額。0 は「推定不可」
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_yen: Option<u64>,
}

impl Dish {
    /// 表示すべき円換算額（0 または未設定なら None）
    pub fn display_yen(&self) -> Option<u64> {
        self.estimated_yen.filter(|&yen| yen > 0)
    }

    /// 印字価格（空文字は None）
    pub fn printed_price(&self) -> Option<&str> {
        self.price
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn ingredients(&self) -> &[String] {
        self.ingredients.as_deref().unwrap_or(&[])
    }
}

/// メニュー解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuAnalysisResult {
    /// 料理ジャンル（表示言語のラベル）
    pub cuisine_type: String,

    /// メニュー記載順の料理
    pub dishes: Vec<Dish>,
}

impl MenuAnalysisResult {
    pub fn dish_count(&self) -> usize {
        self.dishes.len()
    }
}

/// 円表記（3桁区切り）
///
/// # Examples
/// ```
/// use menu_lens_common::format_yen;
///
/// assert_eq!(format_yen(1300), "¥1,300");
/// assert_eq!(format_yen(980), "¥980");
/// ```
pub fn format_yen(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("¥{}", grouped)
}

//! APIレスポンスパーサー
//!
//! スキーマ指定をしても前後に説明文やコードフェンスが付くことがあるため、
//! 最初の `{` から最後の `}` までだけを切り出してパースする。

use crate::error::{AnalysisError, Result};
use crate::types::MenuAnalysisResult;

/// レスポンスからJSONオブジェクト部分を抽出
///
/// 最初の `{` から最後の `}` まで（両端を含む）を返す。
///
/// # Examples
/// ```
/// use menu_lens_common::extract_json_object;
///
/// let text = "Here is the result: {\"a\": 1} Thanks!";
/// assert_eq!(extract_json_object(text), Some("{\"a\": 1}"));
/// assert_eq!(extract_json_object("no braces"), None);
/// ```
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

/// メニュー解析レスポンスをパース
///
/// # Returns
/// * `Ok(MenuAnalysisResult)` - パース成功
/// * `Err(EmptyResponse)` - テキストが空
/// * `Err(MalformedOutput)` - `{`/`}` がない、またはパース失敗（生テキストを保持）
pub fn parse_menu_response(response: &str) -> Result<MenuAnalysisResult> {
    if response.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    let json_str = extract_json_object(response)
        .ok_or_else(|| AnalysisError::malformed("JSONオブジェクトが見つかりません", response))?;

    serde_json::from_str(json_str)
        .map_err(|e| AnalysisError::malformed(format!("JSONパースエラー: {}", e), response))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU_JSON: &str = r#"{
        "cuisineType": "イタリア料理",
        "dishes": [
            {
                "originalName": "Margherita",
                "translatedName": "マルゲリータ",
                "description": "トマトとバジルのピザ",
                "ingredients": ["トマト", "バジル"],
                "price": "€8",
                "estimatedYen": 1300
            }
        ]
    }"#;

    // =============================================
    // extract_json_object テスト
    // =============================================

    #[test]
    fn test_extract_with_surrounding_text() {
        let response = format!("Here is the result: {} Thanks!", MENU_JSON);
        let json = extract_json_object(&response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert_eq!(json, MENU_JSON);
    }

    #[test]
    fn test_extract_from_code_fence() {
        let response = format!("```json\n{}\n```", MENU_JSON);
        assert_eq!(extract_json_object(&response), Some(MENU_JSON));
    }

    #[test]
    fn test_extract_uses_last_closing_brace() {
        let response = r#"prefix {"a": {"b": 1}} middle } suffix"#;
        assert_eq!(
            extract_json_object(response),
            Some(r#"{"a": {"b": 1}} middle }"#)
        );
    }

    #[test]
    fn test_extract_no_open_brace() {
        assert_eq!(extract_json_object("only text }"), None);
    }

    #[test]
    fn test_extract_reversed_braces() {
        assert_eq!(extract_json_object("} then {"), None);
    }

    // =============================================
    // parse_menu_response テスト
    // =============================================

    #[test]
    fn test_parse_wrapped_response() {
        let response = format!("Sure! {} Enjoy your meal.", MENU_JSON);
        let result = parse_menu_response(&response).unwrap();
        assert_eq!(result.cuisine_type, "イタリア料理");
        assert_eq!(result.dishes.len(), 1);
        assert_eq!(result.dishes[0].estimated_yen, Some(1300));
        assert_eq!(result.dishes[0].original_name, "Margherita");
    }

    #[test]
    fn test_parse_empty_response() {
        assert_eq!(parse_menu_response(""), Err(AnalysisError::EmptyResponse));
        assert_eq!(parse_menu_response("  \n"), Err(AnalysisError::EmptyResponse));
    }

    #[test]
    fn test_parse_no_brace_is_malformed() {
        let err = parse_menu_response("I could not read this menu.").unwrap_err();
        match err {
            AnalysisError::MalformedOutput { raw, .. } => {
                assert_eq!(raw, "I could not read this menu.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_json_keeps_raw() {
        let response = "result: {cuisineType: broken} end";
        let err = parse_menu_response(response).unwrap_err();
        match err {
            AnalysisError::MalformedOutput { reason, raw } => {
                assert!(reason.contains("JSONパースエラー"));
                assert_eq!(raw, response);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_required_field() {
        let response = r#"{"cuisineType": "和食"}"#;
        let err = parse_menu_response(response).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedOutput { .. }));
    }
}

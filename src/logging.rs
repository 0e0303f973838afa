//! ログ初期化
//!
//! APIキーやレスポンス本文はログに出さない。出すのはステータスや長さなどのメタ情報のみ。

use std::io::Write;

/// env_logger を初期化する（`RUST_LOG` が優先）
pub fn init(verbose: bool) {
    let default_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    let _ = builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

/// URL中のクエリ値を伏せる（`key=...` など）
///
/// パラメータ名の完全一致のみ対象。解析できないURLはそのまま出さない。
pub fn redact_query_value(url: &str, param: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return "<invalid url>".to_string();
    };
    if !parsed.query_pairs().any(|(name, _)| name == param) {
        return parsed.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == param {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(&pairs);
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_middle_param() {
        let url = "https://example.com/v1?q=sushi&key=SECRET123&num=1";
        assert_eq!(
            redact_query_value(url, "key"),
            "https://example.com/v1?q=sushi&key=REDACTED&num=1"
        );
    }

    #[test]
    fn test_redact_last_param() {
        let url = "https://example.com/v1?q=sushi&key=SECRET123";
        assert_eq!(redact_query_value(url, "key"), "https://example.com/v1?q=sushi&key=REDACTED");
    }

    #[test]
    fn test_redact_missing_param() {
        let url = "https://example.com/v1?q=sushi";
        assert_eq!(redact_query_value(url, "key"), url);
    }

    #[test]
    fn test_redact_exact_name_only() {
        let url = "https://example.com/v1?apikey=visible&key=SECRET123";
        let redacted = redact_query_value(url, "key");
        assert!(redacted.contains("apikey=visible"));
        assert!(redacted.contains("key=REDACTED"));
        assert!(!redacted.contains("SECRET123"));
    }

    #[test]
    fn test_redact_repeated_and_encoded_value() {
        let url = "https://example.com/v1?key=A%26B&q=%E5%AF%BF%E5%8F%B8&key=C";
        let redacted = redact_query_value(url, "key");
        assert!(!redacted.contains("A%26B"));
        assert!(!redacted.contains("key=C"));
        let parsed = reqwest::Url::parse(&redacted).unwrap();
        let q: Vec<String> = parsed.query_pairs().filter(|(k, _)| k == "q").map(|(_, v)| v.into_owned()).collect();
        assert_eq!(q, vec!["寿司".to_string()]);
    }

    #[test]
    fn test_redact_invalid_url() {
        assert_eq!(redact_query_value("not a url key=SECRET", "key"), "<invalid url>");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}

//! 料理画像（検索・生成）のHTTPテスト

use menu_lens::config::{Config, DishImageStrategy};
use menu_lens::dish_image::{
    resolver_from_config, DishImage, GeminiImageGenerator, GenerationError, GoogleImageSearch,
};
use menu_lens::Dish;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn margherita() -> Dish {
    Dish {
        original_name: "Margherita".into(),
        translated_name: "マルゲリータ".into(),
        description: "トマトとモッツァレラのピザ".into(),
        ..Dish::default()
    }
}

fn search_config(server: &MockServer) -> Config {
    Config {
        search_api_key: Some("search-key".into()),
        search_engine_id: Some("cx-123".into()),
        search_api_base: server.uri(),
        ..Config::default()
    }
}

fn generation_config(server: &MockServer) -> Config {
    Config {
        gemini_api_key: Some("gemini-key".into()),
        gemini_api_base: server.uri(),
        dish_image_strategy: DishImageStrategy::Generation,
        ..Config::default()
    }
}

/// 最初の結果のリンクを返す
#[tokio::test]
async fn test_search_returns_first_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", "Margherita マルゲリータ Trattoria Roma 料理"))
        .and(query_param("cx", "cx-123"))
        .and(query_param("key", "search-key"))
        .and(query_param("searchType", "image"))
        .and(query_param("num", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"link": "https://example.com/margherita.jpg"},
                {"link": "https://example.com/other.jpg"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        establishment: Some("Trattoria Roma".into()),
        ..search_config(&server)
    };
    let image = resolver_from_config(&config).resolve(&margherita()).await;
    assert_eq!(image, DishImage::Link("https://example.com/margherita.jpg".into()));
}

/// 結果0件は None
#[tokio::test]
async fn test_search_zero_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "searchInformation": {"totalResults": "0"}
        })))
        .mount(&server)
        .await;

    let search = GoogleImageSearch::new(&search_config(&server));
    assert_eq!(search.search_image("Margherita マルゲリータ 料理").await, None);
}

/// エラーステータスも None（例外にしない）
#[tokio::test]
async fn test_search_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
        .mount(&server)
        .await;

    let search = GoogleImageSearch::new(&search_config(&server));
    assert_eq!(search.search_image("Margherita マルゲリータ 料理").await, None);
}

/// 検索エンジンID未設定なら通信しない
#[tokio::test]
async fn test_search_without_engine_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        search_engine_id: None,
        ..search_config(&server)
    };
    let image = resolver_from_config(&config).resolve(&margherita()).await;
    assert_eq!(image, DishImage::Unavailable);
}

/// インライン画像を返す
#[tokio::test]
async fn test_generation_returns_inline_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/models/gemini-2\.5-flash-image:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here is the photo."},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
            ]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let image = resolver_from_config(&generation_config(&server))
        .resolve(&margherita())
        .await;
    match image {
        DishImage::Generated(generated) => {
            assert_eq!(generated.mime_type, "image/png");
            assert_eq!(generated.data, "iVBORw0KGgo=");
        }
        other => panic!("unexpected image: {:?}", other),
    }

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Margherita"));
    assert!(prompt.contains("マルゲリータ"));
}

/// テキストだけなら GenerationDeclined
#[tokio::test]
async fn test_generation_declined() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "I can't create that image."}]}}]
        })))
        .mount(&server)
        .await;

    let generator = GeminiImageGenerator::new(&generation_config(&server));
    let err = generator.generate("a photo of pizza").await.unwrap_err();
    assert_eq!(err, GenerationError::GenerationDeclined("I can't create that image.".into()));
}

/// 何も返らなければ NoImageCapability
#[tokio::test]
async fn test_generation_without_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let generator = GeminiImageGenerator::new(&generation_config(&server));
    assert_eq!(
        generator.generate("a photo of pizza").await,
        Err(GenerationError::NoImageCapability)
    );
}

/// 生成の失敗はその料理だけの表示に落とす
#[tokio::test]
async fn test_generation_failure_is_scoped_to_dish() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let image = resolver_from_config(&generation_config(&server))
        .resolve(&margherita())
        .await;
    assert!(matches!(image, DishImage::Failed(message) if message.contains("500")));
}

/// デコードできないインラインデータはその料理の失敗にする
#[tokio::test]
async fn test_generation_with_undecodable_inline_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": "not base64!!"}}
            ]}}]
        })))
        .mount(&server)
        .await;

    let generator = GeminiImageGenerator::new(&generation_config(&server));
    assert!(matches!(
        generator.generate("a photo of pizza").await,
        Err(GenerationError::Malformed(_))
    ));

    let image = resolver_from_config(&generation_config(&server))
        .resolve(&margherita())
        .await;
    assert_eq!(image, DishImage::Failed("画像生成に失敗しました".into()));
}

/// 空のインラインデータも失敗
#[tokio::test]
async fn test_generation_with_empty_inline_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": ""}}
            ]}}]
        })))
        .mount(&server)
        .await;

    let generator = GeminiImageGenerator::new(&generation_config(&server));
    assert!(matches!(
        generator.generate("a photo of pizza").await,
        Err(GenerationError::Malformed(_))
    ));
}

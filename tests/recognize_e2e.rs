//! End-to-end tests for the recognize pipeline.
//!
//! Drives the full flow against a mock recognition service: image bytes go
//! to the service, the recognized token string comes back, gets cached,
//! and translates to readable text.

use dotlens::braille::{translate, translate_normalized};
use dotlens::recognition::{RecognitionClient, TextCache};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_image_to_text_pipeline() {
    let mock_server = MockServer::start().await;

    // The service recognizes the tokens for "ahite"
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "100000 101100 011000 011110 100100",
            "confidence": 0.91
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
    let recognized = client.recognize(b"photographed page").await.unwrap();

    assert_eq!(translate(&recognized.text), "ahite");
}

#[tokio::test]
async fn test_noisy_recognition_degrades_to_placeholders() {
    let mock_server = MockServer::start().await;

    // Optical noise: one smudged cell and one doubled space
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "100000 1x1000  110000"
        })))
        .mount(&mock_server)
        .await;

    let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
    let recognized = client.recognize(b"blurry page").await.unwrap();

    // Fail-soft keeps the readable letters and marks the rest
    assert_eq!(translate(&recognized.text), "a??c");
    // The normalizing mode drops only the split artifact
    assert_eq!(translate_normalized(&recognized.text), "a?c");
}

#[tokio::test]
async fn test_cached_result_skips_service() {
    let mock_server = MockServer::start().await;

    // The service must only be hit once for the same image
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"text": "011110 100000"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let cache = TextCache::new_initialized(temp_dir.path().join("cache")).unwrap();
    let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();

    let image = b"same photo twice";

    // First pass: service round trip, then store
    let first = match cache.get(image) {
        Some(text) => text,
        None => {
            let recognized = client.recognize(image).await.unwrap();
            cache.store(image, &recognized.text).unwrap();
            recognized.text
        }
    };

    // Second pass: served from cache
    let second = match cache.get(image) {
        Some(text) => text,
        None => {
            let recognized = client.recognize(image).await.unwrap();
            cache.store(image, &recognized.text).unwrap();
            recognized.text
        }
    };

    assert_eq!(first, second);
    assert_eq!(translate(&second), "ta");
}

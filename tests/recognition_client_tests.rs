//! Unit and mock HTTP tests for RecognitionClient.
//!
//! These tests cover:
//! - Client creation and configuration
//! - Request formatting
//! - Error handling
//! - Retry behavior against a mock HTTP server

use std::time::Duration;

use dotlens::recognition::{
    RecognitionClient, RecognitionError, OCR_KEY_ENV, OCR_URL_ENV,
};

// === Client Creation Tests ===

#[test]
fn test_with_base_url_creates_client() {
    let client =
        RecognitionClient::with_base_url("http://localhost:5000".to_string(), None).unwrap();
    assert_eq!(client.base_url(), "http://localhost:5000");
    assert!(!client.has_api_key());
}

#[test]
fn test_with_base_url_empty_returns_error() {
    let result = RecognitionClient::with_base_url("".to_string(), None);
    assert!(matches!(result, Err(RecognitionError::MissingServiceUrl)));
}

#[test]
fn test_with_timeout_creates_client() {
    let client = RecognitionClient::with_timeout(
        "http://localhost:5000".to_string(),
        Some("secret".to_string()),
        Duration::from_secs(5),
    )
    .unwrap();
    assert_eq!(client.base_url(), "http://localhost:5000");
    assert!(client.has_api_key());
}

#[test]
fn test_with_timeout_empty_url_returns_error() {
    let result =
        RecognitionClient::with_timeout("".to_string(), None, Duration::from_secs(5));
    assert!(matches!(result, Err(RecognitionError::MissingServiceUrl)));
}

#[test]
fn test_new_reads_from_env() {
    // Save current values
    let original_url = std::env::var(OCR_URL_ENV).ok();
    let original_key = std::env::var(OCR_KEY_ENV).ok();

    // Test with env var set
    std::env::set_var(OCR_URL_ENV, "http://ocr.example:5000");
    std::env::remove_var(OCR_KEY_ENV);
    let result = RecognitionClient::new();
    assert!(result.is_ok(), "new() should succeed when the URL is set");
    let client = result.unwrap();
    assert_eq!(client.base_url(), "http://ocr.example:5000");
    assert!(!client.has_api_key());

    // Test with env var unset
    std::env::remove_var(OCR_URL_ENV);
    let result = RecognitionClient::new();
    assert!(
        matches!(result, Err(RecognitionError::MissingServiceUrl)),
        "new() should fail when the URL is not set"
    );

    // Restore original values
    if let Some(val) = original_url {
        std::env::set_var(OCR_URL_ENV, val);
    }
    if let Some(val) = original_key {
        std::env::set_var(OCR_KEY_ENV, val);
    }
}

// === Error Display Tests ===

#[test]
fn test_missing_url_error_message() {
    let msg = format!("{}", RecognitionError::MissingServiceUrl);
    assert!(msg.contains("not configured"));
}

#[test]
fn test_rate_limit_error_message() {
    let err = RecognitionError::RateLimit {
        message: "slow down".to_string(),
        retry_after_secs: Some(7),
    };
    assert!(format!("{}", err).contains("slow down"));
}

#[test]
fn test_network_error_message_includes_attempts() {
    let err = RecognitionError::NetworkError {
        message: "connection refused".to_string(),
        attempts: 4,
    };
    let msg = format!("{}", err);
    assert!(msg.contains("connection refused"));
    assert!(msg.contains("4 attempts"));
}

// === Mock HTTP Server Tests ===

mod mock_http_tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_recognize_posts_image_bytes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/recognize"))
            .and(header("Content-Type", "application/octet-stream"))
            .and(body_bytes(b"fake image bytes".to_vec()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "100000 101000"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
        let result = client.recognize(b"fake image bytes").await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap().text, "100000 101000");
    }

    #[tokio::test]
    async fn test_recognize_sends_authorization_header_when_keyed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/recognize"))
            .and(header("Authorization", "Key test-api-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "100000"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = RecognitionClient::with_base_url(
            mock_server.uri(),
            Some("test-api-key".to_string()),
        )
        .unwrap();
        let result = client.recognize(b"bytes").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_recognize_decodes_confidence() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/recognize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"text": "011110", "confidence": 0.87}),
            ))
            .mount(&mock_server)
            .await;

        let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
        let recognized = client.recognize(b"bytes").await.unwrap();

        assert_eq!(recognized.text, "011110");
        assert_eq!(recognized.confidence, Some(0.87));
    }

    #[tokio::test]
    async fn test_recognize_maps_server_error_to_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/recognize"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
        let result = client.recognize(b"bytes").await;

        match result {
            Err(RecognitionError::ApiError(msg)) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("boom"));
            }
            other => panic!("Expected ApiError, got {:?}", other.map(|r| r.text)),
        }
    }

    #[tokio::test]
    async fn test_recognize_maps_429_to_rate_limit() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/recognize"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "3")
                    .set_body_string("Too many requests"),
            )
            .mount(&mock_server)
            .await;

        let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
        let result = client.recognize(b"bytes").await;

        match result {
            Err(RecognitionError::RateLimit {
                message,
                retry_after_secs,
            }) => {
                assert!(message.contains("Too many requests"));
                assert_eq!(retry_after_secs, Some(3));
            }
            other => panic!("Expected RateLimit, got {:?}", other.map(|r| r.text)),
        }
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_rate_limit_attempts() {
        let mock_server = MockServer::start().await;

        // Always rate limited; no Retry-After so backoff is used
        Mock::given(method("POST"))
            .and(path("/recognize"))
            .respond_with(ResponseTemplate::new(429).set_body_string("still busy"))
            .expect(3) // initial attempt + 2 retries
            .mount(&mock_server)
            .await;

        let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
        let result = client
            .recognize_with_retry_config(
                b"bytes",
                2,
                0,
                Duration::from_millis(10),
                Duration::from_millis(50),
            )
            .await;

        assert!(matches!(result, Err(RecognitionError::RateLimit { .. })));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_rate_limit() {
        let mock_server = MockServer::start().await;

        // First attempt is rate limited
        Mock::given(method("POST"))
            .and(path("/recognize"))
            .respond_with(ResponseTemplate::new(429).set_body_string("busy"))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        // Subsequent attempts succeed
        Mock::given(method("POST"))
            .and(path("/recognize"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "100000 100100"})),
            )
            .mount(&mock_server)
            .await;

        let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
        let result = client
            .recognize_with_retry_config(
                b"bytes",
                3,
                0,
                Duration::from_millis(10),
                Duration::from_millis(50),
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap().text, "100000 100100");
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/recognize"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad image"))
            .expect(1) // no retries for a 400
            .mount(&mock_server)
            .await;

        let client = RecognitionClient::with_base_url(mock_server.uri(), None).unwrap();
        let result = client
            .recognize_with_retry_config(
                b"bytes",
                3,
                3,
                Duration::from_millis(10),
                Duration::from_millis(50),
            )
            .await;

        assert!(matches!(result, Err(RecognitionError::ApiError(_))));
    }
}

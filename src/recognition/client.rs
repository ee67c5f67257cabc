//! RecognitionClient - handles communication with the recognition service.
//!
//! The service receives a captured image and returns the raw dot-pattern
//! token string it recognized; translation happens locally afterwards.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::retry::{
    calculate_backoff, is_transient_network_error, parse_retry_after, DEFAULT_BACKOFF_BASE,
    DEFAULT_BACKOFF_MAX, DEFAULT_MAX_RETRIES, DEFAULT_NETWORK_RETRIES,
};

/// The environment variable name for the recognition service URL.
pub const OCR_URL_ENV: &str = "DOTLENS_OCR_URL";

/// The environment variable name for the optional service API key.
pub const OCR_KEY_ENV: &str = "DOTLENS_OCR_KEY";

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP status code for rate limiting.
const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Recognized text returned by the service.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecognizedText {
    /// The raw token string extracted from the image.
    pub text: String,
    /// Service-reported recognition confidence (0.0-1.0), if provided.
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Errors raised by the recognition client.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition service URL not configured")]
    MissingServiceUrl,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("service error: {0}")]
    ApiError(String),

    #[error("Rate limited: {message}")]
    RateLimit {
        /// Human-readable rate limit message
        message: String,
        /// Retry-After header value in seconds, if provided
        retry_after_secs: Option<u64>,
    },

    #[error("Network error: {message} (after {attempts} attempts)")]
    NetworkError {
        /// Human-readable network error message
        message: String,
        /// Number of attempts made before giving up
        attempts: u32,
    },
}

/// Client for communicating with the recognition service.
pub struct RecognitionClient {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl RecognitionClient {
    /// Create a new RecognitionClient from the environment.
    ///
    /// Reads the service URL from `DOTLENS_OCR_URL` and the optional API
    /// key from `DOTLENS_OCR_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `RecognitionError::MissingServiceUrl` if `DOTLENS_OCR_URL`
    /// is not set.
    pub fn new() -> Result<Self, RecognitionError> {
        let base_url =
            std::env::var(OCR_URL_ENV).map_err(|_| RecognitionError::MissingServiceUrl)?;
        let api_key = std::env::var(OCR_KEY_ENV).ok();
        Self::with_base_url(base_url, api_key)
    }

    /// Create a new RecognitionClient with an explicit base URL.
    ///
    /// This is useful for testing against a mock server, or when the URL
    /// comes from the config file rather than the environment.
    pub fn with_base_url(
        base_url: String,
        api_key: Option<String>,
    ) -> Result<Self, RecognitionError> {
        if base_url.is_empty() {
            return Err(RecognitionError::MissingServiceUrl);
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            http_client,
        })
    }

    /// Create a new RecognitionClient with a custom request timeout.
    pub fn with_timeout(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RecognitionError> {
        if base_url.is_empty() {
            return Err(RecognitionError::MissingServiceUrl);
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            http_client,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether an API key will be sent with requests.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Submit image bytes for recognition.
    ///
    /// Posts the raw bytes to `{base_url}/recognize` and decodes the JSON
    /// response body.
    ///
    /// # Errors
    ///
    /// Returns `RecognitionError::RateLimit` on HTTP 429 (carrying the
    /// parsed Retry-After value), `RecognitionError::ApiError` for other
    /// non-success statuses, or `RecognitionError::HttpError` if the
    /// request itself fails.
    pub async fn recognize(&self, image: &[u8]) -> Result<RecognizedText, RecognitionError> {
        let url = format!("{}/recognize", self.base_url);

        let mut request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec());

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Key {}", key));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();

            if status.as_u16() == HTTP_STATUS_TOO_MANY_REQUESTS {
                let retry_after_secs = parse_retry_after(&response);
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Rate limit exceeded".to_string());
                log::warn!(
                    "Rate limited by recognition service. Retry-After: {:?} seconds",
                    retry_after_secs
                );
                return Err(RecognitionError::RateLimit {
                    message: error_text,
                    retry_after_secs,
                });
            }

            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(RecognitionError::ApiError(format!(
                "recognition request failed with status {}: {}",
                status, error_text
            )));
        }

        let recognized: RecognizedText = response.json().await?;
        log::info!(
            "Recognized {} bytes of image data into {} characters of text",
            image.len(),
            recognized.text.len()
        );
        Ok(recognized)
    }

    /// Submit image bytes for recognition with automatic retry.
    ///
    /// Wraps [`recognize`](Self::recognize) and retries with exponential
    /// backoff on rate limits (honoring Retry-After when provided) and on
    /// transient network errors. Other errors are surfaced immediately.
    pub async fn recognize_with_retry(
        &self,
        image: &[u8],
    ) -> Result<RecognizedText, RecognitionError> {
        self.recognize_with_retry_config(
            image,
            DEFAULT_MAX_RETRIES,
            DEFAULT_NETWORK_RETRIES,
            DEFAULT_BACKOFF_BASE,
            DEFAULT_BACKOFF_MAX,
        )
        .await
    }

    /// Submit image bytes for recognition with custom retry configuration.
    ///
    /// # Arguments
    ///
    /// * `image` - Raw image bytes to recognize
    /// * `max_retries` - Maximum retry attempts after a rate limit
    /// * `network_retries` - Maximum retry attempts after a transient network error
    /// * `backoff_base` - Base delay for exponential backoff
    /// * `backoff_max` - Maximum delay cap for backoff
    pub async fn recognize_with_retry_config(
        &self,
        image: &[u8],
        max_retries: u32,
        network_retries: u32,
        backoff_base: Duration,
        backoff_max: Duration,
    ) -> Result<RecognizedText, RecognitionError> {
        let mut rate_limit_attempts = 0u32;
        let mut network_attempts = 0u32;

        loop {
            match self.recognize(image).await {
                Ok(recognized) => return Ok(recognized),
                Err(RecognitionError::RateLimit {
                    message,
                    retry_after_secs,
                }) => {
                    if rate_limit_attempts >= max_retries {
                        log::error!(
                            "Rate limit exceeded after {} attempts. Giving up.",
                            rate_limit_attempts + 1
                        );
                        return Err(RecognitionError::RateLimit {
                            message,
                            retry_after_secs,
                        });
                    }

                    // Use Retry-After if provided, else exponential backoff
                    let delay = if let Some(retry_secs) = retry_after_secs {
                        Duration::from_secs(retry_secs).min(backoff_max)
                    } else {
                        calculate_backoff(rate_limit_attempts, backoff_base, backoff_max)
                    };

                    log::info!(
                        "Rate limited (attempt {}/{}). Retrying in {:?}...",
                        rate_limit_attempts + 1,
                        max_retries + 1,
                        delay
                    );

                    rate_limit_attempts += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(RecognitionError::HttpError(e)) if is_transient_network_error(&e) => {
                    if network_attempts >= network_retries {
                        log::error!(
                            "Network error persisted after {} attempts: {}",
                            network_attempts + 1,
                            e
                        );
                        return Err(RecognitionError::NetworkError {
                            message: e.to_string(),
                            attempts: network_attempts + 1,
                        });
                    }

                    let delay = calculate_backoff(network_attempts, backoff_base, backoff_max);
                    log::warn!(
                        "Transient network error (attempt {}/{}): {}. Retrying in {:?}...",
                        network_attempts + 1,
                        network_retries + 1,
                        e,
                        delay
                    );

                    network_attempts += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

//! Gemini REST client for summarization, speech and slide images.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::GeminiConfig;
use crate::content::join_blocks;
use crate::error::{BriefingError, BriefingResult};
use crate::providers::{ImageProvider, SpeechProvider, Summarizer};

const DIGEST_PROMPT: &str = "You are writing a short podcast script for a personal digest. It is for a single user. The user has collected content from several URLs (articles, videos, posts, etc.). Below is the extracted content from each source. Write an engaging summary. Highlight the main points from each source in a coherent narrative. Use a friendly, conversational tone. Output only the script, no meta-commentary or section headers like \"Summary:\".";

const SUMMARY_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Gemini API client.
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: Option<String>,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    fn audio(&self) -> Option<&str> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.as_str())
            .next()
    }
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> BriefingResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BriefingError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn from_env() -> BriefingResult<Self> {
        Self::new(GeminiConfig::from_env())
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn api_key(&self) -> BriefingResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| BriefingError::config("GEMINI_API_KEY not set"))
    }

    async fn post<T: Serialize + ?Sized>(&self, model: &str, method: &str, body: &T) -> BriefingResult<reqwest::Response> {
        let key = self.api_key()?;
        let url = format!("{}/models/{}:{}", self.config.base_url, model, method);

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(body)
            .send()
            .await
            .map_err(|e| BriefingError::provider(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BriefingError::provider(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }
        Ok(response)
    }

    async fn generate(&self, model: &str, request: &GenerateRequest) -> BriefingResult<GenerateResponse> {
        self.post(model, "generateContent", request)
            .await?
            .json()
            .await
            .map_err(|e| BriefingError::provider(format!("Failed to parse Gemini response: {}", e)))
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, texts: &[String]) -> BriefingResult<String> {
        self.api_key()?;
        let combined = join_blocks(texts);
        if combined.trim().is_empty() {
            return Err(BriefingError::no_content("nothing to summarize"));
        }

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{}\n\nContent:\n\n{}", DIGEST_PROMPT, combined),
                }],
            }],
            generation_config: json!({ "maxOutputTokens": SUMMARY_MAX_OUTPUT_TOKENS }),
        };

        let mut last_error = None;
        for model in self.config.summary_models() {
            debug!("Attempting Gemini summarization with model: {}", model);
            match self.generate(model, &request).await {
                Ok(response) => {
                    let text = response.text().trim().to_string();
                    if text.is_empty() {
                        return Err(BriefingError::summarization(format!(
                            "{} returned an empty summary",
                            model
                        )));
                    }
                    info!(model, chars = text.len(), "Generated digest summary");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BriefingError::provider("All Gemini models failed")))
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

#[async_trait]
impl SpeechProvider for GeminiClient {
    async fn synthesize(&self, text: &str, voice: &str, model: &str) -> BriefingResult<Vec<u8>> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: text.to_string() }],
            }],
            generation_config: json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                }
            }),
        };

        let response = self.generate(model, &request).await?;
        let data = response
            .audio()
            .ok_or_else(|| BriefingError::provider("No audio in Gemini TTS response"))?;
        let pcm = BASE64
            .decode(data)
            .map_err(|e| BriefingError::provider(format!("Invalid audio payload: {}", e)))?;
        if pcm.is_empty() {
            return Err(BriefingError::provider("Gemini TTS returned empty audio"));
        }
        debug!(model, voice, bytes = pcm.len(), "Synthesized speech chunk");
        Ok(pcm)
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

#[async_trait]
impl ImageProvider for GeminiClient {
    async fn generate_image(&self, prompt: &str, _width: u32, _height: u32) -> BriefingResult<Vec<u8>> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1, "aspectRatio": "16:9" }
        });

        let response: PredictResponse = self
            .post(&self.config.image_model, "predict", &body)
            .await?
            .json()
            .await
            .map_err(|e| BriefingError::provider(format!("Failed to parse Imagen response: {}", e)))?;

        let encoded = response
            .predictions
            .iter()
            .find_map(|p| p.bytes_base64_encoded.as_deref())
            .ok_or_else(|| BriefingError::provider("No image in Imagen response"))?;

        BASE64
            .decode(encoded)
            .map_err(|e| BriefingError::provider(format!("Invalid image payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        let config = GeminiConfig {
            model: "primary".into(),
            fallback_models: vec!["backup".into()],
            ..Default::default()
        }
        .with_api_key("test-key")
        .with_base_url(server.uri());
        GeminiClient::new(config).unwrap()
    }

    fn text_response(text: &str) -> serde_json::Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[tokio::test]
    async fn test_summarize_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/primary:generateContent"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/backup:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("  Hello world.  ")))
            .expect(1)
            .mount(&server)
            .await;

        let summary = client(&server)
            .summarize(&["Source: u\nT\nbody".to_string()])
            .await
            .unwrap();
        assert_eq!(summary, "Hello world.");
    }

    #[tokio::test]
    async fn test_empty_summary_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("   ")))
            .mount(&server)
            .await;

        let err = client(&server).summarize(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, BriefingError::Summarization(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let gemini = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert!(!Summarizer::is_configured(&gemini));
        let err = gemini.summarize(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, BriefingError::Config(_)));
        let err = gemini.synthesize("x", "Kore", "tts").await.unwrap_err();
        assert!(matches!(err, BriefingError::Config(_)));
    }

    #[tokio::test]
    async fn test_synthesize_decodes_inline_audio() {
        let server = MockServer::start().await;
        let pcm = vec![1u8, 0, 2, 0];
        Mock::given(method("POST"))
            .and(path("/models/tts-model:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{
                    "inlineData": { "mimeType": "audio/L16;rate=24000", "data": BASE64.encode(&pcm) }
                }] } }]
            })))
            .mount(&server)
            .await;

        let audio = client(&server).synthesize("Hi", "Kore", "tts-model").await.unwrap();
        assert_eq!(audio, pcm);
    }

    #[tokio::test]
    async fn test_generate_image_reads_prediction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:predict", crate::config::DEFAULT_IMAGE_MODEL)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{ "bytesBase64Encoded": BASE64.encode(b"png") }]
            })))
            .mount(&server)
            .await;

        let bytes = client(&server).generate_image("a cat", 1280, 720).await.unwrap();
        assert_eq!(bytes, b"png");
    }

    #[tokio::test]
    async fn test_provider_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let err = client(&server).generate_image("x", 1, 1).await.unwrap_err();
        match err {
            BriefingError::Provider(msg) => assert!(msg.contains("quota")),
            other => panic!("unexpected error: {other}"),
        }
    }
}

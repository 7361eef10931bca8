//! Gemini API client for commercial asset generation.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use adreel_models::{BusinessBrief, CommercialContent, PublishMetadata};

use crate::error::{GenError, GenResult};

/// Voice used for all voiceovers.
const VOICE_NAME: &str = "Kore";

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// API base URL (overridable for tests)
    pub base_url: String,
    /// Text models, tried in order until one succeeds
    pub text_models: Vec<String>,
    /// Image generation model
    pub image_model: String,
    /// Text-to-speech model
    pub tts_model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> GenResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GenError::config_error("GEMINI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_models: vec![
                "gemini-3-flash-preview".to_string(),
                "gemini-2.5-flash".to_string(),
                "gemini-2.5-flash-lite".to_string(),
            ],
            image_model: std::env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string()),
            tts_model: std::env::var("GEMINI_TTS_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-preview-tts".to_string()),
            timeout: Duration::from_secs(120),
        })
    }
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Default, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
    #[serde(rename = "speechConfig", skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
struct ImageConfig {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

#[derive(Debug, Serialize)]
struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    voice_name: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
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

/// Gemini API client.
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> GenResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("adreel-gen/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Generate the commercial script and visual headline.
    ///
    /// The model is asked for structured JSON; if the reply cannot be
    /// parsed as such, the raw text is kept as the script and the
    /// business name stands in as the headline rather than failing the
    /// whole preview.
    pub async fn generate_commercial_content(
        &self,
        brief: &BusinessBrief,
    ) -> GenResult<CommercialContent> {
        let prompt = format!(
            "Create a short, punchy TV commercial script (under 15 words) and a visual \
             headline (under 5 words) for a business.\n\
             Business: {}\n\
             Type: {}\n\
             Offer: {}\n\
             Context: {}\n\
             Return ONLY a single JSON object with string keys 'script' and 'headline'.",
            brief.business_name, brief.business_type, brief.offer, brief.extra_info
        );

        let text = self.generate_json_text(&prompt).await?;

        match serde_json::from_str::<CommercialContent>(strip_code_fences(&text)) {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!("Commercial content was not valid JSON, using fallback: {}", e);
                Ok(CommercialContent::fallback(&brief.business_name, text.trim()))
            }
        }
    }

    /// Generate the background image as PNG bytes.
    pub async fn generate_background_image(
        &self,
        headline: &str,
        business_type: &str,
    ) -> GenResult<Vec<u8>> {
        let prompt = format!(
            "A cinematic, high-quality, professional background image for a TV commercial \
             for a {} business. No text in the image. Vibrant and clean. \
             Focus on the concept: {}",
            business_type, headline
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: "16:9".to_string(),
                }),
                ..Default::default()
            }),
        };

        let response = self.call(&self.config.image_model, &request).await?;
        let data = first_inline_data(&response)
            .ok_or_else(|| GenError::empty_response("No image in response"))?;

        let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
        debug!("Generated background image ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Generate the voiceover as raw PCM bytes (s16le, 24 kHz, mono).
    pub async fn generate_voiceover(&self, script: &str) -> GenResult<Vec<u8>> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("Say cheerfully: {}", script),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: VOICE_NAME.to_string(),
                        },
                    },
                }),
                ..Default::default()
            }),
        };

        let response = self.call(&self.config.tts_model, &request).await?;
        let data = first_inline_data(&response)
            .ok_or_else(|| GenError::empty_response("No audio in response"))?;

        let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
        debug!("Generated voiceover ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Generate title, description, and tags for the published video.
    pub async fn generate_publish_metadata(
        &self,
        business_name: &str,
        offer: &str,
    ) -> GenResult<PublishMetadata> {
        let prompt = format!(
            "Generate a YouTube title, description, and 5 tags for an unlisted commercial.\n\
             Business: {}\n\
             Offer: {}\n\
             Mentions \"YouTube CTV\" in description. No Hulu/Roku.\n\
             Return ONLY a single JSON object with 'title', 'description', and 'tags'.",
            business_name, offer
        );

        let text = self.generate_json_text(&prompt).await?;
        Ok(serde_json::from_str(strip_code_fences(&text))?)
    }

    /// Run a JSON-mode text prompt through the model fallback chain.
    async fn generate_json_text(&self, prompt: &str) -> GenResult<String> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            }),
        };

        let mut last_error = None;

        for model in &self.config.text_models {
            match self.call(model, &request).await {
                Ok(response) => match first_text(&response) {
                    Some(text) => {
                        info!("Generated text content with {}", model);
                        return Ok(text.to_string());
                    }
                    None => {
                        warn!("Model {} returned no text content", model);
                        last_error = Some(GenError::empty_response("No content in response"));
                    }
                },
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| GenError::generation_failed("All models failed")))
    }

    async fn call(&self, model: &str, request: &GeminiRequest) -> GenResult<GeminiResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        );

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::generation_failed(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

fn first_text(response: &GeminiResponse) -> Option<&str> {
    response
        .candidates
        .first()?
        .content
        .parts
        .iter()
        .find_map(|p| p.text.as_deref())
}

fn first_inline_data(response: &GeminiResponse) -> Option<&str> {
    response
        .candidates
        .first()?
        .content
        .parts
        .iter()
        .find_map(|p| p.inline_data.as_ref().map(|d| d.data.as_str()))
}

/// Strip markdown code fences some models wrap around JSON replies.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

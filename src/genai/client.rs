use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::extract::extract_json;
use super::{prompt, schema};
use crate::assets::EncodedAsset;
use crate::config::Config;
use crate::error::{AdPulseError, Result};
use crate::orchestrator::{ImageGenerator, PlanGenerator, PlanRequest};
use crate::plan::{AspectRatio, GeneratedImage, GenerationPlan, VideoAnalysisResult};

/// Client for the generative-AI provider's REST API
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    video_model: String,
    poll_interval: Duration,
}

/// What to audit: an uploaded file or a public URL
#[derive(Debug, Clone)]
pub enum AuditInput {
    File(EncodedAsset),
    Url(String),
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter())
            .into_iter()
            .flatten()
    }

    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }

    /// First inline image of the first candidate
    fn image(&self) -> Option<GeneratedImage> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .next()
            .map(|d| GeneratedImage {
                mime_type: d.mime_type.clone(),
                data: d.data.clone(),
            })
    }
}

impl Operation {
    fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .pointer("/generateVideoResponse/generatedSamples/0/video/uri")?
            .as_str()
    }
}

impl GeminiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key()?.to_string();
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: config.provider.base_url().trim_end_matches('/').to_string(),
            text_model: config.provider.text_model.clone(),
            image_model: config.provider.image_model.clone(),
            video_model: config.provider.video_model.clone(),
            poll_interval: config.generation.video_poll_interval(),
        })
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        tracing::debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get(&self, url: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json(response: reqwest::Response) -> Result<Value> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdPulseError::Api { status, body });
        }
        Ok(response.json().await?)
    }

    async fn generate_content(&self, model: &str, body: Value) -> Result<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let value = self.post(&url, &body).await?;
        serde_json::from_value(value)
            .map_err(|e| AdPulseError::Transport(format!("unexpected response shape: {}", e)))
    }

    /// Audit a competitor ad, either inline or through search grounding
    pub async fn analyze_video(&self, input: &AuditInput) -> Result<VideoAnalysisResult> {
        let body = match input {
            AuditInput::File(video) => json!({
                "contents": [{
                    "parts": [
                        { "inlineData": { "mimeType": video.mime_type, "data": video.data } },
                        { "text": prompt::AUDIT_PROMPT }
                    ]
                }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": schema::analysis_schema()
                }
            }),
            // Search grounding cannot be combined with a response schema
            AuditInput::Url(url) => json!({
                "contents": [{ "parts": [{ "text": prompt::build_audit_url_prompt(url) }] }],
                "tools": [{ "googleSearch": {} }]
            }),
        };

        let response = self.generate_content(&self.text_model, body).await?;
        let text = response
            .text()
            .ok_or_else(|| AdPulseError::Analysis("No analysis generated".to_string()))?;
        let value = extract_json(&text)?;
        serde_json::from_value(value).map_err(|e| AdPulseError::Analysis(e.to_string()))
    }

    async fn request_plan(&self, request: &PlanRequest) -> Result<GenerationPlan> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt::build_plan_prompt(request) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema::plan_schema()
            }
        });

        let response = self.generate_content(&self.text_model, body).await?;
        let text = response
            .text()
            .ok_or_else(|| AdPulseError::Generation("Failed to generate EDL".to_string()))?;
        GenerationPlan::from_value(extract_json(&text)?)
    }

    /// Synthesize a short video clip and return its download URI
    pub async fn generate_video(
        &self,
        prompt: &str,
        aspect_ratio: &AspectRatio,
        image: Option<&EncodedAsset>,
    ) -> Result<String> {
        let prompt = if prompt.trim().is_empty() {
            "Cinematic movement, high quality, 4k"
        } else {
            prompt
        };

        let mut instance = json!({ "prompt": prompt });
        if let Some(image) = image {
            instance["image"] = json!({
                "bytesBase64Encoded": image.data,
                "mimeType": image.mime_type
            });
        }
        let body = json!({
            "instances": [instance],
            "parameters": { "aspectRatio": aspect_ratio.as_str(), "sampleCount": 1 }
        });

        let url = format!("{}/models/{}:predictLongRunning", self.base_url, self.video_model);
        let mut operation = Self::parse_operation(self.post(&url, &body).await?)?;
        tracing::info!("Started video operation {}", operation.name);

        while !operation.done {
            tokio::time::sleep(self.poll_interval).await;
            let url = format!("{}/{}", self.base_url, operation.name);
            operation = Self::parse_operation(self.get(&url).await?)?;
            tracing::debug!("Video operation {} done={}", operation.name, operation.done);
        }

        if let Some(error) = &operation.error {
            return Err(AdPulseError::VideoGeneration(error.to_string()));
        }

        let uri = operation
            .video_uri()
            .ok_or_else(|| AdPulseError::VideoGeneration("Failed to generate video URI.".to_string()))?;
        let separator = if uri.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}key={}", uri, separator, self.api_key))
    }

    fn parse_operation(value: Value) -> Result<Operation> {
        serde_json::from_value(value)
            .map_err(|e| AdPulseError::VideoGeneration(format!("unexpected operation shape: {}", e)))
    }
}

#[async_trait]
impl PlanGenerator for GeminiClient {
    async fn generate_plan(&self, request: &PlanRequest) -> Result<GenerationPlan> {
        self.request_plan(request).await.map_err(|e| match e {
            AdPulseError::Generation(_) => e,
            other => AdPulseError::Generation(other.to_string()),
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &AspectRatio,
        reference: Option<&EncodedAsset>,
    ) -> Result<GeneratedImage> {
        let mut parts = Vec::new();
        if let Some(reference) = reference {
            parts.push(json!({
                "inlineData": { "mimeType": reference.mime_type, "data": reference.data }
            }));
        }
        parts.push(json!({ "text": prompt }));

        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": aspect_ratio.image_ratio() }
            }
        });

        let response = self.generate_content(&self.image_model, body).await?;
        response
            .image()
            .ok_or_else(|| AdPulseError::ImageGeneration("No image generated by AI".to_string()))
    }
}

//! Storyboard generation workflow.
//!
//! A run synthesizes a plan with the text model, resolves one reference image,
//! then renders every segment's frame in sequence order. Progress is published
//! as owned [`PlanUpdate`] snapshots over a single-writer channel.

mod runner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetHandle, AssetMeta, EncodedAsset};
use crate::error::{AdPulseError, Result};
use crate::plan::{AspectRatio, GeneratedImage, GenerationPlan, VideoAnalysisResult};

pub use runner::Orchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    #[serde(rename = "CUSTOM_PROMPT")]
    Custom,
    #[serde(rename = "COMPETITOR_REPLICA")]
    CompetitorReplica,
}

impl GenerationMode {
    pub fn as_wire(&self) -> &'static str {
        match self {
            GenerationMode::Custom => "CUSTOM_PROMPT",
            GenerationMode::CompetitorReplica => "COMPETITOR_REPLICA",
        }
    }
}

/// Everything a run needs. Asset lists are a snapshot taken at start.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub mode: GenerationMode,
    pub brand_assets: Vec<AssetHandle>,
    pub analysis: Option<VideoAnalysisResult>,
    pub custom_prompt: String,
    pub brand_info: String,
    pub reference_image: Option<AssetHandle>,
}

/// Input of the plan synthesis call
#[derive(Debug, Clone, Serialize)]
pub struct PlanRequest {
    pub assets: Vec<AssetMeta>,
    pub analysis: Option<VideoAnalysisResult>,
    pub mode: GenerationMode,
    pub custom_prompt: String,
    pub brand_info: String,
}

impl From<&GenerationContext> for PlanRequest {
    fn from(context: &GenerationContext) -> Self {
        Self {
            assets: context.brand_assets.iter().map(AssetHandle::meta).collect(),
            analysis: context.analysis.clone(),
            mode: context.mode,
            custom_prompt: context.custom_prompt.clone(),
            brand_info: context.brand_info.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanUpdate {
    pub plan: GenerationPlan,
    pub status_message: String,
}

#[derive(Debug)]
pub enum RunEvent {
    Update(PlanUpdate),
    /// Plan synthesis failed; nothing was published
    Error(AdPulseError),
    /// Terminal event of every run that produced a plan
    Complete { cancelled: bool },
}

/// Text model producing the storyboard
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate_plan(&self, request: &PlanRequest) -> Result<GenerationPlan>;
}

/// Image model rendering one segment
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &AspectRatio,
        reference: Option<&EncodedAsset>,
    ) -> Result<GeneratedImage>;
}

#[async_trait]
pub trait AssetEncoder: Send + Sync {
    async fn encode(&self, asset: &AssetHandle) -> Result<EncodedAsset>;
}

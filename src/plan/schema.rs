use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use crate::error::{AdPulseError, Result};

/// Storyboard / edit decision list produced by the text model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPlan {
    #[serde(rename = "project_title")]
    pub title: String,
    pub aspect_ratio: AspectRatio,
    #[serde(rename = "total_duration_sec")]
    pub total_duration_seconds: f64,
    #[serde(rename = "background_music_keyword", default)]
    pub music_keyword: String,
    #[serde(rename = "timeline")]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other(String),
}

impl AspectRatio {
    pub fn as_str(&self) -> &str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Other(s) => s,
        }
    }

    /// Ratio accepted by the image model; unknown ratios fall back to square
    pub fn image_ratio(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Other(_) => "1:1",
        }
    }
}

impl From<String> for AspectRatio {
    fn from(value: String) -> Self {
        match value.trim() {
            "16:9" => AspectRatio::Landscape,
            "9:16" => AspectRatio::Portrait,
            _ => AspectRatio::Other(value),
        }
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub sequence_id: u32,
    pub segment_type: SegmentType,
    pub visual_prompt: String,
    pub start_time: f64,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_overlay: Option<TextOverlay>,
    #[serde(default)]
    pub transition: Transition,
    #[serde(skip_deserializing)]
    generation_status: GenerationStatus,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    generated_image: Option<GeneratedImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SegmentType {
    Hook,
    Body,
    Cta,
}

impl SegmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentType::Hook => "Hook",
            SegmentType::Body => "Body",
            SegmentType::Cta => "CTA",
        }
    }
}

impl TryFrom<String> for SegmentType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hook" => Ok(SegmentType::Hook),
            "body" => Ok(SegmentType::Body),
            "cta" => Ok(SegmentType::Cta),
            _ => Err(format!("unknown segment type: {}", value)),
        }
    }
}

impl From<SegmentType> for String {
    fn from(value: SegmentType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub content: String,
    #[serde(default)]
    pub position: OverlayPosition,
    #[serde(default)]
    pub style: OverlayStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPosition {
    #[default]
    Center,
    Bottom,
    Top,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStyle {
    #[default]
    BigBold,
    Subtle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Fade,
    #[default]
    Cut,
    Zoom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Failed,
}

impl GenerationStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, GenerationStatus::Done | GenerationStatus::Failed)
    }
}

/// Inline image returned by the image model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

impl GeneratedImage {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| AdPulseError::ImageGeneration(format!("invalid image payload: {}", e)))
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

impl Segment {
    pub fn new(sequence_id: u32, segment_type: SegmentType, visual_prompt: impl Into<String>) -> Self {
        Self {
            sequence_id,
            segment_type,
            visual_prompt: visual_prompt.into(),
            start_time: 0.0,
            duration_seconds: 0.0,
            text_overlay: None,
            transition: Transition::default(),
            generation_status: GenerationStatus::Pending,
            generated_image: None,
        }
    }

    pub fn status(&self) -> GenerationStatus {
        self.generation_status
    }

    pub fn image(&self) -> Option<&GeneratedImage> {
        self.generated_image.as_ref()
    }

    /// Pending -> InProgress. Any other state is returned unchanged.
    pub fn started(&self) -> Segment {
        let mut next = self.clone();
        if next.generation_status == GenerationStatus::Pending {
            next.generation_status = GenerationStatus::InProgress;
        }
        next
    }

    /// InProgress -> Done, attaching the image. Any other state is returned unchanged.
    pub fn completed(&self, image: GeneratedImage) -> Segment {
        let mut next = self.clone();
        if next.generation_status == GenerationStatus::InProgress {
            next.generation_status = GenerationStatus::Done;
            next.generated_image = Some(image);
        }
        next
    }

    /// InProgress -> Failed. Any other state is returned unchanged.
    pub fn failed(&self) -> Segment {
        let mut next = self.clone();
        if next.generation_status == GenerationStatus::InProgress {
            next.generation_status = GenerationStatus::Failed;
        }
        next
    }

    /// Export file name, e.g. `frame_2_Body.png`
    pub fn frame_file_name(&self) -> Option<String> {
        self.generated_image.as_ref().map(|image| {
            format!(
                "frame_{}_{}.{}",
                self.sequence_id,
                self.segment_type.as_str(),
                image.extension()
            )
        })
    }
}

impl GenerationPlan {
    /// Validate an extracted model response and build a plan from it.
    ///
    /// A missing, non-array or empty `timeline` is rejected outright, as are
    /// duplicate sequence ids. Segments come back sorted by sequence id with
    /// every status reset to pending.
    pub fn from_value(value: Value) -> Result<Self> {
        match value.get("timeline") {
            Some(Value::Array(items)) if !items.is_empty() => {}
            Some(Value::Array(_)) => {
                return Err(AdPulseError::Generation(
                    "AI generated an empty timeline".to_string(),
                ))
            }
            _ => {
                return Err(AdPulseError::Generation(
                    "AI generated an incomplete plan structure (missing timeline)".to_string(),
                ))
            }
        }

        let plan: GenerationPlan = serde_json::from_value(value)
            .map_err(|e| AdPulseError::Generation(format!("malformed plan: {}", e)))?;
        plan.normalized()
    }

    /// Check a plan before rendering and return it ready to start.
    ///
    /// Rejects an empty timeline and duplicate sequence ids, sorts segments by
    /// sequence id and resets every segment to pending with no image.
    pub fn normalized(mut self) -> Result<Self> {
        if self.segments.is_empty() {
            return Err(AdPulseError::Generation(
                "AI generated an empty timeline".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for segment in &self.segments {
            if !seen.insert(segment.sequence_id) {
                return Err(AdPulseError::Generation(format!(
                    "duplicate sequence_id {}",
                    segment.sequence_id
                )));
            }
        }

        self.segments.sort_by_key(|s| s.sequence_id);
        for segment in &mut self.segments {
            segment.generation_status = GenerationStatus::Pending;
            segment.generated_image = None;
        }

        Ok(self)
    }

    /// Copy of the plan with a new segment list
    pub fn with_segments(&self, segments: Vec<Segment>) -> GenerationPlan {
        GenerationPlan {
            segments,
            ..self.clone()
        }
    }

    pub fn settled_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.generation_status.is_settled())
            .count()
    }
}

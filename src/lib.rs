pub mod assets;
pub mod config;
pub mod error;
pub mod genai;
pub mod orchestrator;
pub mod plan;

pub use config::Config;
pub use error::{AdPulseError, Result};
pub use genai::{extract_json, GeminiClient};
pub use orchestrator::{GenerationContext, GenerationMode, Orchestrator, PlanUpdate, RunEvent};
pub use plan::{GenerationPlan, GenerationStatus, Segment};

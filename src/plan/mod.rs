pub mod analysis;
pub mod schema;

pub use analysis::VideoAnalysisResult;
pub use schema::{
    AspectRatio, GeneratedImage, GenerationPlan, GenerationStatus, OverlayPosition, OverlayStyle,
    Segment, SegmentType, TextOverlay, Transition,
};

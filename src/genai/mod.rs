mod client;
pub mod extract;
pub mod prompt;
pub mod schema;

pub use client::{AuditInput, GeminiClient};
pub use extract::extract_json;

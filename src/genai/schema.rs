//! Response schemas sent with structured-output requests.

use serde_json::{json, Value};

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "is_ad": { "type": "BOOLEAN", "description": "True if the video is classified as an ad" },
            "confidence_score": { "type": "NUMBER", "description": "0.0 to 1.0 confidence" },
            "classification_reason": { "type": "STRING", "description": "Visual evidence for the classification" },
            "structure": {
                "type": "OBJECT",
                "properties": {
                    "hook": {
                        "type": "OBJECT",
                        "properties": {
                            "detected": { "type": "BOOLEAN" },
                            "type": { "type": "STRING" },
                            "description": { "type": "STRING" },
                            "effectiveness_score": { "type": "NUMBER", "description": "1-10" }
                        },
                        "required": ["detected", "type", "description", "effectiveness_score"]
                    },
                    "flow": {
                        "type": "OBJECT",
                        "properties": {
                            "pacing": { "type": "STRING" },
                            "structure_type": { "type": "STRING" }
                        },
                        "required": ["pacing", "structure_type"]
                    },
                    "elements": {
                        "type": "OBJECT",
                        "properties": {
                            "audio_style": { "type": "STRING" },
                            "visual_style": { "type": "STRING" },
                            "text_overlay_usage": { "type": "STRING" }
                        },
                        "required": ["audio_style", "visual_style", "text_overlay_usage"]
                    },
                    "cta": {
                        "type": "OBJECT",
                        "properties": {
                            "detected": { "type": "BOOLEAN" },
                            "type": { "type": "STRING" },
                            "content": { "type": "STRING" }
                        },
                        "required": ["detected", "type", "content"]
                    }
                },
                "required": ["hook", "flow", "elements", "cta"]
            },
            "metrics": {
                "type": "OBJECT",
                "properties": {
                    "commercial_intent_score": { "type": "NUMBER", "description": "0-10, 0 if not an ad" },
                    "target_audience": { "type": "STRING" },
                    "pain_point": { "type": "STRING" },
                    "product_focus": { "type": "STRING" }
                },
                "required": ["commercial_intent_score", "target_audience", "pain_point", "product_focus"]
            },
            "strategies": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "psychological_trigger": { "type": "STRING" }
                    },
                    "required": ["name", "description", "psychological_trigger"]
                }
            }
        },
        "required": ["is_ad", "confidence_score", "structure", "metrics"]
    })
}

pub fn plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "project_title": { "type": "STRING" },
            "aspect_ratio": { "type": "STRING" },
            "total_duration_sec": { "type": "NUMBER" },
            "background_music_keyword": { "type": "STRING" },
            "timeline": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "sequence_id": { "type": "INTEGER" },
                        "segment_type": { "type": "STRING", "enum": ["Hook", "Body", "CTA"] },
                        "visual_prompt": { "type": "STRING", "description": "Detailed prompt for the image model" },
                        "start_time": { "type": "NUMBER" },
                        "duration": { "type": "NUMBER" },
                        "text_overlay": {
                            "type": "OBJECT",
                            "properties": {
                                "content": { "type": "STRING" },
                                "position": { "type": "STRING", "enum": ["center", "bottom", "top"] },
                                "style": { "type": "STRING", "enum": ["big_bold", "subtle"] }
                            },
                            "required": ["content"]
                        },
                        "transition": { "type": "STRING", "enum": ["fade", "cut", "zoom"] }
                    },
                    "required": ["sequence_id", "segment_type", "visual_prompt", "duration", "start_time"]
                }
            }
        },
        "required": ["project_title", "aspect_ratio", "total_duration_sec", "timeline", "background_music_keyword"]
    })
}

use serde::{Deserialize, Deserializer, Serialize};

/// Competitor ad audit, used as context for replica plans.
///
/// URL audits run without a response schema, so the model may answer `null`
/// for anything it could not observe. Those fields decode to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysisResult {
    pub is_ad: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub classification_reason: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub structure: AdStructure,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: AdMetrics,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strategies: Vec<Strategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdStructure {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hook: Hook,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flow: Flow,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elements: Elements,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cta: CallToAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    #[serde(default, deserialize_with = "null_as_default")]
    pub detected: bool,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub effectiveness_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pacing: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub structure_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Elements {
    #[serde(default, deserialize_with = "null_as_default")]
    pub audio_style: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visual_style: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text_overlay_usage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToAction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub detected: bool,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdMetrics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub commercial_intent_score: f64,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub pain_point: Option<String>,
    #[serde(default)]
    pub product_focus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub psychological_trigger: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_ad_with_null_metrics_parses() {
        let value = json!({
            "is_ad": false,
            "confidence_score": 0.1,
            "structure": {
                "hook": { "detected": false, "type": "None", "description": "", "effectiveness_score": 0 },
                "flow": { "pacing": "Slow", "structure_type": "Vlog" },
                "elements": { "audio_style": "Voice", "visual_style": "UGC", "text_overlay_usage": "None" },
                "cta": { "detected": false, "type": "None", "content": "" }
            },
            "metrics": {
                "commercial_intent_score": 0,
                "target_audience": null,
                "pain_point": null,
                "product_focus": null
            }
        });

        let result: VideoAnalysisResult = serde_json::from_value(value).unwrap();
        assert!(!result.is_ad);
        assert!(result.strategies.is_empty());
        assert_eq!(result.structure.hook.kind, "None");
        assert!(result.metrics.target_audience.is_none());
    }

    #[test]
    fn url_audit_with_null_structure_parses() {
        let value = json!({
            "is_ad": false,
            "confidence_score": 0,
            "classification_reason": null,
            "structure": null,
            "metrics": { "commercial_intent_score": null, "target_audience": null },
            "strategies": null
        });

        let result: VideoAnalysisResult = serde_json::from_value(value).unwrap();
        assert!(!result.is_ad);
        assert_eq!(result.structure, AdStructure::default());
        assert_eq!(result.metrics.commercial_intent_score, 0.0);
        assert!(result.strategies.is_empty());
    }

    #[test]
    fn null_hook_and_cta_strings_parse() {
        let value = json!({
            "is_ad": true,
            "confidence_score": 0.4,
            "structure": {
                "hook": { "detected": true, "type": null, "description": null, "effectiveness_score": 5 },
                "cta": { "detected": false, "type": null, "content": null }
            },
            "metrics": { "commercial_intent_score": 3 }
        });

        let result: VideoAnalysisResult = serde_json::from_value(value).unwrap();
        assert!(result.structure.hook.detected);
        assert_eq!(result.structure.hook.kind, "");
        assert_eq!(result.structure.cta.content, "");
        assert_eq!(result.structure.flow, Flow::default());
    }
}

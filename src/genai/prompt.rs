use crate::orchestrator::PlanRequest;

/// Instructions for the competitor ad audit
pub const AUDIT_PROMPT: &str = r#"Role: You are a senior ad performance auditor.

Analyze the ACTUAL video content you are given. Do not produce generic answers and do not invent details.

Tasks:
1. AD MARKER SCAN: look for frames containing calls to action, product demos and brand overlays.
2. CLASSIFY: decide whether this is an ad, organic content, or unusable input.
3. STRUCTURE:
   - HOOK: describe exactly what happens in the first 3 seconds.
   - FLOW & PACING: estimate the cut rate. Fast? Slow?
   - ELEMENTS: identify the audio style and read any on-screen text.
   - CTA: quote the call to action verbatim if one is present.
4. METRICS: infer the target audience from the actors and style.
5. STRATEGIES: identify 3 specific creative strategies.

If the content is not an ad, or you cannot see it clearly, return 0/null metrics and a low confidence_score.

Respond with JSON only, matching the provided schema."#;

/// Suffix appended by `--enhance`
pub const ENHANCE_SUFFIX: &str =
    " -- high quality, 4k, trending on social media, detailed texture, perfect lighting.";

/// Prompt for auditing a video by URL through search grounding
pub fn build_audit_url_prompt(url: &str) -> String {
    format!(
        "{}\n\nThe video ad is at this URL: {}.\nUse search to find transcripts, frame descriptions or reviews of this specific video and base the analysis on them.\nIf you cannot find concrete details about its visual content, set confidence_score = 0 and is_ad = false.",
        AUDIT_PROMPT, url
    )
}

/// Build the edit decision list prompt from the run context
pub fn build_plan_prompt(request: &PlanRequest) -> String {
    let assets = serde_json::to_string(&request.assets).unwrap_or_else(|_| "[]".to_string());
    let analysis = request
        .analysis
        .as_ref()
        .and_then(|a| serde_json::to_string(a).ok())
        .unwrap_or_else(|| "NULL".to_string());
    let custom_prompt = if request.custom_prompt.trim().is_empty() {
        "NULL"
    } else {
        request.custom_prompt.as_str()
    };

    format!(
        r#"ROLE
You are the AdPulse creative director engine. Produce a precise edit decision list (EDL) in JSON for a generative video workflow.
You never pick existing footage. Every segment carries a "visual_prompt" that will be sent to an image generation model and later animated.

INPUT CONTEXT
User context assets: {assets}
Analysis data: {analysis}
User intent: Mode={mode}, Prompt={custom_prompt}
Brand info: {brand_info}

RULES
1. Visual prompts, not asset ids. Each prompt must be highly descriptive: lighting, camera angle, subject, texture.
2. Visual consistency. Hook, Body and CTA segments share one artistic style, chosen from the assets and brand info.
3. Mode:
   - COMPETITOR_REPLICA: follow the pacing and content structure of the analysis data, re-cast for this brand.
   - CUSTOM_PROMPT: build the sequence purely from the user's prompt.

OUTPUT
Return only a JSON object with a "timeline" array. No markdown."#,
        assets = assets,
        analysis = analysis,
        mode = request.mode.as_wire(),
        custom_prompt = custom_prompt,
        brand_info = request.brand_info,
    )
}

/// Brand description in the form the plan prompt expects
pub fn brand_info(voice: &str, product: &str) -> String {
    format!("Voice: {}. Product: {}", voice, product)
}

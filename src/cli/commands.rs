use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{AnimateArgs, AuditArgs, Commands, ConfigCommands, GenerateArgs, ModeArg};
use adpulse::assets::{AssetHandle, FsAssetEncoder};
use adpulse::genai::prompt;
use adpulse::genai::{AuditInput, GeminiClient};
use adpulse::orchestrator::{AssetEncoder, GenerationContext, GenerationMode, Orchestrator, RunEvent};
use adpulse::plan::{AspectRatio, GenerationPlan, GenerationStatus, VideoAnalysisResult};
use adpulse::Config;

pub async fn dispatch(
    config: &Config,
    config_path: Option<&Path>,
    command: Commands,
    pretty: bool,
) -> Result<()> {
    match command {
        Commands::Doctor => doctor(config, pretty),
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_show(config),
            ConfigCommands::Init { force } => config_init(config_path, force),
            ConfigCommands::Path => {
                let path = config_path
                    .map(Path::to_path_buf)
                    .unwrap_or_else(Config::default_path);
                println!("{}", path.display());
                Ok(())
            }
        },
        Commands::Audit(args) => audit(config, args, pretty).await,
        Commands::Generate(args) => generate(config, args, pretty).await,
        Commands::Animate(args) => animate(config, args, pretty).await,
    }
}

/// Doctor command - check configuration
pub fn doctor(config: &Config, pretty: bool) -> Result<()> {
    let api_status = match config.api_key() {
        Ok(_) => json!({
            "name": "api_key",
            "status": "ok",
            "message": "Configured"
        }),
        Err(e) => json!({
            "name": "api_key",
            "status": "error",
            "message": e.to_string()
        }),
    };

    let models = json!({
        "name": "models",
        "status": "ok",
        "message": format!(
            "text={} image={} video={}",
            config.provider.text_model, config.provider.image_model, config.provider.video_model
        )
    });

    let endpoint = json!({
        "name": "endpoint",
        "status": "ok",
        "message": config.provider.base_url()
    });

    let checks = vec![api_status, models, endpoint];

    if pretty {
        println!("AdPulse Doctor\n");
        for check in &checks {
            let icon = match check["status"].as_str().unwrap_or("") {
                "ok" => "\u{2714}",
                "warning" => "\u{26A0}",
                "error" => "\u{2718}",
                _ => "?",
            };
            println!(
                "{} {}: {}",
                icon,
                check["name"].as_str().unwrap_or(""),
                check["message"].as_str().unwrap_or("")
            );
        }
    } else {
        println!("{}", serde_json::to_string(&json!({ "checks": checks }))?);
    }

    Ok(())
}

fn config_show(config: &Config) -> Result<()> {
    let rendered =
        toml::to_string_pretty(&config.redacted()).context("Failed to serialize config")?;
    print!("{}", rendered);
    Ok(())
}

fn config_init(path: Option<&Path>, force: bool) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().write(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Audit command - classify and dissect a competitor ad
pub async fn audit(config: &Config, args: AuditArgs, pretty: bool) -> Result<()> {
    let client = GeminiClient::new(config)?;

    let input = match (&args.file, &args.url) {
        (Some(file), _) => {
            let encoded = FsAssetEncoder.encode(&AssetHandle::new(file)).await?;
            AuditInput::File(encoded)
        }
        (None, Some(url)) if !url.trim().is_empty() => AuditInput::Url(url.trim().to_string()),
        _ => anyhow::bail!("Please enter a valid URL."),
    };

    let analysis = client
        .analyze_video(&input)
        .await
        .context("Failed to analyze video")?;

    if let Some(path) = &args.save {
        std::fs::write(path, serde_json::to_string_pretty(&analysis)?)
            .with_context(|| format!("Failed to write analysis to {:?}", path))?;
        tracing::info!("Saved analysis to {}", path.display());
    }

    if pretty {
        print_analysis_pretty(&analysis);
    } else {
        println!("{}", serde_json::to_string(&analysis)?);
    }

    Ok(())
}

fn print_analysis_pretty(analysis: &VideoAnalysisResult) {
    println!(
        "Ad: {} (confidence {:.2})",
        if analysis.is_ad { "yes" } else { "no" },
        analysis.confidence_score
    );
    if !analysis.classification_reason.is_empty() {
        println!("Reason: {}", analysis.classification_reason);
    }

    let s = &analysis.structure;
    println!(
        "\nHook: {} ({}/10)\n  {}",
        s.hook.kind, s.hook.effectiveness_score, s.hook.description
    );
    println!("Flow: {} / {}", s.flow.pacing, s.flow.structure_type);
    println!(
        "Elements: audio={} visual={} text={}",
        s.elements.audio_style, s.elements.visual_style, s.elements.text_overlay_usage
    );
    if s.cta.detected {
        println!("CTA: {} \"{}\"", s.cta.kind, s.cta.content);
    } else {
        println!("CTA: none");
    }

    let m = &analysis.metrics;
    println!("\nCommercial intent: {}/10", m.commercial_intent_score);
    for (label, value) in [
        ("Audience", &m.target_audience),
        ("Pain point", &m.pain_point),
        ("Product", &m.product_focus),
    ] {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }

    if !analysis.strategies.is_empty() {
        println!("\nStrategies:");
        for (i, strategy) in analysis.strategies.iter().enumerate() {
            println!(
                "  {}. {} [{}]\n     {}",
                i + 1,
                strategy.name,
                strategy.psychological_trigger,
                strategy.description
            );
        }
    }
}

/// Turn CLI arguments into a run context
pub fn build_context(
    args: &GenerateArgs,
    analysis: Option<VideoAnalysisResult>,
) -> Result<GenerationContext> {
    let mode = match args.mode {
        ModeArg::Custom => GenerationMode::Custom,
        ModeArg::Replica => GenerationMode::CompetitorReplica,
    };
    if mode == GenerationMode::CompetitorReplica && analysis.is_none() {
        anyhow::bail!("Replica mode needs --analysis (create one with `adpulse audit --save`)");
    }

    let mut custom_prompt = args.prompt.clone();
    if args.enhance && !custom_prompt.is_empty() {
        custom_prompt.push_str(prompt::ENHANCE_SUFFIX);
    }

    Ok(GenerationContext {
        mode,
        brand_assets: args.assets.iter().map(AssetHandle::new).collect(),
        analysis,
        custom_prompt,
        brand_info: prompt::brand_info(args.voice.label(), &args.product),
        reference_image: args.reference.as_ref().map(AssetHandle::new),
    })
}

/// Generate command - storyboard plus frames
pub async fn generate(config: &Config, args: GenerateArgs, pretty: bool) -> Result<()> {
    let analysis = match &args.analysis {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read analysis file: {:?}", path))?;
            Some(serde_json::from_str(&contents).context("Failed to parse analysis file")?)
        }
        None => None,
    };
    let context = build_context(&args, analysis)?;

    let client = Arc::new(GeminiClient::new(config)?);
    let orchestrator = Orchestrator::new(client.clone(), client, Arc::new(FsAssetEncoder))
        .with_image_timeout(config.generation.image_timeout());

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing current frame");
                cancel.cancel();
            }
        });
    }

    let mut events = Box::pin(orchestrator.run_generation(context, cancel));
    let mut latest: Option<GenerationPlan> = None;
    let mut cancelled = false;

    while let Some(event) = events.next().await {
        match event {
            RunEvent::Update(update) => {
                let total = update.plan.segments.len();
                let settled = update.plan.settled_count();
                if pretty {
                    eprintln!("[{}/{}] {}", settled, total, update.status_message);
                } else {
                    tracing::info!("[{}/{}] {}", settled, total, update.status_message);
                }
                latest = Some(update.plan);
            }
            RunEvent::Error(e) => {
                return Err(anyhow::Error::new(e).context("Storyboard generation failed"));
            }
            RunEvent::Complete { cancelled: c } => cancelled = c,
        }
    }

    let plan = latest.context("Generation ended without a plan")?;
    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| config.generation.output_dir.clone());
    let frames = export_plan(&plan, &out_dir)?;

    if pretty {
        print_plan_pretty(&plan);
        println!("\nWrote {} frame(s) to {}", frames.len(), out_dir.display());
        if cancelled {
            println!("Run was cancelled before every frame was rendered");
        }
    } else {
        let segments: Vec<_> = plan
            .segments
            .iter()
            .map(|s| {
                json!({
                    "sequence_id": s.sequence_id,
                    "segment_type": s.segment_type,
                    "status": s.status(),
                    "frame": s.frame_file_name(),
                })
            })
            .collect();
        println!(
            "{}",
            json!({
                "title": plan.title,
                "cancelled": cancelled,
                "output_dir": out_dir,
                "segments": segments,
            })
        );
    }

    Ok(())
}

/// Write `plan.json` and one file per rendered frame
pub fn export_plan(plan: &GenerationPlan, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let plan_path = out_dir.join("plan.json");
    std::fs::write(&plan_path, serde_json::to_string_pretty(plan)?)
        .with_context(|| format!("Failed to write {:?}", plan_path))?;

    let mut written = Vec::new();
    for segment in &plan.segments {
        let (Some(image), Some(name)) = (segment.image(), segment.frame_file_name()) else {
            continue;
        };
        let path = out_dir.join(name);
        std::fs::write(&path, image.decode()?)
            .with_context(|| format!("Failed to write frame {:?}", path))?;
        written.push(path);
    }

    Ok(written)
}

fn print_plan_pretty(plan: &GenerationPlan) {
    println!("\n{}", plan.title);
    println!(
        "{} | {}s | music: {}\n",
        plan.aspect_ratio, plan.total_duration_seconds, plan.music_keyword
    );
    for segment in &plan.segments {
        let icon = match segment.status() {
            GenerationStatus::Done => "\u{2714}",
            GenerationStatus::Failed => "\u{2718}",
            _ => "\u{2026}",
        };
        println!(
            "{} #{} {} @{}s ({}s)",
            icon,
            segment.sequence_id,
            segment.segment_type.as_str(),
            segment.start_time,
            segment.duration_seconds
        );
        println!("    {}", segment.visual_prompt);
        if let Some(overlay) = &segment.text_overlay {
            println!("    text: \"{}\"", overlay.content);
        }
    }
}

/// Animate command - long-running video synthesis
pub async fn animate(config: &Config, args: AnimateArgs, pretty: bool) -> Result<()> {
    let client = GeminiClient::new(config)?;

    let image = match &args.image {
        Some(path) => Some(FsAssetEncoder.encode(&AssetHandle::new(path)).await?),
        None => None,
    };
    let aspect_ratio = if args.portrait {
        AspectRatio::Portrait
    } else {
        AspectRatio::Landscape
    };

    let uri = client
        .generate_video(&args.prompt, &aspect_ratio, image.as_ref())
        .await
        .context("Video generation failed")?;

    if pretty {
        println!("Video ready: {}", uri);
    } else {
        println!("{}", json!({ "uri": uri }));
    }
    Ok(())
}

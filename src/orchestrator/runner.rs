use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    AssetEncoder, GenerationContext, ImageGenerator, PlanGenerator, PlanRequest, PlanUpdate,
    RunEvent,
};
use crate::assets::EncodedAsset;
use crate::error::{AdPulseError, Result};
use crate::plan::{AspectRatio, GeneratedImage, GenerationPlan, Segment};

const EVENT_BUFFER: usize = 16;

/// Drives plan synthesis and per-segment rendering for one run at a time
#[derive(Clone)]
pub struct Orchestrator {
    planner: Arc<dyn PlanGenerator>,
    images: Arc<dyn ImageGenerator>,
    encoder: Arc<dyn AssetEncoder>,
    image_timeout: Option<Duration>,
}

/// Why the segment loop stopped early
enum Stop {
    Cancelled,
    ReceiverGone,
}

impl Orchestrator {
    pub fn new(
        planner: Arc<dyn PlanGenerator>,
        images: Arc<dyn ImageGenerator>,
        encoder: Arc<dyn AssetEncoder>,
    ) -> Self {
        Self {
            planner,
            images,
            encoder,
            image_timeout: None,
        }
    }

    /// Per-call limit on image generation; an expired call fails its segment
    pub fn with_image_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.image_timeout = timeout;
        self
    }

    /// Spawn a run and return its event stream.
    ///
    /// The stream ends after a terminal `Error` or `Complete` event. Dropping
    /// it stops the run before the next image call.
    pub fn run_generation(
        &self,
        context: GenerationContext,
        cancel: CancellationToken,
    ) -> impl Stream<Item = RunEvent> + Send + 'static {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let this = self.clone();
        tokio::spawn(async move { this.run(context, tx, cancel).await });
        futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|e| (e, rx)) })
    }

    /// Run to completion, sending every event to `events`
    pub async fn run(
        &self,
        context: GenerationContext,
        events: mpsc::Sender<RunEvent>,
        cancel: CancellationToken,
    ) {
        tracing::info!("Architecting Script & Strategy...");

        let plan = match self.synthesize(&context).await {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!("Plan synthesis failed: {}", e);
                let _ = events.send(RunEvent::Error(e)).await;
                return;
            }
        };

        let cancelled = match self.render_all(plan, &context, &events, &cancel).await {
            Ok(()) => false,
            Err(Stop::Cancelled) => true,
            Err(Stop::ReceiverGone) => {
                tracing::info!("Event receiver dropped, abandoning run");
                return;
            }
        };

        if cancelled {
            tracing::info!("Storyboard generation cancelled");
        } else {
            tracing::info!("Storyboard Generation Complete.");
        }
        let _ = events.send(RunEvent::Complete { cancelled }).await;
    }

    /// Single attempt. Any failure here ends the run.
    async fn synthesize(&self, context: &GenerationContext) -> Result<GenerationPlan> {
        let request = PlanRequest::from(context);
        let plan = self
            .planner
            .generate_plan(&request)
            .await
            .map_err(|e| match e {
                AdPulseError::Generation(_) => e,
                other => AdPulseError::Generation(other.to_string()),
            })?;

        plan.normalized()
    }

    async fn render_all(
        &self,
        plan: GenerationPlan,
        context: &GenerationContext,
        events: &mpsc::Sender<RunEvent>,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), Stop> {
        let mut plan = plan.with_segments(plan.segments.iter().map(Segment::started).collect());
        publish(events, &plan, "Visualizing Storyboard Frames...".to_string()).await?;

        let reference = self.resolve_reference(context).await;
        let total = plan.segments.len();

        for index in 0..total {
            if cancel.is_cancelled() {
                let remaining = plan.segments.iter().map(Segment::failed).collect();
                plan = plan.with_segments(remaining);
                publish(events, &plan, "Generation cancelled".to_string()).await?;
                return Err(Stop::Cancelled);
            }

            let segment = &plan.segments[index];
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AdPulseError::ImageGeneration("cancelled".to_string())),
                result = self.render(segment, &plan.aspect_ratio, reference.as_ref()) => result,
            };

            let (settled, message) = match outcome {
                Ok(image) => (
                    segment.completed(image),
                    format!("Rendered frame {} of {}", index + 1, total),
                ),
                Err(e) => {
                    tracing::warn!(
                        "Failed to generate image for segment {}: {}",
                        segment.sequence_id,
                        e
                    );
                    (
                        segment.failed(),
                        format!("Frame {} of {} failed", index + 1, total),
                    )
                }
            };

            let mut segments = plan.segments.clone();
            segments[index] = settled;
            plan = plan.with_segments(segments);
            publish(events, &plan, message).await?;
        }

        if cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        Ok(())
    }

    async fn render(
        &self,
        segment: &Segment,
        aspect_ratio: &AspectRatio,
        reference: Option<&EncodedAsset>,
    ) -> Result<GeneratedImage> {
        tracing::debug!("Rendering segment {}", segment.sequence_id);
        let call = self
            .images
            .generate_image(&segment.visual_prompt, aspect_ratio, reference);

        match self.image_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AdPulseError::Timeout(limit))?,
            None => call.await,
        }
    }

    /// Explicit reference first, then the first brand asset. Encoded once per run.
    async fn resolve_reference(&self, context: &GenerationContext) -> Option<EncodedAsset> {
        let asset = context
            .reference_image
            .as_ref()
            .or_else(|| context.brand_assets.first())?;

        match self.encoder.encode(asset).await {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!("Continuing without reference image: {}", e);
                None
            }
        }
    }
}

async fn publish(
    events: &mpsc::Sender<RunEvent>,
    plan: &GenerationPlan,
    status_message: String,
) -> std::result::Result<(), Stop> {
    tracing::debug!("{}", status_message);
    events
        .send(RunEvent::Update(PlanUpdate {
            plan: plan.clone(),
            status_message,
        }))
        .await
        .map_err(|_| Stop::ReceiverGone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetHandle;
    use crate::orchestrator::{GenerationMode, PlanGenerator};
    use crate::plan::{GenerationStatus, SegmentType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedPlan(GenerationPlan);

    #[async_trait]
    impl PlanGenerator for FixedPlan {
        async fn generate_plan(&self, _request: &PlanRequest) -> Result<GenerationPlan> {
            Ok(self.0.clone())
        }
    }

    /// Records prompts and fails the listed ones
    #[derive(Default)]
    struct ScriptedImages {
        calls: Mutex<Vec<(String, Option<String>)>>,
        fail: Vec<&'static str>,
    }

    #[async_trait]
    impl ImageGenerator for ScriptedImages {
        async fn generate_image(
            &self,
            prompt: &str,
            _aspect_ratio: &AspectRatio,
            reference: Option<&EncodedAsset>,
        ) -> Result<GeneratedImage> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), reference.map(|r| r.data.clone())));
            if self.fail.iter().any(|f| *f == prompt) {
                return Err(AdPulseError::ImageGeneration("No image generated by AI".into()));
            }
            Ok(GeneratedImage {
                mime_type: "image/png".to_string(),
                data: format!("img-{}", prompt),
            })
        }
    }

    #[derive(Default)]
    struct CountingEncoder {
        calls: AtomicUsize,
        broken: bool,
    }

    #[async_trait]
    impl AssetEncoder for CountingEncoder {
        async fn encode(&self, asset: &AssetHandle) -> Result<EncodedAsset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(AdPulseError::Encoding {
                    path: asset.name(),
                    message: "unreadable".into(),
                });
            }
            Ok(EncodedAsset {
                mime_type: asset.mime_type.clone(),
                data: asset.name(),
            })
        }
    }

    fn plan(prompts: &[&str]) -> GenerationPlan {
        GenerationPlan {
            title: "Test".to_string(),
            aspect_ratio: AspectRatio::Portrait,
            total_duration_seconds: 15.0,
            music_keyword: "lofi".to_string(),
            segments: prompts
                .iter()
                .enumerate()
                .map(|(i, p)| Segment::new(i as u32 + 1, SegmentType::Body, *p))
                .collect(),
        }
    }

    fn context(assets: &[&str], reference: Option<&str>) -> GenerationContext {
        GenerationContext {
            mode: GenerationMode::Custom,
            brand_assets: assets.iter().map(AssetHandle::new).collect(),
            analysis: None,
            custom_prompt: "summer launch".to_string(),
            brand_info: "Voice: Professional. Product: Shoes".to_string(),
            reference_image: reference.map(AssetHandle::new),
        }
    }

    async fn collect(orchestrator: &Orchestrator, ctx: GenerationContext) -> Vec<RunEvent> {
        let (tx, mut rx) = mpsc::channel(64);
        orchestrator.run(ctx, tx, CancellationToken::new()).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn final_plan(events: &[RunEvent]) -> &GenerationPlan {
        events
            .iter()
            .rev()
            .find_map(|e| match e {
                RunEvent::Update(u) => Some(&u.plan),
                _ => None,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn explicit_reference_beats_brand_assets() {
        let images = Arc::new(ScriptedImages::default());
        let encoder = Arc::new(CountingEncoder::default());
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["a", "b"]))),
            images.clone(),
            encoder.clone(),
        );

        collect(&orchestrator, context(&["logo.png"], Some("hero.png"))).await;

        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
        let calls = images.calls.lock().unwrap();
        assert!(calls.iter().all(|(_, r)| r.as_deref() == Some("hero.png")));
    }

    #[tokio::test]
    async fn no_assets_means_no_reference() {
        let images = Arc::new(ScriptedImages::default());
        let encoder = Arc::new(CountingEncoder::default());
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["a"]))),
            images.clone(),
            encoder.clone(),
        );

        let events = collect(&orchestrator, context(&[], None)).await;

        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(images.calls.lock().unwrap()[0].1, None);
        assert!(matches!(events.last(), Some(RunEvent::Complete { cancelled: false })));
    }

    #[tokio::test]
    async fn encode_failure_is_not_fatal() {
        let images = Arc::new(ScriptedImages::default());
        let encoder = Arc::new(CountingEncoder {
            broken: true,
            ..Default::default()
        });
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["a", "b"]))),
            images.clone(),
            encoder,
        );

        let events = collect(&orchestrator, context(&["logo.png"], None)).await;

        assert!(images.calls.lock().unwrap().iter().all(|(_, r)| r.is_none()));
        let plan = final_plan(&events);
        assert!(plan
            .segments
            .iter()
            .all(|s| s.status() == GenerationStatus::Done));
    }

    #[tokio::test]
    async fn every_segment_failing_still_completes() {
        let images = Arc::new(ScriptedImages {
            fail: vec!["a", "b"],
            ..Default::default()
        });
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["a", "b"]))),
            images,
            Arc::new(CountingEncoder::default()),
        );

        let events = collect(&orchestrator, context(&[], None)).await;

        assert!(!events.iter().any(|e| matches!(e, RunEvent::Error(_))));
        assert!(matches!(events.last(), Some(RunEvent::Complete { cancelled: false })));
        let plan = final_plan(&events);
        assert!(plan
            .segments
            .iter()
            .all(|s| s.status() == GenerationStatus::Failed && s.image().is_none()));
    }

    #[tokio::test]
    async fn empty_plan_is_fatal() {
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&[]))),
            Arc::new(ScriptedImages::default()),
            Arc::new(CountingEncoder::default()),
        );

        let events = collect(&orchestrator, context(&[], None)).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], RunEvent::Error(AdPulseError::Generation(_))));
    }

    #[tokio::test]
    async fn settled_count_grows_by_one_per_update() {
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["a", "b", "c"]))),
            Arc::new(ScriptedImages {
                fail: vec!["b"],
                ..Default::default()
            }),
            Arc::new(CountingEncoder::default()),
        );

        let events = collect(&orchestrator, context(&[], None)).await;

        let counts: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Update(u) => Some(u.plan.settled_count()),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn timed_out_segment_fails_and_run_continues() {
        struct SlowFirst;

        #[async_trait]
        impl ImageGenerator for SlowFirst {
            async fn generate_image(
                &self,
                prompt: &str,
                _aspect_ratio: &AspectRatio,
                _reference: Option<&EncodedAsset>,
            ) -> Result<GeneratedImage> {
                if prompt == "slow" {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok(GeneratedImage {
                    mime_type: "image/png".to_string(),
                    data: prompt.to_string(),
                })
            }
        }

        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["slow", "fast"]))),
            Arc::new(SlowFirst),
            Arc::new(CountingEncoder::default()),
        )
        .with_image_timeout(Some(Duration::from_millis(50)));

        let events = collect(&orchestrator, context(&[], None)).await;

        let plan = final_plan(&events);
        assert_eq!(plan.segments[0].status(), GenerationStatus::Failed);
        assert_eq!(plan.segments[1].status(), GenerationStatus::Done);
    }

    #[tokio::test]
    async fn cancellation_stops_further_calls() {
        struct CancelAfterFirst {
            token: CancellationToken,
            calls: AtomicUsize,
        }

        #[async_trait]
        impl ImageGenerator for CancelAfterFirst {
            async fn generate_image(
                &self,
                prompt: &str,
                _aspect_ratio: &AspectRatio,
                _reference: Option<&EncodedAsset>,
            ) -> Result<GeneratedImage> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.token.cancel();
                Ok(GeneratedImage {
                    mime_type: "image/png".to_string(),
                    data: prompt.to_string(),
                })
            }
        }

        let token = CancellationToken::new();
        let images = Arc::new(CancelAfterFirst {
            token: token.clone(),
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["a", "b", "c"]))),
            images.clone(),
            Arc::new(CountingEncoder::default()),
        );

        let (tx, mut rx) = mpsc::channel(64);
        orchestrator.run(context(&[], None), tx, token).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(images.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(events.last(), Some(RunEvent::Complete { cancelled: true })));
        let statuses: Vec<GenerationStatus> =
            final_plan(&events).segments.iter().map(|s| s.status()).collect();
        assert_eq!(
            statuses,
            vec![
                GenerationStatus::Done,
                GenerationStatus::Failed,
                GenerationStatus::Failed
            ]
        );
    }

    #[tokio::test]
    async fn in_flight_call_is_abandoned_on_cancel() {
        struct Hangs {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl ImageGenerator for Hangs {
            async fn generate_image(
                &self,
                _prompt: &str,
                _aspect_ratio: &AspectRatio,
                _reference: Option<&EncodedAsset>,
            ) -> Result<GeneratedImage> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                std::future::pending().await
            }
        }

        let token = CancellationToken::new();
        let images = Arc::new(Hangs {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["a", "b"]))),
            images.clone(),
            Arc::new(CountingEncoder::default()),
        );

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let (tx, mut rx) = mpsc::channel(64);
        orchestrator.run(context(&[], None), tx, token).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(images.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(events.last(), Some(RunEvent::Complete { cancelled: true })));
        let plan = final_plan(&events);
        assert!(plan
            .segments
            .iter()
            .all(|s| s.status() == GenerationStatus::Failed && s.image().is_none()));
    }

    #[tokio::test]
    async fn settled_segments_from_planner_are_reset() {
        let images = Arc::new(ScriptedImages::default());
        let mut fixed = plan(&["a", "b"]);
        fixed.segments[1] = fixed.segments[1].started().completed(GeneratedImage {
            mime_type: "image/png".to_string(),
            data: "stale".to_string(),
        });
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(fixed)),
            images.clone(),
            Arc::new(CountingEncoder::default()),
        );

        let events = collect(&orchestrator, context(&[], None)).await;

        let RunEvent::Update(first) = &events[0] else {
            panic!("expected an update first");
        };
        assert!(first
            .plan
            .segments
            .iter()
            .all(|s| s.status() == GenerationStatus::InProgress && s.image().is_none()));
        assert_eq!(images.calls.lock().unwrap().len(), 2);
        let last = final_plan(&events);
        assert_eq!(last.segments[1].image().unwrap().data, "img-b");
    }

    #[tokio::test]
    async fn duplicate_ids_from_planner_are_fatal() {
        let images = Arc::new(ScriptedImages::default());
        let mut fixed = plan(&["a", "b"]);
        fixed.segments[1].sequence_id = 1;
        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(fixed)),
            images.clone(),
            Arc::new(CountingEncoder::default()),
        );

        let events = collect(&orchestrator, context(&[], None)).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], RunEvent::Error(AdPulseError::Generation(_))));
        assert!(images.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stream_ends_after_terminal_event() {
        use futures::StreamExt;

        let orchestrator = Orchestrator::new(
            Arc::new(FixedPlan(plan(&["a", "b"]))),
            Arc::new(ScriptedImages::default()),
            Arc::new(CountingEncoder::default()),
        );

        let events: Vec<RunEvent> = orchestrator
            .run_generation(context(&[], None), CancellationToken::new())
            .collect()
            .await;

        assert_eq!(events.len(), 4);
        assert!(matches!(events[3], RunEvent::Complete { cancelled: false }));
    }
}

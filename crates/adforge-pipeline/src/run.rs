//! End-to-end orchestration of a generation request.
//!
//! One pipeline instance owns the three external clients. A set run is:
//! validated generation → record creation → render submission; watching the
//! renders is a separate step so callers can run it in the background.
//! Each external write is keyed by record id, so reissuing an update
//! overwrites instead of duplicating.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use adforge_llm_client::{build_set_instruction, build_single_instruction, LlmClient};
use adforge_models::{
    AdLabel, Creative, CreativeSet, CreativeStatus, FunnelStage, RenderJob, RenderJobId,
    RenderState, VideoSlot,
};
use adforge_notion::{CreativeRepository, RenderUpdate};
use adforge_video_client::VideoClient;

use crate::error::{PipelineError, PollError};
use crate::generate::{generate_set_with_retry, generate_single_with_retry, DEFAULT_GENERATION_ATTEMPTS};
use crate::poll::{poll_until_done, JobUpdate, PollConfig, PollSummary, UpdateSink};

/// Pipeline tuning, constructed once at startup and passed in.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Generation attempt budget (initial call + corrective retries)
    pub max_generation_attempts: u32,
    /// Render polling configuration
    pub poll: PollConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
            poll: PollConfig::default(),
        }
    }
}

/// Result of a set run, before render polling.
#[derive(Debug, Clone)]
pub struct SetRunReport {
    /// The set that was generated
    pub set: CreativeSet,
    /// Validated creatives, in label order
    pub creatives: Vec<Creative>,
    /// Record id per label, for the rows that persisted
    pub pages: HashMap<AdLabel, String>,
    /// Render jobs that were accepted by the provider
    pub jobs: Vec<RenderJob>,
    /// Per-row persistence or per-slot submission failures
    pub errors: Vec<String>,
}

/// A regeneration request for one existing record.
#[derive(Debug, Clone)]
pub struct RegenerationRequest {
    pub page_id: String,
    pub label: AdLabel,
    pub persona: String,
    pub market: String,
    /// Reviewer feedback to incorporate
    pub feedback: String,
    /// Iteration currently stored on the record
    pub current_iteration: u32,
}

/// Orchestrates generation, persistence and render polling.
pub struct CreativePipeline {
    llm: Arc<LlmClient>,
    video: Arc<VideoClient>,
    records: Arc<CreativeRepository>,
    config: PipelineConfig,
}

impl CreativePipeline {
    pub fn new(
        llm: Arc<LlmClient>,
        video: Arc<VideoClient>,
        records: Arc<CreativeRepository>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            llm,
            video,
            records,
            config,
        }
    }

    /// Generate a full set: validated copy, one record per creative, one
    /// render job per slot. Returns without waiting for the renders; pass
    /// the report to [`CreativePipeline::watch_renders`].
    pub async fn run_set(
        &self,
        persona: &str,
        market: &str,
        funnel_focus: FunnelStage,
    ) -> Result<SetRunReport, PipelineError> {
        let set = CreativeSet::new(persona.trim(), market.trim(), funnel_focus);
        info!(set_id = %set.set_id, "Starting set generation");

        let instruction =
            build_set_instruction(&set.set_id, &set.persona, &set.market, set.funnel_focus);
        let validated = generate_set_with_retry(
            self.llm.as_ref(),
            &instruction,
            self.config.max_generation_attempts,
        )
        .await?;

        let mut errors = Vec::new();

        // Persist one record per creative. A single failed row does not
        // abort the set; it is reported instead.
        let mut pages = HashMap::new();
        for creative in &validated.creatives {
            match self.records.create(&set, creative).await {
                Ok(page_id) => {
                    pages.insert(creative.label, page_id);
                }
                Err(e) => {
                    error!(label = %creative.label, "Failed to persist creative record: {}", e);
                    errors.push(format!("Ad {}: {}", creative.label, e));
                }
            }
        }

        // Submit one render per slot. A rejected submit marks the slot
        // failed on its rows and the set continues.
        let mut jobs = Vec::new();
        for slot in VideoSlot::ALL {
            let prompt = match validated.video_prompts.get(&slot) {
                Some(prompt) => prompt,
                None => continue,
            };
            match self.video.submit(prompt).await {
                Ok(job_id) => {
                    info!(slot = %slot, job_id = %job_id, "Render task submitted");
                    jobs.push(RenderJob::new(job_id, slot));
                }
                Err(e) => {
                    warn!(slot = %slot, "Render submission failed: {}", e);
                    errors.push(format!("Video {}: {}", slot, e));
                    self.mark_slot_failed(&pages, &validated.creatives, slot, &e.to_string())
                        .await;
                }
            }
        }

        info!(
            set_id = %set.set_id,
            records = pages.len(),
            jobs = jobs.len(),
            "Set generation complete, renders in flight"
        );

        Ok(SetRunReport {
            set,
            creatives: validated.creatives,
            pages,
            jobs,
            errors,
        })
    }

    /// Drive the report's render jobs to terminal states, recording every
    /// transition on the rows that reference the slot.
    pub async fn watch_renders(&self, report: &SetRunReport) -> Result<PollSummary, PollError> {
        let job_ids: Vec<RenderJobId> = report.jobs.iter().map(|j| j.job_id.clone()).collect();
        if job_ids.is_empty() {
            return Ok(PollSummary {
                attempts: 0,
                outcomes: Vec::new(),
            });
        }

        let mut sink = RecordSink::new(self.records.clone(), report);
        poll_until_done(self.video.as_ref(), &job_ids, &self.config.poll, &mut sink).await
    }

    /// Regenerate one creative's copy with reviewer feedback and update its
    /// record. Returns the accepted creative at its new iteration.
    ///
    /// Whether a video shared with other creatives should also re-render is
    /// the caller's policy; this method touches copy only.
    pub async fn regenerate(&self, request: &RegenerationRequest) -> Result<Creative, PipelineError> {
        info!(page_id = %request.page_id, label = %request.label, "Regenerating creative");

        let instruction = build_single_instruction(
            request.label,
            &request.persona,
            &request.market,
            &request.feedback,
        );
        let mut creative = generate_single_with_retry(
            self.llm.as_ref(),
            &instruction,
            request.label,
            self.config.max_generation_attempts,
        )
        .await?;

        creative.iteration = request.current_iteration + 1;
        creative.status = CreativeStatus::Generated;

        self.records
            .update_copy(
                &request.page_id,
                &creative.headline,
                &creative.primary_text,
                &creative.cta,
                creative.iteration,
            )
            .await?;

        Ok(creative)
    }

    /// Record a failed submission on every row referencing the slot.
    async fn mark_slot_failed(
        &self,
        pages: &HashMap<AdLabel, String>,
        creatives: &[Creative],
        slot: VideoSlot,
        reason: &str,
    ) {
        let update = RenderUpdate {
            state: RenderState::Failed,
            video_url: None,
            status: None,
        };
        for creative in creatives.iter().filter(|c| c.video_slot == slot) {
            let Some(page_id) = pages.get(&creative.label) else {
                continue;
            };
            if let Err(e) = self.records.apply_render_update(page_id, &update).await {
                error!(page_id = %page_id, slot = %slot, reason, "Failed to record submission failure: {}", e);
            }
        }
    }
}

/// Persistence sink: fans each job transition out to the rows whose
/// creative references the job's slot.
struct RecordSink {
    records: Arc<CreativeRepository>,
    slots: HashMap<RenderJobId, VideoSlot>,
    pages_by_slot: HashMap<VideoSlot, Vec<String>>,
}

impl RecordSink {
    fn new(records: Arc<CreativeRepository>, report: &SetRunReport) -> Self {
        let slots = report
            .jobs
            .iter()
            .map(|job| (job.job_id.clone(), job.slot))
            .collect();

        let mut pages_by_slot: HashMap<VideoSlot, Vec<String>> = HashMap::new();
        for creative in &report.creatives {
            if let Some(page_id) = report.pages.get(&creative.label) {
                pages_by_slot
                    .entry(creative.video_slot)
                    .or_default()
                    .push(page_id.clone());
            }
        }

        Self {
            records,
            slots,
            pages_by_slot,
        }
    }

    /// Creative status recorded alongside a render transition.
    fn status_for(state: RenderState) -> Option<CreativeStatus> {
        match state {
            RenderState::Processing => Some(CreativeStatus::Generating),
            RenderState::Completed => Some(CreativeStatus::Generated),
            RenderState::Queued | RenderState::Failed => None,
        }
    }
}

#[async_trait]
impl UpdateSink for RecordSink {
    async fn on_update(&mut self, update: JobUpdate) {
        let Some(slot) = self.slots.get(&update.job_id).copied() else {
            warn!(job_id = %update.job_id, "Update for unknown render job");
            return;
        };

        let render_update = RenderUpdate {
            state: update.state,
            video_url: update.video_url.clone(),
            status: Self::status_for(update.state),
        };

        for page_id in self.pages_by_slot.get(&slot).into_iter().flatten() {
            // A failed write is logged, not fatal: the next transition or a
            // manual refresh re-applies the same keyed update
            if let Err(e) = self.records.apply_render_update(page_id, &render_update).await {
                error!(page_id = %page_id, slot = %slot, "Failed to record render update: {}", e);
            }
        }
    }
}

//! Job poller: drive render jobs to a terminal state.
//!
//! Sweeps all non-terminal jobs at a fixed interval. Every observed status
//! transition is forwarded to the sink exactly once, in transition order
//! per job. The poll exits early when every job is terminal; on exhaustion
//! it reports the unresolved ids without retracting updates already
//! delivered.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use adforge_models::{RenderJobId, RenderState};
use adforge_video_client::{StatusSnapshot, VideoClient};

use crate::error::{PollError, ServiceError};

/// Polling configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Suspension between sweeps
    pub interval: Duration,
    /// Maximum number of sweeps
    pub max_attempts: u32,
    /// Transient status-query retries within one sweep, per job
    pub status_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
            status_retries: 2,
        }
    }
}

/// One observed status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    pub job_id: RenderJobId,
    pub state: RenderState,
    /// Clip URL, present only on completion
    pub video_url: Option<String>,
    /// Provider error, present only on failure
    pub error: Option<String>,
}

/// Terminal outcome of one job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: RenderJobId,
    pub state: RenderState,
    pub video_url: Option<String>,
}

/// Summary of a completed poll.
#[derive(Debug, Clone)]
pub struct PollSummary {
    /// Sweeps used before every job went terminal
    pub attempts: u32,
    /// Terminal state per job, in submission order
    pub outcomes: Vec<JobOutcome>,
}

impl PollSummary {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == RenderState::Completed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == RenderState::Failed)
            .count()
    }
}

/// Source of render job status observations.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(&self, job_id: &RenderJobId) -> Result<StatusSnapshot, ServiceError>;
}

#[async_trait]
impl StatusSource for VideoClient {
    async fn status(&self, job_id: &RenderJobId) -> Result<StatusSnapshot, ServiceError> {
        Ok(VideoClient::status(self, job_id).await?)
    }
}

/// Receiver of observed transitions, typically a persistence writer.
#[async_trait]
pub trait UpdateSink: Send {
    async fn on_update(&mut self, update: JobUpdate);
}

/// Poll all jobs until every one is terminal or the sweep budget runs out.
///
/// A job's last observed state starts at [`RenderState::Queued`], the state
/// it holds on submit, so the first sink call for a job is its first real
/// transition.
pub async fn poll_until_done<S, U>(
    source: &S,
    jobs: &[RenderJobId],
    config: &PollConfig,
    sink: &mut U,
) -> Result<PollSummary, PollError>
where
    S: StatusSource + ?Sized,
    U: UpdateSink + ?Sized,
{
    let mut observed: HashMap<RenderJobId, (RenderState, Option<String>)> = jobs
        .iter()
        .map(|id| (id.clone(), (RenderState::Queued, None)))
        .collect();

    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        for job_id in jobs {
            if observed[job_id].0.is_terminal() {
                continue;
            }

            let snapshot = match query_with_retry(source, job_id, config.status_retries).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    // Treated as not-yet-terminal for this sweep only
                    warn!(job_id = %job_id, attempt, "Status query failed, will re-poll: {}", e);
                    continue;
                }
            };

            let previous = observed[job_id].0;
            if snapshot.state != previous {
                observed.insert(
                    job_id.clone(),
                    (snapshot.state, snapshot.video_url.clone()),
                );
                sink.on_update(JobUpdate {
                    job_id: job_id.clone(),
                    state: snapshot.state,
                    video_url: snapshot.video_url,
                    error: snapshot.error,
                })
                .await;
            }
        }

        if jobs.iter().all(|id| observed[id].0.is_terminal()) {
            info!(attempt, jobs = jobs.len(), "All render jobs reached a terminal state");
            let mut outcomes = Vec::new();
            let mut reported = std::collections::HashSet::new();
            for job_id in jobs {
                if !reported.insert(job_id.clone()) {
                    continue;
                }
                let (state, video_url) = observed[job_id].clone();
                outcomes.push(JobOutcome {
                    job_id: job_id.clone(),
                    state,
                    video_url,
                });
            }
            return Ok(PollSummary { attempts: attempt, outcomes });
        }

        if attempt < max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    let pending = jobs
        .iter()
        .filter(|id| !observed[*id].0.is_terminal())
        .cloned()
        .collect();
    Err(PollError::Timeout { pending })
}

async fn query_with_retry<S>(
    source: &S,
    job_id: &RenderJobId,
    retries: u32,
) -> Result<StatusSnapshot, ServiceError>
where
    S: StatusSource + ?Sized,
{
    let mut last_error = None;
    for _ in 0..=retries {
        match source.status(job_id).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        ServiceError::Video(adforge_video_client::VideoError::RequestFailed(
            "Status query failed".to_string(),
        ))
    }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use adforge_video_client::VideoError;

    /// Per-job scripted status source; repeats the last entry once a
    /// script is exhausted.
    struct ScriptedSource {
        scripts: HashMap<RenderJobId, Vec<Result<StatusSnapshot, ()>>>,
        cursors: Mutex<HashMap<RenderJobId, usize>>,
    }

    impl ScriptedSource {
        fn new(scripts: Vec<(&str, Vec<Result<StatusSnapshot, ()>>)>) -> Self {
            Self {
                scripts: scripts
                    .into_iter()
                    .map(|(id, s)| (RenderJobId::from(id), s))
                    .collect(),
                cursors: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn status(&self, job_id: &RenderJobId) -> Result<StatusSnapshot, ServiceError> {
            let script = self.scripts.get(job_id).expect("unknown job id");
            let mut cursors = self.cursors.lock().unwrap();
            let cursor = cursors.entry(job_id.clone()).or_insert(0);
            let index = (*cursor).min(script.len() - 1);
            *cursor += 1;
            match &script[index] {
                Ok(snapshot) => Ok(snapshot.clone()),
                Err(()) => Err(ServiceError::Video(VideoError::RequestFailed(
                    "scripted failure".to_string(),
                ))),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        updates: Vec<JobUpdate>,
    }

    #[async_trait]
    impl UpdateSink for RecordingSink {
        async fn on_update(&mut self, update: JobUpdate) {
            self.updates.push(update);
        }
    }

    fn fast_config(max_attempts: u32, status_retries: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            max_attempts,
            status_retries,
        }
    }

    fn processing() -> Result<StatusSnapshot, ()> {
        Ok(StatusSnapshot::processing())
    }

    fn completed(url: &str) -> Result<StatusSnapshot, ()> {
        Ok(StatusSnapshot::completed(url))
    }

    fn failed(msg: &str) -> Result<StatusSnapshot, ()> {
        Ok(StatusSnapshot::failed(msg))
    }

    #[tokio::test]
    async fn test_early_exit_and_single_terminal_update_per_job() {
        // Five jobs; job 3 fails on sweep 4, the rest complete on sweep 5.
        // With a budget of 10 the poll must stop after sweep 5.
        let slow = |url: &str| {
            vec![
                processing(),
                processing(),
                processing(),
                processing(),
                completed(url),
            ]
        };
        let source = ScriptedSource::new(vec![
            ("job-1", slow("https://cdn/1.mp4")),
            ("job-2", slow("https://cdn/2.mp4")),
            (
                "job-3",
                vec![processing(), processing(), processing(), failed("render error")],
            ),
            ("job-4", slow("https://cdn/4.mp4")),
            ("job-5", slow("https://cdn/5.mp4")),
        ]);
        let jobs: Vec<RenderJobId> = (1..=5).map(|i| RenderJobId::from(format!("job-{i}"))).collect();

        let mut sink = RecordingSink::default();
        let summary = poll_until_done(&source, &jobs, &fast_config(10, 0), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.attempts, 5);
        assert_eq!(summary.completed(), 4);
        assert_eq!(summary.failed(), 1);

        // Exactly one terminal update per job, never the same state twice
        for job_id in &jobs {
            let states: Vec<RenderState> = sink
                .updates
                .iter()
                .filter(|u| &u.job_id == job_id)
                .map(|u| u.state)
                .collect();
            let terminal: Vec<&RenderState> =
                states.iter().filter(|s| s.is_terminal()).collect();
            assert_eq!(terminal.len(), 1, "job {job_id} terminal updates");
            let mut deduped = states.clone();
            deduped.dedup();
            assert_eq!(states, deduped, "job {job_id} repeated a state");
        }

        let failed_update = sink
            .updates
            .iter()
            .find(|u| u.job_id.as_str() == "job-3" && u.state.is_terminal())
            .unwrap();
        assert_eq!(failed_update.state, RenderState::Failed);
        assert_eq!(failed_update.error.as_deref(), Some("render error"));
    }

    #[tokio::test]
    async fn test_timeout_lists_unresolved_and_keeps_completions() {
        let source = ScriptedSource::new(vec![
            ("job-1", vec![processing()]),
            ("job-2", vec![processing(), completed("https://cdn/2.mp4")]),
            ("job-3", vec![processing()]),
        ]);
        let jobs = vec![
            RenderJobId::from("job-1"),
            RenderJobId::from("job-2"),
            RenderJobId::from("job-3"),
        ];

        let mut sink = RecordingSink::default();
        let err = poll_until_done(&source, &jobs, &fast_config(3, 0), &mut sink)
            .await
            .unwrap_err();

        let PollError::Timeout { pending } = err;
        assert_eq!(pending.len(), 2);
        assert!(pending.contains(&RenderJobId::from("job-1")));
        assert!(pending.contains(&RenderJobId::from("job-3")));

        // The completion observed before the timeout was still reported
        assert!(sink
            .updates
            .iter()
            .any(|u| u.job_id.as_str() == "job-2" && u.state == RenderState::Completed));
    }

    #[tokio::test]
    async fn test_transient_query_failure_does_not_abort() {
        let source = ScriptedSource::new(vec![(
            "job-1",
            vec![Err(()), completed("https://cdn/1.mp4")],
        )]);
        let jobs = vec![RenderJobId::from("job-1")];

        let mut sink = RecordingSink::default();
        let summary = poll_until_done(&source, &jobs, &fast_config(5, 0), &mut sink)
            .await
            .unwrap();

        // The failed sweep counts, the job resolves on the next one
        assert_eq!(summary.attempts, 2);
        assert_eq!(summary.completed(), 1);
        assert_eq!(sink.updates.len(), 1);
    }

    #[tokio::test]
    async fn test_status_retries_within_a_sweep() {
        // One transient failure then success; with one retry allowed the
        // job resolves within the first sweep
        let source = ScriptedSource::new(vec![(
            "job-1",
            vec![Err(()), completed("https://cdn/1.mp4")],
        )]);
        let jobs = vec![RenderJobId::from("job-1")];

        let mut sink = RecordingSink::default();
        let summary = poll_until_done(&source, &jobs, &fast_config(5, 1), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.attempts, 1);
        assert_eq!(summary.completed(), 1);
    }

    #[tokio::test]
    async fn test_updates_delivered_in_transition_order() {
        let source = ScriptedSource::new(vec![(
            "job-1",
            vec![processing(), completed("https://cdn/1.mp4")],
        )]);
        let jobs = vec![RenderJobId::from("job-1")];

        let mut sink = RecordingSink::default();
        poll_until_done(&source, &jobs, &fast_config(5, 0), &mut sink)
            .await
            .unwrap();

        let states: Vec<RenderState> = sink.updates.iter().map(|u| u.state).collect();
        assert_eq!(states, vec![RenderState::Processing, RenderState::Completed]);
        assert_eq!(
            sink.updates[1].video_url.as_deref(),
            Some("https://cdn/1.mp4")
        );
    }

    #[tokio::test]
    async fn test_queued_observation_is_not_a_transition() {
        let queued = StatusSnapshot {
            state: RenderState::Queued,
            video_url: None,
            error: None,
        };
        let source = ScriptedSource::new(vec![(
            "job-1",
            vec![Ok(queued), completed("https://cdn/1.mp4")],
        )]);
        let jobs = vec![RenderJobId::from("job-1")];

        let mut sink = RecordingSink::default();
        poll_until_done(&source, &jobs, &fast_config(5, 0), &mut sink)
            .await
            .unwrap();

        // Queued is the submit-time state, so only the completion fires
        assert_eq!(sink.updates.len(), 1);
        assert_eq!(sink.updates[0].state, RenderState::Completed);
    }
}

use crate::calls;
use crate::config::PipelineConfig;
use crate::image::{encode_image, ImageUpload};
use crate::model_adapter::{CallKind, GenerativeModel};
use crate::policy::ConfidencePolicy;
use crate::state::{RunEvent, RunPhase, StatusUpdate, TransitionError};
use crate::types::{
    ClarificationRequest, IdentificationRequest, IdentifierError, PipelineOutcome, Result, RunId,
};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// How a submission ended from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The run's terminal state was committed to the display slot.
    Completed { run: RunId, outcome: PipelineOutcome },
    /// A newer submission took the display slot; this run's result was dropped.
    Superseded { run: RunId, by: RunId },
}

impl Submission {
    pub fn outcome(&self) -> Option<&PipelineOutcome> {
        match self {
            Submission::Completed { outcome, .. } => Some(outcome),
            Submission::Superseded { .. } => None,
        }
    }
}

/// Runs submissions through encode, identify, decide and (maybe) clarify, and
/// publishes the phase of the newest run.
///
/// Every submission gets a fresh [`RunId`]. Only the newest run may publish;
/// the check and the write happen together inside the watch channel, so a
/// slow run finishing after a newer one started leaves no trace.
pub struct Orchestrator {
    model: Arc<dyn GenerativeModel>,
    policy: ConfidencePolicy,
    config: PipelineConfig,
    status: watch::Sender<StatusUpdate>,
    events: broadcast::Sender<StatusUpdate>,
    next_run: AtomicU64,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn GenerativeModel>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let policy = config.policy()?;
        let (status, _) = watch::channel(StatusUpdate::idle());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            "Orchestrator ready with {} (threshold {:.2}, up to {} candidates)",
            model.model_name(),
            policy.threshold(),
            config.max_candidates
        );

        Ok(Self {
            model,
            policy,
            config,
            status,
            events,
            next_run: AtomicU64::new(0),
        })
    }

    /// Latest phase of the newest run.
    pub fn subscribe(&self) -> watch::Receiver<StatusUpdate> {
        self.status.subscribe()
    }

    /// Every committed transition, in order.
    pub fn events(&self) -> broadcast::Receiver<StatusUpdate> {
        self.events.subscribe()
    }

    pub fn current(&self) -> StatusUpdate {
        self.status.borrow().clone()
    }

    pub fn policy(&self) -> ConfidencePolicy {
        self.policy
    }

    pub async fn submit(&self, upload: ImageUpload) -> Submission {
        let run = self.begin_run();
        info!(
            "Starting {} for {} ({} bytes)",
            run,
            upload.file_name.as_deref().unwrap_or("upload"),
            upload.bytes.len()
        );

        let mut phase = RunPhase::Idle;
        match self.drive(run, &mut phase, &upload).await {
            Ok(()) => {}
            Err(IdentifierError::Superseded { .. }) => {
                let by = self.current().run;
                warn!("{} abandoned before clarification, superseded by {}", run, by);
                return Submission::Superseded { run, by };
            }
            Err(error) => {
                warn!("{} failed: {}", run, error);
                let failure = error.to_failure();
                phase = phase
                    .clone()
                    .apply(RunEvent::Failed(failure.clone()))
                    .unwrap_or(RunPhase::Failed { failure });
            }
        }

        let outcome = match phase.outcome() {
            Some(outcome) => outcome,
            None => {
                let failure = IdentifierError::from(TransitionError::Illegal {
                    from: phase.name(),
                    event: "commit",
                })
                .to_failure();
                phase = RunPhase::Failed {
                    failure: failure.clone(),
                };
                PipelineOutcome::Failed(failure)
            }
        };

        if self.publish(StatusUpdate { run, phase }) {
            info!("{} finished: {}", run, describe(&outcome));
            Submission::Completed { run, outcome }
        } else {
            let by = self.current().run;
            warn!("{} finished after being superseded by {}; result dropped", run, by);
            Submission::Superseded { run, by }
        }
    }

    async fn drive(&self, run: RunId, phase: &mut RunPhase, upload: &ImageUpload) -> Result<()> {
        self.advance(run, phase, RunEvent::Submitted)?;

        let image = encode_image(upload, self.config.max_image_bytes)?;
        self.advance(run, phase, RunEvent::ImageEncoded)?;

        let request = IdentificationRequest::new(image).with_max_candidates(self.config.max_candidates);
        let result = self
            .with_timeout(CallKind::Identify, calls::identify(self.model.as_ref(), &request))
            .await?;
        let decision = self.policy.decide(&result);
        debug!(
            "{}: confidence {:.2} against threshold {:.2} -> {:?}",
            run,
            result.confidence.value(),
            self.policy.threshold(),
            decision
        );
        self.advance(run, phase, RunEvent::Identified { result, decision })?;

        let Some(candidates) = phase.pending_candidates().map(|c| c.to_vec()) else {
            return Ok(());
        };

        if !self.is_current(run) {
            return Err(IdentifierError::Superseded { run });
        }

        let clarification = ClarificationRequest::new(request.image, candidates)?;
        let answer = self
            .with_timeout(CallKind::Clarify, calls::clarify(self.model.as_ref(), &clarification))
            .await?;
        self.advance(run, phase, RunEvent::Clarified { selected: answer.selected })?;
        Ok(())
    }

    /// Apply an event and publish the new phase unless it is terminal;
    /// terminal phases are committed by `submit`.
    fn advance(&self, run: RunId, phase: &mut RunPhase, event: RunEvent) -> Result<()> {
        let next = phase.clone().apply(event)?;
        debug!("{}: {} -> {}", run, phase.name(), next.name());
        *phase = next;
        if !phase.is_terminal() {
            self.publish(StatusUpdate {
                run,
                phase: phase.clone(),
            });
        }
        Ok(())
    }

    async fn with_timeout<T, F>(&self, kind: CallKind, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.config.call_timeout();
        tokio::time::timeout(limit, call).await.map_err(|_| {
            IdentifierError::ModelUnavailable(format!("{:?} call timed out after {:?}", kind, limit))
        })?
    }

    /// Claim the display slot for a new run, resetting it to idle.
    fn begin_run(&self) -> RunId {
        let mut run = RunId(0);
        self.status.send_modify(|current| {
            run = RunId(self.next_run.fetch_add(1, Ordering::SeqCst) + 1);
            if current.run != RunId(0) && !current.phase.is_terminal() {
                info!("{} supersedes in-flight {}", run, current.run);
            }
            *current = StatusUpdate {
                run,
                phase: RunPhase::Idle,
            };
            let _ = self.events.send(current.clone());
        });
        run
    }

    fn is_current(&self, run: RunId) -> bool {
        self.status.borrow().run == run
    }

    /// Write `update` only if its run still owns the display slot.
    fn publish(&self, update: StatusUpdate) -> bool {
        self.status.send_if_modified(|current| {
            if current.run != update.run {
                return false;
            }
            let _ = self.events.send(update.clone());
            *current = update;
            true
        })
    }
}

fn describe(outcome: &PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::Succeeded(record) => record.to_string(),
        PipelineOutcome::Failed(failure) => failure.message.clone(),
    }
}

/// Builder for wiring an orchestrator from parts.
pub struct PipelineBuilder {
    model: Arc<dyn GenerativeModel>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.config.max_candidates = max_candidates;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        Orchestrator::new(self.model, self.config)
    }
}

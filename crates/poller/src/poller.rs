//! The submit -> trigger -> poll state machine.
//!
//! Each session runs as one Tokio task that owns its poll interval and
//! its deadline and selects over them together with a
//! [`CancellationToken`]. Session state lives in a single
//! [`watch`] channel; every write is tagged with the session id and goes
//! through the guarded `record_*` transitions of [`PollSnapshot`], so a
//! superseded or already-ended session can never be modified.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jobwatch_core::outcome::PollOutcome;
use jobwatch_core::spec::JobSpecification;
use jobwatch_core::types::{JobHandle, SessionId};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::{JobStatusClient, JobStatusReport, JobSubmissionClient, SubmissionError};
use crate::config::PollerConfig;
use crate::events::PollerEvent;
use crate::snapshot::PollSnapshot;

/// Broadcast channel capacity for poller events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How long [`AsyncJobPoller::shutdown`] waits for the session task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Drives one job at a time from submission to a terminal outcome.
///
/// Starting a new session cancels the previous one. Independent pollers
/// share nothing, so several can watch different jobs side by side.
pub struct AsyncJobPoller {
    submitter: Arc<dyn JobSubmissionClient>,
    status_client: Arc<dyn JobStatusClient>,
    config: PollerConfig,
    state: Arc<watch::Sender<PollSnapshot>>,
    event_tx: broadcast::Sender<PollerEvent>,
    active: Mutex<Option<ActiveSession>>,
    next_session: AtomicU64,
}

/// Bookkeeping for the session task currently owned by the poller.
struct ActiveSession {
    session: SessionId,
    cancel: CancellationToken,
    task_handle: tokio::task::JoinHandle<()>,
}

impl AsyncJobPoller {
    pub fn new(
        submitter: Arc<dyn JobSubmissionClient>,
        status_client: Arc<dyn JobStatusClient>,
        config: PollerConfig,
    ) -> Self {
        let (state, _) = watch::channel(PollSnapshot::default());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            submitter,
            status_client,
            config,
            state: Arc::new(state),
            event_tx,
            active: Mutex::new(None),
            next_session: AtomicU64::new(0),
        }
    }

    /// Build a poller from one client that both submits and reports status.
    pub fn with_client<C>(client: Arc<C>, config: PollerConfig) -> Self
    where
        C: JobSubmissionClient + JobStatusClient + 'static,
    {
        Self::new(client.clone(), client, config)
    }

    /// Current state of the latest session.
    pub fn snapshot(&self) -> PollSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn watch(&self) -> watch::Receiver<PollSnapshot> {
        self.state.subscribe()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<PollerEvent> {
        self.event_tx.subscribe()
    }

    /// Start watching a new job, replacing any active session.
    pub async fn start(&self, spec: JobSpecification) -> SessionId {
        self.start_with_expected_steps(spec, None).await
    }

    /// Like [`start`](Self::start), sizing progress by the number of
    /// steps the job is known to run.
    pub async fn start_with_expected_steps(
        &self,
        spec: JobSpecification,
        expected_steps: Option<usize>,
    ) -> SessionId {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            previous.cancel.cancel();
            if self.state.borrow().outcome.is_active() {
                tracing::info!(session = previous.session, "Superseding active poll session");
                let _ = self.event_tx.send(PollerEvent::SessionEnded {
                    session: previous.session,
                    outcome: PollOutcome::Cancelled,
                });
            }
        }

        let session = self.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        self.state.send_replace(PollSnapshot::begin(session, expected_steps));

        let cancel = CancellationToken::new();
        let ctx = SessionContext {
            session,
            submitter: Arc::clone(&self.submitter),
            status_client: Arc::clone(&self.status_client),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            event_tx: self.event_tx.clone(),
        };

        tracing::info!(
            session,
            job = %spec.name,
            job_type = %spec.job_type,
            connection_type = %spec.connection_type,
            "Starting poll session",
        );
        let _ = self.event_tx.send(PollerEvent::SessionStarted { session });

        let task_cancel = cancel.clone();
        let task_handle = tokio::spawn(async move {
            ctx.run(spec, task_cancel).await;
        });

        *active = Some(ActiveSession {
            session,
            cancel,
            task_handle,
        });

        session
    }

    /// Stop watching the active session.
    ///
    /// Recorded steps are kept and the backend job is left alone. Returns
    /// `false` when there was nothing active to cancel.
    pub async fn cancel(&self) -> bool {
        let active = self.active.lock().await;
        let Some(current) = active.as_ref() else {
            return false;
        };
        current.cancel.cancel();

        let session = current.session;
        let cancelled = self
            .state
            .send_if_modified(|snap| snap.session == session && snap.record_cancel());

        if cancelled {
            tracing::info!(session, "Poll session cancelled");
            let _ = self.event_tx.send(PollerEvent::SessionEnded {
                session,
                outcome: PollOutcome::Cancelled,
            });
        }
        cancelled
    }

    /// Wait until the current session is no longer active.
    pub async fn wait_for_outcome(&self) -> PollSnapshot {
        let mut rx = self.state.subscribe();
        let snap = match rx.wait_for(|snap| !snap.outcome.is_active()).await {
            Ok(snap) => (*snap).clone(),
            Err(_) => self.snapshot(),
        };
        snap
    }

    /// Cancel the active session and wait briefly for its task to exit.
    pub async fn shutdown(&self) {
        let current = self.active.lock().await.take();
        let Some(current) = current else {
            return;
        };

        current.cancel.cancel();
        let session = current.session;
        if self
            .state
            .send_if_modified(|snap| snap.session == session && snap.record_cancel())
        {
            let _ = self.event_tx.send(PollerEvent::SessionEnded {
                session,
                outcome: PollOutcome::Cancelled,
            });
        }

        if tokio::time::timeout(SHUTDOWN_GRACE, current.task_handle)
            .await
            .is_err()
        {
            tracing::warn!(session, "Poll session task did not exit in time");
        }
    }
}

impl Drop for AsyncJobPoller {
    fn drop(&mut self) {
        if let Some(current) = self.active.get_mut().as_ref() {
            current.cancel.cancel();
        }
    }
}

/// Everything a session task needs, detached from the poller itself.
struct SessionContext {
    session: SessionId,
    submitter: Arc<dyn JobSubmissionClient>,
    status_client: Arc<dyn JobStatusClient>,
    config: PollerConfig,
    state: Arc<watch::Sender<PollSnapshot>>,
    event_tx: broadcast::Sender<PollerEvent>,
}

impl SessionContext {
    /// Run the session until it ends or the token is cancelled.
    async fn run(self, spec: JobSpecification, cancel: CancellationToken) {
        let deadline = tokio::time::sleep(self.config.timeout);
        tokio::pin!(deadline);

        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = &mut deadline => {
                self.time_out();
                return;
            }
            result = self.submit(&spec) => result,
        };

        let handle = match submitted {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(session = self.session, error = %e, "Job submission failed");
                if self.apply(|snap| snap.record_submission_failure(&e.to_string())) {
                    self.emit(PollerEvent::SessionEnded {
                        session: self.session,
                        outcome: PollOutcome::Failed,
                    });
                }
                return;
            }
        };

        if !self.apply(|snap| snap.record_submitted(handle.clone())) {
            return;
        }
        tracing::info!(session = self.session, handle = %handle, "Job submitted, polling status");
        self.emit(PollerEvent::JobSubmitted {
            session: self.session,
            handle: handle.clone(),
        });

        let period = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = &mut deadline => {
                    self.time_out();
                    return;
                }
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = &mut deadline => {
                    self.time_out();
                    return;
                }
                result = self.status_client.fetch_job_status(&handle) => result,
            };

            match fetched {
                Ok(report) => {
                    if let Some(outcome) = self.record(&handle, report) {
                        self.finish(&handle, outcome).await;
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        session = self.session,
                        handle = %handle,
                        error = %e,
                        "Status fetch failed, retrying on next tick",
                    );
                    self.emit(PollerEvent::PollFailed {
                        session: self.session,
                        handle: handle.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    /// Validate, submit and trigger. Any failure here ends the session.
    async fn submit(&self, spec: &JobSpecification) -> Result<JobHandle, SubmissionError> {
        spec.validate()
            .map_err(|e| SubmissionError::Rejected(e.to_string()))?;
        let handle = self.submitter.submit_job(spec).await?;
        self.submitter.trigger_job(&handle).await?;
        Ok(handle)
    }

    /// Store one fetch result; returns the outcome if it ended the session.
    fn record(&self, handle: &JobHandle, report: JobStatusReport) -> Option<PollOutcome> {
        let JobStatusReport { status, steps } = report;
        let step_count = steps.len();
        let mut ended = None;

        let applied = self.apply(|snap| {
            if snap.outcome != PollOutcome::Polling {
                return false;
            }
            ended = snap.record_report(status, steps);
            true
        });
        if !applied {
            return None;
        }

        tracing::debug!(
            session = self.session,
            handle = %handle,
            status = %status,
            step_count,
            "Polled job status",
        );
        self.emit(PollerEvent::StatusPolled {
            session: self.session,
            handle: handle.clone(),
            status,
            step_count,
        });
        ended
    }

    async fn finish(&self, handle: &JobHandle, outcome: PollOutcome) {
        tracing::info!(
            session = self.session,
            handle = %handle,
            outcome = %outcome,
            "Job reached terminal status",
        );
        self.emit(PollerEvent::SessionEnded {
            session: self.session,
            outcome,
        });

        if self.config.release_on_completion {
            if let Err(e) = self.submitter.release_job(handle).await {
                tracing::warn!(
                    session = self.session,
                    handle = %handle,
                    error = %e,
                    "Failed to release finished job",
                );
            }
        }
    }

    fn time_out(&self) {
        if !self.apply(|snap| snap.record_timeout()) {
            return;
        }
        tracing::warn!(
            session = self.session,
            timeout_secs = self.config.timeout.as_secs(),
            "Job did not finish within the timeout; stopped polling",
        );
        self.emit(PollerEvent::SessionEnded {
            session: self.session,
            outcome: PollOutcome::TimedOut,
        });
    }

    /// Apply a transition if the state still belongs to this session.
    fn apply(&self, transition: impl FnOnce(&mut PollSnapshot) -> bool) -> bool {
        self.state
            .send_if_modified(|snap| snap.session == self.session && transition(snap))
    }

    fn emit(&self, event: PollerEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.event_tx.send(event);
    }
}

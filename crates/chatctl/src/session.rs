//! The service entry point: drives one full ask/response exchange against a
//! target application.
//!
//! Per call the state machine is
//! `Idle -> EnsureLaunched -> EnsureReady -> LockAcquired -> Sent -> Polling
//! -> {Completed | Failed}`. Every suspension point goes through
//! [`PendingOperation::wait`], which consults the call's cancellation signal
//! and deadline; the target's lock is released exactly once on every exit
//! route.

use crate::apps::ChatApp;
use crate::config::AutomationConfig;
use crate::errors::AutomationError;
use crate::lockfile::LockManager;
use crate::status::Status;
use crate::ChatTarget;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// The request in flight: a deadline and a cancellation signal. Created when
/// a call begins, dropped when it returns or fails.
pub struct PendingOperation {
    deadline: Instant,
    cancel: CancellationToken,
}

impl PendingOperation {
    pub fn new(budget: Duration, cancel: CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + budget,
            cancel,
        }
    }

    /// Suspend for `duration` (clamped to the remaining budget) unless the
    /// cancellation signal fires or the deadline elapses first. The only way
    /// a call ever yields.
    pub async fn wait(
        &self,
        duration: Duration,
        waiting_for: &str,
    ) -> Result<(), AutomationError> {
        if self.cancel.is_cancelled() {
            return Err(AutomationError::Cancelled(format!(
                "cancelled while {waiting_for}"
            )));
        }
        let now = Instant::now();
        if now >= self.deadline {
            return Err(AutomationError::Timeout(format!(
                "deadline elapsed while {waiting_for}"
            )));
        }
        let step = duration.min(self.deadline - now);
        tokio::select! {
            _ = tokio::time::sleep(step) => {
                if Instant::now() >= self.deadline {
                    Err(AutomationError::Timeout(format!(
                        "deadline elapsed while {waiting_for}"
                    )))
                } else {
                    Ok(())
                }
            }
            _ = self.cancel.cancelled() => Err(AutomationError::Cancelled(format!(
                "cancelled while {waiting_for}"
            ))),
        }
    }
}

/// Outcome of a completed ask exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    /// The conversation the exchange landed in, where the target exposes one.
    pub conversation_id: Option<String>,
    pub response: String,
}

pub struct SessionOrchestrator {
    target: ChatTarget,
    app: Arc<dyn ChatApp>,
    locks: LockManager,
    config: AutomationConfig,
}

impl SessionOrchestrator {
    pub fn new(target: ChatTarget, app: Arc<dyn ChatApp>, config: AutomationConfig) -> Self {
        Self {
            target,
            locks: LockManager::new(&config),
            app,
            config,
        }
    }

    fn target_name(&self) -> &'static str {
        self.target.resource_id()
    }

    /// Send `prompt` and return the extracted response. With a conversation
    /// identifier the exchange continues that conversation; without one a new
    /// chat is started first.
    #[instrument(skip(self, prompt, cancel), fields(target = self.target_name()))]
    pub async fn ask(
        &self,
        prompt: &str,
        conversation_id: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<AskOutcome, AutomationError> {
        let op = PendingOperation::new(self.config.overall_deadline(), cancel);
        self.ask_inner(prompt, conversation_id, &op)
            .await
            .map_err(|e| e.with_context("ask", self.target_name()))
    }

    async fn ask_inner(
        &self,
        prompt: &str,
        conversation_id: Option<&str>,
        op: &PendingOperation,
    ) -> Result<AskOutcome, AutomationError> {
        self.ensure_ready(op).await?;

        let mut guard = self.locks.acquire(self.target_name())?;
        let result = self.drive_exchange(prompt, conversation_id, op).await;
        guard.release();
        result
    }

    async fn drive_exchange(
        &self,
        prompt: &str,
        conversation_id: Option<&str>,
        op: &PendingOperation,
    ) -> Result<AskOutcome, AutomationError> {
        // A named conversation always goes through the driver, so targets
        // without a conversation surface reject it instead of silently
        // dropping it.
        match conversation_id {
            Some(title) => {
                self.app.select_conversation(title).await?;
                op.wait(self.config.settle_delay(), "waiting for the conversation surface")
                    .await?;
            }
            None if self.app.supports_conversations() => {
                self.app.new_chat().await?;
                op.wait(self.config.settle_delay(), "waiting for the conversation surface")
                    .await?;
            }
            None => {}
        }

        if self.app.prepare_input().await? {
            op.wait(self.config.settle_delay(), "waiting for the input controls to settle")
                .await?;
        }

        self.app
            .send_prompt(prompt, conversation_id.is_some())
            .await?;
        debug!(target = self.target_name(), "prompt sent");
        op.wait(self.config.settle_delay(), "waiting for the prompt to register")
            .await?;

        self.poll_until_ready(op).await?;

        let response = self.app.extract_response().await?;
        let conversation_id = match conversation_id {
            Some(title) => Some(title.to_string()),
            None if self.app.supports_conversations() => self.app.conversation_id().await?,
            None => None,
        };
        Ok(AskOutcome {
            conversation_id,
            response,
        })
    }

    /// Re-read the response currently displayed, waiting for any in-flight
    /// generation to finish first. Does not launch the target.
    #[instrument(skip(self, cancel), fields(target = self.target_name()))]
    pub async fn previous_response(
        &self,
        conversation_id: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<String, AutomationError> {
        let op = PendingOperation::new(self.config.overall_deadline(), cancel);
        self.previous_response_inner(conversation_id, &op)
            .await
            .map_err(|e| e.with_context("previous response", self.target_name()))
    }

    async fn previous_response_inner(
        &self,
        conversation_id: Option<&str>,
        op: &PendingOperation,
    ) -> Result<String, AutomationError> {
        if self.app.status().await? == Status::Inactive {
            return Err(AutomationError::TargetUnavailable(
                "application is not running".to_string(),
            ));
        }

        let mut guard = self.locks.acquire(self.target_name())?;
        let result = async {
            if let Some(title) = conversation_id {
                self.app.select_conversation(title).await?;
                op.wait(self.config.settle_delay(), "waiting for the conversation surface")
                    .await?;
            }
            self.poll_until_ready(op).await?;
            self.app.extract_response().await
        }
        .await;
        guard.release();
        result
    }

    /// Titles of the conversations the UI currently displays. Read-only, so
    /// no lock is taken.
    pub async fn conversations(&self) -> Result<Vec<String>, AutomationError> {
        self.app
            .conversations()
            .await
            .map_err(|e| e.with_context("list conversations", self.target_name()))
    }

    /// Fresh status probe.
    pub async fn status(&self) -> Result<Status, AutomationError> {
        self.app
            .status()
            .await
            .map_err(|e| e.with_context("status", self.target_name()))
    }

    /// EnsureLaunched + EnsureReady: launch if inactive, then wait out any
    /// in-flight generation, bounded by the call deadline.
    async fn ensure_ready(&self, op: &PendingOperation) -> Result<(), AutomationError> {
        let mut status = self.app.status().await?;

        if status == Status::Inactive {
            info!(target = self.target_name(), "launching application");
            self.app.launch().await?;
            op.wait(self.config.settle_delay(), "waiting for the application to launch")
                .await?;
            status = self.app.status().await?;
            if matches!(status, Status::Inactive | Status::Error) {
                return Err(AutomationError::TargetUnavailable(format!(
                    "application did not come up after launch (status: {status})"
                )));
            }
        }

        loop {
            match status {
                Status::Ready => return Ok(()),
                Status::Running => {
                    op.wait(
                        self.config.poll_interval(),
                        "waiting for the application to become idle",
                    )
                    .await?;
                    status = self.app.status().await?;
                }
                Status::Inactive | Status::Error => {
                    return Err(AutomationError::TargetUnavailable(format!(
                        "control surface is unreadable (status: {status})"
                    )));
                }
            }
        }
    }

    /// Polling: probe at the configured interval until ready, deadline, or
    /// cancellation. The poll loop is the only retry mechanism across time.
    async fn poll_until_ready(&self, op: &PendingOperation) -> Result<(), AutomationError> {
        loop {
            match self.app.status().await? {
                Status::Ready => return Ok(()),
                Status::Running => {
                    op.wait(
                        self.config.poll_interval(),
                        "waiting for the response to complete",
                    )
                    .await?;
                }
                status @ (Status::Inactive | Status::Error) => {
                    return Err(AutomationError::TargetUnavailable(format!(
                        "application became unreachable while waiting (status: {status})"
                    )));
                }
            }
        }
    }
}

//! Serializable operation boundary.
//!
//! Callers that cannot hold a typed handle (IPC, embedding hosts) submit a
//! [`CallRequest`] and always get a [`CallResponse`] back: failures are
//! rendered into the response text with `is_error` set, never surfaced as a
//! transport-level error.

use crate::session::SessionOrchestrator;
use crate::status::Status;
use crate::{Automator, ChatTarget};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Send a prompt and wait for the response.
    Ask,
    /// Re-read the response currently on screen.
    PreviousResponse,
    /// List conversation titles.
    Conversations,
    /// Probe the coarse application state.
    Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub target: ChatTarget,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResponse {
    pub text: String,
    pub is_error: bool,
}

impl CallResponse {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn err(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Execute one request against the appropriate target session.
pub async fn execute(
    automator: &Automator,
    request: &CallRequest,
    cancel: CancellationToken,
) -> CallResponse {
    let session = automator.session(request.target);
    match run(&session, request, cancel).await {
        Ok(text) => CallResponse::ok(text),
        Err(e) => {
            error!(target = request.target.resource_id(), error = %e, "operation failed");
            CallResponse::err(e.to_string())
        }
    }
}

async fn run(
    session: &SessionOrchestrator,
    request: &CallRequest,
    cancel: CancellationToken,
) -> Result<String, crate::errors::AutomationError> {
    match request.operation {
        Operation::Ask => {
            let prompt = request.prompt.as_deref().ok_or_else(|| {
                crate::errors::AutomationError::InvalidArgument(
                    "ask requires a prompt".to_string(),
                )
            })?;
            let outcome = session
                .ask(prompt, request.conversation_id.as_deref(), cancel)
                .await?;
            Ok(match outcome.conversation_id {
                Some(id) => format!("[{id}]\n{}", outcome.response),
                None => outcome.response,
            })
        }
        Operation::PreviousResponse => {
            session
                .previous_response(request.conversation_id.as_deref(), cancel)
                .await
        }
        Operation::Conversations => Ok(session.conversations().await?.join("\n")),
        Operation::Status => {
            let status: Status = session.status().await?;
            Ok(status.to_string())
        }
    }
}

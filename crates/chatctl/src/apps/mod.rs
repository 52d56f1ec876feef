//! Per-application drivers.
//!
//! A driver owns the bridge for one process and knows which layout-variant
//! candidates to try for each logical operation. Expected absence of a
//! candidate is an `ElementUnavailable` result recovered by trying the next
//! variant; only once every candidate is exhausted does the failure escalate.

pub mod chatgpt;
pub mod claude;

pub use chatgpt::ChatGptDriver;
pub use claude::ClaudeDriver;

use crate::bridge::ScriptBridge;
use crate::errors::AutomationError;
use crate::status::{Status, StatusDetector, StatusSpec};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

/// Common surface the session orchestrator drives.
#[async_trait]
pub trait ChatApp: Send + Sync {
    fn bridge(&self) -> &ScriptBridge;

    /// Declarative status description consumed by the detector.
    fn status_spec(&self) -> &StatusSpec;

    /// Whether the application exposes an enumerable conversation list.
    fn supports_conversations(&self) -> bool {
        false
    }

    /// Probe the live tree for the current coarse state. Never cached.
    async fn status(&self) -> Result<Status, AutomationError> {
        StatusDetector::detect(self.bridge(), self.status_spec()).await
    }

    /// Activate the application and make its tree readable.
    async fn launch(&self) -> Result<(), AutomationError> {
        self.bridge().launch().await?;
        self.bridge().enable_accessibility().await
    }

    /// Idempotent pre-send preparation (feature toggles). Returns whether any
    /// UI state was mutated, so the caller knows to let it settle. Default:
    /// nothing.
    async fn prepare_input(&self) -> Result<bool, AutomationError> {
        Ok(false)
    }

    /// Start a fresh conversation.
    async fn new_chat(&self) -> Result<(), AutomationError> {
        Err(AutomationError::InvalidArgument(format!(
            "{} does not expose a conversation surface",
            self.bridge().process_name()
        )))
    }

    /// Bring the named conversation to the foreground.
    async fn select_conversation(&self, _title: &str) -> Result<(), AutomationError> {
        Err(AutomationError::InvalidArgument(format!(
            "{} does not expose a conversation surface",
            self.bridge().process_name()
        )))
    }

    /// Titles of all conversations the UI currently displays.
    async fn conversations(&self) -> Result<Vec<String>, AutomationError> {
        Err(AutomationError::InvalidArgument(format!(
            "{} does not expose a conversation surface",
            self.bridge().process_name()
        )))
    }

    /// Title of the conversation currently on screen, if the application
    /// exposes one.
    async fn conversation_id(&self) -> Result<Option<String>, AutomationError> {
        Ok(None)
    }

    /// Write the prompt into the input element and invoke the send control.
    /// `continuation` is true when replying inside an existing conversation.
    async fn send_prompt(&self, prompt: &str, continuation: bool) -> Result<(), AutomationError>;

    /// Read all text-bearing elements of the response container, in tree
    /// order, joined with a line separator. Empty is a valid result.
    async fn extract_response(&self) -> Result<String, AutomationError>;
}

static STATIC_TEXT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^static text "(.+?)" of "#).expect("static text pattern"));

/// Pull the quoted values out of `static text "…" of …` descriptor lines
/// from a subtree dump, preserving tree order.
pub(crate) fn collect_static_text(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| line.trim())
        .filter_map(|line| STATIC_TEXT_LINE.captures(line))
        .map(|captures| captures[1].to_string())
        .filter(|value| !value.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_only_static_text_values_in_order() {
        let lines = vec![
            "button \"Send\" of group 4 of window \"Claude\"".to_string(),
            "static text \"Hi\" of group 1 of window \"Claude\"".to_string(),
            "  static text \"there\" of group 2 of window \"Claude\"".to_string(),
            "image 1 of group 2 of window \"Claude\"".to_string(),
            "static text \"!\" of group 3 of window \"Claude\"".to_string(),
        ];
        assert_eq!(collect_static_text(&lines), "Hi\nthere\n!");
    }

    #[test]
    fn blank_values_are_dropped() {
        let lines = vec![
            "static text \" \" of group 1 of window \"Claude\"".to_string(),
            "static text \"kept\" of group 2 of window \"Claude\"".to_string(),
        ];
        assert_eq!(collect_static_text(&lines), "kept");
    }

    #[test]
    fn empty_dump_is_empty_response() {
        assert_eq!(collect_static_text(&[]), "");
    }
}

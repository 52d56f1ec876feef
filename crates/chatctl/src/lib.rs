//! Chatctl: remote-control the Claude and ChatGPT desktop applications
//! through their accessibility trees.
//!
//! The crate drives the full round trip of an exchange: ensure the target is
//! running, take an exclusive lock on its single-instance window, write the
//! prompt, send it, poll for completion, and read the response back out of
//! the accessibility tree. Everything runs over a scripting bridge to the
//! system accessibility service; the bridge is a trait so tests can swap in
//! a fixture.
//!
//! ```no_run
//! use chatctl::{Automator, ChatTarget, CancellationToken};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let automator = Automator::new();
//!     let session = automator.session(ChatTarget::Claude);
//!     let outcome = session
//!         .ask("What is 2 + 2?", None, CancellationToken::new())
//!         .await?;
//!     println!("{}", outcome.response);
//!     Ok(())
//! }
//! ```

pub mod apps;
pub mod bridge;
pub mod config;
pub mod element;
pub mod errors;
pub mod layout;
pub mod lockfile;
pub mod ops;
pub mod session;
pub mod status;

pub use bridge::{Clipboard, OsaRunner, ScriptBridge, ScriptRunner};
pub use config::AutomationConfig;
pub use element::ElementRef;
pub use errors::AutomationError;
pub use session::{AskOutcome, SessionOrchestrator};
pub use status::Status;
// Re-exported so downstream callers don't need a direct tokio-util dep.
pub use tokio_util::sync::CancellationToken;

use apps::{ChatApp, ChatGptDriver, ClaudeDriver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The applications this crate knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatTarget {
    Claude,
    ChatGpt,
}

impl ChatTarget {
    /// Accessibility process name the target registers under.
    pub fn process_name(&self) -> &'static str {
        match self {
            ChatTarget::Claude => apps::claude::CLAUDE_PROCESS,
            ChatTarget::ChatGpt => apps::chatgpt::CHATGPT_PROCESS,
        }
    }

    /// Stable identifier used for lock files and logging.
    pub fn resource_id(&self) -> &'static str {
        match self {
            ChatTarget::Claude => "claude",
            ChatTarget::ChatGpt => "chatgpt",
        }
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_id())
    }
}

impl FromStr for ChatTarget {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "claude" => Ok(ChatTarget::Claude),
            "chatgpt" => Ok(ChatTarget::ChatGpt),
            other => Err(AutomationError::InvalidArgument(format!(
                "unknown target '{other}' (expected 'claude' or 'chatgpt')"
            ))),
        }
    }
}

/// Entry point holding the script runner and configuration shared by all
/// sessions. Cheap to clone a session out of; each session owns its own
/// driver over the shared runner.
pub struct Automator {
    runner: Arc<dyn ScriptRunner>,
    config: AutomationConfig,
}

impl Default for Automator {
    fn default() -> Self {
        Self::new()
    }
}

impl Automator {
    /// Automator over the system scripting bridge with default configuration.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(OsaRunner), AutomationConfig::default())
    }

    /// Automator over a caller-supplied runner. This is the seam tests and
    /// embedders inject through.
    pub fn with_runner(runner: Arc<dyn ScriptRunner>, config: AutomationConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    fn driver(&self, target: ChatTarget) -> Arc<dyn ChatApp> {
        match target {
            ChatTarget::Claude => Arc::new(ClaudeDriver::new(self.runner.clone())),
            ChatTarget::ChatGpt => Arc::new(ChatGptDriver::new(self.runner.clone())),
        }
    }

    /// Session orchestrator for one target.
    pub fn session(&self, target: ChatTarget) -> SessionOrchestrator {
        SessionOrchestrator::new(target, self.driver(target), self.config.clone())
    }

    /// Raw bridge to one target's process, for diagnostics.
    pub fn bridge(&self, target: ChatTarget) -> ScriptBridge {
        ScriptBridge::new(target.process_name(), self.runner.clone())
    }

    /// System clipboard over the same runner, for save/restore around
    /// automations that stomp it.
    pub fn clipboard(&self) -> Clipboard {
        Clipboard::new(self.runner.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parses_case_insensitively() {
        assert_eq!("Claude".parse::<ChatTarget>().unwrap(), ChatTarget::Claude);
        assert_eq!(
            "CHATGPT".parse::<ChatTarget>().unwrap(),
            ChatTarget::ChatGpt
        );
        assert!("copilot".parse::<ChatTarget>().is_err());
    }

    #[test]
    fn target_display_matches_resource_id() {
        assert_eq!(ChatTarget::Claude.to_string(), "claude");
        assert_eq!(ChatTarget::ChatGpt.to_string(), "chatgpt");
    }
}

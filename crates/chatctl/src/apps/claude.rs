//! Driver for the Claude desktop application.

use super::{collect_static_text, ChatApp};
use crate::bridge::{ScriptBridge, ScriptRunner};
use crate::errors::AutomationError;
use crate::layout::ClaudeLayout;
use crate::status::{Marker, StatusSpec};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const CLAUDE_PROCESS: &str = "Claude";

pub struct ClaudeDriver {
    bridge: ScriptBridge,
    layouts: Vec<ClaudeLayout>,
    status_spec: StatusSpec,
}

impl ClaudeDriver {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        let layouts = ClaudeLayout::candidates();
        let status_spec = StatusSpec {
            // An enabled send affordance, on either the new-chat page or an
            // open conversation, means input is accepted.
            ready_markers: vec![
                Marker::Exists(layouts.iter().map(|l| l.new_chat_send_button()).collect()),
                Marker::Exists(
                    layouts
                        .iter()
                        .map(|l| l.conversation_send_button())
                        .collect(),
                ),
            ],
            busy_markers: vec![Marker::Exists(
                layouts
                    .iter()
                    .map(|l| l.conversation_stop_button())
                    .collect(),
            )],
        };
        Self {
            bridge: ScriptBridge::new(CLAUDE_PROCESS, runner),
            layouts,
            status_spec,
        }
    }

    fn exhausted(last: Option<AutomationError>, operation: &str) -> AutomationError {
        last.unwrap_or_else(|| {
            AutomationError::ElementUnavailable(format!(
                "{operation}: no layout variant resolved"
            ))
        })
    }
}

#[async_trait]
impl ChatApp for ClaudeDriver {
    fn bridge(&self) -> &ScriptBridge {
        &self.bridge
    }

    fn status_spec(&self) -> &StatusSpec {
        &self.status_spec
    }

    fn supports_conversations(&self) -> bool {
        true
    }

    async fn new_chat(&self) -> Result<(), AutomationError> {
        let mut last = None;
        for layout in &self.layouts {
            match self.bridge.click(&layout.new_chat_button()).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_element_unavailable() => last = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(Self::exhausted(last, "new chat"))
    }

    async fn select_conversation(&self, title: &str) -> Result<(), AutomationError> {
        let mut last = None;
        for layout in &self.layouts {
            let groups = layout.conversation_groups();
            let titles = match self
                .bridge
                .query_all(&layout.conversation_title_select(), &groups, "true")
                .await
            {
                Ok(titles) if !titles.is_empty() => titles,
                Ok(_) => {
                    last = Some(AutomationError::ElementUnavailable(
                        "conversation list is empty".to_string(),
                    ));
                    continue;
                }
                Err(e) if e.is_element_unavailable() => {
                    last = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            // The list resolved under this variant; a missing title is a
            // caller error, not a layout mismatch.
            let position = titles
                .iter()
                .position(|t| t == title)
                .ok_or_else(|| {
                    AutomationError::InvalidArgument(format!("conversation '{title}' not found"))
                })?;

            debug!(title, position, "selecting conversation");
            return self
                .bridge
                .click(&layout.conversation_item_button(position + 1))
                .await;
        }
        Err(Self::exhausted(last, "select conversation"))
    }

    async fn conversations(&self) -> Result<Vec<String>, AutomationError> {
        let mut last = None;
        for layout in &self.layouts {
            match self
                .bridge
                .query_all(
                    &layout.conversation_title_select(),
                    &layout.conversation_groups(),
                    "true",
                )
                .await
            {
                Ok(titles) if !titles.is_empty() => return Ok(titles),
                Ok(_) => {}
                Err(e) if e.is_element_unavailable() => last = Some(e),
                Err(e) => return Err(e),
            }
        }
        match last {
            // Every variant resolved to an empty list: the sidebar really is
            // empty.
            None => Ok(Vec::new()),
            Some(e) => Err(e),
        }
    }

    async fn conversation_id(&self) -> Result<Option<String>, AutomationError> {
        let mut last = None;
        for layout in &self.layouts {
            match self.bridge.fetch(&layout.conversation_title()).await {
                Ok(title) => return Ok(Some(title)),
                Err(e) if e.is_element_unavailable() => last = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(Self::exhausted(last, "conversation title"))
    }

    async fn send_prompt(&self, prompt: &str, continuation: bool) -> Result<(), AutomationError> {
        let mut last = None;
        for layout in &self.layouts {
            let (input, send) = if continuation {
                (
                    layout.conversation_prompt(),
                    layout.conversation_send_button(),
                )
            } else {
                (layout.new_chat_prompt(), layout.new_chat_send_button())
            };
            match self.bridge.set_value(&input, prompt).await {
                Ok(()) => {}
                Err(e) if e.is_element_unavailable() => {
                    last = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            }
            return self.bridge.click(&send).await;
        }
        Err(Self::exhausted(last, "send prompt"))
    }

    async fn extract_response(&self) -> Result<String, AutomationError> {
        let mut last = None;
        for layout in &self.layouts {
            match self.bridge.list_all(&layout.response_container()).await {
                Ok(lines) => return Ok(collect_static_text(&lines)),
                Err(e) if e.is_element_unavailable() => last = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(Self::exhausted(last, "extract response"))
    }
}

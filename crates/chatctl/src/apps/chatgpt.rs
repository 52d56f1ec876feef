//! Driver for the ChatGPT desktop application.

use super::{collect_static_text, ChatApp};
use crate::bridge::{ScriptBridge, ScriptRunner};
use crate::errors::AutomationError;
use crate::layout::{
    ChatGptLayout, CHATGPT_SEND_LABEL, CHATGPT_VOICE_DICTATION_LABEL, CHATGPT_VOICE_START_LABEL,
    CHATGPT_WEB_SEARCH_LABEL,
};
use crate::status::{Marker, StatusSpec};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const CHATGPT_PROCESS: &str = "ChatGPT";

/// Width the web-search toggle collapses to while disabled.
const WEB_SEARCH_DISABLED_WIDTH: i64 = 30;

pub struct ChatGptDriver {
    bridge: ScriptBridge,
    layouts: Vec<ChatGptLayout>,
    status_spec: StatusSpec,
}

impl ChatGptDriver {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        let layouts = ChatGptLayout::candidates();
        let status_spec = StatusSpec {
            // Any voice affordance or an enabled send affordance means idle.
            ready_markers: vec![Marker::LabelAmong {
                buttons: layouts.iter().map(|l| l.buttons()).collect(),
                labels: vec![
                    CHATGPT_VOICE_START_LABEL,
                    CHATGPT_VOICE_DICTATION_LABEL,
                    CHATGPT_SEND_LABEL,
                ],
            }],
            // The input button group without any ready affordance means a
            // response is still streaming.
            busy_markers: vec![Marker::Exists(
                layouts.iter().map(|l| l.button_group()).collect(),
            )],
        };
        Self {
            bridge: ScriptBridge::new(CHATGPT_PROCESS, runner),
            layouts,
            status_spec,
        }
    }

    async fn button_helps(
        &self,
        layout: &ChatGptLayout,
    ) -> Result<Vec<String>, AutomationError> {
        self.bridge
            .query_all("help of current", &layout.buttons(), "true")
            .await
    }
}

#[async_trait]
impl ChatApp for ChatGptDriver {
    fn bridge(&self) -> &ScriptBridge {
        &self.bridge
    }

    fn status_spec(&self) -> &StatusSpec {
        &self.status_spec
    }

    /// Turn on web search if the toggle reports its disabled width.
    /// Idempotent: checks current state before acting.
    async fn prepare_input(&self) -> Result<bool, AutomationError> {
        let mut last = None;
        for layout in &self.layouts {
            let helps = match self.button_helps(layout).await {
                Ok(helps) => helps,
                Err(e) if e.is_element_unavailable() => {
                    last = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let position = match helps
                .iter()
                .position(|h| h.contains(CHATGPT_WEB_SEARCH_LABEL))
            {
                Some(position) => position,
                // No toggle in this build; nothing to enable.
                None => return Ok(false),
            };

            let toggle = layout.buttons().item(position + 1);
            let size = self.bridge.fetch(&toggle.property("size")).await?;
            if parse_leading_dimension(&size) == Some(WEB_SEARCH_DISABLED_WIDTH) {
                debug!("enabling web search toggle");
                self.bridge.click(&toggle).await?;
                return Ok(true);
            }
            return Ok(false);
        }
        Err(last.unwrap_or_else(|| {
            AutomationError::ElementUnavailable("web search toggle: no layout variant resolved".to_string())
        }))
    }

    async fn send_prompt(&self, prompt: &str, _continuation: bool) -> Result<(), AutomationError> {
        let mut last = None;
        for layout in &self.layouts {
            match self.bridge.set_value(&layout.prompt(), prompt).await {
                Ok(()) => {}
                Err(e) if e.is_element_unavailable() => {
                    last = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            }

            let helps = self.button_helps(layout).await?;
            let position = helps
                .iter()
                .position(|h| h == CHATGPT_SEND_LABEL)
                .ok_or_else(|| {
                    AutomationError::ElementUnavailable("send button not found".to_string())
                })?;
            return self.bridge.click(&layout.buttons().item(position + 1)).await;
        }
        Err(last.unwrap_or_else(|| {
            AutomationError::ElementUnavailable("send prompt: no layout variant resolved".to_string())
        }))
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
        Err(last.unwrap_or_else(|| {
            AutomationError::ElementUnavailable("extract response: no layout variant resolved".to_string())
        }))
    }
}

/// Parse the leading dimension out of a size result like `30, 30`.
fn parse_leading_dimension(size: &str) -> Option<i64> {
    size.split(',')
        .next()?
        .trim()
        .trim_start_matches('{')
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_pairs() {
        assert_eq!(parse_leading_dimension("30, 30"), Some(30));
        assert_eq!(parse_leading_dimension("{44, 30}"), Some(44));
        assert_eq!(parse_leading_dimension(""), None);
        assert_eq!(parse_leading_dimension("wide"), None);
    }
}

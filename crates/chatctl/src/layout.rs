//! Layout variant tables for the supported chat applications.
//!
//! Each logical UI location (input field, send button, stop button, response
//! container, conversation list, conversation title, new-chat button) is
//! described once per variant axis; the candidate set for a location is the
//! cross-product of the axes in a fixed priority order. Consumers try
//! candidates in order and report failure only after exhausting all of them.

use crate::element::ElementRef;

// ---------------------------------------------------------------------------
// Claude
// ---------------------------------------------------------------------------

const CLAUDE_WINDOW: &str = "Claude";
const CLAUDE_PRIMARY_ANCHOR: &str = "UI element 2 of group 1 of group 1 of group 1 of group 1";

// Conversation list
const CONVERSATION_GROUPS: &str = "groups of list 1 of group 3 of group 1 of group 2";
const CONVERSATION_GROUPS_PROJECT: &str = "groups of list 1 of group 4 of group 1 of group 2";
const CONVERSATION_ITEM_BUTTON: &str = "UI element 1 of group 1";
const CONVERSATION_ITEM_TITLE: &str = "value of static text 1 of UI element 1 of group 1";

// Sidebar
const NEW_CHAT_BUTTON: &str = "UI element 1 of group 1 of group 1 of group 2";

// New chat page
const NEW_CHAT_PAGE: &str = "group 1 of group 2 of group 3";
const NEW_CHAT_PAGE_COMPACT: &str = "group 2 of group 2 of group 3";
const PAGE_PROMPT: &str = "value of text area 1 of group 1 of group 1";
const PAGE_SEND_BUTTON: &str = "button 1 of group 4";

// Open conversation
const CONVERSATION_TITLE: &str =
    "value of static text 1 of group 1 of pop up button 1 of group 1 of group 3";
const CONVERSATION_PAGE: &str = "group 1 of group 2 of group 3";
const INPUT_PAGE_OF_LAST_GROUP: &str = "group 1 of group 1";
const INPUT_PAGE_COMPACT_OF_LAST_GROUP: &str = "group 2 of group 1";
const INPUT_STOP_BUTTON: &str = "button 1";

/// Where the Claude content root sits inside the window hierarchy. Newer app
/// revisions insert one more wrapping group around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaudeAnchor {
    Primary,
    Nested,
}

/// One concrete Claude tree shape: anchor revision x project sidebar x
/// compacted input area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaudeVariant {
    pub anchor: ClaudeAnchor,
    pub project_sidebar: bool,
    pub compact_input: bool,
}

impl ClaudeVariant {
    /// All variants in priority order: the project-sidebar shapes first (the
    /// common paid-tier layout), the primary anchor before the nested one.
    pub fn all() -> Vec<ClaudeVariant> {
        let mut variants = Vec::with_capacity(8);
        for (project_sidebar, compact_input) in
            [(true, false), (true, true), (false, false), (false, true)]
        {
            for anchor in [ClaudeAnchor::Primary, ClaudeAnchor::Nested] {
                variants.push(ClaudeVariant {
                    anchor,
                    project_sidebar,
                    compact_input,
                });
            }
        }
        variants
    }
}

/// Path builder for one Claude layout variant. Pure string composition; no
/// operation here can fail.
#[derive(Debug, Clone)]
pub struct ClaudeLayout {
    pub variant: ClaudeVariant,
    root: ElementRef,
}

impl ClaudeLayout {
    pub fn new(variant: ClaudeVariant) -> Self {
        let window = ElementRef::window(CLAUDE_WINDOW);
        let root = match variant.anchor {
            ClaudeAnchor::Primary => window.descend(CLAUDE_PRIMARY_ANCHOR),
            ClaudeAnchor::Nested => window.descend(CLAUDE_PRIMARY_ANCHOR).descend("group 1"),
        };
        Self { variant, root }
    }

    /// Every variant, in resolution priority order.
    pub fn candidates() -> Vec<ClaudeLayout> {
        ClaudeVariant::all().into_iter().map(Self::new).collect()
    }

    /// The content root; doubles as the window-surface probe.
    pub fn root(&self) -> ElementRef {
        self.root.clone()
    }

    pub fn conversation_groups(&self) -> ElementRef {
        let groups = if self.variant.project_sidebar {
            CONVERSATION_GROUPS_PROJECT
        } else {
            CONVERSATION_GROUPS
        };
        self.root.descend(groups)
    }

    /// The clickable selector of the n-th (1-based) conversation group.
    pub fn conversation_item_button(&self, index: usize) -> ElementRef {
        self.conversation_groups()
            .item(index)
            .descend(CONVERSATION_ITEM_BUTTON)
    }

    /// Select expression projecting a conversation group onto its title,
    /// for use with `query_all` over `conversation_groups()`.
    pub fn conversation_title_select(&self) -> String {
        format!("{CONVERSATION_ITEM_TITLE} of current")
    }

    pub fn new_chat_button(&self) -> ElementRef {
        self.root.descend(NEW_CHAT_BUTTON)
    }

    fn new_chat_page(&self) -> ElementRef {
        let page = if self.variant.compact_input {
            NEW_CHAT_PAGE_COMPACT
        } else {
            NEW_CHAT_PAGE
        };
        self.root.descend(page)
    }

    pub fn new_chat_prompt(&self) -> ElementRef {
        self.new_chat_page().descend(PAGE_PROMPT)
    }

    pub fn new_chat_send_button(&self) -> ElementRef {
        self.new_chat_page().descend(PAGE_SEND_BUTTON)
    }

    pub fn conversation_title(&self) -> ElementRef {
        self.root.descend(CONVERSATION_TITLE)
    }

    fn conversation_page(&self) -> ElementRef {
        self.root.descend(CONVERSATION_PAGE)
    }

    /// The input area lives in the last group of the conversation page; the
    /// group count is only known at probe time, so the index stays a live
    /// `count of groups` expression.
    fn input_page(&self) -> ElementRef {
        let page = self.conversation_page().render();
        let last_group = ElementRef::anchored(format!("group (count of groups of {page}) of {page}"));
        if self.variant.compact_input {
            last_group.descend(INPUT_PAGE_COMPACT_OF_LAST_GROUP)
        } else {
            last_group.descend(INPUT_PAGE_OF_LAST_GROUP)
        }
    }

    pub fn conversation_prompt(&self) -> ElementRef {
        self.input_page().descend(PAGE_PROMPT)
    }

    pub fn conversation_send_button(&self) -> ElementRef {
        self.input_page().descend(PAGE_SEND_BUTTON)
    }

    pub fn conversation_stop_button(&self) -> ElementRef {
        self.input_page().descend(INPUT_STOP_BUTTON)
    }

    /// The response container: every descendant of the conversation page.
    pub fn response_container(&self) -> ElementRef {
        self.conversation_page().descend("entire contents")
    }
}

// ---------------------------------------------------------------------------
// ChatGPT
// ---------------------------------------------------------------------------

const CHATGPT_WINDOW: &str = "ChatGPT";
const CHATGPT_PAGE: &str = "splitter group 1 of group 1";
const CHATGPT_PROMPT: &str = "value of text area 1 of scroll area 3 of group 2";
const CHATGPT_BUTTON_GROUP: &str = "group 2";

/// Descriptive texts the ChatGPT app puts on its input-affordance buttons.
/// Any of the first three present means the app accepts input.
pub const CHATGPT_VOICE_START_LABEL: &str = "음성 대화 시작";
pub const CHATGPT_VOICE_DICTATION_LABEL: &str = "음성 받아쓰기";
pub const CHATGPT_SEND_LABEL: &str = "메시지 보내기(⏎)";
pub const CHATGPT_WEB_SEARCH_LABEL: &str = "웹 검색하기";

/// ChatGPT ships a single known tree shape today; it still goes through the
/// variant table so a second shape is one more row, not a parallel builder.
#[derive(Debug, Clone)]
pub struct ChatGptLayout {
    page: ElementRef,
}

impl ChatGptLayout {
    pub fn new() -> Self {
        Self {
            page: ElementRef::window(CHATGPT_WINDOW).descend(CHATGPT_PAGE),
        }
    }

    pub fn candidates() -> Vec<ChatGptLayout> {
        vec![Self::new()]
    }

    pub fn root(&self) -> ElementRef {
        self.page.clone()
    }

    pub fn prompt(&self) -> ElementRef {
        self.page.descend(CHATGPT_PROMPT)
    }

    pub fn button_group(&self) -> ElementRef {
        self.page.descend(CHATGPT_BUTTON_GROUP)
    }

    pub fn buttons(&self) -> ElementRef {
        self.button_group().descend("buttons")
    }

    pub fn response_container(&self) -> ElementRef {
        self.page.descend("entire contents")
    }
}

impl Default for ChatGptLayout {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claude_variant_priority_is_stable() {
        let variants = ClaudeVariant::all();
        assert_eq!(variants.len(), 8);
        // Project-sidebar, expanded-input, primary anchor comes first.
        assert_eq!(
            variants[0],
            ClaudeVariant {
                anchor: ClaudeAnchor::Primary,
                project_sidebar: true,
                compact_input: false,
            }
        );
        // The nested anchor immediately follows its primary counterpart.
        assert_eq!(variants[1].anchor, ClaudeAnchor::Nested);
        assert!(variants[1].project_sidebar);
    }

    #[test]
    fn nested_anchor_adds_one_group() {
        let primary = ClaudeLayout::new(ClaudeVariant {
            anchor: ClaudeAnchor::Primary,
            project_sidebar: false,
            compact_input: false,
        });
        let nested = ClaudeLayout::new(ClaudeVariant {
            anchor: ClaudeAnchor::Nested,
            project_sidebar: false,
            compact_input: false,
        });
        assert_eq!(
            nested.root().render(),
            format!("group 1 of {}", primary.root().render())
        );
    }

    #[test]
    fn project_axis_switches_conversation_list() {
        let layout = ClaudeLayout::new(ClaudeVariant {
            anchor: ClaudeAnchor::Primary,
            project_sidebar: true,
            compact_input: false,
        });
        assert!(layout
            .conversation_groups()
            .render()
            .starts_with("groups of list 1 of group 4"));
    }

    #[test]
    fn compact_axis_switches_input_page() {
        let compact = ClaudeLayout::new(ClaudeVariant {
            anchor: ClaudeAnchor::Primary,
            project_sidebar: false,
            compact_input: true,
        });
        assert!(compact
            .conversation_send_button()
            .render()
            .contains("group 2 of group 1 of group (count of groups of"));
        assert!(compact
            .new_chat_prompt()
            .render()
            .contains("group 2 of group 2 of group 3"));
    }

    #[test]
    fn chatgpt_prompt_path() {
        let layout = ChatGptLayout::new();
        assert_eq!(
            layout.prompt().render(),
            "value of text area 1 of scroll area 3 of group 2 of splitter group 1 of group 1 of window \"ChatGPT\""
        );
    }
}

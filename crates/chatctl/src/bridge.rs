//! Adapter between element references and the System Events scripting layer.
//!
//! All statement composition, value escaping, and result parsing live here;
//! nothing outside this module ever sees osascript syntax. Failures normalize
//! to two kinds: [`AutomationError::ElementUnavailable`] when a reference did
//! not resolve, and [`AutomationError::BridgeFailure`] for everything else
//! (process not found, scripting not permitted, syntax errors).

use crate::element::ElementRef;
use crate::errors::AutomationError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// The raw capability this crate assumes: execute a scripting statement
/// against the OS and return its text result. The trait is the seam for
/// fixture-driven tests.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run_script(&self, source: &str) -> Result<String, AutomationError>;
}

/// Production runner: spawns `osascript -e`.
#[derive(Debug, Default)]
pub struct OsaRunner;

#[async_trait]
impl ScriptRunner for OsaRunner {
    async fn run_script(&self, source: &str) -> Result<String, AutomationError> {
        let output = tokio::process::Command::new("osascript")
            .arg("-e")
            .arg(source)
            .output()
            .await
            .map_err(|e| AutomationError::BridgeFailure {
                intent: "osascript".to_string(),
                message: format!("failed to spawn osascript: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(%stderr, "osascript returned non-zero status");
            return Err(AutomationError::BridgeFailure {
                intent: "osascript".to_string(),
                message: stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim_end_matches('\n').to_string())
    }
}

/// Primitive element operations against one named process.
#[derive(Clone)]
pub struct ScriptBridge {
    process: String,
    runner: Arc<dyn ScriptRunner>,
}

impl ScriptBridge {
    pub fn new(process: impl Into<String>, runner: Arc<dyn ScriptRunner>) -> Self {
        Self {
            process: process.into(),
            runner,
        }
    }

    pub fn process_name(&self) -> &str {
        &self.process
    }

    /// Escape a value for embedding inside a quoted AppleScript string.
    /// Line breaks must become escape sequences or the statement itself
    /// breaks mid-literal.
    fn escape(value: &str) -> String {
        value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\r', "\\r")
            .replace('\n', "\\n")
    }

    /// Wrap a statement body in the System Events tell-block for this
    /// process, with the manual-accessibility attribute enabled up front.
    fn statement(&self, body: &str) -> String {
        format!(
            "tell application \"System Events\"\n\
             \ttell process \"{process}\"\n\
             \t\tset value of attribute \"AXManualAccessibility\" to true\n\
             {body}\n\
             \tend tell\n\
             end tell",
            process = self.process,
            body = body,
        )
    }

    async fn run(&self, intent: &str, source: &str) -> Result<String, AutomationError> {
        debug!(intent, process = %self.process, "bridge call");
        self.runner
            .run_script(source)
            .await
            .map_err(|e| Self::normalize(intent, e))
    }

    /// Fold scripting-layer errors into the two bridge error kinds. Messages
    /// like `Can't get ...` or `Invalid index` mean the composed reference
    /// failed to resolve; everything else is a genuine bridge fault.
    fn normalize(intent: &str, error: AutomationError) -> AutomationError {
        match error {
            AutomationError::BridgeFailure { message, .. } => {
                if message.contains("Can't get") || message.contains("Invalid index") {
                    AutomationError::ElementUnavailable(format!("{intent}: {message}"))
                } else {
                    AutomationError::BridgeFailure {
                        intent: intent.to_string(),
                        message,
                    }
                }
            }
            other => other,
        }
    }

    /// Whether the target process is currently running.
    pub async fn process_running(&self) -> Result<bool, AutomationError> {
        let source = format!(
            "tell application \"System Events\" to return exists application process \"{}\"",
            self.process
        );
        let result = self.run("process_running", &source).await?;
        Ok(result == "true")
    }

    /// Activate (launching if necessary) the target application.
    pub async fn launch(&self) -> Result<(), AutomationError> {
        let source = format!("tell application \"{}\" to activate", self.process);
        self.run("launch", &source).await.map_err(|e| match e {
            AutomationError::BridgeFailure { message, .. } => AutomationError::TargetUnavailable(
                format!("could not activate {}: {message}", self.process),
            ),
            other => other,
        })?;
        Ok(())
    }

    /// Turn on the manual-accessibility attribute for apps that only expose
    /// their tree on request. Idempotent.
    pub async fn enable_accessibility(&self) -> Result<(), AutomationError> {
        let source = self.statement("");
        self.run("enable_accessibility", &source).await?;
        Ok(())
    }

    /// Whether `element` resolves in the live tree. A reference that fails to
    /// resolve is reported as `false`, not as an error.
    pub async fn exists(&self, element: &ElementRef) -> Result<bool, AutomationError> {
        let body = format!("\t\treturn exists {}", element.render());
        let source = self.statement(&body);
        match self.run("exists", &source).await {
            Ok(result) => Ok(result == "true"),
            Err(AutomationError::ElementUnavailable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a scalar property or value.
    pub async fn fetch(&self, element: &ElementRef) -> Result<String, AutomationError> {
        let body = format!("\t\treturn {}", element.render());
        let source = self.statement(&body);
        self.run("fetch", &source).await
    }

    /// Write a value. Mutates live application state.
    pub async fn set_value(
        &self,
        element: &ElementRef,
        value: &str,
    ) -> Result<(), AutomationError> {
        let body = format!(
            "\t\tset {} to \"{}\"",
            element.render(),
            Self::escape(value)
        );
        let source = self.statement(&body);
        self.run("set", &source).await?;
        Ok(())
    }

    /// Click an element. Mutates live application state; not idempotent.
    pub async fn click(&self, element: &ElementRef) -> Result<(), AutomationError> {
        let body = format!("\t\tclick {}", element.render());
        let source = self.statement(&body);
        self.run("click", &source).await?;
        Ok(())
    }

    /// Enumerate descendants of `container`, keeping those for which
    /// `predicate` holds and projecting each through `select`. Both
    /// expressions refer to the element under test as `current`. Order
    /// follows the tree's native enumeration and is best-effort only.
    pub async fn query_all(
        &self,
        select: &str,
        container: &ElementRef,
        predicate: &str,
    ) -> Result<Vec<String>, AutomationError> {
        let body = format!(
            "\t\tset matches to {{}}\n\
             \t\trepeat with current in ({container})\n\
             \t\t\ttry\n\
             \t\t\t\tif {predicate} then set end of matches to ({select})\n\
             \t\t\tend try\n\
             \t\tend repeat\n\
             \t\tset AppleScript's text item delimiters to linefeed\n\
             \t\treturn matches as text",
            container = container.render(),
            predicate = predicate,
            select = select,
        );
        let source = self.statement(&body);
        let result = self.run("query_all", &source).await?;
        Ok(split_lines(&result))
    }

    /// Dump the full subtree under `container` as opaque descriptor lines.
    /// Used where predicate-based querying on a property is unsupported and
    /// callers must pattern-match the textual dump instead.
    pub async fn list_all(&self, container: &ElementRef) -> Result<Vec<String>, AutomationError> {
        let body = format!(
            "\t\tset AppleScript's text item delimiters to linefeed\n\
             \t\treturn ({}) as text",
            container.render()
        );
        let source = self.statement(&body);
        let result = self.run("list_all", &source).await?;
        Ok(split_lines(&result))
    }
}

/// System clipboard access over the same scripting layer. Process-agnostic,
/// so it lives beside the bridge rather than on it.
#[derive(Clone)]
pub struct Clipboard {
    runner: Arc<dyn ScriptRunner>,
}

impl Clipboard {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    /// Current clipboard content as text.
    pub async fn read(&self) -> Result<String, AutomationError> {
        self.runner
            .run_script("return the clipboard as text")
            .await
    }

    /// Overwrite the clipboard.
    pub async fn write(&self, content: &str) -> Result<(), AutomationError> {
        let source = format!(
            "set the clipboard to \"{}\"",
            ScriptBridge::escape(content)
        );
        self.runner.run_script(&source).await?;
        Ok(())
    }
}

fn split_lines(result: &str) -> Vec<String> {
    if result.is_empty() {
        return Vec::new();
    }
    result.lines().map(|line| line.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fixture runner: answers from a fixed script-substring -> response
    /// table and records every statement it executes.
    pub(crate) struct FixtureRunner {
        rules: Vec<(&'static str, Result<String, AutomationError>)>,
        pub executed: Mutex<Vec<String>>,
    }

    impl FixtureRunner {
        pub(crate) fn new(
            rules: Vec<(&'static str, Result<String, AutomationError>)>,
        ) -> Arc<Self> {
            Arc::new(Self {
                rules,
                executed: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ScriptRunner for FixtureRunner {
        async fn run_script(&self, source: &str) -> Result<String, AutomationError> {
            self.executed.lock().unwrap().push(source.to_string());
            for (needle, response) in &self.rules {
                if source.contains(needle) {
                    return response.clone();
                }
            }
            Err(AutomationError::BridgeFailure {
                intent: "fixture".to_string(),
                message: format!("no fixture rule for script: {source}"),
            })
        }
    }

    fn cant_get() -> Result<String, AutomationError> {
        Err(AutomationError::BridgeFailure {
            intent: "osascript".to_string(),
            message: "execution error: Can't get group 9 of window \"Claude\". (-1728)".to_string(),
        })
    }

    #[tokio::test]
    async fn statements_carry_process_and_accessibility_preamble() {
        let runner = FixtureRunner::new(vec![("return exists", Ok("true".to_string()))]);
        let bridge = ScriptBridge::new("Claude", runner.clone());
        let window = ElementRef::window("Claude");
        assert!(bridge.exists(&window).await.unwrap());

        let executed = runner.executed.lock().unwrap();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].contains("tell process \"Claude\""));
        assert!(executed[0].contains("AXManualAccessibility"));
        assert!(executed[0].contains("return exists window \"Claude\""));
    }

    #[tokio::test]
    async fn unresolvable_reference_reads_as_absent() {
        let runner = FixtureRunner::new(vec![("return exists", cant_get())]);
        let bridge = ScriptBridge::new("Claude", runner);
        let missing = ElementRef::window("Claude").descend("group 9");
        assert!(!bridge.exists(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn fetch_normalizes_resolution_failure() {
        let runner = FixtureRunner::new(vec![("return ", cant_get())]);
        let bridge = ScriptBridge::new("Claude", runner);
        let missing = ElementRef::window("Claude").descend("group 9");
        let err = bridge.fetch(&missing).await.unwrap_err();
        assert!(err.is_element_unavailable(), "got {err:?}");
    }

    #[tokio::test]
    async fn other_failures_stay_bridge_failures_with_intent() {
        let runner = FixtureRunner::new(vec![(
            "click",
            Err(AutomationError::BridgeFailure {
                intent: "osascript".to_string(),
                message: "osascript is not allowed assistive access".to_string(),
            }),
        )]);
        let bridge = ScriptBridge::new("ChatGPT", runner);
        let button = ElementRef::window("ChatGPT").descend("button 1");
        match bridge.click(&button).await.unwrap_err() {
            AutomationError::BridgeFailure { intent, message } => {
                assert_eq!(intent, "click");
                assert!(message.contains("assistive access"));
            }
            other => panic!("expected BridgeFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn set_value_escapes_quotes() {
        let runner = FixtureRunner::new(vec![("set value", Ok(String::new()))]);
        let bridge = ScriptBridge::new("Claude", runner.clone());
        let prompt = ElementRef::window("Claude").descend("value of text area 1");
        bridge
            .set_value(&prompt, "say \"hello\" back")
            .await
            .unwrap();

        let executed = runner.executed.lock().unwrap();
        assert!(executed[0].contains("to \"say \\\"hello\\\" back\""));
    }

    #[tokio::test]
    async fn set_value_escapes_line_breaks() {
        let runner = FixtureRunner::new(vec![("set value", Ok(String::new()))]);
        let bridge = ScriptBridge::new("Claude", runner.clone());
        let prompt = ElementRef::window("Claude").descend("value of text area 1");
        bridge
            .set_value(&prompt, "line one\nline two")
            .await
            .unwrap();

        // The break must arrive as an escape sequence, not a literal newline
        // splitting the statement.
        let executed = runner.executed.lock().unwrap();
        assert!(executed[0].contains("to \"line one\\nline two\""));
        assert!(!executed[0].contains("to \"line one\nline two\""));
    }

    #[tokio::test]
    async fn clipboard_reads_and_writes_escaped_content() {
        let runner = FixtureRunner::new(vec![
            ("return the clipboard", Ok("saved text".to_string())),
            ("set the clipboard to", Ok(String::new())),
        ]);
        let clipboard = Clipboard::new(runner.clone());

        assert_eq!(clipboard.read().await.unwrap(), "saved text");
        clipboard.write("a \"quoted\"\nline").await.unwrap();

        let executed = runner.executed.lock().unwrap();
        assert!(executed[1].contains("set the clipboard to \"a \\\"quoted\\\"\\nline\""));
    }

    #[tokio::test]
    async fn query_all_splits_delimited_output() {
        let runner = FixtureRunner::new(vec![(
            "repeat with current",
            Ok("Chat about locks\nWeekend plans".to_string()),
        )]);
        let bridge = ScriptBridge::new("Claude", runner);
        let groups = ElementRef::anchored("groups of list 1");
        let titles = bridge
            .query_all("value of static text 1 of current", &groups, "true")
            .await
            .unwrap();
        assert_eq!(titles, vec!["Chat about locks", "Weekend plans"]);
    }

    #[tokio::test]
    async fn query_all_empty_result_is_empty_vec() {
        let runner = FixtureRunner::new(vec![("repeat with current", Ok(String::new()))]);
        let bridge = ScriptBridge::new("Claude", runner);
        let groups = ElementRef::anchored("groups of list 1");
        let titles = bridge.query_all("current", &groups, "true").await.unwrap();
        assert!(titles.is_empty());
    }
}

use chatctl::ChatTarget;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "chatctl")]
#[command(about = "Drive the Claude and ChatGPT desktop apps from the command line")]
#[command(
    long_about = "chatctl remote-controls desktop chat applications through their accessibility trees: send a prompt and wait for the response, read the response already on screen, or inspect the live element tree."
)]
pub struct Cli {
    /// Total time budget for a single call, in milliseconds
    #[clap(long, global = true, env = "CHATCTL_DEADLINE_MS")]
    pub deadline_ms: Option<u64>,

    /// Delay between readiness probes, in milliseconds
    #[clap(long, global = true, env = "CHATCTL_POLL_MS")]
    pub poll_ms: Option<u64>,

    /// Directory holding the per-target lock files
    #[clap(long, global = true, env = "CHATCTL_LOCK_DIR")]
    pub lock_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[clap(rename_all = "lower")]
pub enum Target {
    Claude,
    ChatGpt,
}

impl From<Target> for ChatTarget {
    fn from(target: Target) -> Self {
        match target {
            Target::Claude => ChatTarget::Claude,
            Target::ChatGpt => ChatTarget::ChatGpt,
        }
    }
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    #[clap(value_enum)]
    pub target: Target,

    /// The prompt to send
    pub prompt: String,

    /// Continue the named conversation instead of starting a new chat
    #[clap(long, short = 'c')]
    pub conversation: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ResponseArgs {
    #[clap(value_enum)]
    pub target: Target,

    /// Bring this conversation to the foreground first
    #[clap(long, short = 'c')]
    pub conversation: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TargetArgs {
    #[clap(value_enum)]
    pub target: Target,
}

#[derive(Parser, Debug)]
pub struct ElementArgs {
    #[clap(value_enum)]
    pub target: Target,

    /// Element reference, innermost first (e.g. "button 1 of group 4 of window 1")
    pub path: String,
}

#[derive(Parser, Debug)]
pub struct SetArgs {
    #[clap(value_enum)]
    pub target: Target,

    /// Element reference, innermost first
    pub path: String,

    /// Value to write into the element
    pub value: String,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    #[clap(value_enum)]
    pub target: Target,

    /// Container reference enumerated element by element
    pub container: String,

    /// Projection applied to each match; refers to the element as "current"
    #[clap(long, short = 's', default_value = "current")]
    pub select: String,

    /// Filter expression; refers to the element as "current"
    #[clap(long, short = 'w', default_value = "true")]
    pub r#where: String,
}

/// Raw accessibility-tree primitives, for diagnosing layout drift after an
/// application update.
#[derive(Subcommand, Debug)]
pub enum TreeCommands {
    /// Report whether an element reference resolves
    Exists(ElementArgs),
    /// Read an element's value
    Fetch(ElementArgs),
    /// Write an element's value
    Set(SetArgs),
    /// Press an element
    Click(ElementArgs),
    /// Enumerate a container, filtering and projecting each element
    Query(QueryArgs),
    /// Dump every descendant of a container, one descriptor per line
    List(ElementArgs),
}

/// Save/restore the system clipboard around automations that overwrite it.
#[derive(Subcommand, Debug)]
pub enum ClipboardCommands {
    /// Print the current clipboard content
    Save,
    /// Overwrite the clipboard
    Restore {
        /// Content to place on the clipboard
        #[clap(long, short = 'c')]
        content: String,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a prompt and print the response
    Ask(AskArgs),
    /// Print the response currently on screen
    Response(ResponseArgs),
    /// List conversation titles
    Conversations(TargetArgs),
    /// Print the application's status (inactive, running, ready, error)
    Status(TargetArgs),
    /// Raw element-tree primitives
    #[command(subcommand)]
    Tree(TreeCommands),
    /// System clipboard save/restore
    #[command(subcommand)]
    Clipboard(ClipboardCommands),
}

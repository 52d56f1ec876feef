use crate::cli::{
    AskArgs, Cli, ClipboardCommands, ElementArgs, QueryArgs, ResponseArgs, SetArgs, TargetArgs,
    TreeCommands,
};
use anyhow::Result;
use chatctl::{Automator, AutomationConfig, CancellationToken, ElementRef};
use tracing::debug;

pub fn build_automator(cli: &Cli) -> Automator {
    let mut config = AutomationConfig::default();
    if let Some(deadline_ms) = cli.deadline_ms {
        config.overall_deadline_ms = deadline_ms;
    }
    if let Some(poll_ms) = cli.poll_ms {
        config.poll_interval_ms = poll_ms;
    }
    if let Some(lock_dir) = &cli.lock_dir {
        config.lock_dir = lock_dir.clone();
    }
    debug!(?config, "resolved configuration");
    Automator::with_runner(std::sync::Arc::new(chatctl::OsaRunner), config)
}

/// Cancellation token that fires on Ctrl-C, so an in-flight call unwinds
/// through its normal error path and releases the target's lock.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}

pub async fn handle_ask(automator: &Automator, args: AskArgs) -> Result<()> {
    let session = automator.session(args.target.into());
    let outcome = session
        .ask(&args.prompt, args.conversation.as_deref(), cancel_on_ctrl_c())
        .await?;
    if let Some(id) = &outcome.conversation_id {
        eprintln!("conversation: {id}");
    }
    println!("{}", outcome.response);
    Ok(())
}

pub async fn handle_response(automator: &Automator, args: ResponseArgs) -> Result<()> {
    let session = automator.session(args.target.into());
    let response = session
        .previous_response(args.conversation.as_deref(), cancel_on_ctrl_c())
        .await?;
    println!("{response}");
    Ok(())
}

pub async fn handle_conversations(automator: &Automator, args: TargetArgs) -> Result<()> {
    let session = automator.session(args.target.into());
    for title in session.conversations().await? {
        println!("{title}");
    }
    Ok(())
}

pub async fn handle_status(automator: &Automator, args: TargetArgs) -> Result<()> {
    let session = automator.session(args.target.into());
    println!("{}", session.status().await?);
    Ok(())
}

pub async fn handle_clipboard(automator: &Automator, command: ClipboardCommands) -> Result<()> {
    let clipboard = automator.clipboard();
    match command {
        ClipboardCommands::Save => println!("{}", clipboard.read().await?),
        ClipboardCommands::Restore { content } => clipboard.write(&content).await?,
    }
    Ok(())
}

pub async fn handle_tree(automator: &Automator, command: TreeCommands) -> Result<()> {
    match command {
        TreeCommands::Exists(ElementArgs { target, path }) => {
            let bridge = automator.bridge(target.into());
            println!("{}", bridge.exists(&ElementRef::anchored(path)).await?);
        }
        TreeCommands::Fetch(ElementArgs { target, path }) => {
            let bridge = automator.bridge(target.into());
            println!("{}", bridge.fetch(&ElementRef::anchored(path)).await?);
        }
        TreeCommands::Set(SetArgs {
            target,
            path,
            value,
        }) => {
            let bridge = automator.bridge(target.into());
            bridge.set_value(&ElementRef::anchored(path), &value).await?;
        }
        TreeCommands::Click(ElementArgs { target, path }) => {
            let bridge = automator.bridge(target.into());
            bridge.click(&ElementRef::anchored(path)).await?;
        }
        TreeCommands::Query(QueryArgs {
            target,
            container,
            select,
            r#where,
        }) => {
            let bridge = automator.bridge(target.into());
            let matches = bridge
                .query_all(&select, &ElementRef::anchored(container), &r#where)
                .await?;
            for line in matches {
                println!("{line}");
            }
        }
        TreeCommands::List(ElementArgs { target, path }) => {
            let bridge = automator.bridge(target.into());
            for line in bridge.list_all(&ElementRef::anchored(path)).await? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

//! Foreman - 本地私有对话助理
//!
//! 入口：初始化日志与配置，打开工作区存储，构建 Agent，进入 REPL 主循环。
//! 普通输入走流式对话（分片实时打印），以 `/` 开头的行是工作区管理命令。

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use foreman::agent::Agent;
use foreman::config::load_config;
use foreman::llm::OpenAiClient;
use foreman::store::{WorkspaceMeta, WorkspaceStore};
use foreman::tools::{builtin_registry, ToolDispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).context("Failed to load config")?;

    let store =
        WorkspaceStore::open(&cfg.history.db_path).context("Failed to open history database")?;

    // 默认进入最近的工作区；首次运行时创建 default
    let mut active = match store.list_workspaces()?.into_iter().next() {
        Some(meta) => meta,
        None => {
            let id = store.create_workspace("default")?;
            tracing::info!(id, "created default workspace");
            store
                .list_workspaces()?
                .into_iter()
                .find(|w| w.id == id)
                .context("workspace vanished after create")?
        }
    };

    let client = Arc::new(OpenAiClient::new(
        Some(&cfg.llm.base_url),
        &cfg.llm.model,
        cfg.llm.api_key.as_deref(),
    ));
    let dispatcher = ToolDispatcher::new(builtin_registry()?, cfg.tools.timeout_secs);
    let mut agent = Agent::new(
        client,
        dispatcher,
        cfg.agent.system_prompt(),
        cfg.agent.max_tool_rounds,
    );
    agent.reset_context(store.summary(active.id)?, store.load_history(active.id)?);

    println!("Foreman ready. Workspace: {}. Type /help for commands.", active.name);

    let stdin = io::stdin();
    loop {
        print!("You: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            match handle_command(command, &store, &mut agent, &mut active).await {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => eprintln!("Command failed: {e}"),
            }
            continue;
        }

        // 流式打印：分片经 channel 送到打印任务，回复结束后随任务退出
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let printer = tokio::spawn(async move {
            while let Some(fragment) = rx.recv().await {
                print!("{fragment}");
                let _ = io::stdout().flush();
            }
            println!();
        });

        match agent.submit(input, Some(&tx), CancellationToken::new()).await {
            Ok(response) => {
                drop(tx);
                let _ = printer.await;
                store.append_history(active.id, input, &response)?;
            }
            Err(e) => {
                drop(tx);
                let _ = printer.await;
                eprintln!("Agent unavailable: {e}");
            }
        }
    }

    Ok(())
}

/// 处理一条 `/` 命令；返回 Ok(true) 表示退出主循环
async fn handle_command(
    command: &str,
    store: &WorkspaceStore,
    agent: &mut Agent,
    active: &mut WorkspaceMeta,
) -> anyhow::Result<bool> {
    let mut parts = command.splitn(2, ' ');
    let verb = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).unwrap_or("");

    match verb {
        "quit" | "exit" => return Ok(true),
        "help" => {
            println!("/list  /new <name>  /open <name>  /delete <name>  /summarize  /quit");
        }
        "list" => {
            for ws in store.list_workspaces()? {
                let marker = if ws.id == active.id { "*" } else { " " };
                println!("{marker} {} ({})", ws.name, ws.created_at.format("%Y-%m-%d %H:%M"));
            }
        }
        "new" => {
            if arg.is_empty() {
                println!("Usage: /new <name>");
            } else if store.find_workspace(arg)?.is_some() {
                println!("Workspace already exists: {arg}");
            } else {
                let id = store.create_workspace(arg)?;
                let target = store
                    .list_workspaces()?
                    .into_iter()
                    .find(|w| w.id == id)
                    .context("workspace vanished after create")?;
                switch_workspace(store, agent, active, target).await?;
                println!("Switched to new workspace: {arg}");
            }
        }
        "open" => {
            match store.find_workspace(arg)? {
                Some(target) if target.id == active.id => {
                    println!("Already in workspace: {arg}");
                }
                Some(target) => {
                    switch_workspace(store, agent, active, target).await?;
                    println!("Switched to workspace: {arg}");
                }
                None => println!("No such workspace: {arg}"),
            }
        }
        "delete" => {
            match store.find_workspace(arg)? {
                Some(target) if target.id == active.id => {
                    println!("Cannot delete the active workspace");
                }
                Some(target) => {
                    store.delete_workspace(target.id)?;
                    println!("Deleted workspace: {arg}");
                }
                None => println!("No such workspace: {arg}"),
            }
        }
        "summarize" => {
            if agent.context().history().is_empty() {
                println!("Nothing to summarize yet");
            } else {
                let summary = agent.summarize().await?;
                store.set_summary(active.id, &summary)?;
                println!("Summary saved: {summary}");
            }
        }
        other => println!("Unknown command: /{other}"),
    }
    Ok(false)
}

/// 切换工作区：先把当前历史压缩为摘要落库，再从目标工作区恢复上下文
async fn switch_workspace(
    store: &WorkspaceStore,
    agent: &mut Agent,
    active: &mut WorkspaceMeta,
    target: WorkspaceMeta,
) -> anyhow::Result<()> {
    if !agent.context().history().is_empty() {
        match agent.summarize().await {
            Ok(summary) => store.set_summary(active.id, &summary)?,
            Err(e) => tracing::warn!(error = %e, "summarize on switch failed, keeping old summary"),
        }
    }

    agent.reset_context(store.summary(target.id)?, store.load_history(target.id)?);
    *active = target;
    Ok(())
}

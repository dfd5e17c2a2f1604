//! 端到端集成测试：Mock 后端 + 内置工具 + 临时 SQLite 存储
//!
//! 覆盖「一次带工具调用的对话 -> 历史落库 -> 摘要落库 -> 切换工作区后
//! 摘要被注入出站 prompt」的完整流程。

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use foreman::agent::{Agent, Role};
use foreman::llm::{MockClient, StreamChunk, ToolCallRequest};
use foreman::store::WorkspaceStore;
use foreman::tools::{builtin_registry, ToolDispatcher};

fn agent_with(client: Arc<MockClient>) -> Agent {
    let dispatcher = ToolDispatcher::new(builtin_registry().unwrap(), 5);
    Agent::new(client, dispatcher, "You are a terminal assistant.", 8)
}

#[tokio::test]
async fn tool_turn_persists_and_summary_carries_across_sessions() {
    let dir = TempDir::new().unwrap();
    let store = WorkspaceStore::open(dir.path().join("history.sqlite")).unwrap();
    let ws = store.create_workspace("math").unwrap();

    // 第一轮模型要求调用 sqrt，第二轮给出最终文本
    let client = Arc::new(MockClient::new(vec![
        vec![StreamChunk::tool_call(ToolCallRequest {
            id: "call_1".to_string(),
            name: "sqrt".to_string(),
            arguments: json!({"x": 144}),
        })],
        vec![StreamChunk::text("The square root of 144 is 12.")],
    ]));
    let mut agent = agent_with(client.clone());
    agent.reset_context(store.summary(ws).unwrap(), store.load_history(ws).unwrap());

    let response = agent
        .submit("what is the square root of 144", None, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response, "The square root of 144 is 12.");
    store
        .append_history(ws, "what is the square root of 144", &response)
        .unwrap();

    // 第二次请求（工具反馈轮）里应出现内容为 "12" 的 tool 消息
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    let tool_msg = requests[1]
        .iter()
        .find(|m| m.role == Role::Tool)
        .expect("tool feedback message");
    assert_eq!(tool_msg.content, "12");
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));

    // 压缩为摘要并落库
    let summary = agent.summarize().await.unwrap();
    store.set_summary(ws, &summary).unwrap();
    assert_eq!(store.summary(ws).unwrap().as_deref(), Some("Mock summary."));

    // 新会话：从存储恢复上下文，摘要应原样注入第一条 system 消息
    let fresh_client = Arc::new(MockClient::text_reply(&["picking up where we left off"]));
    let mut fresh = agent_with(fresh_client.clone());
    fresh.reset_context(store.summary(ws).unwrap(), store.load_history(ws).unwrap());

    fresh
        .submit("continue", None, CancellationToken::new())
        .await
        .unwrap();

    let fresh_requests = fresh_client.requests();
    let system = &fresh_requests[0][0];
    assert_eq!(system.role, Role::System);
    assert!(system.content.contains("[Context Summary]: Mock summary."));
    // 恢复的历史对紧随其后
    assert_eq!(
        fresh_requests[0][1].content,
        "what is the square root of 144"
    );
}

#[tokio::test]
async fn empty_workspace_injects_no_summary_block() {
    let dir = TempDir::new().unwrap();
    let store = WorkspaceStore::open(dir.path().join("history.sqlite")).unwrap();
    let ws = store.create_workspace("fresh").unwrap();

    let client = Arc::new(MockClient::text_reply(&["hello"]));
    let mut agent = agent_with(client.clone());
    agent.reset_context(store.summary(ws).unwrap(), store.load_history(ws).unwrap());

    agent
        .submit("hi", None, CancellationToken::new())
        .await
        .unwrap();

    let requests = client.requests();
    assert!(!requests[0][0].content.contains("[Context Summary]"));
    assert_eq!(requests[0].len(), 2);
}
